//! Client for the external quiz REST API.

mod client;
mod wire;

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{AnswerSet, Question, ReviewReport, StudentCredential, SubmissionResult};
use url::Url;

use crate::error::ApiError;

pub use client::HttpQuizApi;
pub use wire::{decode_credential, decode_questions, decode_review, decode_submission};

/// Default backend when `CCC_API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl ApiConfig {
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if `base_url` does not parse.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: Url::parse(base_url.trim())?,
            timeout: Duration::from_secs(20),
        })
    }

    /// Reads `CCC_API_BASE_URL`, falling back to the local development server.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidBaseUrl` if the configured value does not parse.
    pub fn from_env() -> Result<Self, ApiError> {
        let base_url = env::var("CCC_API_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        Self::new(&base_url)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Joins an absolute API path (`/api/...`) onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

/// The REST endpoints the student client talks to.
///
/// Implemented by `HttpQuizApi`; tests substitute scripted fakes.
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// `GET /api/student/questions`, normalized.
    async fn fetch_questions(&self) -> Result<Vec<Question>, ApiError>;

    /// `POST /api/student/submit` with the bearer token.
    async fn submit_answers(
        &self,
        token: &str,
        answers: &AnswerSet,
    ) -> Result<SubmissionResult, ApiError>;

    /// `POST /api/auth/login`.
    async fn login(&self, roll_number: &str, password: &str)
    -> Result<StudentCredential, ApiError>;

    /// `GET /api/student/review` with the bearer token.
    async fn fetch_review(&self, token: &str) -> Result<ReviewReport, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let cfg = ApiConfig::new("https://quiz.example.org/").unwrap();
        assert_eq!(
            cfg.endpoint("/api/student/questions"),
            "https://quiz.example.org/api/student/questions"
        );
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let err = ApiConfig::new("not a url").unwrap_err();
        assert!(matches!(err, ApiError::InvalidBaseUrl(_)));
    }
}
