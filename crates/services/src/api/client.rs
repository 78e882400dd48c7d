use async_trait::async_trait;
use quiz_core::model::{AnswerSet, Question, ReviewReport, StudentCredential, SubmissionResult};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;

use super::wire::{decode_credential, decode_questions, decode_review, decode_submission};
use super::{ApiConfig, QuizApi};
use crate::error::ApiError;

const QUESTIONS_PATH: &str = "/api/student/questions";
const SUBMIT_PATH: &str = "/api/student/submit";
const REVIEW_PATH: &str = "/api/student/review";
const LOGIN_PATH: &str = "/api/auth/login";

/// `reqwest`-backed implementation of `QuizApi`.
#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    config: ApiConfig,
}

impl HttpQuizApi {
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }
}

async fn read_body(response: Response) -> Result<(StatusCode, String), ApiError> {
    let status = response.status();
    let body = response.text().await?;
    Ok((status, body))
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    answers: &'a AnswerSet,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    roll_number: &'a str,
    password: &'a str,
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn fetch_questions(&self) -> Result<Vec<Question>, ApiError> {
        let url = self.config.endpoint(QUESTIONS_PATH);
        tracing::debug!(%url, "fetching questions");
        let response = self.client.get(url).send().await?;
        let (status, body) = read_body(response).await?;
        decode_questions(status, &body)
    }

    async fn submit_answers(
        &self,
        token: &str,
        answers: &AnswerSet,
    ) -> Result<SubmissionResult, ApiError> {
        let url = self.config.endpoint(SUBMIT_PATH);
        tracing::debug!(%url, answers = answers.len(), "submitting answers");
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&SubmitRequest { answers })
            .send()
            .await?;
        let (status, body) = read_body(response).await?;
        decode_submission(status, &body)
    }

    async fn login(
        &self,
        roll_number: &str,
        password: &str,
    ) -> Result<StudentCredential, ApiError> {
        let url = self.config.endpoint(LOGIN_PATH);
        let response = self
            .client
            .post(url)
            .json(&LoginRequest {
                roll_number,
                password,
            })
            .send()
            .await?;
        let (status, body) = read_body(response).await?;
        decode_credential(status, &body)
    }

    async fn fetch_review(&self, token: &str) -> Result<ReviewReport, ApiError> {
        let url = self.config.endpoint(REVIEW_PATH);
        let response = self.client.get(url).bearer_auth(token).send().await?;
        let (status, body) = read_body(response).await?;
        decode_review(status, &body)
    }
}
