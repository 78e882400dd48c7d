//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::AnswerError;
use storage::repository::StorageError;

/// Errors emitted by the quiz REST client.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("invalid API base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    /// The body was HTML or otherwise not the JSON the endpoint promises.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The server answered with a non-success status; `message` is its own text.
    #[error("{message}")]
    Rejected {
        status: reqwest::StatusCode,
        message: String,
    },
}

impl ApiError {
    #[must_use]
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, ApiError::InvalidResponse(_))
    }
}

/// Errors emitted by the test session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("please log in first to attempt the test")]
    Unauthenticated,
    #[error("questions are not loaded")]
    NotReady,
    #[error("test already submitted")]
    AlreadySubmitted,
    #[error("a submission is already in progress")]
    SubmitInFlight,
    #[error("failed to load questions: {0}")]
    LoadFailed(String),
    #[error(transparent)]
    Answer(#[from] AnswerError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AuthService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ReviewService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReviewServiceError {
    #[error("please log in first to view your test review")]
    Unauthenticated,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
