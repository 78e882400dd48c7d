#![forbid(unsafe_code)]

pub mod api;
pub mod auth_service;
pub mod error;
pub mod review_service;
pub mod sessions;

pub use quiz_core::Clock;

pub use api::{ApiConfig, HttpQuizApi, QuizApi};
pub use auth_service::AuthService;
pub use error::{ApiError, AuthError, ReviewServiceError, SessionError};
pub use review_service::ReviewService;

pub use sessions::{
    SessionCommand, SessionEvent, SessionPhase, SessionRunner, SessionView, TestSession,
    TestSessionService,
};
