use std::sync::Arc;

use quiz_core::model::ReviewReport;
use storage::repository::{CREDENTIAL_KEY, CredentialRepository};

use crate::api::QuizApi;
use crate::auth_service::load_usable_credential;
use crate::error::ReviewServiceError;

/// Fetches the scored review of the student's submitted test.
#[derive(Clone)]
pub struct ReviewService {
    api: Arc<dyn QuizApi>,
    credentials: Arc<dyn CredentialRepository>,
    key: String,
}

impl ReviewService {
    #[must_use]
    pub fn new(api: Arc<dyn QuizApi>, credentials: Arc<dyn CredentialRepository>) -> Self {
        Self {
            api,
            credentials,
            key: CREDENTIAL_KEY.to_string(),
        }
    }

    /// # Errors
    ///
    /// Returns `ReviewServiceError::Unauthenticated` without a stored
    /// credential, `ReviewServiceError::Api` for transport, HTML or rejected
    /// responses, and `ReviewServiceError::Storage` if the store is unreadable.
    pub async fn fetch_review(&self) -> Result<ReviewReport, ReviewServiceError> {
        let credential = load_usable_credential(self.credentials.as_ref(), &self.key)
            .await?
            .ok_or(ReviewServiceError::Unauthenticated)?;
        let report = self.api.fetch_review(&credential.token).await?;
        tracing::debug!(items = report.review.len(), "review loaded");
        Ok(report)
    }
}
