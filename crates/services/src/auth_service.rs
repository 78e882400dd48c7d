use std::sync::Arc;

use quiz_core::model::StudentCredential;
use storage::repository::{CREDENTIAL_KEY, CredentialRepository, StorageError};

use crate::api::QuizApi;
use crate::error::AuthError;

/// Read the stored credential, treating unreadable or blank-token entries as
/// signed out.
pub(crate) async fn load_usable_credential(
    credentials: &dyn CredentialRepository,
    key: &str,
) -> Result<Option<StudentCredential>, StorageError> {
    match credentials.load_credential(key).await {
        Ok(credential) => Ok(credential.filter(StudentCredential::is_usable)),
        Err(StorageError::Serialization(reason)) => {
            tracing::warn!(%reason, "ignoring unreadable credential");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Signs the student in and out.
///
/// The credential lives in the local store; nothing else is cleared on
/// logout, so an unfinished test can be resumed after signing in again.
#[derive(Clone)]
pub struct AuthService {
    api: Arc<dyn QuizApi>,
    credentials: Arc<dyn CredentialRepository>,
    key: String,
}

impl AuthService {
    #[must_use]
    pub fn new(api: Arc<dyn QuizApi>, credentials: Arc<dyn CredentialRepository>) -> Self {
        Self {
            api,
            credentials,
            key: CREDENTIAL_KEY.to_string(),
        }
    }

    /// Exchange a roll number and password for a credential and store it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` for blank input, `AuthError::Api`
    /// when the server rejects the login (carrying its message), or
    /// `AuthError::Storage` if the credential cannot be saved.
    pub async fn login(
        &self,
        roll_number: &str,
        password: &str,
    ) -> Result<StudentCredential, AuthError> {
        let roll_number = roll_number.trim();
        if roll_number.is_empty() {
            return Err(AuthError::MissingField("roll number"));
        }
        if password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        let credential = self.api.login(roll_number, password).await?;
        self.credentials
            .save_credential(&self.key, &credential)
            .await?;
        tracing::info!(roll_number, "signed in");
        Ok(credential)
    }

    /// Forget the stored credential.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store cannot be written.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.credentials.clear_credential(&self.key).await?;
        tracing::info!("signed out");
        Ok(())
    }

    /// The signed-in student, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the store cannot be read.
    pub async fn current(&self) -> Result<Option<StudentCredential>, AuthError> {
        Ok(load_usable_credential(self.credentials.as_ref(), &self.key).await?)
    }
}
