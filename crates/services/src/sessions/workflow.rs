use std::future::Future;
use std::sync::Arc;

use quiz_core::model::{
    AnswerSet, DEFAULT_TIME_BUDGET_SECS, PersistedSnapshot, ResultSummary, StudentCredential,
    SubmissionResult,
};
use storage::repository::{
    CREDENTIAL_KEY, CredentialRepository, SNAPSHOT_KEY, SnapshotRepository, StorageError,
};

use super::service::{TestSession, TickOutcome};
use crate::Clock;
use crate::api::QuizApi;
use crate::auth_service::load_usable_credential;
use crate::error::{ApiError, SessionError};

/// A claimed submission waiting to be sent.
///
/// Produced by `TestSessionService::prepare_submission`; the session is in
/// `Submitting` until the outcome is handed to `finish_submission`.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    token: String,
    answers: AnswerSet,
}

impl PendingSubmission {
    #[must_use]
    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    /// Send the answers. The returned future owns everything it needs, so a
    /// caller can keep serving other events while it is outstanding.
    pub fn send(
        self,
        api: Arc<dyn QuizApi>,
    ) -> impl Future<Output = Result<SubmissionResult, ApiError>> + Send + 'static {
        async move { api.submit_answers(&self.token, &self.answers).await }
    }
}

/// Orchestrates one test attempt: credential check, resume, question load,
/// autosave and the submission handshake.
#[derive(Clone)]
pub struct TestSessionService {
    clock: Clock,
    api: Arc<dyn QuizApi>,
    snapshots: Arc<dyn SnapshotRepository>,
    credentials: Arc<dyn CredentialRepository>,
    time_budget: u32,
}

impl TestSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        api: Arc<dyn QuizApi>,
        snapshots: Arc<dyn SnapshotRepository>,
        credentials: Arc<dyn CredentialRepository>,
    ) -> Self {
        Self {
            clock,
            api,
            snapshots,
            credentials,
            time_budget: DEFAULT_TIME_BUDGET_SECS,
        }
    }

    /// Countdown used when there is no saved progress.
    #[must_use]
    pub fn with_time_budget(mut self, seconds: u32) -> Self {
        self.time_budget = seconds;
        self
    }

    #[must_use]
    pub fn api(&self) -> Arc<dyn QuizApi> {
        Arc::clone(&self.api)
    }

    #[must_use]
    pub fn time_budget(&self) -> u32 {
        self.time_budget
    }

    /// Enter the test page.
    ///
    /// Requires a stored credential. A submitted snapshot short-circuits to the
    /// terminal state without touching the network; otherwise the questions are
    /// fetched. A load failure is kept on the returned session (`Failed` phase)
    /// rather than returned, so the caller can render it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unauthenticated` when no usable credential exists,
    /// or a storage error reading it.
    pub async fn start_session(&self) -> Result<TestSession, SessionError> {
        if self.credential().await?.is_none() {
            return Err(SessionError::Unauthenticated);
        }

        let snapshot = self.restore_snapshot().await;
        let mut session = TestSession::resume(snapshot, self.time_budget);
        if session.is_submitted() {
            tracing::info!("snapshot already submitted; showing summary");
            return Ok(session);
        }

        if let Err(err) = self.load_questions(&mut session).await {
            tracing::warn!(error = %err, "question load failed");
        }
        self.persist(&session).await;
        Ok(session)
    }

    /// Read the saved snapshot. Missing, unreadable or unavailable storage all
    /// yield `None`.
    pub async fn restore_snapshot(&self) -> Option<PersistedSnapshot> {
        match self
            .snapshots
            .load_snapshot(SNAPSHOT_KEY, self.time_budget)
            .await
        {
            Ok(snapshot) => snapshot,
            Err(StorageError::Serialization(reason)) => {
                tracing::warn!(%reason, "discarding corrupt test snapshot");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not read test snapshot");
                None
            }
        }
    }

    /// Fetch and install the question set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::LoadFailed` after moving the session to `Failed`.
    pub async fn load_questions(&self, session: &mut TestSession) -> Result<usize, SessionError> {
        match self.api.fetch_questions().await {
            Ok(questions) => {
                let count = questions.len();
                session.load_questions(questions);
                tracing::info!(count, "questions loaded");
                Ok(count)
            }
            Err(err) => {
                let message = err.to_string();
                session.fail_load(err);
                Err(SessionError::LoadFailed(message))
            }
        }
    }

    /// Write the current snapshot. Failures are logged and swallowed.
    pub async fn persist(&self, session: &TestSession) {
        let snapshot = session.snapshot(self.clock.now());
        if let Err(err) = self
            .snapshots
            .save_snapshot(SNAPSHOT_KEY, &snapshot)
            .await
        {
            tracing::warn!(error = %err, "autosave failed");
        }
    }

    /// Record an answer and autosave.
    ///
    /// # Errors
    ///
    /// Propagates `TestSession::select_answer` errors; nothing is saved then.
    pub async fn select_answer(
        &self,
        session: &mut TestSession,
        question: usize,
        option: usize,
    ) -> Result<(), SessionError> {
        session.select_answer(question, option)?;
        self.persist(session).await;
        Ok(())
    }

    /// Move the pointer and autosave.
    pub async fn navigate(&self, session: &mut TestSession, target: usize) {
        session.navigate(target);
        self.persist(session).await;
    }

    /// One countdown second, saved whenever it moved the clock.
    ///
    /// `Expired` is reported once per attempt; starting the automatic
    /// submission is left to the caller.
    pub async fn tick(&self, session: &mut TestSession) -> TickOutcome {
        let outcome = session.tick();
        if outcome != TickOutcome::Idle {
            self.persist(session).await;
        }
        outcome
    }

    /// Submit the answers once.
    ///
    /// Calling again after success is a no-op that returns the same summary.
    ///
    /// # Errors
    ///
    /// `SubmitInFlight` or `NotReady` when a submission cannot start,
    /// `Unauthenticated` when the credential is gone, or the API error that
    /// rejected the attempt. On failure the session stays retryable.
    pub async fn submit(&self, session: &mut TestSession) -> Result<ResultSummary, SessionError> {
        if let Some(summary) = session.result_summary() {
            return Ok(summary);
        }
        let pending = self.prepare_submission(session).await?;
        let outcome = pending.send(self.api()).await;
        self.finish_submission(session, outcome).await
    }

    /// Claim the submission slot and gather the payload.
    ///
    /// # Errors
    ///
    /// `AlreadySubmitted`, `SubmitInFlight`, `NotReady`, or `Unauthenticated`
    /// (recorded on the session as a retryable failure).
    pub async fn prepare_submission(
        &self,
        session: &mut TestSession,
    ) -> Result<PendingSubmission, SessionError> {
        session.ensure_submittable()?;
        let credential = match self.credential().await {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                session.fail_submit("session expired; please log in again");
                return Err(SessionError::Unauthenticated);
            }
            Err(err) => {
                session.fail_submit(err.to_string());
                return Err(err);
            }
        };
        let answers = session.begin_submit()?;
        Ok(PendingSubmission {
            token: credential.token,
            answers,
        })
    }

    /// Apply the server's verdict and write the final snapshot on success.
    ///
    /// # Errors
    ///
    /// Returns the API error after returning the session to `Ready`.
    pub async fn finish_submission(
        &self,
        session: &mut TestSession,
        outcome: Result<SubmissionResult, ApiError>,
    ) -> Result<ResultSummary, SessionError> {
        match outcome {
            Ok(result) => {
                session.complete_submit(result);
                self.persist(session).await;
                let summary = session
                    .result_summary()
                    .ok_or(SessionError::NotReady)?;
                tracing::info!(
                    score = ?summary.score,
                    total = summary.total_questions,
                    "test submitted"
                );
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!(error = %err, "submission failed");
                session.fail_submit(err.to_string());
                self.persist(session).await;
                Err(err.into())
            }
        }
    }

    async fn credential(&self) -> Result<Option<StudentCredential>, SessionError> {
        Ok(load_usable_credential(self.credentials.as_ref(), CREDENTIAL_KEY).await?)
    }
}
