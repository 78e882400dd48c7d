use chrono::{DateTime, Utc};
use std::fmt;

use quiz_core::model::{
    AnswerError, AnswerSet, PersistedSnapshot, Question, ResultSummary, SubmissionResult,
};

use super::progress::{PaletteStatus, SessionProgress};
use crate::error::{ApiError, SessionError};

//
// ─── PHASES ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of one test attempt.
///
/// `Loading → Ready ⇄ Submitting → Submitted`, or `Loading → Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Loading,
    Ready,
    Submitting,
    Submitted,
    Failed,
}

/// What a single countdown tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session is not running; nothing changed.
    Idle,
    /// One second elapsed; carries the remaining time.
    Counting(u32),
    /// The countdown hit zero and the automatic submission should start.
    /// Reported once per attempt.
    Expired,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory state of one test attempt.
///
/// Pure bookkeeping: no I/O happens here. `TestSessionService` wraps it with
/// the network calls and snapshot writes.
pub struct TestSession {
    phase: SessionPhase,
    questions: Vec<Question>,
    answers: AnswerSet,
    current: usize,
    time_left: u32,
    auto_submit_fired: bool,
    result: Option<SubmissionResult>,
    load_error: Option<ApiError>,
    last_error: Option<String>,
}

impl TestSession {
    /// A fresh attempt with no saved progress.
    #[must_use]
    pub fn new(time_budget: u32) -> Self {
        Self {
            phase: SessionPhase::Loading,
            questions: Vec::new(),
            answers: AnswerSet::default(),
            current: 0,
            time_left: time_budget,
            auto_submit_fired: false,
            result: None,
            load_error: None,
            last_error: None,
        }
    }

    /// Resume from a snapshot.
    ///
    /// A submitted snapshot yields a terminal session that never shows
    /// questions again. Otherwise answers, pointer and remaining time are
    /// adopted and the session waits for its questions.
    #[must_use]
    pub fn resume(snapshot: Option<PersistedSnapshot>, time_budget: u32) -> Self {
        let mut session = Self::new(time_budget);
        let Some(snapshot) = snapshot else {
            return session;
        };

        session.answers = snapshot.answers.clone();
        if snapshot.submitted {
            session.phase = SessionPhase::Submitted;
            session.result = Some(snapshot.result());
            return session;
        }
        session.current = snapshot.current;
        session.time_left = snapshot.time_left;
        session
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    #[must_use]
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// The error that stopped question loading.
    #[must_use]
    pub fn load_error(&self) -> Option<&ApiError> {
        self.load_error.as_ref()
    }

    /// Most recent submission failure, cleared by a successful submit.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Countdown and autosave run only in these phases.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.phase, SessionPhase::Ready | SessionPhase::Submitting)
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.phase == SessionPhase::Submitted
    }

    /// Summary for the terminal view; `None` until submitted.
    #[must_use]
    pub fn result_summary(&self) -> Option<ResultSummary> {
        let result = self.result.as_ref()?;
        Some(ResultSummary::new(result, self.answers.len()))
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let answered = self.answers.answered_count();
        SessionProgress {
            total,
            answered,
            unanswered: total.saturating_sub(answered),
            current: self.current,
        }
    }

    /// Per-question status for the navigation palette.
    #[must_use]
    pub fn palette(&self) -> Vec<PaletteStatus> {
        (0..self.questions.len())
            .map(|idx| {
                if idx == self.current {
                    PaletteStatus::Current
                } else if self.answers.is_answered(idx) {
                    PaletteStatus::Answered
                } else {
                    PaletteStatus::Unanswered
                }
            })
            .collect()
    }

    /// Install the fetched questions and move to `Ready`.
    ///
    /// The answer set is resized to the question count, keeping restored
    /// selections by position, and the pointer is clamped.
    pub fn load_questions(&mut self, questions: Vec<Question>) {
        if self.phase != SessionPhase::Loading {
            return;
        }
        self.answers.resize(questions.len());
        self.questions = questions;
        self.current = self.clamp(self.current);
        self.phase = SessionPhase::Ready;
    }

    /// Record a fatal load failure. No partial question set is kept.
    pub fn fail_load(&mut self, error: ApiError) {
        if self.phase != SessionPhase::Loading {
            return;
        }
        self.questions.clear();
        self.load_error = Some(error);
        self.phase = SessionPhase::Failed;
    }

    /// Record `option` for `question`, replacing any earlier choice.
    ///
    /// Silently ignored once submitted.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotReady` before questions are loaded and
    /// `SessionError::Answer` for an out-of-range question or option.
    pub fn select_answer(&mut self, question: usize, option: usize) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Submitted => return Ok(()),
            SessionPhase::Loading | SessionPhase::Failed => return Err(SessionError::NotReady),
            SessionPhase::Ready | SessionPhase::Submitting => {}
        }

        let len = self.questions.len();
        let q = self
            .questions
            .get(question)
            .ok_or(AnswerError::QuestionOutOfRange {
                index: question,
                len,
            })?;
        if option >= q.option_count() {
            return Err(AnswerError::OptionOutOfRange {
                question,
                option,
                len: q.option_count(),
            }
            .into());
        }
        self.answers.select(question, option)?;
        Ok(())
    }

    /// Move the pointer to `target`, clamped to the question range.
    pub fn navigate(&mut self, target: usize) {
        if self.is_running() {
            self.current = self.clamp(target);
        }
    }

    pub fn next(&mut self) {
        self.navigate(self.current.saturating_add(1));
    }

    pub fn previous(&mut self) {
        self.navigate(self.current.saturating_sub(1));
    }

    /// Advance the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Idle;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            if self.auto_submit_fired {
                return TickOutcome::Idle;
            }
            self.auto_submit_fired = true;
            return TickOutcome::Expired;
        }
        TickOutcome::Counting(self.time_left)
    }

    /// Claim the single submission slot and return the answers to send.
    ///
    /// # Errors
    ///
    /// `AlreadySubmitted` after success, `SubmitInFlight` while another
    /// submission is outstanding, `NotReady` before questions load.
    pub fn begin_submit(&mut self) -> Result<AnswerSet, SessionError> {
        self.ensure_submittable()?;
        self.phase = SessionPhase::Submitting;
        Ok(self.answers.clone())
    }

    /// Checks that `begin_submit` would succeed without claiming the slot.
    ///
    /// # Errors
    ///
    /// Same as `begin_submit`.
    pub fn ensure_submittable(&self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Ready => Ok(()),
            SessionPhase::Submitting => Err(SessionError::SubmitInFlight),
            SessionPhase::Submitted => Err(SessionError::AlreadySubmitted),
            SessionPhase::Loading | SessionPhase::Failed => Err(SessionError::NotReady),
        }
    }

    /// The server accepted the submission. Terminal.
    pub fn complete_submit(&mut self, result: SubmissionResult) {
        if self.phase != SessionPhase::Submitting {
            return;
        }
        self.result = Some(result);
        self.last_error = None;
        self.phase = SessionPhase::Submitted;
    }

    /// The submission failed; answers stay and another attempt is allowed.
    ///
    /// The countdown is not reset.
    pub fn fail_submit(&mut self, message: impl Into<String>) {
        if self.phase == SessionPhase::Submitting {
            self.phase = SessionPhase::Ready;
        }
        self.last_error = Some(message.into());
    }

    /// Capture the resumable state.
    #[must_use]
    pub fn snapshot(&self, saved_at: DateTime<Utc>) -> PersistedSnapshot {
        let mut snapshot = PersistedSnapshot {
            answers: self.answers.clone(),
            current: self.current,
            time_left: self.time_left,
            submitted: self.is_submitted(),
            saved_at: Some(saved_at),
            ..PersistedSnapshot::default()
        };
        if let Some(result) = &self.result {
            snapshot.set_result(result);
        }
        snapshot
    }

    fn clamp(&self, target: usize) -> usize {
        target.min(self.questions.len().saturating_sub(1))
    }
}

impl fmt::Debug for TestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSession")
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("answered", &self.answers.answered_count())
            .field("current", &self.current)
            .field("time_left", &self.time_left)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
