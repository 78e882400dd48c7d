use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnswerError {
    #[error("question {index} is out of range (have {len})")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("option {option} is out of range for question {question} (have {len})")]
    OptionOutOfRange {
        question: usize,
        option: usize,
        len: usize,
    },
}

/// One slot per question: `None` is unanswered, `Some(k)` is option `k`.
///
/// Serializes as a plain JSON array such as `[1, null, 0]`, which is both the
/// snapshot format and the submission payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(Vec<Option<usize>>);

impl AnswerSet {
    /// Creates `len` unanswered slots.
    #[must_use]
    pub fn unanswered(len: usize) -> Self {
        Self(vec![None; len])
    }

    #[must_use]
    pub fn from_slots(slots: Vec<Option<usize>>) -> Self {
        Self(slots)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resize to `len`, keeping earlier selections by position and padding
    /// with unanswered slots.
    pub fn resize(&mut self, len: usize) {
        self.0.resize(len, None);
    }

    #[must_use]
    pub fn get(&self, question: usize) -> Option<usize> {
        self.0.get(question).copied().flatten()
    }

    /// Records `option` for `question`, replacing any earlier pick.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::QuestionOutOfRange` if `question` has no slot.
    pub fn select(&mut self, question: usize, option: usize) -> Result<(), AnswerError> {
        let len = self.0.len();
        let slot = self
            .0
            .get_mut(question)
            .ok_or(AnswerError::QuestionOutOfRange {
                index: question,
                len,
            })?;
        *slot = Some(option);
        Ok(())
    }

    #[must_use]
    pub fn is_answered(&self, question: usize) -> bool {
        self.get(question).is_some()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.0.iter().filter(|slot| slot.is_some()).count()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Option<usize>] {
        &self.0
    }
}
