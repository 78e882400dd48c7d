use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::answers::AnswerSet;
use crate::model::lenient;
use crate::model::result::SubmissionResult;

/// Default countdown for one attempt (30 minutes).
pub const DEFAULT_TIME_BUDGET_SECS: u32 = 1800;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("snapshot is not a JSON object")]
    NotAnObject,
}

/// Resumable copy of a test attempt.
///
/// Written to the local store on every change and on a timer. It is only a
/// resume aid; the server's submission response is authoritative for scoring.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub answers: AnswerSet,
    pub current: usize,
    pub time_left: u32,
    pub submitted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Default for PersistedSnapshot {
    fn default() -> Self {
        Self {
            answers: AnswerSet::default(),
            current: 0,
            time_left: DEFAULT_TIME_BUDGET_SECS,
            submitted: false,
            score: None,
            total_questions: None,
            percentage: None,
            saved_at: None,
        }
    }
}

impl PersistedSnapshot {
    /// Server result recorded with the final snapshot, if any.
    #[must_use]
    pub fn result(&self) -> SubmissionResult {
        SubmissionResult {
            score: self.score,
            total_questions: self.total_questions,
            percentage: self.percentage,
        }
    }

    pub fn set_result(&mut self, result: &SubmissionResult) {
        self.score = result.score;
        self.total_questions = result.total_questions;
        self.percentage = result.percentage;
    }

    /// Serialize to the JSON text kept in the local store.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::InvalidJson` if serialization fails.
    pub fn encode(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|err| SnapshotError::InvalidJson(err.to_string()))
    }

    /// Parse stored JSON text, falling back to defaults field by field.
    ///
    /// A field that is missing or has the wrong shape takes its default, so a
    /// partially damaged snapshot still restores whatever is readable. `time_left`
    /// uses `default_time_left` when it cannot be read.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the text is not JSON or not a JSON object.
    pub fn decode(raw: &str, default_time_left: u32) -> Result<Self, SnapshotError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|err| SnapshotError::InvalidJson(err.to_string()))?;
        if !value.is_object() {
            return Err(SnapshotError::NotAnObject);
        }
        let stored: StoredSnapshot = serde_json::from_value(value)
            .map_err(|err| SnapshotError::InvalidJson(err.to_string()))?;

        Ok(Self {
            answers: stored.answers,
            current: stored.current.unwrap_or(0),
            time_left: stored.time_left.unwrap_or(default_time_left),
            submitted: stored.submitted,
            score: stored.score,
            total_questions: stored.total_questions,
            percentage: stored.percentage,
            saved_at: stored.saved_at,
        })
    }
}

/// Stored layout. Every field falls back on its own.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSnapshot {
    #[serde(default, deserialize_with = "answers_or_empty")]
    answers: AnswerSet,
    #[serde(default, deserialize_with = "lenient::opt_usize")]
    current: Option<usize>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    time_left: Option<u32>,
    #[serde(default, deserialize_with = "lenient::bool_or_false")]
    submitted: bool,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    score: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    total_questions: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_timestamp")]
    saved_at: Option<DateTime<Utc>>,
}

// One unreadable slot discards the whole list.
fn answers_or_empty<'de, D: Deserializer<'de>>(de: D) -> Result<AnswerSet, D::Error> {
    let Value::Array(items) = Value::deserialize(de)? else {
        return Ok(AnswerSet::default());
    };
    let slots: Option<Vec<Option<usize>>> = items
        .iter()
        .map(|item| match item {
            Value::Null => Some(None),
            other => usize::try_from(other.as_u64()?).ok().map(Some),
        })
        .collect();
    Ok(slots.map(AnswerSet::from_slots).unwrap_or_default())
}
