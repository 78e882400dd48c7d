use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::lenient;

/// Score fields the submit endpoint may return. Every field is optional and
/// a field of the wrong type reads as missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub score: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub total_questions: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub percentage: Option<f64>,
}

/// What the terminal view shows after a submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultSummary {
    pub total_questions: u32,
    pub score: Option<u32>,
    pub percentage: Option<f64>,
}

impl ResultSummary {
    /// Builds the summary from the server result.
    ///
    /// `loaded_questions` stands in when the server omitted the total. A missing
    /// percentage is derived from the score when both are known.
    #[must_use]
    pub fn new(result: &SubmissionResult, loaded_questions: usize) -> Self {
        let total_questions = result
            .total_questions
            .unwrap_or_else(|| u32::try_from(loaded_questions).unwrap_or(u32::MAX));
        let percentage = result.percentage.or_else(|| {
            let score = result.score?;
            if total_questions == 0 {
                return None;
            }
            Some((f64::from(score) / f64::from(total_questions) * 100.0).round())
        });
        Self {
            total_questions,
            score: result.score,
            percentage,
        }
    }

    #[must_use]
    pub fn score_label(&self) -> String {
        self.score
            .map_or_else(|| UNKNOWN.to_string(), |score| score.to_string())
    }

    #[must_use]
    pub fn percentage_label(&self) -> String {
        self.percentage
            .map_or_else(|| UNKNOWN.to_string(), |pct| format!("{pct}%"))
    }
}

const UNKNOWN: &str = "unknown";

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total Questions: {}, Score: {}, Percentage: {}",
            self.total_questions,
            self.score_label(),
            self.percentage_label()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_render_unknown() {
        let summary = ResultSummary::new(&SubmissionResult::default(), 5);
        assert_eq!(summary.total_questions, 5);
        assert_eq!(summary.score_label(), "unknown");
        assert_eq!(summary.percentage_label(), "unknown");
    }

    #[test]
    fn percentage_is_derived_from_score() {
        let result = SubmissionResult {
            score: Some(2),
            total_questions: Some(3),
            percentage: None,
        };
        let summary = ResultSummary::new(&result, 10);
        assert_eq!(summary.total_questions, 3);
        assert_eq!(summary.percentage, Some(67.0));
        assert_eq!(
            summary.to_string(),
            "Total Questions: 3, Score: 2, Percentage: 67%"
        );
    }

    #[test]
    fn server_percentage_wins() {
        let result = SubmissionResult {
            score: Some(1),
            total_questions: Some(4),
            percentage: Some(12.5),
        };
        assert_eq!(ResultSummary::new(&result, 4).percentage_label(), "12.5%");
    }

    #[test]
    fn zero_total_has_no_percentage() {
        let result = SubmissionResult {
            score: Some(0),
            ..SubmissionResult::default()
        };
        assert_eq!(ResultSummary::new(&result, 0).percentage, None);
    }
}
