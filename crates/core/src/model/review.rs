use serde::{Deserialize, Serialize};

/// Per-question outcome returned by the review endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewItem {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: Option<String>,
    pub user_answer: Option<String>,
    pub is_correct: bool,
}

/// How an option is highlighted when reviewing an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Correct,
    WrongPick,
    Neutral,
}

impl ReviewItem {
    /// Marks each option: the correct one, the student's wrong pick, or neither.
    #[must_use]
    pub fn option_marks(&self) -> Vec<OptionMark> {
        self.options
            .iter()
            .map(|opt| {
                if self.correct_answer.as_deref() == Some(opt.as_str()) {
                    OptionMark::Correct
                } else if self.user_answer.as_deref() == Some(opt.as_str()) {
                    OptionMark::WrongPick
                } else {
                    OptionMark::Neutral
                }
            })
            .collect()
    }
}

/// Scored review of the student's submitted attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewReport {
    pub score: Option<u32>,
    pub total_questions: Option<u32>,
    pub percentage: Option<f64>,
    pub review: Vec<ReviewItem>,
}

impl ReviewReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.review.is_empty()
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.review.iter().filter(|item| item.is_correct).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_correct_and_wrong_pick() {
        let item = ReviewItem {
            question_text: "1 byte =".into(),
            options: vec!["4 bits".into(), "8 bits".into(), "16 bits".into()],
            correct_answer: Some("8 bits".into()),
            user_answer: Some("4 bits".into()),
            is_correct: false,
        };
        assert_eq!(
            item.option_marks(),
            vec![OptionMark::WrongPick, OptionMark::Correct, OptionMark::Neutral]
        );
    }

    #[test]
    fn report_tolerates_missing_fields() {
        let report: ReviewReport =
            serde_json::from_str(r#"{"review":[{"questionText":"q","isCorrect":true}]}"#).unwrap();
        assert_eq!(report.score, None);
        assert_eq!(report.correct_count(), 1);
        assert!(!report.is_empty());
    }
}
