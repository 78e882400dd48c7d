use quiz_core::model::{Language, ResultSummary};
use quiz_core::time::format_countdown;

use super::progress::{PaletteStatus, SessionProgress};
use super::service::{SessionPhase, TestSession};

/// One option line as presented to the student.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub index: usize,
    pub text: String,
    pub selected: bool,
}

/// Everything a presentation layer needs to draw the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    /// One-based question number.
    pub number: usize,
    pub total: usize,
    pub text: String,
    pub options: Vec<OptionView>,
    pub time_left: String,
    pub palette: Vec<PaletteStatus>,
    pub progress: SessionProgress,
    pub is_first: bool,
    pub is_last: bool,
    pub submitting: bool,
    pub last_error: Option<String>,
}

/// Read-only projection of a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionView {
    Loading,
    Failed { message: String },
    Empty,
    Question(QuestionView),
    Submitted(ResultSummary),
}

impl SessionView {
    /// Project `session` in `language`. Hindi falls back to English per question.
    #[must_use]
    pub fn build(session: &TestSession, language: Language) -> Self {
        match session.phase() {
            SessionPhase::Loading => return Self::Loading,
            SessionPhase::Failed => {
                let message = session
                    .load_error()
                    .map_or_else(|| "failed to load questions".to_string(), ToString::to_string);
                return Self::Failed { message };
            }
            SessionPhase::Submitted => {
                if let Some(summary) = session.result_summary() {
                    return Self::Submitted(summary);
                }
            }
            SessionPhase::Ready | SessionPhase::Submitting => {}
        }

        let Some(question) = session.current_question() else {
            return Self::Empty;
        };
        let current = session.current_index();
        let selected = session.answers().get(current);
        let total = session.questions().len();

        let options = question
            .options(language)
            .iter()
            .enumerate()
            .map(|(index, text)| OptionView {
                index,
                text: text.clone(),
                selected: selected == Some(index),
            })
            .collect();

        Self::Question(QuestionView {
            number: current + 1,
            total,
            text: question.text(language).to_string(),
            options,
            time_left: format_countdown(session.time_left()),
            palette: session.palette(),
            progress: session.progress(),
            is_first: current == 0,
            is_last: current + 1 >= total,
            submitting: session.phase() == SessionPhase::Submitting,
            last_error: session.last_error().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionDraft;

    fn session() -> TestSession {
        let mut session = TestSession::new(125);
        session.load_questions(vec![
            QuestionDraft {
                question_text: Some("Binary of 2?".into()),
                question_text_hi: Some("2 का बाइनरी?".into()),
                options: vec!["10".into(), "11".into()],
                options_hi: Some(vec!["दस".into(), "ग्यारह".into()]),
                ..QuestionDraft::default()
            }
            .normalize(),
            QuestionDraft {
                question_text: Some("ROM is".into()),
                options: vec!["read-only".into()],
                ..QuestionDraft::default()
            }
            .normalize(),
        ]);
        session
    }

    #[test]
    fn question_view_marks_selection_and_time() {
        let mut s = session();
        s.select_answer(0, 1).unwrap();
        let SessionView::Question(view) = SessionView::build(&s, Language::English) else {
            panic!("expected question view");
        };
        assert_eq!(view.number, 1);
        assert_eq!(view.total, 2);
        assert_eq!(view.time_left, "2:05");
        assert!(view.options[1].selected);
        assert!(!view.options[0].selected);
        assert!(view.is_first && !view.is_last);
    }

    #[test]
    fn hindi_view_falls_back_per_question() {
        let mut s = session();
        let SessionView::Question(view) = SessionView::build(&s, Language::Hindi) else {
            panic!("expected question view");
        };
        assert_eq!(view.text, "2 का बाइनरी?");
        assert_eq!(view.options[0].text, "दस");

        s.next();
        let SessionView::Question(view) = SessionView::build(&s, Language::Hindi) else {
            panic!("expected question view");
        };
        assert_eq!(view.text, "ROM is");
        assert!(view.is_last);
    }

    #[test]
    fn empty_and_loading_views() {
        let loading = TestSession::new(10);
        assert_eq!(SessionView::build(&loading, Language::English), SessionView::Loading);

        let mut empty = TestSession::new(10);
        empty.load_questions(Vec::new());
        assert_eq!(SessionView::build(&empty, Language::English), SessionView::Empty);
    }
}
