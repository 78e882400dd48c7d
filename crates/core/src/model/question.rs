use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::ids::QuestionId;

//
// ─── LANGUAGE ──────────────────────────────────────────────────────────────────
//

/// Display language for question text and options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Hindi,
}

impl Language {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLanguageError(String);

impl fmt::Display for ParseLanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown language: {} (expected en or hi)", self.0)
    }
}

impl std::error::Error for ParseLanguageError {}

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "hi" | "hindi" => Ok(Language::Hindi),
            _ => Err(ParseLanguageError(s.to_string())),
        }
    }
}

//
// ─── WIRE SHAPE ────────────────────────────────────────────────────────────────
//

/// Question exactly as the question endpoint returns it.
///
/// Every field is optional on the wire; `normalize` turns a draft into a
/// `Question` with a resolved correct-answer index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuestionDraft {
    #[serde(rename = "_id", alias = "id")]
    pub id: Option<QuestionId>,
    pub question_text: Option<String>,
    pub question_text_hi: Option<String>,
    pub options: Vec<String>,
    pub options_hi: Option<Vec<String>>,
    pub correct_answer: Option<String>,
    pub correct_answer_index: Option<i64>,
}

impl QuestionDraft {
    /// Resolve the correct answer to an option index.
    ///
    /// An explicit in-range index wins. Otherwise the option whose trimmed text
    /// equals the trimmed correct-answer text is used. Text matching is a
    /// best-effort fallback; when nothing matches the index stays `None`.
    #[must_use]
    pub fn normalize(self) -> Question {
        let explicit = self
            .correct_answer_index
            .and_then(|idx| usize::try_from(idx).ok())
            .filter(|idx| *idx < self.options.len());

        let correct_index = explicit.or_else(|| {
            let wanted = self.correct_answer.as_deref()?.trim();
            if wanted.is_empty() {
                return None;
            }
            self.options.iter().position(|opt| opt.trim() == wanted)
        });

        Question {
            id: self.id,
            text: self.question_text.unwrap_or_default(),
            text_hi: self.question_text_hi.filter(|t| !t.trim().is_empty()),
            options: self.options,
            options_hi: self.options_hi.filter(|opts| !opts.is_empty()),
            correct_index,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A loaded question with its correct answer resolved to an index.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    id: Option<QuestionId>,
    text: String,
    text_hi: Option<String>,
    options: Vec<String>,
    options_hi: Option<Vec<String>>,
    correct_index: Option<usize>,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> Option<&QuestionId> {
        self.id.as_ref()
    }

    /// Question text in the given language, falling back to English.
    #[must_use]
    pub fn text(&self, language: Language) -> &str {
        match language {
            Language::Hindi => self.text_hi.as_deref().unwrap_or(&self.text),
            Language::English => &self.text,
        }
    }

    /// Options in the given language, falling back to English when the Hindi
    /// list is missing.
    #[must_use]
    pub fn options(&self, language: Language) -> &[String] {
        match language {
            Language::Hindi => self.options_hi.as_deref().unwrap_or(&self.options),
            Language::English => &self.options,
        }
    }

    /// Number of selectable options (the English list is canonical).
    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Zero-based index of the correct option, or `None` when unscoreable locally.
    #[must_use]
    pub fn correct_index(&self) -> Option<usize> {
        self.correct_index
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(options: &[&str]) -> QuestionDraft {
        QuestionDraft {
            question_text: Some("What does CPU stand for?".into()),
            options: options.iter().map(|o| (*o).to_string()).collect(),
            ..QuestionDraft::default()
        }
    }

    #[test]
    fn explicit_index_is_kept() {
        let mut d = draft(&["a", "b", "c"]);
        d.correct_answer_index = Some(2);
        d.correct_answer = Some("a".into());
        assert_eq!(d.normalize().correct_index(), Some(2));
    }

    #[test]
    fn text_answer_resolves_by_trimmed_match() {
        let mut d = draft(&["Central Processing Unit ", "Control Unit"]);
        d.correct_answer = Some("  Central Processing Unit".into());
        assert_eq!(d.normalize().correct_index(), Some(0));
    }

    #[test]
    fn unmatched_text_leaves_index_empty() {
        let mut d = draft(&["x", "y"]);
        d.correct_answer = Some("z".into());
        assert_eq!(d.normalize().correct_index(), None);
        assert_eq!(draft(&["x"]).normalize().correct_index(), None);
    }

    #[test]
    fn out_of_range_index_falls_back_to_text() {
        let mut d = draft(&["x", "y"]);
        d.correct_answer_index = Some(7);
        d.correct_answer = Some("y".into());
        assert_eq!(d.normalize().correct_index(), Some(1));

        let mut negative = draft(&["x", "y"]);
        negative.correct_answer_index = Some(-1);
        assert_eq!(negative.normalize().correct_index(), None);
    }

    #[test]
    fn hindi_falls_back_to_english() {
        let q = draft(&["yes", "no"]).normalize();
        assert_eq!(q.text(Language::Hindi), "What does CPU stand for?");
        assert_eq!(q.options(Language::Hindi), ["yes", "no"]);

        let mut d = draft(&["yes", "no"]);
        d.question_text_hi = Some("सीपीयू क्या है?".into());
        d.options_hi = Some(vec!["हाँ".into(), "नहीं".into()]);
        let q = d.normalize();
        assert_eq!(q.text(Language::Hindi), "सीपीयू क्या है?");
        assert_eq!(q.options(Language::Hindi)[1], "नहीं");
        assert_eq!(q.options(Language::English)[1], "no");
    }

    #[test]
    fn empty_hindi_options_are_ignored() {
        let mut d = draft(&["yes"]);
        d.options_hi = Some(Vec::new());
        d.question_text_hi = Some("   ".into());
        let q = d.normalize();
        assert_eq!(q.options(Language::Hindi), ["yes"]);
        assert_eq!(q.text(Language::Hindi), "What does CPU stand for?");
    }

    #[test]
    fn draft_reads_wire_names() {
        let json = r#"{
            "_id": "q1",
            "questionText": "RAM is",
            "questionTextHi": "रैम है",
            "options": ["volatile", "permanent"],
            "optionsHi": ["अस्थिर", "स्थायी"],
            "correctAnswer": "volatile"
        }"#;
        let d: QuestionDraft = serde_json::from_str(json).unwrap();
        let q = d.normalize();
        assert_eq!(q.id().map(QuestionId::as_str), Some("q1"));
        assert_eq!(q.correct_index(), Some(0));
        assert_eq!(q.option_count(), 2);
    }

    #[test]
    fn language_parses_codes() {
        assert_eq!("hi".parse::<Language>().unwrap(), Language::Hindi);
        assert_eq!("EN".parse::<Language>().unwrap(), Language::English);
        assert!("fr".parse::<Language>().is_err());
    }
}
