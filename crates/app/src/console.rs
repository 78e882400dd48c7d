use std::fmt::Write as _;

use quiz_core::model::{OptionMark, ResultSummary, ReviewReport};
use services::sessions::{PaletteStatus, QuestionView, SessionCommand, SessionView};

pub const TEST_HELP: &str = "\
Commands while the test is running:
  1-9          choose that option for the current question
  n, next      next question
  p, prev      previous question
  g <number>   jump to question <number>
  s, submit    submit the test
  q, quit      leave (progress is saved)
  h, help      show this help";

/// What one line of terminal input asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Command(SessionCommand),
    Help,
    Blank,
    Unknown,
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Blank;
    }
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or_default().to_ascii_lowercase();
    let arg = parts.next();

    let command = match (head.as_str(), arg) {
        ("n" | "next", None) => SessionCommand::Next,
        ("p" | "prev" | "previous", None) => SessionCommand::Previous,
        ("s" | "submit", None) => SessionCommand::Submit,
        ("q" | "quit" | "exit", None) => SessionCommand::Quit,
        ("h" | "help" | "?", None) => return Input::Help,
        ("g" | "go" | "goto", Some(target)) => match one_based(target) {
            Some(index) => SessionCommand::Navigate(index),
            None => return Input::Unknown,
        },
        (number, None) => match one_based(number) {
            Some(option) => SessionCommand::Answer(option),
            None => return Input::Unknown,
        },
        _ => return Input::Unknown,
    };
    Input::Command(command)
}

fn one_based(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok()?.checked_sub(1)
}

/// Decides which session views are worth printing.
///
/// The runner publishes a view every second; only the countdown changes then,
/// so those are folded into a minute-by-minute reminder.
#[derive(Default)]
pub struct Screen {
    last: Option<QuestionView>,
}

impl Screen {
    pub fn render(&mut self, view: &SessionView) -> Option<String> {
        match view {
            SessionView::Loading => Some("Loading questions...".into()),
            SessionView::Failed { message } => Some(format!("Could not load the test: {message}")),
            SessionView::Empty => Some(
                "No questions are available. Type `s` to submit or `q` to leave.".into(),
            ),
            SessionView::Submitted(summary) => Some(render_summary(summary)),
            SessionView::Question(question) => self.render_question(question),
        }
    }

    fn render_question(&mut self, view: &QuestionView) -> Option<String> {
        let changed = self.last.as_ref().is_none_or(|last| {
            let mut last = last.clone();
            last.time_left.clone_from(&view.time_left);
            last != *view
        });
        self.last = Some(view.clone());
        if changed {
            return Some(render_question(view));
        }
        view.time_left
            .ends_with(":00")
            .then(|| format!("Time left: {}", view.time_left))
    }
}

pub fn render_question(view: &QuestionView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nQuestion {} of {}    Time left: {}",
        view.number, view.total, view.time_left
    );
    let _ = writeln!(out, "{}", view.text);
    for option in &view.options {
        let marker = if option.selected { "x" } else { " " };
        let _ = writeln!(out, "  [{marker}] {}. {}", option.index + 1, option.text);
    }

    let palette: Vec<String> = view
        .palette
        .iter()
        .enumerate()
        .map(|(idx, status)| match status {
            PaletteStatus::Current => format!("({})", idx + 1),
            PaletteStatus::Answered => format!("{}*", idx + 1),
            PaletteStatus::Unanswered => (idx + 1).to_string(),
        })
        .collect();
    let _ = writeln!(out, "Palette: {}", palette.join(" "));
    let _ = writeln!(out, "Keys: {}", navigation_hint(view));
    let _ = write!(
        out,
        "Answered {} / {}, unanswered {}",
        view.progress.answered, view.progress.total, view.progress.unanswered
    );
    if view.submitting {
        out.push_str("\nSubmitting...");
    }
    if let Some(error) = &view.last_error {
        let _ = write!(out, "\nLast submission failed: {error}");
    }
    out
}

fn navigation_hint(view: &QuestionView) -> &'static str {
    match (view.is_first, view.is_last) {
        (true, true) => "s submit, h help",
        (true, false) => "n next, s submit, h help",
        (false, true) => "p prev, s submit, h help",
        (false, false) => "p prev, n next, s submit, h help",
    }
}

pub fn render_summary(summary: &ResultSummary) -> String {
    format!(
        "Test submitted.\nTotal Questions: {}\nScore: {}\nPercentage: {}",
        summary.total_questions,
        summary.score_label(),
        summary.percentage_label()
    )
}

pub fn render_review(report: &ReviewReport) -> String {
    let mut out = String::new();
    let label = |value: Option<String>| value.unwrap_or_else(|| "unknown".into());
    let _ = writeln!(
        out,
        "Score: {} / {} ({})",
        label(report.score.map(|s| s.to_string())),
        label(report.total_questions.map(|t| t.to_string())),
        label(report.percentage.map(|p| format!("{p}%")))
    );
    if report.is_empty() {
        out.push_str("No answers to review yet.");
        return out;
    }
    for (idx, item) in report.review.iter().enumerate() {
        let verdict = if item.is_correct { "correct" } else { "wrong" };
        let _ = writeln!(out, "\n{}. {} [{verdict}]", idx + 1, item.question_text);
        for (option, mark) in item.options.iter().zip(item.option_marks()) {
            let tag = match mark {
                OptionMark::Correct => "+",
                OptionMark::WrongPick => "-",
                OptionMark::Neutral => " ",
            };
            let _ = writeln!(out, "  {tag} {option}");
        }
    }
    out
}
