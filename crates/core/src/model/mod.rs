mod answers;
mod credential;
mod ids;
mod lenient;
mod question;
mod result;
mod review;
mod snapshot;

pub use answers::{AnswerError, AnswerSet};
pub use credential::{StudentCredential, StudentProfile};
pub use ids::QuestionId;
pub use question::{Language, ParseLanguageError, Question, QuestionDraft};
pub use result::{ResultSummary, SubmissionResult};
pub use review::{OptionMark, ReviewItem, ReviewReport};
pub use snapshot::{DEFAULT_TIME_BUDGET_SECS, PersistedSnapshot, SnapshotError};
