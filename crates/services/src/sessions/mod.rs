mod progress;
mod runner;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::{PaletteStatus, SessionProgress};
pub use runner::{AUTOSAVE_PERIOD, SessionCommand, SessionEvent, SessionRunner, TICK_PERIOD};
pub use service::{SessionPhase, TestSession, TickOutcome};
pub use view::{OptionView, QuestionView, SessionView};
pub use workflow::{PendingSubmission, TestSessionService};
