/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub unanswered: usize,
    /// Zero-based pointer to the question on screen.
    pub current: usize,
}

/// Colour of a question number in the navigation palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteStatus {
    Current,
    Answered,
    Unanswered,
}
