use prep_core::engine::{EngineError, SubmitPrompt};

/// User intent delivered to a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    SelectAnswer(usize),
    ClearAnswer,
    Next,
    Previous,
    GoTo(usize),
    /// Ask for the answered/unanswered prompt without submitting.
    RequestSubmit,
    /// The user confirmed the prompt; submit now.
    ConfirmSubmit,
    Cancel,
}

/// Why an attempt went to scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitReason {
    Manual,
    TimeUp,
}

/// Progress published while a session runs. Delivery is best-effort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionUpdate {
    Tick { remaining_seconds: u32 },
    Moved { index: usize },
    AnswerRecorded { index: usize, option: usize },
    AnswerCleared { index: usize },
    ConfirmSubmit(SubmitPrompt),
    Rejected(EngineError),
    Submitting(SubmitReason),
}
