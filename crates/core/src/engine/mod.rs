//! Timed exam session engine.

mod attempt;
mod completion;
mod session;

pub use attempt::{AttemptResult, AttemptStatus, SubmitPrompt};
pub use completion::{ChannelSink, CompletionSink, DeliveryError};
pub use session::{
    CancelOutcome, EngineError, Navigation, SessionEngine, SubmitOutcome, TickOutcome,
};
