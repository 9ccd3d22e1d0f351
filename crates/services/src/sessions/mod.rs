mod events;
mod host;

pub use events::{SessionInput, SessionUpdate, SubmitReason};
pub use host::{ActiveSession, CompletionSummary, HostConfig, HostOutcome, SessionHost};
