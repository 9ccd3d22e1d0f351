mod exam;
mod ids;
mod paper;
mod question;
mod stats;
mod user;

pub use ids::{AttemptId, ParseIdError, QuestionId, TestId};

pub use exam::{Test, TestError, TestKind};
pub use paper::{DEFAULT_SLOT, DEFAULT_YEAR, PaperDescriptor, PaperKey};
pub use question::{Category, Question, QuestionDraft, QuestionError, UnknownCategory};
pub use stats::{HistoryEntry, UserStats};
pub use user::{Email, EmailError, UserRecord};
