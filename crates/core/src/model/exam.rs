use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::TestId;
use crate::model::question::Question;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TestError {
    #[error("test must contain at least one question")]
    NoQuestions,

    #[error("test duration must be > 0 minutes")]
    InvalidDuration,

    #[error("test title cannot be empty")]
    EmptyTitle,
}

/// How a test was assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestKind {
    Mock,
    #[serde(rename = "PYQ")]
    Pyq,
    Practice,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TestKind::Mock => "Mock",
            TestKind::Pyq => "PYQ",
            TestKind::Practice => "Practice",
        })
    }
}

/// An ordered, fixed set of questions plus a time budget.
///
/// The question order is the presentation order and never changes once the
/// test exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Test {
    id: TestId,
    title: String,
    duration_minutes: u32,
    questions: Vec<Question>,
    kind: TestKind,
}

impl Test {
    /// Create a test.
    ///
    /// # Errors
    ///
    /// Returns `TestError` if the title is blank, the duration is zero, or
    /// there are no questions.
    pub fn new(
        id: TestId,
        title: impl Into<String>,
        duration_minutes: u32,
        questions: Vec<Question>,
        kind: TestKind,
    ) -> Result<Self, TestError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(TestError::EmptyTitle);
        }
        if duration_minutes == 0 {
            return Err(TestError::InvalidDuration);
        }
        if questions.is_empty() {
            return Err(TestError::NoQuestions);
        }

        Ok(Self {
            id,
            title,
            duration_minutes,
            questions,
            kind,
        })
    }

    /// Wrap a single question; used for practice tests whose parts are fixed.
    pub(crate) fn single(
        id: TestId,
        title: String,
        duration_minutes: u32,
        question: Question,
        kind: TestKind,
    ) -> Self {
        debug_assert!(duration_minutes > 0);
        Self {
            id,
            title,
            duration_minutes,
            questions: vec![question],
            kind,
        }
    }

    #[must_use]
    pub fn id(&self) -> &TestId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false for a constructed test; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn kind(&self) -> TestKind {
        self.kind
    }
}
