use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{AttemptId, Question, Test, TestId};

/// Lifecycle of one attempt.
///
/// `Running -> Submitting -> Finished`, or `Running -> Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttemptStatus {
    Running,
    Submitting,
    Finished,
    Cancelled,
}

impl AttemptStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, AttemptStatus::Finished | AttemptStatus::Cancelled)
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AttemptStatus::Running => "running",
            AttemptStatus::Submitting => "submitting",
            AttemptStatus::Finished => "finished",
            AttemptStatus::Cancelled => "cancelled",
        })
    }
}

/// Final score of an attempt, delivered once to the completion sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptResult {
    pub attempt_id: AttemptId,
    pub test_id: TestId,
    pub score: u32,
    pub total: u32,
    pub answered: u32,
}

/// Answered-vs-total snapshot shown before the user confirms submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitPrompt {
    pub answered: usize,
    pub total: usize,
}

impl SubmitPrompt {
    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.total.saturating_sub(self.answered)
    }
}

/// Mutable state of one run through a test. Owned by exactly one engine.
#[derive(Debug)]
pub(crate) struct Attempt {
    pub(crate) id: AttemptId,
    pub(crate) test: Test,
    pub(crate) cursor: usize,
    pub(crate) answers: Vec<Option<usize>>,
    pub(crate) remaining_seconds: u32,
    pub(crate) status: AttemptStatus,
}

impl Attempt {
    pub(crate) fn new(test: Test) -> Self {
        let answers = vec![None; test.len()];
        let remaining_seconds = test.duration_seconds();
        Self {
            id: AttemptId::generate(),
            test,
            cursor: 0,
            answers,
            remaining_seconds,
            status: AttemptStatus::Running,
        }
    }

    pub(crate) fn current_question(&self) -> &Question {
        // cursor is kept within 0..len and tests are never empty
        &self.test.questions()[self.cursor]
    }

    pub(crate) fn last_index(&self) -> usize {
        self.test.len().saturating_sub(1)
    }

    pub(crate) fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub(crate) fn prompt(&self) -> SubmitPrompt {
        SubmitPrompt {
            answered: self.answered_count(),
            total: self.test.len(),
        }
    }

    /// Unanswered slots count as incorrect; the denominator is always the
    /// full question count.
    pub(crate) fn score(&self) -> AttemptResult {
        let score = self
            .test
            .questions()
            .iter()
            .zip(&self.answers)
            .filter(|(question, answer)| answer.is_some_and(|choice| question.is_correct(choice)))
            .count();

        AttemptResult {
            attempt_id: self.id,
            test_id: self.test.id().clone(),
            score: saturating_u32(score),
            total: saturating_u32(self.test.len()),
            answered: saturating_u32(self.answered_count()),
        }
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
