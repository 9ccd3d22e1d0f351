use thiserror::Error;
use tracing::{debug, warn};

use super::attempt::{Attempt, AttemptResult, AttemptStatus, SubmitPrompt};
use super::completion::CompletionSink;
use crate::model::{AttemptId, Question, Test};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    #[error("option {index} is out of range for a question with {len} options")]
    InvalidArgument { index: usize, len: usize },

    #[error("attempt is {status}, not running")]
    NotRunning { status: AttemptStatus },

    #[error("attempt is {status}, no submission is pending")]
    NotSubmitting { status: AttemptStatus },

    #[error("no completion handler is available to receive the score")]
    MissingCompletionHandler,
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of a cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Cursor now points at this index.
    Moved(usize),
    /// Movement was clamped; cursor unchanged.
    Stayed(usize),
    /// `next()` on the last question: the caller should confirm submission.
    ConfirmSubmit(SubmitPrompt),
}

/// Result of a one-second tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Counting { remaining_seconds: u32 },
    /// The countdown hit zero and submission was triggered.
    Expired(AttemptResult),
    /// Attempt is no longer running; tick ignored.
    Idle,
}

/// Result of a submit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Scored and now waiting for `complete_submission`.
    Pending(AttemptResult),
    /// A submission was already requested or the attempt ended; nothing changed.
    Ignored,
}

/// Result of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    /// A submission is in flight and will still complete.
    SubmissionPending,
    /// Attempt already finished or cancelled.
    AlreadyClosed,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Owns exactly one attempt at one test.
///
/// A new test always needs a new engine: there is no way to swap the test
/// under an existing attempt. All operations are synchronous; the countdown
/// advances only when `tick()` is called, and the post-submit delay is the
/// caller's job (call `complete_submission()` once it has elapsed).
pub struct SessionEngine {
    attempt: Attempt,
    sink: Option<Box<dyn CompletionSink>>,
    pending: Option<AttemptResult>,
}

impl SessionEngine {
    /// Begin a fresh attempt at `test`: cursor 0, nothing answered, full time budget.
    #[must_use]
    pub fn start(test: Test) -> Self {
        let attempt = Attempt::new(test);
        debug!(
            attempt = %attempt.id,
            test = %attempt.test.id(),
            questions = attempt.test.len(),
            seconds = attempt.remaining_seconds,
            "attempt started"
        );
        Self {
            attempt,
            sink: None,
            pending: None,
        }
    }

    #[must_use]
    pub fn with_completion_sink(mut self, sink: impl CompletionSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Attach or replace the completion sink, e.g. to retry a failed delivery.
    pub fn set_completion_sink(&mut self, sink: impl CompletionSink + 'static) {
        self.sink = Some(Box::new(sink));
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt.id
    }

    #[must_use]
    pub fn test(&self) -> &Test {
        &self.attempt.test
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.attempt.status
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.attempt.cursor
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.attempt.remaining_seconds
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        self.attempt.current_question()
    }

    /// Chosen option for question `index`, if any.
    #[must_use]
    pub fn answer_at(&self, index: usize) -> Option<usize> {
        self.attempt.answers.get(index).copied().flatten()
    }

    #[must_use]
    pub fn answers(&self) -> &[Option<usize>] {
        &self.attempt.answers
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.attempt.answered_count()
    }

    /// Result computed at submission, available while submitting and after.
    #[must_use]
    pub fn result(&self) -> Option<&AttemptResult> {
        self.pending.as_ref()
    }

    /// Record `option` as the answer for the current question, replacing any
    /// earlier choice.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotRunning` after submission or cancellation and
    /// `EngineError::InvalidArgument` when `option` is not a valid option index.
    pub fn select_answer(&mut self, option: usize) -> Result<(), EngineError> {
        self.ensure_running()?;
        let len = self.attempt.current_question().option_count();
        if option >= len {
            return Err(EngineError::InvalidArgument { index: option, len });
        }
        let cursor = self.attempt.cursor;
        self.attempt.answers[cursor] = Some(option);
        Ok(())
    }

    /// Remove the answer for the current question.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotRunning` if the attempt is not running.
    pub fn clear_answer(&mut self) -> Result<(), EngineError> {
        self.ensure_running()?;
        let cursor = self.attempt.cursor;
        self.attempt.answers[cursor] = None;
        Ok(())
    }

    /// Jump to `index`, clamped to the last question.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotRunning` if the attempt is not running.
    pub fn go_to(&mut self, index: usize) -> Result<Navigation, EngineError> {
        self.ensure_running()?;
        let target = index.min(self.attempt.last_index());
        Ok(self.move_cursor(target))
    }

    /// Advance one question. On the last question this asks for submit confirmation instead.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotRunning` if the attempt is not running.
    pub fn next(&mut self) -> Result<Navigation, EngineError> {
        self.ensure_running()?;
        if self.attempt.cursor >= self.attempt.last_index() {
            return Ok(Navigation::ConfirmSubmit(self.attempt.prompt()));
        }
        Ok(self.move_cursor(self.attempt.cursor + 1))
    }

    /// Step back one question; no-op at the first question.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotRunning` if the attempt is not running.
    pub fn previous(&mut self) -> Result<Navigation, EngineError> {
        self.ensure_running()?;
        let target = self.attempt.cursor.saturating_sub(1);
        Ok(self.move_cursor(target))
    }

    /// Count down one second. Reaching zero submits automatically.
    pub fn tick(&mut self) -> TickOutcome {
        if self.attempt.status != AttemptStatus::Running {
            return TickOutcome::Idle;
        }
        self.attempt.remaining_seconds = self.attempt.remaining_seconds.saturating_sub(1);
        if self.attempt.remaining_seconds > 0 {
            return TickOutcome::Counting {
                remaining_seconds: self.attempt.remaining_seconds,
            };
        }

        debug!(attempt = %self.attempt.id, "time expired, submitting");
        match self.submit() {
            SubmitOutcome::Pending(result) => TickOutcome::Expired(result),
            SubmitOutcome::Ignored => TickOutcome::Idle,
        }
    }

    /// Answered-vs-total snapshot for a confirmation step. Changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotRunning` if the attempt is not running.
    pub fn request_submit(&self) -> Result<SubmitPrompt, EngineError> {
        self.ensure_running()?;
        Ok(self.attempt.prompt())
    }

    /// Score the attempt and move to `Submitting`.
    ///
    /// Only the first call while running has an effect; later calls (manual
    /// or from the countdown) return `SubmitOutcome::Ignored`.
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.attempt.status != AttemptStatus::Running {
            debug!(attempt = %self.attempt.id, status = %self.attempt.status, "duplicate submit ignored");
            return SubmitOutcome::Ignored;
        }
        let result = self.attempt.score();
        self.attempt.status = AttemptStatus::Submitting;
        self.pending = Some(result.clone());
        debug!(
            attempt = %self.attempt.id,
            score = result.score,
            total = result.total,
            "attempt submitting"
        );
        SubmitOutcome::Pending(result)
    }

    /// Deliver the score and move to `Finished`.
    ///
    /// Called once the post-submit delay has elapsed. If no sink is attached
    /// or delivery fails the attempt stays in `Submitting` so the score is not
    /// lost; attach a sink and call again.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NotSubmitting` unless the attempt is submitting and
    /// `EngineError::MissingCompletionHandler` if the score could not be delivered.
    pub fn complete_submission(&mut self) -> Result<AttemptResult, EngineError> {
        let status = self.attempt.status;
        let Some(result) = self.pending.clone().filter(|_| status == AttemptStatus::Submitting)
        else {
            return Err(EngineError::NotSubmitting { status });
        };

        let Some(sink) = self.sink.as_mut() else {
            warn!(attempt = %self.attempt.id, "submission completed without a completion sink");
            return Err(EngineError::MissingCompletionHandler);
        };
        if let Err(err) = sink.deliver(&result) {
            warn!(attempt = %self.attempt.id, error = %err, "score delivery failed");
            return Err(EngineError::MissingCompletionHandler);
        }

        self.attempt.status = AttemptStatus::Finished;
        debug!(attempt = %self.attempt.id, "attempt finished");
        Ok(result)
    }

    /// Abandon a running attempt without scoring.
    ///
    /// A submission already in flight wins: the attempt stays in `Submitting`.
    pub fn cancel(&mut self) -> CancelOutcome {
        match self.attempt.status {
            AttemptStatus::Running => {
                self.attempt.status = AttemptStatus::Cancelled;
                debug!(attempt = %self.attempt.id, "attempt cancelled");
                CancelOutcome::Cancelled
            }
            AttemptStatus::Submitting => CancelOutcome::SubmissionPending,
            AttemptStatus::Finished | AttemptStatus::Cancelled => CancelOutcome::AlreadyClosed,
        }
    }

    fn ensure_running(&self) -> Result<(), EngineError> {
        match self.attempt.status {
            AttemptStatus::Running => Ok(()),
            status => Err(EngineError::NotRunning { status }),
        }
    }

    fn move_cursor(&mut self, target: usize) -> Navigation {
        if target == self.attempt.cursor {
            return Navigation::Stayed(target);
        }
        self.attempt.cursor = target;
        Navigation::Moved(target)
    }
}

impl std::fmt::Debug for SessionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("attempt", &self.attempt)
            .field("has_sink", &self.sink.is_some())
            .field("pending", &self.pending)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::completion::{ChannelSink, DeliveryError};
    use crate::model::{Category, QuestionDraft, QuestionId, TestId, TestKind};

    fn question(id: u64, correct: usize) -> Question {
        QuestionDraft {
            id: QuestionId::new(id),
            question: format!("Q{id}"),
            passage: None,
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer: correct,
            explanation: None,
            category: Category::Quant,
            is_premium: false,
            year: None,
            slot: None,
        }
        .validate()
        .unwrap()
    }

    fn test_with(minutes: u32, correct: &[usize]) -> Test {
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, c)| question(i as u64 + 1, *c))
            .collect();
        Test::new(TestId::new("t"), "Test", minutes, questions, TestKind::Mock).unwrap()
    }

    #[test]
    fn start_resets_everything() {
        let engine = SessionEngine::start(test_with(2, &[0, 1, 2]));
        assert_eq!(engine.status(), AttemptStatus::Running);
        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.remaining_seconds(), 120);
        assert_eq!(engine.answers(), &[None, None, None]);
    }

    #[test]
    fn latest_answer_wins() {
        let mut engine = SessionEngine::start(test_with(1, &[2]));
        engine.select_answer(0).unwrap();
        engine.select_answer(2).unwrap();
        assert_eq!(engine.answer_at(0), Some(2));
    }

    #[test]
    fn out_of_range_answer_is_rejected_without_change() {
        let mut engine = SessionEngine::start(test_with(1, &[2]));
        engine.select_answer(1).unwrap();
        let err = engine.select_answer(4).unwrap_err();
        assert_eq!(err, EngineError::InvalidArgument { index: 4, len: 4 });
        assert_eq!(engine.answer_at(0), Some(1));
    }

    #[test]
    fn navigation_is_clamped() {
        let mut engine = SessionEngine::start(test_with(1, &[0, 0, 0]));
        assert_eq!(engine.previous().unwrap(), Navigation::Stayed(0));
        assert_eq!(engine.next().unwrap(), Navigation::Moved(1));
        assert_eq!(engine.go_to(99).unwrap(), Navigation::Moved(2));
        assert_eq!(engine.go_to(2).unwrap(), Navigation::Stayed(2));
    }

    #[test]
    fn next_on_last_question_asks_for_confirmation() {
        let mut engine = SessionEngine::start(test_with(1, &[0, 0]));
        engine.select_answer(0).unwrap();
        engine.next().unwrap();
        let nav = engine.next().unwrap();
        assert_eq!(
            nav,
            Navigation::ConfirmSubmit(SubmitPrompt {
                answered: 1,
                total: 2
            })
        );
        assert_eq!(engine.cursor(), 1);
        assert_eq!(engine.status(), AttemptStatus::Running);
    }

    #[test]
    fn request_submit_does_not_change_state() {
        let engine = SessionEngine::start(test_with(1, &[0, 1]));
        let prompt = engine.request_submit().unwrap();
        assert_eq!(prompt.unanswered(), 2);
        assert_eq!(engine.status(), AttemptStatus::Running);
    }

    #[test]
    fn unanswered_questions_score_as_incorrect() {
        let mut engine = SessionEngine::start(test_with(1, &[1, 2, 3]));
        engine.select_answer(1).unwrap();
        engine.next().unwrap();
        engine.select_answer(0).unwrap();

        let SubmitOutcome::Pending(result) = engine.submit() else {
            panic!("expected pending submission");
        };
        assert_eq!(result.score, 1);
        assert_eq!(result.total, 3);
        assert_eq!(result.answered, 2);
        assert!(result.score <= result.total);
    }

    #[test]
    fn submit_twice_emits_once() {
        let (sink, rx) = ChannelSink::channel();
        let mut engine = SessionEngine::start(test_with(1, &[0])).with_completion_sink(sink);

        assert!(matches!(engine.submit(), SubmitOutcome::Pending(_)));
        assert_eq!(engine.submit(), SubmitOutcome::Ignored);
        engine.complete_submission().unwrap();
        assert_eq!(engine.submit(), SubmitOutcome::Ignored);
        assert!(matches!(
            engine.complete_submission(),
            Err(EngineError::NotSubmitting { .. })
        ));

        assert_eq!(rx.try_iter().count(), 1);
        assert_eq!(engine.status(), AttemptStatus::Finished);
    }

    #[test]
    fn input_is_rejected_while_submitting() {
        let mut engine = SessionEngine::start(test_with(1, &[0, 0]));
        engine.submit();
        assert_eq!(
            engine.select_answer(0).unwrap_err(),
            EngineError::NotRunning {
                status: AttemptStatus::Submitting
            }
        );
        assert!(engine.next().is_err());
    }

    #[test]
    fn countdown_auto_submits_exactly_once() {
        let (sink, rx) = ChannelSink::channel();
        let mut engine = SessionEngine::start(test_with(1, &[0])).with_completion_sink(sink);

        let mut expirations = 0;
        for _ in 0..60 {
            if let TickOutcome::Expired(_) = engine.tick() {
                expirations += 1;
            }
        }
        assert_eq!(expirations, 1);
        assert_eq!(engine.remaining_seconds(), 0);
        assert_eq!(engine.status(), AttemptStatus::Submitting);

        assert_eq!(engine.tick(), TickOutcome::Idle);
        assert_eq!(engine.remaining_seconds(), 0);
        assert_eq!(engine.submit(), SubmitOutcome::Ignored);

        engine.complete_submission().unwrap();
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn manual_submit_beats_countdown() {
        let mut engine = SessionEngine::start(test_with(1, &[0]));
        for _ in 0..59 {
            engine.tick();
        }
        assert!(matches!(engine.submit(), SubmitOutcome::Pending(_)));
        assert_eq!(engine.tick(), TickOutcome::Idle);
        assert_eq!(engine.remaining_seconds(), 1);
    }

    #[test]
    fn missing_sink_keeps_attempt_submitting() {
        let mut engine = SessionEngine::start(test_with(1, &[0]));
        engine.select_answer(0).unwrap();
        engine.submit();

        assert_eq!(
            engine.complete_submission().unwrap_err(),
            EngineError::MissingCompletionHandler
        );
        assert_eq!(engine.status(), AttemptStatus::Submitting);
        assert_eq!(engine.result().map(|r| r.score), Some(1));

        let (sink, rx) = ChannelSink::channel();
        engine.set_completion_sink(sink);
        let result = engine.complete_submission().unwrap();
        assert_eq!(result.score, 1);
        assert_eq!(rx.try_recv().unwrap(), result);
    }

    #[test]
    fn failed_delivery_is_not_finished() {
        let mut engine = SessionEngine::start(test_with(1, &[0]))
            .with_completion_sink(|_: &AttemptResult| -> Result<(), DeliveryError> {
                Err(DeliveryError)
            });
        engine.submit();
        assert_eq!(
            engine.complete_submission().unwrap_err(),
            EngineError::MissingCompletionHandler
        );
        assert_eq!(engine.status(), AttemptStatus::Submitting);
    }

    #[test]
    fn cancel_stops_everything_and_emits_nothing() {
        let (sink, rx) = ChannelSink::channel();
        let mut engine = SessionEngine::start(test_with(1, &[0])).with_completion_sink(sink);

        assert_eq!(engine.cancel(), CancelOutcome::Cancelled);
        assert_eq!(engine.tick(), TickOutcome::Idle);
        assert_eq!(engine.submit(), SubmitOutcome::Ignored);
        assert_eq!(engine.cancel(), CancelOutcome::AlreadyClosed);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cancel_during_submission_lets_submit_finish() {
        let (sink, rx) = ChannelSink::channel();
        let mut engine = SessionEngine::start(test_with(1, &[0])).with_completion_sink(sink);
        engine.submit();

        assert_eq!(engine.cancel(), CancelOutcome::SubmissionPending);
        assert_eq!(engine.status(), AttemptStatus::Submitting);
        engine.complete_submission().unwrap();
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn each_engine_gets_its_own_attempt() {
        let test = test_with(1, &[0, 1]);
        let mut first = SessionEngine::start(test.clone());
        first.select_answer(0).unwrap();
        first.tick();

        let second = SessionEngine::start(test);
        assert_ne!(first.attempt_id(), second.attempt_id());
        assert_eq!(second.answers(), &[None, None]);
        assert_eq!(second.remaining_seconds(), 60);
    }
}
