use std::sync::{Arc, mpsc as std_mpsc};
use std::time::Duration;

use prep_core::engine::{
    AttemptResult, AttemptStatus, CancelOutcome, ChannelSink, Navigation, SessionEngine,
    SubmitOutcome, TickOutcome,
};
use prep_core::model::{Email, QuestionId, Test, TestId, UserStats};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::events::{SessionInput, SessionUpdate, SubmitReason};
use crate::ai::QuestionGenerator;
use crate::catalog_service::CatalogService;
use crate::error::HostError;
use crate::stats_service::StatsService;

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Timing for the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostConfig {
    /// Period of the countdown; one engine tick per interval.
    pub tick_interval: Duration,
    /// Pause between submitting and delivering the score.
    pub submit_delay: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
            submit_delay: Duration::from_millis(1500),
        }
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One attempt in progress: a fresh engine plus the channel its score lands on.
#[derive(Debug)]
pub struct ActiveSession {
    engine: SessionEngine,
    results: std_mpsc::Receiver<AttemptResult>,
}

impl ActiveSession {
    fn start(test: Test) -> Self {
        let (sink, results) = ChannelSink::channel();
        let engine = SessionEngine::start(test).with_completion_sink(sink);
        Self { engine, results }
    }

    #[must_use]
    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    #[must_use]
    pub fn test(&self) -> &Test {
        self.engine.test()
    }

    #[must_use]
    pub fn status(&self) -> AttemptStatus {
        self.engine.status()
    }

    /// Replace the completion channel after a failed delivery so `run` can retry.
    pub fn reattach_completion_sink(&mut self) {
        let (sink, results) = ChannelSink::channel();
        self.engine.set_completion_sink(sink);
        self.results = results;
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// What the caller shows after a finished attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSummary {
    pub title: String,
    pub result: AttemptResult,
    pub stats: UserStats,
}

impl CompletionSummary {
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.result.total == 0 {
            return 0.0;
        }
        f64::from(self.result.score) * 100.0 / f64::from(self.result.total)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostOutcome {
    Completed(CompletionSummary),
    Cancelled,
}

//
// ─── HOST ──────────────────────────────────────────────────────────────────────
//

/// Turns catalog selections into sessions and drives them to completion.
#[derive(Clone)]
pub struct SessionHost {
    catalog: Arc<CatalogService>,
    stats: Arc<StatsService>,
    generator: Arc<dyn QuestionGenerator>,
    config: HostConfig,
}

impl SessionHost {
    #[must_use]
    pub fn new(
        catalog: Arc<CatalogService>,
        stats: Arc<StatsService>,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Self {
        Self {
            catalog,
            stats,
            generator,
            config: HostConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> HostConfig {
        self.config
    }

    /// Start the full mock or a sectional.
    ///
    /// # Errors
    ///
    /// Returns `HostError::UnknownTest` if no composed mock has this id.
    pub fn start_mock(&self, id: &TestId) -> Result<ActiveSession, HostError> {
        let test = self
            .catalog
            .mock(id)
            .cloned()
            .ok_or_else(|| HostError::UnknownTest(id.clone()))?;
        Ok(begin(test))
    }

    /// # Errors
    ///
    /// Returns `HostError::NotFound` if no question carries `(year, slot)`.
    pub fn start_pyq(&self, year: &str, slot: &str) -> Result<ActiveSession, HostError> {
        Ok(begin(self.catalog.pyq_test(year, slot)?))
    }

    /// # Errors
    ///
    /// Returns `HostError::UnknownQuestion` if the catalog has no such question.
    pub fn start_practice(&self, id: QuestionId) -> Result<ActiveSession, HostError> {
        let test = self
            .catalog
            .practice_test(id)
            .ok_or(HostError::UnknownQuestion(id))?;
        Ok(begin(test))
    }

    /// Practice a freshly generated question.
    ///
    /// # Errors
    ///
    /// Returns `HostError::GenerationUnavailable` if the generator produced
    /// nothing. The caller may simply try again.
    pub async fn start_generated_practice(&self, topic: &str) -> Result<ActiveSession, HostError> {
        let question = self
            .generator
            .generate(topic)
            .await
            .ok_or(HostError::GenerationUnavailable)?;
        Ok(begin(prep_core::catalog::build_practice_test(&question)))
    }

    /// Drive `session` until it finishes or is cancelled.
    ///
    /// Ticks the countdown, applies `inputs` in arrival order and, once the
    /// attempt is submitted, waits out the submit delay before delivering the
    /// score and recording it against `user`. A closed input channel cancels a
    /// running attempt but never one that is already submitting.
    ///
    /// # Errors
    ///
    /// Returns `HostError::SessionClosed` if the attempt already ended,
    /// `HostError::Engine` if the score could not be delivered (the session
    /// stays submitting; reattach a sink and run again), or `HostError::Stats`
    /// if recording failed after the attempt finished.
    pub async fn run(
        &self,
        user: &Email,
        session: &mut ActiveSession,
        inputs: &mut mpsc::Receiver<SessionInput>,
        updates: &mpsc::UnboundedSender<SessionUpdate>,
    ) -> Result<HostOutcome, HostError> {
        let mut deadline = match session.status() {
            AttemptStatus::Running => None,
            AttemptStatus::Submitting => Some(Instant::now()),
            status => return Err(HostError::SessionClosed { status }),
        };

        let period = self.config.tick_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inputs_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick(), if deadline.is_none() => {
                    match session.engine.tick() {
                        TickOutcome::Counting { remaining_seconds } => {
                            publish(updates, SessionUpdate::Tick { remaining_seconds });
                        }
                        TickOutcome::Expired(_) => {
                            publish(updates, SessionUpdate::Tick { remaining_seconds: 0 });
                            publish(updates, SessionUpdate::Submitting(SubmitReason::TimeUp));
                            deadline = Some(Instant::now() + self.config.submit_delay);
                        }
                        TickOutcome::Idle => {}
                    }
                }
                input = inputs.recv(), if inputs_open => {
                    let Some(input) = input else {
                        inputs_open = false;
                        if session.engine.cancel() == CancelOutcome::Cancelled {
                            info!(test = %session.test().id(), "input closed, attempt cancelled");
                            return Ok(HostOutcome::Cancelled);
                        }
                        continue;
                    };
                    if input == SessionInput::Cancel {
                        match session.engine.cancel() {
                            CancelOutcome::Cancelled => {
                                info!(test = %session.test().id(), "attempt cancelled");
                                return Ok(HostOutcome::Cancelled);
                            }
                            outcome => debug!(?outcome, "cancel ignored"),
                        }
                        continue;
                    }
                    if apply(&mut session.engine, input, updates) {
                        deadline = Some(Instant::now() + self.config.submit_delay);
                    }
                }
                () = sleep_until(deadline), if deadline.is_some() => {
                    let delivered = session.engine.complete_submission()?;
                    let result = session.results.try_iter().last().unwrap_or(delivered);
                    let title = session.test().title().to_string();
                    return self.finish(user, title, result).await;
                }
            }
        }
    }

    async fn finish(
        &self,
        user: &Email,
        title: String,
        result: AttemptResult,
    ) -> Result<HostOutcome, HostError> {
        match self
            .stats
            .record_completion(user, result.score, result.total, &result.test_id)
            .await
        {
            Ok(stats) => {
                info!(
                    test = %result.test_id,
                    score = result.score,
                    total = result.total,
                    "attempt completed"
                );
                Ok(HostOutcome::Completed(CompletionSummary {
                    title,
                    result,
                    stats,
                }))
            }
            Err(source) => Err(HostError::Stats { result, source }),
        }
    }
}

fn begin(test: Test) -> ActiveSession {
    info!(
        test = %test.id(),
        questions = test.len(),
        minutes = test.duration_minutes(),
        "session started"
    );
    ActiveSession::start(test)
}

async fn sleep_until(deadline: Option<Instant>) {
    if let Some(deadline) = deadline {
        time::sleep_until(deadline).await;
    }
}

/// Apply one non-cancel input. Returns true when it triggered a submission.
fn apply(
    engine: &mut SessionEngine,
    input: SessionInput,
    updates: &mpsc::UnboundedSender<SessionUpdate>,
) -> bool {
    let navigation = match input {
        SessionInput::SelectAnswer(option) => {
            let index = engine.cursor();
            let update = match engine.select_answer(option) {
                Ok(()) => SessionUpdate::AnswerRecorded { index, option },
                Err(err) => SessionUpdate::Rejected(err),
            };
            publish(updates, update);
            return false;
        }
        SessionInput::ClearAnswer => {
            let index = engine.cursor();
            let update = match engine.clear_answer() {
                Ok(()) => SessionUpdate::AnswerCleared { index },
                Err(err) => SessionUpdate::Rejected(err),
            };
            publish(updates, update);
            return false;
        }
        SessionInput::RequestSubmit => {
            let update = match engine.request_submit() {
                Ok(prompt) => SessionUpdate::ConfirmSubmit(prompt),
                Err(err) => SessionUpdate::Rejected(err),
            };
            publish(updates, update);
            return false;
        }
        SessionInput::ConfirmSubmit => {
            return match engine.submit() {
                SubmitOutcome::Pending(_) => {
                    publish(updates, SessionUpdate::Submitting(SubmitReason::Manual));
                    true
                }
                SubmitOutcome::Ignored => false,
            };
        }
        SessionInput::Cancel => return false,
        SessionInput::Next => engine.next(),
        SessionInput::Previous => engine.previous(),
        SessionInput::GoTo(index) => engine.go_to(index),
    };

    match navigation {
        Ok(Navigation::Moved(index)) => publish(updates, SessionUpdate::Moved { index }),
        Ok(Navigation::Stayed(_)) => {}
        Ok(Navigation::ConfirmSubmit(prompt)) => {
            publish(updates, SessionUpdate::ConfirmSubmit(prompt));
        }
        Err(err) => publish(updates, SessionUpdate::Rejected(err)),
    }
    false
}

fn publish(updates: &mpsc::UnboundedSender<SessionUpdate>, update: SessionUpdate) {
    if updates.send(update).is_err() {
        debug!("no listener for session updates");
    }
}
