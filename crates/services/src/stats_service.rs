use std::sync::Arc;

use prep_core::Clock;
use prep_core::model::{Email, HistoryEntry, TestId, UserStats};
use storage::repository::StatsRepository;
use tracing::info;

use crate::error::StatsServiceError;

/// Reads and updates a user's cumulative stats.
///
/// Each completion is one read followed by a wholesale overwrite; concurrent
/// writers for the same user are last-write-wins.
#[derive(Clone)]
pub struct StatsService {
    clock: Clock,
    repo: Arc<dyn StatsRepository>,
}

impl StatsService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn StatsRepository>) -> Self {
        Self { clock, repo }
    }

    /// Stored stats, or zeroed stats for a user with no history yet.
    ///
    /// # Errors
    ///
    /// Returns `StatsServiceError::Storage` on backend failures.
    pub async fn load(&self, email: &Email) -> Result<UserStats, StatsServiceError> {
        Ok(self.repo.load(email).await?.unwrap_or_default())
    }

    /// Fold a finished attempt into the user's stats and persist them.
    ///
    /// # Errors
    ///
    /// Returns `StatsServiceError::InvalidScore` if `score > total`, or
    /// `StatsServiceError::Storage` on backend failures.
    pub async fn record_completion(
        &self,
        email: &Email,
        score: u32,
        total: u32,
        test_id: &TestId,
    ) -> Result<UserStats, StatsServiceError> {
        if score > total {
            return Err(StatsServiceError::InvalidScore { score, total });
        }

        let mut stats = self.load(email).await?;
        stats.record(HistoryEntry {
            date: self.clock.now(),
            test_id: test_id.clone(),
            score,
            total,
        });
        self.repo.save(email, &stats).await?;
        info!(email = %email, test = %test_id, score, total, "completion recorded");
        Ok(stats)
    }

    /// Newest-first slice of the user's history.
    ///
    /// # Errors
    ///
    /// Returns `StatsServiceError::Storage` on backend failures.
    pub async fn recent_history(
        &self,
        email: &Email,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StatsServiceError> {
        let stats = self.load(email).await?;
        Ok(stats.recent(limit).cloned().collect())
    }
}
