use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::TestId;

/// One completed attempt, as remembered in a user's history. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: DateTime<Utc>,
    pub test_id: TestId,
    pub score: u32,
    pub total: u32,
}

/// Cumulative per-user counters plus attempt history.
///
/// The serialized shape is the persisted payload and is overwritten wholesale
/// after every completed attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub tests_taken: u32,
    pub questions_attempted: u32,
    pub correct_answers: u32,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl UserStats {
    /// Fold a completed attempt into the counters and append it to history.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.tests_taken = self.tests_taken.saturating_add(1);
        self.questions_attempted = self.questions_attempted.saturating_add(entry.total);
        self.correct_answers = self.correct_answers.saturating_add(entry.score);
        self.history.push(entry);
    }

    /// Percentage of attempted questions answered correctly, 0 when nothing attempted.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.questions_attempted == 0 {
            return 0.0;
        }
        f64::from(self.correct_answers) * 100.0 / f64::from(self.questions_attempted)
    }

    /// Newest-first view over the last `limit` history entries.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter().rev().take(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn entry(test: &str, score: u32, total: u32) -> HistoryEntry {
        HistoryEntry {
            date: fixed_now(),
            test_id: TestId::new(test),
            score,
            total,
        }
    }

    #[test]
    fn record_accumulates_counters() {
        let mut stats = UserStats::default();
        stats.record(entry("full-mock", 40, 66));
        stats.record(entry("practice-3", 1, 1));

        assert_eq!(stats.tests_taken, 2);
        assert_eq!(stats.questions_attempted, 67);
        assert_eq!(stats.correct_answers, 41);
        assert_eq!(stats.history.len(), 2);
    }

    #[test]
    fn recent_is_newest_first() {
        let mut stats = UserStats::default();
        stats.record(entry("a", 0, 1));
        stats.record(entry("b", 1, 1));
        stats.record(entry("c", 1, 1));

        let ids: Vec<_> = stats.recent(2).map(|e| e.test_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn accuracy_handles_empty_stats() {
        assert!(UserStats::default().accuracy().abs() < f64::EPSILON);
    }

    #[test]
    fn payload_uses_camel_case_keys() {
        let mut stats = UserStats::default();
        stats.record(entry("sectional-quant", 3, 4));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["testsTaken"], 1);
        assert_eq!(json["questionsAttempted"], 4);
        assert_eq!(json["correctAnswers"], 3);
        assert_eq!(json["history"][0]["testId"], "sectional-quant");
    }
}
