//! Aggregate statistics over finished test sessions

use serde::Serialize;

use crate::error::Result;
use crate::session::ResultRecord;
use crate::store::ResultStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub sessions: usize,
    /// Rounded mean of each session's accuracy.
    pub average_accuracy: u32,
    pub total_correct: usize,
    pub total_wrong: usize,
}

impl HistorySummary {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let sessions = records.len();
        let accuracy_sum: u64 = records.iter().map(|r| r.accuracy_percent as u64).sum();
        Self {
            sessions,
            average_accuracy: ((2 * accuracy_sum + sessions as u64) / (2 * sessions as u64)) as u32,
            total_correct: records.iter().map(|r| r.correct_count).sum(),
            total_wrong: records.iter().map(|r| r.wrong_count).sum(),
        }
    }

    pub fn load(store: &dyn ResultStore) -> Result<Self> {
        Ok(Self::from_records(&store.load_all()?))
    }
}

/// Records ordered newest first, for display.
pub fn recent_first(records: &[ResultRecord]) -> Vec<ResultRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Utc};

    fn record(day: u32, correct: usize, wrong: usize, accuracy: u32) -> ResultRecord {
        ResultRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            correct_count: correct,
            wrong_count: wrong,
            accuracy_percent: accuracy,
            total_questions: correct + wrong,
        }
    }

    #[test]
    fn empty_history() {
        assert_eq!(HistorySummary::from_records(&[]), HistorySummary::default());
    }

    #[test]
    fn averages_session_accuracy() {
        let records = vec![record(1, 7, 3, 70), record(2, 1, 0, 100), record(3, 1, 1, 50)];
        let summary = HistorySummary::from_records(&records);
        assert_eq!(summary.sessions, 3);
        // (70 + 100 + 50) / 3 = 73.3
        assert_eq!(summary.average_accuracy, 73);
        assert_eq!(summary.total_correct, 9);
        assert_eq!(summary.total_wrong, 4);
    }

    #[test]
    fn average_rounds_half_up() {
        let records = vec![record(1, 1, 0, 100), record(2, 0, 1, 0), record(3, 1, 1, 50), record(4, 1, 1, 51)];
        // 201 / 4 = 50.25
        assert_eq!(HistorySummary::from_records(&records).average_accuracy, 50);
        let records = vec![record(1, 1, 0, 100), record(2, 0, 1, 1)];
        // 101 / 2 = 50.5
        assert_eq!(HistorySummary::from_records(&records).average_accuracy, 51);
    }

    #[test]
    fn newest_first() {
        let records = vec![record(2, 1, 0, 100), record(5, 0, 1, 0), record(1, 1, 1, 50)];
        let days: Vec<u32> = recent_first(&records).iter().map(|r| r.timestamp.day()).collect();
        assert_eq!(days, vec![5, 2, 1]);
    }
}
