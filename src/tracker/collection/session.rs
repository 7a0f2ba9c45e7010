use chrono::{DateTime, Duration, Local, NaiveDate};
use tracing::warn;

use crate::tracker::storage::entities::DailyUsageRecord;

/// Running total for one day together with the session currently in progress.
///
/// A session is attributed to the day the accumulator was created for, even if it only closes
/// after midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyAccumulator {
    date: NaiveDate,
    total: Duration,
    session_start: Option<DateTime<Local>>,
}

impl DailyAccumulator {
    /// `persisted` is whatever the store already had for `date`.
    pub fn new(date: NaiveDate, persisted: Duration) -> Self {
        Self {
            date,
            total: persisted.max(Duration::zero()),
            session_start: None,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[cfg(test)]
    pub fn total(&self) -> Duration {
        self.total
    }

    pub fn is_active(&self) -> bool {
        self.session_start.is_some()
    }

    /// Marks the start of a session. Does nothing if one is already open.
    pub fn open(&mut self, now: DateTime<Local>) {
        self.session_start.get_or_insert(now);
    }

    /// Folds the open session into the total. Returns the record to persist, or [None] if no
    /// session was open.
    pub fn close(&mut self, now: DateTime<Local>) -> Option<DailyUsageRecord> {
        let start = self.session_start.take()?;
        let session = now - start;
        if session < Duration::zero() {
            warn!("Clock went backwards during a session ({start} -> {now}), counting it as zero");
        }
        self.total += session.max(Duration::zero());
        Some(DailyUsageRecord::new(self.date, self.total))
    }
}
