use std::fmt::Display;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::{
    tracker::storage::entities::{duration_ser, DailyUsageRecord},
    utils::time::format_clock,
};

/// How many of the most recent days the report lists.
pub const REPORT_DAYS: usize = 7;

const BAR_STEP_SECONDS: i64 = 10 * 60;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Snapshot of the store as shown to the user: today's total and the last few tracked days.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UsageReport {
    pub today: NaiveDate,
    #[serde(with = "duration_ser")]
    pub today_total: Duration,
    /// Most recent days present in the store, oldest first.
    pub recent: Vec<DailyUsageRecord>,
}

impl UsageReport {
    pub fn build(mut records: Vec<DailyUsageRecord>, today: NaiveDate) -> Self {
        let today_total = records
            .iter()
            .find(|v| v.date == today)
            .map(|v| v.total)
            .unwrap_or_else(Duration::zero);

        records.sort_by_key(|v| v.date);
        records.dedup_by_key(|v| v.date);
        let skip = records.len().saturating_sub(REPORT_DAYS);
        let recent = records.split_off(skip);

        Self {
            today,
            today_total,
            recent,
        }
    }
}

/// One block per 10 minutes. Only the time-of-day part of the duration is used, so whole days
/// don't contribute to the bar.
pub fn usage_bar(total: Duration) -> String {
    let seconds = total.num_seconds().rem_euclid(SECONDS_PER_DAY);
    "█".repeat((seconds / BAR_STEP_SECONDS) as usize)
}

impl Display for UsageReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "-> Time Spent Today ({}): {}",
            self.today,
            format_clock(self.today_total)
        )?;
        writeln!(f)?;
        writeln!(f, "<.> Time Spent in Last {REPORT_DAYS} Days:")?;
        for record in &self.recent {
            writeln!(
                f,
                "{}: {} {}",
                record.date,
                format_clock(record.total),
                usage_bar(record.total)
            )?;
        }
        Ok(())
    }
}
