use std::{collections::HashSet, future::Future, ops::Deref, path::PathBuf};

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

use crate::{
    fs::operations::{read_locked, rewrite_locked},
    utils::time::{date_to_record_name, parse_clock, parse_record_name},
};

use super::entities::DailyUsageRecord;

pub const HEADER_KEY: &str = "Date";
pub const HEADER: &str = "Date,Total Time";

/// Interface for abstracting storage of daily totals.
pub trait UsageStore {
    /// Previously saved total for `date`. Zero when nothing was saved yet.
    fn load(&self, date: NaiveDate) -> impl Future<Output = Result<Duration>> + Send;

    /// Replaces the total for `date`, or adds it. Other days stay untouched.
    fn save(&self, date: NaiveDate, total: Duration) -> impl Future<Output = Result<()>> + Send;

    /// Every saved day in storage order. [None] means nothing was ever saved.
    fn load_all(&self) -> impl Future<Output = Result<Option<Vec<DailyUsageRecord>>>> + Send;
}

impl<T: Deref> UsageStore for T
where
    T::Target: UsageStore,
{
    fn load(&self, date: NaiveDate) -> impl Future<Output = Result<Duration>> + Send {
        self.deref().load(date)
    }

    fn save(&self, date: NaiveDate, total: Duration) -> impl Future<Output = Result<()>> + Send {
        self.deref().save(date, total)
    }

    fn load_all(&self) -> impl Future<Output = Result<Option<Vec<DailyUsageRecord>>>> + Send {
        self.deref().load_all()
    }
}

/// The main realization of [UsageStore]. Keeps everything in one delimited text file.
pub struct CsvUsageStore {
    path: PathBuf,
}

impl CsvUsageStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl UsageStore for CsvUsageStore {
    async fn load(&self, date: NaiveDate) -> Result<Duration> {
        let Some(contents) = read_locked(&self.path).await? else {
            debug!("No store at {:?}, starting from zero", self.path);
            return Ok(Duration::zero());
        };

        let key = date_to_record_name(date);
        let total = data_rows(&contents)
            .find(|(row_key, _)| *row_key == key)
            .map(|(_, value)| parse_total(&key, value))
            .unwrap_or_else(Duration::zero);
        Ok(total)
    }

    async fn save(&self, date: NaiveDate, total: Duration) -> Result<()> {
        let record = DailyUsageRecord::new(date, total);
        rewrite_locked(&self.path, |current| upsert_row(current, &record)).await?;
        debug!("Saved {}", record.to_row());
        Ok(())
    }

    async fn load_all(&self) -> Result<Option<Vec<DailyUsageRecord>>> {
        let Some(contents) = read_locked(&self.path).await? else {
            return Ok(None);
        };

        let mut seen = HashSet::new();
        let mut records = vec![];
        for (key, value) in data_rows(&contents) {
            let Some(date) = parse_record_name(key) else {
                // ignore rows we can't attribute to a day. They are still kept on save.
                warn!("Found illegal date {key:?} in {:?}", self.path);
                continue;
            };
            if !seen.insert(date) {
                warn!("Found duplicate row for {key}, keeping the first one");
                continue;
            }
            records.push(DailyUsageRecord::new(date, parse_total(key, value)));
        }
        Ok(Some(records))
    }
}

/// A duration that can't be read counts as zero so the rest of the file is still usable.
fn parse_total(key: &str, value: Option<&str>) -> Duration {
    match value.and_then(parse_clock) {
        Some(total) => total,
        None => {
            warn!("Found illegal duration {value:?} for {key}");
            Duration::zero()
        }
    }
}

fn unquote(field: &str) -> &str {
    let field = field.trim();
    field
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(field)
}

/// Date and total are the first two columns. Anything after them is ignored.
fn split_row(line: &str) -> (&str, Option<&str>) {
    let mut fields = line.split(',');
    let key = fields.next().map(unquote).unwrap_or_default();
    (key, fields.next().map(unquote))
}

fn non_empty_lines(contents: &str) -> impl Iterator<Item = &str> {
    contents.lines().filter(|line| !line.trim().is_empty())
}

/// Rows after the header. A file without a header is read from the first line.
fn data_rows(contents: &str) -> impl Iterator<Item = (&str, Option<&str>)> {
    non_empty_lines(contents)
        .map(split_row)
        .enumerate()
        .filter(|(index, (key, _))| !(*index == 0 && *key == HEADER_KEY))
        .map(|(_, row)| row)
}

/// Produces new file contents with `record` replacing the row for its date, or appended at the
/// end. All other rows are copied as they are.
fn upsert_row(contents: &str, record: &DailyUsageRecord) -> String {
    let key = date_to_record_name(record.date);
    let row = record.to_row();
    let mut lines = non_empty_lines(contents).collect::<Vec<_>>();

    if lines.first().map(|line| split_row(line).0) != Some(HEADER_KEY) {
        lines.insert(0, HEADER);
    }

    let existing = lines
        .iter()
        .skip(1)
        .position(|line| split_row(line).0 == key);
    match existing {
        Some(index) => lines[index + 1] = &row,
        None => lines.push(&row),
    }

    let mut output = lines.join("\n");
    output.push('\n');
    output
}
