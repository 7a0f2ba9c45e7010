use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDate};

use super::{entities::DailyUsageRecord, usage_store::UsageStore};

/// In-memory [UsageStore] for tests that run on a paused clock, where real file io would stall.
#[derive(Default)]
pub struct MemoryStore {
    totals: Mutex<BTreeMap<NaiveDate, Duration>>,
    pub saves: AtomicUsize,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Default::default()
        }
    }
}

impl UsageStore for MemoryStore {
    async fn load(&self, date: NaiveDate) -> Result<Duration> {
        Ok(self
            .totals
            .lock()
            .unwrap()
            .get(&date)
            .copied()
            .unwrap_or_else(Duration::zero))
    }

    async fn save(&self, date: NaiveDate, total: Duration) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves {
            return Err(anyhow!("disk is full"));
        }
        self.totals.lock().unwrap().insert(date, total);
        Ok(())
    }

    async fn load_all(&self) -> Result<Option<Vec<DailyUsageRecord>>> {
        let totals = self.totals.lock().unwrap();
        if totals.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            totals
                .iter()
                .map(|(date, total)| DailyUsageRecord::new(*date, *total))
                .collect(),
        ))
    }
}
