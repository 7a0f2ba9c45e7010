use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument};

use crate::{
    process_api::{is_target_running, ProcessMatcher, ProcessSource},
    tracker::storage::usage_store::UsageStore,
    utils::{clock::Clock, time::format_clock},
};

use super::session::DailyAccumulator;

/// Polls the process list and turns presence samples into daily totals. Every completed session
/// is persisted right away.
pub struct Sampler<S: UsageStore> {
    store: S,
    source: Box<dyn ProcessSource + Send>,
    matcher: ProcessMatcher,
    shutdown: CancellationToken,
    poll_interval: Duration,
    time_provider: Arc<dyn Clock>,
    accumulator: Option<DailyAccumulator>,
}

impl<S: UsageStore> Sampler<S> {
    pub fn new(
        store: S,
        source: Box<dyn ProcessSource + Send>,
        matcher: ProcessMatcher,
        shutdown: CancellationToken,
        poll_interval: Duration,
        time_provider: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            source,
            matcher,
            shutdown,
            poll_interval,
            time_provider,
            accumulator: None,
        }
    }

    /// Executes the sampling loop until the shutdown token is cancelled. A session that is still
    /// open at that point is flushed before returning.
    pub async fn run(mut self) -> Result<()> {
        let mut poll_point = self.time_provider.instant();
        loop {
            poll_point += self.poll_interval;

            let present = is_target_running(self.source.as_mut(), &self.matcher);
            self.observe(present).await;

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    break
                }
                _ = self.time_provider.sleep_until(poll_point) => ()
            }
        }

        info!("Sampling stopped");
        self.flush().await
    }

    async fn observe(&mut self, present: bool) {
        let active = self
            .accumulator
            .as_ref()
            .is_some_and(DailyAccumulator::is_active);

        match (active, present) {
            (false, true) => self.open_session().await,
            (true, false) => {
                if let Err(e) = self.flush().await {
                    error!("Failed to persist finished session {e:?}")
                }
            }
            _ => (),
        }
    }

    async fn open_session(&mut self) {
        let now = self.time_provider.time();
        let today = now.date_naive();

        let mut accumulator = match self.accumulator.take() {
            Some(accumulator) if accumulator.date() == today => accumulator,
            _ => DailyAccumulator::new(today, persisted_total(&self.store, today).await),
        };
        accumulator.open(now);
        debug!("Target process appeared at {now}");
        self.accumulator = Some(accumulator);
    }

    /// Closes the open session, if any, and saves the new daily total.
    async fn flush(&mut self) -> Result<()> {
        let now = self.time_provider.time();
        let Some(record) = self.accumulator.as_mut().and_then(|v| v.close(now)) else {
            return Ok(());
        };

        let span = info_span!("Persisting session", date = %record.date);
        self.store
            .save(record.date, record.total)
            .instrument(span)
            .await?;
        info!(
            "Saved total of {} for {}",
            format_clock(record.total),
            record.date
        );
        Ok(())
    }
}

async fn persisted_total(store: &impl UsageStore, date: NaiveDate) -> chrono::Duration {
    match store.load(date).await {
        Ok(total) => total,
        Err(e) => {
            error!("Failed to load total for {date}, starting from zero {e:?}");
            chrono::Duration::zero()
        }
    }
}
