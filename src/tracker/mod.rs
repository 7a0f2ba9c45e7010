use std::{fmt::Display, sync::Arc, time::Duration};

use anyhow::Result;
use collection::sampler::Sampler;
use report::UsageReport;
use storage::usage_store::UsageStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    process_api::{ProcessMatcher, ProcessSource, SysinfoSource},
    utils::clock::{Clock, DefaultClock},
};

pub mod collection;
pub mod report;
pub mod shutdown;
pub mod storage;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    pub matcher: ProcessMatcher,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            matcher: ProcessMatcher::default(),
        }
    }
}

/// Outcome of a control command, meant to be shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Started,
    AlreadyRunning,
    Stopped,
    NotRunning,
}

impl Notice {
    pub fn title(&self) -> &'static str {
        match self {
            Notice::Started => "Started",
            Notice::AlreadyRunning => "Already Running",
            Notice::Stopped => "Stopped",
            Notice::NotRunning => "Not Running",
        }
    }

    /// Whether the command changed anything.
    pub fn is_transition(&self) -> bool {
        matches!(self, Notice::Started | Notice::Stopped)
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::Started => write!(f, "Tracking started!"),
            Notice::AlreadyRunning => write!(f, "Tracking is already active."),
            Notice::Stopped => write!(f, "Tracking stopped."),
            Notice::NotRunning => write!(f, "Tracking was not active."),
        }
    }
}

/// Background sampling task together with the token that stops it.
pub struct Worker {
    shutdown: CancellationToken,
    handle: JoinHandle<Result<()>>,
}

/// There is at most one worker, and it only exists while tracking.
#[derive(Default)]
pub enum TrackerState {
    #[default]
    Idle,
    Tracking(Worker),
}

impl TrackerState {
    pub fn is_tracking(&self) -> bool {
        matches!(self, TrackerState::Tracking(_))
    }

    /// `spawn` is only called when idle.
    pub fn start(
        self,
        spawn: impl FnOnce(CancellationToken) -> JoinHandle<Result<()>>,
    ) -> (Self, Notice) {
        match self {
            TrackerState::Tracking(worker) => {
                (TrackerState::Tracking(worker), Notice::AlreadyRunning)
            }
            TrackerState::Idle => {
                let shutdown = CancellationToken::new();
                let handle = spawn(shutdown.clone());
                (
                    TrackerState::Tracking(Worker { shutdown, handle }),
                    Notice::Started,
                )
            }
        }
    }

    /// Signals the worker and waits for it to flush the session in progress.
    pub async fn stop(self) -> (Self, Notice) {
        let TrackerState::Tracking(Worker { shutdown, handle }) = self else {
            return (TrackerState::Idle, Notice::NotRunning);
        };

        shutdown.cancel();
        match handle.await {
            Ok(Ok(())) => info!("Sampler finished"),
            Ok(Err(e)) => error!("Sampler finished with an error {e:?}"),
            Err(e) => error!("Sampler task failed {e:?}"),
        }
        (TrackerState::Idle, Notice::Stopped)
    }
}

pub type SourceFactory = Box<dyn Fn() -> Box<dyn ProcessSource + Send> + Send + Sync>;

/// Every start gets a fresh source from `make`.
pub fn source_factory<P, F>(make: F) -> SourceFactory
where
    P: ProcessSource + Send + 'static,
    F: Fn() -> P + Send + Sync + 'static,
{
    Box::new(move || -> Box<dyn ProcessSource + Send> { Box::new(make()) })
}

/// Represents the core of the application: start/stop control over sampling plus reporting
/// from the same store.
pub struct Tracker<S> {
    store: Arc<S>,
    config: TrackerConfig,
    source_factory: SourceFactory,
    clock: Arc<dyn Clock>,
    state: TrackerState,
}

impl<S: UsageStore + Send + Sync + 'static> Tracker<S> {
    pub fn new(store: S, config: TrackerConfig) -> Self {
        Self::with_parts(
            store,
            config,
            source_factory(SysinfoSource::new),
            Arc::new(DefaultClock),
        )
    }

    pub fn with_parts(
        store: S,
        config: TrackerConfig,
        source_factory: SourceFactory,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            config,
            source_factory,
            clock,
            state: TrackerState::Idle,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.state.is_tracking()
    }

    /// Spawns the sampler. Must be called from within a tokio runtime.
    pub fn start(&mut self) -> Notice {
        let (state, notice) = std::mem::take(&mut self.state).start(|shutdown| {
            let sampler = create_sampler(
                self.store.clone(),
                (self.source_factory)(),
                &self.config,
                shutdown,
                self.clock.clone(),
            );
            tokio::spawn(sampler.run())
        });
        self.state = state;
        if notice.is_transition() {
            info!(
                "Started tracking {:?} every {:?}",
                self.config.matcher, self.config.poll_interval
            );
        }
        notice
    }

    pub async fn stop(&mut self) -> Notice {
        let (state, notice) = std::mem::take(&mut self.state).stop().await;
        self.state = state;
        notice
    }

    /// Reads the whole store. [None] when nothing was ever tracked.
    pub async fn generate_report(&self) -> Result<Option<UsageReport>> {
        let today = self.clock.time().date_naive();
        let Some(records) = self.store.load_all().await? else {
            warn!("Requested a report without any data");
            return Ok(None);
        };
        Ok(Some(UsageReport::build(records, today)))
    }
}

/// Runs the sampler in the foreground until Ctrl-C or until `shutdown_token` is cancelled. Used
/// when there is no shell to stop it. The open session is saved before returning.
pub async fn track_until_shutdown<S: UsageStore>(
    store: S,
    source: Box<dyn ProcessSource + Send>,
    config: &TrackerConfig,
    shutdown_token: CancellationToken,
    clock: Arc<dyn Clock>,
) -> Result<()> {
    let sampler = create_sampler(store, source, config, shutdown_token.clone(), clock);
    info!(
        "Tracking {:?} every {:?}, press Ctrl-C to stop",
        config.matcher, config.poll_interval
    );

    let (_, sampling_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token),
        sampler.run()
    );

    sampling_result.inspect_err(|e| error!("Sampling module got an error {e:?}"))
}

pub fn create_sampler<S: UsageStore>(
    store: S,
    source: Box<dyn ProcessSource + Send>,
    config: &TrackerConfig,
    shutdown: CancellationToken,
    clock: Arc<dyn Clock>,
) -> Sampler<S> {
    Sampler::new(
        store,
        source,
        config.matcher.clone(),
        shutdown,
        config.poll_interval,
        clock,
    )
}
