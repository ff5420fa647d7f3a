//! Refresh scheduler.
//!
//! A [`Watcher`] drives the collection cycle on a fixed interval:
//!
//! ```text
//!   Idle --start()--> Running --cancel--> Stopped
//! ```
//!
//! Every tick runs one cycle under the [`RetryPolicy`]: collect a snapshot,
//! derive observations, publish them, print the status line. A cycle that
//! exhausts its retries is logged and skipped; the previously published
//! metrics stay in place until the next successful cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::collector::{CollectError, Collector};
use crate::config::{ConfigError, WatcherConfig};
use crate::derive::derive;
use crate::metrics::MetricsRegistry;
use crate::render::StatusRenderer;
use crate::retry::{MAX_ATTEMPTS, RetryError, RetryPolicy};
use crate::rpc::ChainGateway;

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const STOPPED: u8 = 2;

/// Lifecycle state of a [`Watcher`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WatcherState {
    Idle,
    Running,
    /// Terminal; reached only through cancellation.
    Stopped,
}

/// Errors returned by [`Watcher`] construction and startup.
#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("watcher already started")]
    AlreadyStarted,
    #[error("failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Periodically republishes the chain state as metrics.
pub struct Watcher<G> {
    collector: Collector<G>,
    metrics: Arc<MetricsRegistry>,
    config: WatcherConfig,
    retry: RetryPolicy,
    renderer: StatusRenderer,
    state: AtomicU8,
    synced: AtomicBool,
}

impl<G: ChainGateway> Watcher<G> {
    /// Creates a watcher publishing into an existing registry.
    ///
    /// Fails if the configuration is invalid (e.g. a zero refresh rate).
    pub fn new(
        gateway: G,
        metrics: Arc<MetricsRegistry>,
        config: WatcherConfig,
    ) -> Result<Self, WatcherError> {
        config.validate()?;

        Ok(Self {
            collector: Collector::new(gateway),
            metrics,
            retry: RetryPolicy::new(config.retry_delay),
            renderer: StatusRenderer::stdout(config.colored),
            config,
            state: AtomicU8::new(IDLE),
            synced: AtomicBool::new(false),
        })
    }

    /// Creates a watcher with its own registry, namespaced per `config`.
    pub fn with_registry(gateway: G, config: WatcherConfig) -> Result<Self, WatcherError> {
        config.validate()?;
        let metrics = Arc::new(MetricsRegistry::new(&config.namespace)?);
        Self::new(gateway, metrics, config)
    }

    /// Replaces the status line sink (stdout by default).
    pub fn with_renderer(mut self, renderer: StatusRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    pub fn state(&self) -> WatcherState {
        match self.state.load(Ordering::SeqCst) {
            IDLE => WatcherState::Idle,
            RUNNING => WatcherState::Running,
            _ => WatcherState::Stopped,
        }
    }

    /// Whether the node reported itself as not syncing in the latest
    /// successful cycle. False until the first success.
    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::SeqCst)
    }

    /// Runs the refresh loop until `cancel` fires.
    ///
    /// The first cycle starts immediately. Cycles never overlap: a cycle that
    /// outlasts the refresh rate is followed by at most one immediate cycle.
    pub async fn start(&self, cancel: CancellationToken) -> Result<(), WatcherError> {
        self.state
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| WatcherError::AlreadyStarted)?;

        info!(
            refresh_rate = ?self.config.refresh_rate,
            tracked = self.config.tracked_accounts.len(),
            "watcher started"
        );

        let mut ticker = interval(self.config.refresh_rate);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.refresh(&cancel).await {
                Ok(()) => {}
                Err(RetryError::Cancelled) => break,
                Err(RetryError::Exhausted { attempts, last }) => {
                    error!(
                        endpoint = ?last.endpoint(),
                        attempts,
                        error = %last,
                        "refresh failed, keeping previous metrics"
                    );
                }
                Err(RetryError::Fatal(err)) => {
                    error!(endpoint = ?err.endpoint(), error = %err, "refresh failed");
                }
            }
        }

        self.state.store(STOPPED, Ordering::SeqCst);
        info!("watcher stopped");
        Ok(())
    }

    /// Runs one retried cycle and publishes its result.
    pub async fn refresh(
        &self,
        cancel: &CancellationToken,
    ) -> Result<(), RetryError<CollectError>> {
        let snapshot = self
            .retry
            .run(
                cancel,
                || self.collector.collect(cancel),
                |attempt, err| {
                    warn!(
                        attempt,
                        max_attempts = MAX_ATTEMPTS,
                        endpoint = ?err.endpoint(),
                        error = %err,
                        "refresh attempt failed"
                    );
                },
            )
            .await?;

        let observations = derive(&snapshot, &self.config.tracked_accounts);
        self.metrics.watcher.publish(&observations);
        self.synced
            .store(!snapshot.status.sync_info.syncing, Ordering::SeqCst);

        if let Err(e) = self.renderer.render(
            &snapshot.status,
            &snapshot.validators,
            &self.config.tracked_accounts,
        ) {
            warn!(error = %e, "failed to write status line");
        }

        info!(
            block = observations.block_number,
            epoch_start_height = observations.epoch_start_height,
            validators = observations.validators.len(),
            "refresh completed"
        );
        Ok(())
    }
}
