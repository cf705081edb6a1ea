//! Pipeline execution, scheduling, history, and cancellation for crawl runs.
//!
//! [`Crawler`] is the whole public contract: `run_once`, `enable_schedule`,
//! `disable_schedule`, `status`, `history`. Everything else in this crate —
//! the pipeline wiring, the daily trigger loop, the cancellation token, the
//! counters — is private machinery behind that surface.

mod cancellation;
mod error;
mod metrics;
mod pipeline;
mod schedule;
mod status;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use crawler_protocol::CrawlerConfig;
use crawler_store::{RunRecord, Store};
use tokio::sync::Mutex;

pub use cancellation::CancelToken;
pub use error::OrchestratorError;
pub use metrics::{Metrics, MetricsSnapshot};
pub use pipeline::{Orchestrator, RunOutcome};
pub use status::{RunCompletionStatus, RunState, Status};

/// The top-level handle a CLI or service wraps around one configured crawl
/// target. Owns whether the crawler is enabled, whether the schedule is
/// running, and the timestamp of the last successful run.
pub struct Crawler {
    orchestrator: Arc<Orchestrator>,
    schedule: schedule::Schedule,
    shutdown: CancelToken,
    enabled: Arc<AtomicBool>,
    last_successful_run: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl Crawler {
    pub fn new(config: CrawlerConfig, store: Store) -> Self {
        let enabled = Arc::new(AtomicBool::new(config.enabled));
        Self {
            orchestrator: Arc::new(Orchestrator::new(config, store)),
            schedule: schedule::Schedule::new(),
            shutdown: CancelToken::new(),
            enabled,
            last_successful_run: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Enables the crawler. Does not by itself start the schedule; callers
    /// that want both call `enable_schedule` too.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Disables the crawler and the schedule together, per the CLI's
    /// `disable` contract.
    pub async fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
        self.schedule.disable().await;
    }

    pub async fn enable_schedule(&self) {
        self.schedule.enable(self.orchestrator.clone(), self.shutdown.clone()).await;
    }

    pub async fn disable_schedule(&self) {
        self.schedule.disable().await;
    }

    /// Runs one pipeline pass now, regardless of the schedule. Rejects if a
    /// run (scheduled or manual) is already active.
    pub async fn run_once(&self) -> Result<RunOutcome, OrchestratorError> {
        let metrics = Metrics::new();
        let outcome = self.orchestrator.run_once(&metrics).await?;
        if matches!(outcome.status, RunCompletionStatus::Completed) {
            *self.last_successful_run.lock().await = Some(outcome.completed_at);
        }
        Ok(outcome)
    }

    pub async fn cancel_active_run(&self) {
        self.orchestrator.cancel_active_run().await;
    }

    pub async fn status(&self) -> Status {
        let run_state = if self.orchestrator.is_active().await {
            RunState::Running
        } else {
            RunState::Idle
        };
        Status {
            enabled: self.is_enabled(),
            schedule_enabled: self.schedule.is_enabled(),
            run_state,
            last_successful_run: *self.last_successful_run.lock().await,
        }
    }

    pub async fn history(&self, limit: u32) -> Result<Vec<RunRecord>, OrchestratorError> {
        Ok(self.orchestrator.store().history(limit).await?)
    }

    pub fn store(&self) -> &Store {
        self.orchestrator.store()
    }
}

impl Drop for Crawler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
