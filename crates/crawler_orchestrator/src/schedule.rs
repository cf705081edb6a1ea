use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cancellation::CancelToken;
use crate::metrics::Metrics;
use crate::pipeline::Orchestrator;

const DAILY: Duration = Duration::from_secs(24 * 60 * 60);

/// The cron-like daily trigger. A tick that finds a run already active is
/// skipped and logged rather than queued, per the "only one run may be
/// active" rule.
pub struct Schedule {
    enabled: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub async fn enable(&self, orchestrator: Arc<Orchestrator>, shutdown: CancelToken) {
        if self.enabled.swap(true, Ordering::Relaxed) {
            return;
        }
        let enabled = self.enabled.clone();
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(DAILY);
            interval.tick().await; // first tick fires immediately; skip it
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("schedule loop stopping");
                        break;
                    }
                    _ = interval.tick() => {
                        if !enabled.load(Ordering::Relaxed) {
                            break;
                        }
                        if orchestrator.is_active().await {
                            warn!("scheduled trigger skipped: a run is already active");
                            continue;
                        }
                        let metrics = Metrics::new();
                        if let Err(e) = orchestrator.run_once(&metrics).await {
                            warn!(error = %e, "scheduled run failed");
                        }
                    }
                }
            }
        });
        *self.handle.lock().await = Some(task);
    }

    pub async fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.lock().await.take() {
            handle.abort();
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new()
    }
}
