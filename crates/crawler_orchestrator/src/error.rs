#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("a run is already active")]
    RunAlreadyActive,
    #[error("store error: {0}")]
    Store(#[from] crawler_store::StoreError),
    #[error("run exceeded its wall-clock budget")]
    WallClockExceeded,
}
