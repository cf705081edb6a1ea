use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Cancelling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunCompletionStatus {
    Completed,
    Failed,
    Skipped,
}

impl RunCompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunCompletionStatus::Completed => "completed",
            RunCompletionStatus::Failed => "failed",
            RunCompletionStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Status {
    pub enabled: bool,
    pub schedule_enabled: bool,
    pub run_state: RunState,
    pub last_successful_run: Option<DateTime<Utc>>,
}
