//! Shared error taxonomy.
//!
//! Every stage-specific crate defines its own `thiserror` enum for the
//! mechanics of that stage; this module defines the taxonomy those errors
//! get classified into when a candidate's processing fails, so the
//! orchestrator can record a run row without needing to know the internals
//! of any one stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of processing one candidate through the pipeline.
///
/// Errors inside a single candidate's processing never fail the whole run.
/// This type is how a stage reports that without raising.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CandidateOutcome {
    Persisted { slug: String, created: bool },
    Dropped { reason: DropReason, detail: String },
    Failed { error: CrawlError, detail: String },
}

/// Reasons a candidate is intentionally dropped without being an error.
/// Filter rejection is counted but is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    NotMcp,
    RegistryNotFound,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::NotMcp => "not_mcp",
            DropReason::RegistryNotFound => "registry_not_found",
        };
        write!(f, "{s}")
    }
}

/// The crawl error taxonomy, shared across crates so the orchestrator can
/// aggregate counts without matching on crate-local error types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum CrawlError {
    #[error("transient network error: {0}")]
    TransientNetwork(String),
    #[error("parse error on scraped content: {0}")]
    ScrapeParse(String),
    #[error("install failure: {0}")]
    InstallFailure(String),
    #[error("subprocess crashed or timed out: {0}")]
    SubprocessFailure(String),
    #[error("persistence conflict after retry: {0}")]
    PersistenceConflict(String),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl CrawlError {
    /// Configuration errors are fatal at startup; everything else
    /// is scoped to the one candidate.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, CrawlError::Configuration(_))
    }
}
