//! Shared domain types for the MCP registry crawler.
//!
//! Every crate in the workspace depends on this one for the entities of the
//! crawl pipeline (`Candidate`, `CanonicalMCP`, ...), the error taxonomy, and
//! the immutable run configuration. Nothing here performs I/O.

pub mod config;
pub mod error;
pub mod idempotency;
pub mod naming;
pub mod types;

pub use config::{ConcurrencyConfig, ConfigError, CrawlerConfig, FilterConfig, RateLimitConfig, TimeoutConfig};
pub use error::{CandidateOutcome, CrawlError};
pub use types::*;
