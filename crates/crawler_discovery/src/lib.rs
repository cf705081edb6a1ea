//! Ecosystem discoverers and the candidate filter.
//!
//! Each discoverer produces a finite stream of [`Candidate`](crawler_protocol::Candidate)
//! values tagged with their discovery provenance; [`filter::likely_mcp`] is
//! the pure gate applied before any expensive scraping happens.

mod cargo_crates;
mod filter;
mod go_modules;
mod npm;
mod pypi;
mod trait_def;

pub use filter::likely_mcp;
pub use trait_def::{DiscoveryError, Discoverer};

pub use cargo_crates::CargoDiscoverer;
pub use go_modules::GoDiscoverer;
pub use npm::NpmDiscoverer;
pub use pypi::PypiDiscoverer;
