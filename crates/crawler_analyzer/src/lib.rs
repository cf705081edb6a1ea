//! The content analyzer, the densest deterministic logic in the
//! crawler.
//!
//! This is not a class hierarchy: [`analyze`] is a single pure function that
//! threads a [`ScrapedBundle`] and an optional [`IntelligenceReport`] through
//! a fixed, explicit sequence of pure extractor functions, one module per
//! family. [`enrich::Enricher`] is an optional post-processing capability,
//! never a dependency of the deterministic path.

mod auth;
mod category;
mod description;
mod enrich;
mod install;
mod record;
mod slug;
mod tags;
mod tools;
mod use_cases;

pub use enrich::{Enricher, NullEnricher};
pub use record::{analyze, AnalysisRecord};
