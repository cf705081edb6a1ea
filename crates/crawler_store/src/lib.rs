//! Turns analyzer output and live-validation reports into canonical,
//! deduplicated records and persists them.
//!
//! `normalize_and_merge` (C7) decides what a candidate's row should look
//! like, honoring any existing operator edits. `Store::upsert` (C8) writes
//! it, serialized per slug, alongside an append-only run-history log.

mod dedup;
mod error;
mod normalize;
mod persist;
mod pool;
mod schema;

pub use dedup::{find_match, normalized_repo_url, DedupMatch};
pub use error::StoreError;
pub use normalize::normalize_and_merge;
pub use persist::{RunRecord, Store, UpsertOutcome};
pub use pool::{create_pool, DbPool};
