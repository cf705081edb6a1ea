use async_trait::async_trait;

use crate::record::AnalysisRecord;

/// Optional LLM-backed enrichment, applied after the deterministic analyzer
/// has already produced a complete, legal record. A capability layered on
/// top of the deterministic path, not a dependency of it — never used if it
/// would leave a description empty or unchanged-boilerplate.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn enrich(&self, record: AnalysisRecord) -> AnalysisRecord;
}

/// The default: no enrichment capability configured.
pub struct NullEnricher;

#[async_trait]
impl Enricher for NullEnricher {
    async fn enrich(&self, record: AnalysisRecord) -> AnalysisRecord {
        record
    }
}
