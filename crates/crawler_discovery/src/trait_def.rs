use async_trait::async_trait;
use crawler_protocol::Candidate;

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("registry search failed: {0}")]
    Search(#[from] crawler_http::HttpError),
    #[error("could not parse registry response: {0}")]
    Parse(String),
}

/// One ecosystem's search surface.
///
/// `discover` returns the union of every search method the implementation
/// composes (keyword, dependency, naming-pattern, topic/classifier),
/// deduplicated by `(ecosystem, identifier)` — duplicates across methods
/// within one ecosystem are expected and collapsed here rather than by the
/// caller.
#[async_trait]
pub trait Discoverer: Send + Sync {
    fn ecosystem(&self) -> crawler_protocol::Ecosystem;

    async fn discover(&self, seed_keywords: &[String]) -> Result<Vec<Candidate>, DiscoveryError>;
}

/// Collapse candidates from possibly-overlapping search methods by identity,
/// keeping the first-seen discovery provenance string.
pub(crate) fn dedup_by_identity(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let key = (candidate.ecosystem, candidate.identifier.clone());
        if seen.insert(key) {
            out.push(candidate);
        }
    }
    out
}
