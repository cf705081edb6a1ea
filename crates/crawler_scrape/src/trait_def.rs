use async_trait::async_trait;
use crawler_protocol::Candidate;

use crate::bundle::ScrapedBundle;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("registry has no detail record for {identifier}")]
    RegistryRecordMissing { identifier: String },
    #[error("registry fetch failed: {0}")]
    Fetch(#[from] crawler_http::HttpError),
    #[error("could not parse registry response: {0}")]
    Parse(String),
}

#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape(&self, candidate: &Candidate) -> Result<ScrapedBundle, ScrapeError>;
}
