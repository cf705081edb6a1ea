#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} timed out after {elapsed_secs}s")]
    Timeout { url: String, elapsed_secs: u64 },
    #[error("{url} returned status {code}")]
    Status { url: String, code: u16 },
    #[error("rate limit bucket for {category} drained and caller declined to wait")]
    RateLimitExceeded { category: String },
    #[error("failed to parse response from {url}: {detail}")]
    Parse { url: String, detail: String },
}

impl HttpError {
    /// Retryable on 429/5xx/transport errors, not on other 4xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::Network { .. } | HttpError::Timeout { .. } => true,
            HttpError::Status { code, .. } => {
                *code == 429 || *code == 408 || *code == 425 || (500..600).contains(code)
            }
            HttpError::RateLimitExceeded { .. } | HttpError::Parse { .. } => false,
        }
    }
}
