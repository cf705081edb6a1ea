use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;

use crate::error::HttpError;
use crate::ratelimit::RateLimiter;
use crate::request::{FetchRequest, FetchResponse, Method, RenderMode};
use crate::retry;

const USER_AGENT: &str = concat!("mcp-registry-crawler/", env!("CARGO_PKG_VERSION"));

/// Post-render navigation, used only when a static fetch yields insufficient
/// content. The default fetcher has no browser backend wired in;
/// callers that need one implement this trait against a real headless
/// browser and pass it to [`Fetcher::with_browser`].
#[async_trait]
pub trait BrowserFetcher: Send + Sync {
    async fn render(&self, url: &str) -> Result<String, HttpError>;
}

/// A `BrowserFetcher` that always reports the page as unavailable. Used when
/// no browser backend is configured, so `RenderMode::Browser` requests fail
/// fast instead of silently falling back to static fetching.
pub struct NoBrowser;

#[async_trait]
impl BrowserFetcher for NoBrowser {
    async fn render(&self, url: &str) -> Result<String, HttpError> {
        Err(HttpError::Parse {
            url: url.to_string(),
            detail: "browser rendering requested but no browser backend is configured".into(),
        })
    }
}

/// Shared, rate-limited, retrying HTTP client.
pub struct Fetcher {
    client: reqwest::Client,
    limiter: RateLimiter,
    browser: Box<dyn BrowserFetcher>,
}

impl Fetcher {
    pub fn new(registry_qps: f64, repo_api_qps: f64, doc_site_qps: f64, generic_qps: f64) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("reqwest client builds with static configuration");
        Self {
            client,
            limiter: RateLimiter::new(registry_qps, repo_api_qps, doc_site_qps, generic_qps),
            browser: Box::new(NoBrowser),
        }
    }

    pub fn with_browser(mut self, browser: Box<dyn BrowserFetcher>) -> Self {
        self.browser = browser;
        self
    }

    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, HttpError> {
        if request.render_mode == RenderMode::Browser {
            self.limiter.acquire(request.host_category).await;
            let body = self.browser.render(&request.url).await?;
            return Ok(FetchResponse {
                status: 200,
                body,
                headers: HashMap::new(),
            });
        }

        let mut last_err = None;
        for attempt in 0..request.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(retry::backoff_delay(attempt)).await;
            }
            self.limiter.acquire(request.host_category).await;

            match self.try_once(&request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt + 1 < request.max_attempts => {
                    tracing::warn!(url = %request.url, attempt, error = %err, "retrying after transient failure");
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.expect("loop runs at least once"))
    }

    async fn try_once(&self, request: &FetchRequest) -> Result<FetchResponse, HttpError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        builder = builder.timeout(request.timeout);

        let start = Instant::now();
        let response = builder.send().await.map_err(|source| {
            if source.is_timeout() {
                HttpError::Timeout {
                    url: request.url.clone(),
                    elapsed_secs: start.elapsed().as_secs(),
                }
            } else {
                HttpError::Network {
                    url: request.url.clone(),
                    source,
                }
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        if !(200..300).contains(&status) {
            return Err(HttpError::Status {
                url: request.url.clone(),
                code: status,
            });
        }

        let body = response.text().await.map_err(|source| HttpError::Network {
            url: request.url.clone(),
            source,
        })?;

        Ok(FetchResponse { status, body, headers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::HostCategory;

    #[test]
    fn fetch_request_builder_sets_defaults() {
        let request = FetchRequest::get("https://example.com", HostCategory::DocSite);
        assert_eq!(request.max_attempts, 3);
        assert_eq!(request.render_mode, RenderMode::Static);
    }

    #[tokio::test]
    async fn no_browser_fails_fast() {
        let fetcher = Fetcher::new(2.0, 2.0, 1.0, 1.0);
        let request = FetchRequest::get("https://example.com", HostCategory::DocSite)
            .with_browser_render();
        let err = fetcher.fetch(request).await.unwrap_err();
        assert!(matches!(err, HttpError::Parse { .. }));
    }
}
