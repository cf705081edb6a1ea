use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use crawler_http::{FetchRequest, Fetcher, HostCategory};
use crawler_protocol::{Candidate, CrawlerConfig, Ecosystem};
use serde::Deserialize;

use crate::trait_def::{dedup_by_identity, DiscoveryError, Discoverer};

const GITHUB_SEARCH_URL: &str = "https://api.github.com/search/repositories";
const PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
struct GithubSearchResponse {
    items: Vec<GithubRepo>,
}

#[derive(Debug, Deserialize)]
struct GithubRepo {
    full_name: String,
    #[serde(default)]
    description: Option<String>,
    html_url: String,
}

/// Go module discoverer. The Go module index
/// exposes no search API, so discovery falls back entirely to searching
/// GitHub for Go repositories with MCP-adjacent topics or keywords and
/// synthesizing the module path from the repository's `owner/name`
/// coordinates (`github.com/<owner>/<name>`, the overwhelmingly common case
/// for Go module paths hosted on GitHub).
pub struct GoDiscoverer {
    fetcher: Arc<Fetcher>,
    github_token: Option<String>,
}

impl GoDiscoverer {
    pub fn new(fetcher: Arc<Fetcher>, config: &CrawlerConfig) -> Self {
        Self {
            fetcher,
            github_token: config.github_token.clone(),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<Candidate>, DiscoveryError> {
        let url = format!(
            "{GITHUB_SEARCH_URL}?q={}+language:Go&per_page={PER_PAGE}",
            urlencode(query)
        );
        let mut request = FetchRequest::get(url, HostCategory::RepoApi)
            .with_header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.github_token {
            request = request.with_header("Authorization", format!("Bearer {token}"));
        }
        let response = self.fetcher.fetch(request).await?;
        let parsed: GithubSearchResponse = serde_json::from_str(&response.body)
            .map_err(|e| DiscoveryError::Parse(e.to_string()))?;

        Ok(parsed
            .items
            .into_iter()
            .map(|repo| Candidate {
                ecosystem: Ecosystem::Go,
                identifier: format!("github.com/{}", repo.full_name),
                declared_description: repo.description,
                declared_repository_url: Some(repo.html_url),
                discovery_method: format!("topic:{query}"),
                discovered_at: Utc::now(),
            })
            .collect())
    }
}

#[async_trait]
impl Discoverer for GoDiscoverer {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Go
    }

    async fn discover(&self, seed_keywords: &[String]) -> Result<Vec<Candidate>, DiscoveryError> {
        let mut all = Vec::new();
        for keyword in seed_keywords {
            all.extend(self.search(keyword).await?);
        }
        all.extend(self.search("topic:mcp-server").await?);
        all.extend(self.search("topic:model-context-protocol").await?);
        Ok(dedup_by_identity(all))
    }
}

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' || c == ':' {
                c.to_string()
            } else {
                format!("%{:02X}", c as u32)
            }
        })
        .collect()
}
