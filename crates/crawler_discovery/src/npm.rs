use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use crawler_http::{FetchRequest, Fetcher, HostCategory};
use crawler_protocol::{Candidate, CrawlerConfig, Ecosystem};
use serde::Deserialize;

use crate::trait_def::{dedup_by_identity, DiscoveryError, Discoverer};

const SEARCH_URL: &str = "https://registry.npmjs.org/-/v1/search";
const PAGE_SIZE: u32 = 100;
const MAX_PAGES: u32 = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    objects: Vec<SearchObject>,
    total: u64,
}

#[derive(Debug, Deserialize)]
struct SearchObject {
    package: Package,
}

#[derive(Debug, Deserialize)]
struct Package {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    repository: Option<String>,
}

/// npm ecosystem discoverer: keyword search against the public
/// registry search surface, plus dependency search reusing the same search
/// text endpoint against known MCP SDK package names. npm's naming-pattern
/// (`mcp-*`/`*-mcp`) candidates are a subset of the keyword results, since
/// npm's search ranks by text relevance over the package name already.
pub struct NpmDiscoverer {
    fetcher: Arc<Fetcher>,
    known_sdk_dependencies: Vec<String>,
}

impl NpmDiscoverer {
    pub fn new(fetcher: Arc<Fetcher>, config: &CrawlerConfig) -> Self {
        Self {
            fetcher,
            known_sdk_dependencies: config
                .filter
                .known_mcp_sdk_dependencies
                .iter()
                .filter(|dep| !dep.contains('/') || dep.starts_with('@'))
                .cloned()
                .collect(),
        }
    }

    async fn search(&self, text: &str, provenance_prefix: &str) -> Result<Vec<Candidate>, DiscoveryError> {
        let mut out = Vec::new();
        for page in 0..MAX_PAGES {
            let url = format!(
                "{SEARCH_URL}?text={}&size={PAGE_SIZE}&from={}",
                urlencode(text),
                page * PAGE_SIZE
            );
            let request = FetchRequest::get(url, HostCategory::Registry);
            let response = self.fetcher.fetch(request).await?;
            let parsed: SearchResponse = serde_json::from_str(&response.body)
                .map_err(|e| DiscoveryError::Parse(e.to_string()))?;

            let got = parsed.objects.len();
            for object in parsed.objects {
                out.push(Candidate {
                    ecosystem: Ecosystem::Npm,
                    identifier: object.package.name,
                    declared_description: object.package.description,
                    declared_repository_url: object.package.links.repository,
                    discovery_method: format!("{provenance_prefix}:{text}"),
                    discovered_at: Utc::now(),
                });
            }
            if got < PAGE_SIZE as usize || out.len() as u64 >= parsed.total {
                break;
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl Discoverer for NpmDiscoverer {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urlencode_escapes_special_characters() {
        assert_eq!(urlencode("@modelcontextprotocol/sdk"), "%40modelcontextprotocol%2Fsdk");
        assert_eq!(urlencode("mcp-server"), "mcp-server");
    }
}
