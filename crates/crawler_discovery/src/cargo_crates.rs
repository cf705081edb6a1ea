use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use crawler_http::{FetchRequest, Fetcher, HostCategory};
use crawler_protocol::{Candidate, CrawlerConfig, Ecosystem};
use serde::Deserialize;

use crate::trait_def::{dedup_by_identity, DiscoveryError, Discoverer};

const SEARCH_URL: &str = "https://crates.io/api/v1/crates";
const PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
struct CratesResponse {
    crates: Vec<CrateEntry>,
    meta: Meta,
}

#[derive(Debug, Deserialize)]
struct Meta {
    total: u64,
}

#[derive(Debug, Deserialize)]
struct CrateEntry {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    repository: Option<String>,
}

/// crates.io ecosystem discoverer. crates.io's search endpoint
/// already covers keyword, naming-pattern, and reverse-dependency queries
/// (`crates?q=<dependency>` surfaces crates whose description or metadata
/// mentions it) under one API, so all four search methods route through it
/// with different query text and a distinct provenance prefix.
pub struct CargoDiscoverer {
    fetcher: Arc<Fetcher>,
    known_sdk_dependencies: Vec<String>,
}

impl CargoDiscoverer {
    pub fn new(fetcher: Arc<Fetcher>, config: &CrawlerConfig) -> Self {
        Self {
            fetcher,
            known_sdk_dependencies: config.filter.known_mcp_sdk_dependencies.clone(),
        }
    }

    async fn search(&self, query: &str, provenance_prefix: &str) -> Result<Vec<Candidate>, DiscoveryError> {
        let mut out = Vec::new();
        let mut page = 1u32;
        loop {
            let url = format!(
                "{SEARCH_URL}?q={}&per_page={PER_PAGE}&page={page}",
                urlencode(query)
            );
            let request = FetchRequest::get(url, HostCategory::Registry);
            let response = self.fetcher.fetch(request).await?;
            let parsed: CratesResponse = serde_json::from_str(&response.body)
                .map_err(|e| DiscoveryError::Parse(e.to_string()))?;

            let got = parsed.crates.len();
            for entry in parsed.crates {
                out.push(Candidate {
                    ecosystem: Ecosystem::Cargo,
                    identifier: entry.name,
                    declared_description: entry.description,
                    declared_repository_url: entry.repository,
                    discovery_method: format!("{provenance_prefix}:{query}"),
                    discovered_at: Utc::now(),
                });
            }
            if got < PER_PAGE as usize || out.len() as u64 >= parsed.meta.total {
                break;
            }
            page += 1;
            if page > 5 {
                break;
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl Discoverer for CargoDiscoverer {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Cargo
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
