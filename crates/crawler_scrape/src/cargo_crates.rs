use std::sync::Arc;

use async_trait::async_trait;
use crawler_http::{FetchRequest, Fetcher, HostCategory};
use crawler_protocol::{Candidate, RegistryRecord};
use serde::Deserialize;

use crate::bundle::ScrapedBundle;
use crate::github;
use crate::trait_def::{ScrapeError, Scraper};

const DOC_BUDGET: usize = 4;

#[derive(Debug, Deserialize)]
struct CrateResponse {
    #[serde(rename = "crate")]
    krate: CrateDetail,
    #[serde(default)]
    versions: Vec<VersionDetail>,
}

#[derive(Debug, Deserialize)]
struct CrateDetail {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    repository: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VersionDetail {
    #[serde(rename = "num")]
    number: String,
    #[serde(default)]
    license: Option<String>,
}

/// crates.io scraper: fetches the crate's registry detail,
/// derives its GitHub repository from the declared `repository` field, and
/// opportunistically fetches the docs.rs page (the ecosystem-idiomatic
/// documentation host for crates).
pub struct CargoScraper {
    fetcher: Arc<Fetcher>,
    github_token: Option<String>,
}

impl CargoScraper {
    pub fn new(fetcher: Arc<Fetcher>, github_token: Option<String>) -> Self {
        Self { fetcher, github_token }
    }
}

#[async_trait]
impl Scraper for CargoScraper {
    async fn scrape(&self, candidate: &Candidate) -> Result<ScrapedBundle, ScrapeError> {
        let url = format!("https://crates.io/api/v1/crates/{}", candidate.identifier);
        let request = FetchRequest::get(url, HostCategory::Registry);
        let response = self.fetcher.fetch(request).await.map_err(|error| {
            if matches!(error, crawler_http::HttpError::Status { code: 404, .. }) {
                ScrapeError::RegistryRecordMissing {
                    identifier: candidate.identifier.clone(),
                }
            } else {
                ScrapeError::Fetch(error)
            }
        })?;
        let parsed: CrateResponse =
            serde_json::from_str(&response.body).map_err(|e| ScrapeError::Parse(e.to_string()))?;

        let registry = RegistryRecord {
            versions: parsed.versions.iter().map(|v| v.number.clone()).collect(),
            declared_author: None,
            declared_license: parsed.versions.first().and_then(|v| v.license.clone()),
            declared_dependencies: Vec::new(),
            declared_keywords: parsed.krate.keywords,
            latest_upload_time: None,
            classifiers: Vec::new(),
            description: parsed.krate.description,
            homepage: parsed.krate.homepage.clone(),
            repository_url: parsed.krate.repository.clone(),
        };

        let repo = match registry.repository_url.as_deref().and_then(github::parse_owner_repo) {
            Some((owner, repo_name)) => {
                github::fetch_repo_record(&self.fetcher, &owner, &repo_name, self.github_token.as_deref()).await
            }
            None => None,
        };

        let mut doc_urls = vec![format!("https://docs.rs/{}", candidate.identifier)];
        if let Some(homepage) = &registry.homepage {
            doc_urls.push(homepage.clone());
        }
        let docs = crawler_protocol::DocsBundle {
            pages: github::fetch_doc_pages(&self.fetcher, &doc_urls, DOC_BUDGET).await,
        };

        Ok(ScrapedBundle {
            registry,
            repo,
            docs,
            install_hints: vec![format!("cargo install {}", candidate.identifier)],
            auth_hints: Vec::new(),
        })
    }
}
