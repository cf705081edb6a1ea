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
struct PypiResponse {
    info: PypiInfo,
    #[serde(default)]
    releases: std::collections::HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    home_page: Option<String>,
    #[serde(default)]
    project_urls: Option<std::collections::HashMap<String, String>>,
    #[serde(default)]
    keywords: Option<String>,
    #[serde(default)]
    classifiers: Vec<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    requires_dist: Option<Vec<String>>,
}

/// PyPI scraper: fetches the package's stable JSON API document,
/// derives its GitHub repository from `project_urls`/`home_page`, and
/// opportunistically fetches the declared documentation URL.
pub struct PypiScraper {
    fetcher: Arc<Fetcher>,
    github_token: Option<String>,
}

impl PypiScraper {
    pub fn new(fetcher: Arc<Fetcher>, github_token: Option<String>) -> Self {
        Self { fetcher, github_token }
    }
}

#[async_trait]
impl Scraper for PypiScraper {
    async fn scrape(&self, candidate: &Candidate) -> Result<ScrapedBundle, ScrapeError> {
        let url = format!("https://pypi.org/pypi/{}/json", candidate.identifier);
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
        let parsed: PypiResponse =
            serde_json::from_str(&response.body).map_err(|e| ScrapeError::Parse(e.to_string()))?;

        let repository_url = parsed
            .info
            .project_urls
            .as_ref()
            .and_then(|urls| {
                urls.iter()
                    .find(|(key, _)| {
                        let key = key.to_lowercase();
                        key.contains("source") || key.contains("repository") || key.contains("code")
                    })
                    .map(|(_, url)| url.clone())
            })
            .or_else(|| parsed.info.home_page.clone());

        let registry = RegistryRecord {
            versions: parsed.releases.keys().cloned().collect(),
            declared_author: parsed.info.author,
            declared_license: parsed.info.license,
            declared_dependencies: parsed.info.requires_dist.unwrap_or_default(),
            declared_keywords: parsed
                .info
                .keywords
                .map(|k| k.split(|c| c == ',' || c == ' ').filter(|s| !s.is_empty()).map(str::to_string).collect())
                .unwrap_or_default(),
            latest_upload_time: None,
            classifiers: parsed.info.classifiers,
            description: parsed.info.summary.or(parsed.info.description),
            homepage: parsed.info.home_page.clone(),
            repository_url: repository_url.clone(),
        };

        let repo = match repository_url.as_deref().and_then(github::parse_owner_repo) {
            Some((owner, repo_name)) => {
                github::fetch_repo_record(&self.fetcher, &owner, &repo_name, self.github_token.as_deref()).await
            }
            None => None,
        };

        let mut doc_urls = Vec::new();
        if let Some(homepage) = &registry.homepage {
            doc_urls.push(homepage.clone());
        }
        doc_urls.push(format!("https://pypi.org/project/{}/", candidate.identifier));
        let docs = crawler_protocol::DocsBundle {
            pages: github::fetch_doc_pages(&self.fetcher, &doc_urls, DOC_BUDGET).await,
        };

        Ok(ScrapedBundle {
            registry,
            repo,
            docs,
            install_hints: vec![
                format!("pipx install {}", candidate.identifier),
                format!("pip install {}", candidate.identifier),
            ],
            auth_hints: Vec::new(),
        })
    }
}
