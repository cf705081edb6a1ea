use std::collections::HashMap;
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
struct NpmPackageResponse {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    repository: Option<Repository>,
    #[serde(default)]
    versions: HashMap<String, VersionDetail>,
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    license: Option<String>,
    #[serde(default)]
    author: Option<AuthorField>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Repository {
    Url(String),
    Object { url: String },
}

impl Repository {
    fn url(&self) -> &str {
        match self {
            Repository::Url(url) => url,
            Repository::Object { url } => url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthorField {
    Name(String),
    Object { name: Option<String> },
}

#[derive(Debug, Deserialize, Default)]
struct VersionDetail {
    #[serde(default)]
    dependencies: HashMap<String, String>,
}

/// npm scraper: fetches the package's registry detail document,
/// derives its GitHub repository from `repository.url`, and opportunistically
/// fetches the homepage as a documentation page.
pub struct NpmScraper {
    fetcher: Arc<Fetcher>,
    github_token: Option<String>,
}

impl NpmScraper {
    pub fn new(fetcher: Arc<Fetcher>, github_token: Option<String>) -> Self {
        Self { fetcher, github_token }
    }
}

#[async_trait]
impl Scraper for NpmScraper {
    async fn scrape(&self, candidate: &Candidate) -> Result<ScrapedBundle, ScrapeError> {
        let url = format!(
            "https://registry.npmjs.org/{}",
            candidate.identifier.replace('/', "%2F")
        );
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
        let parsed: NpmPackageResponse =
            serde_json::from_str(&response.body).map_err(|e| ScrapeError::Parse(e.to_string()))?;

        let latest = parsed.dist_tags.get("latest");
        let dependencies = latest
            .and_then(|v| parsed.versions.get(v))
            .map(|detail| detail.dependencies.keys().cloned().collect())
            .unwrap_or_default();

        let registry = RegistryRecord {
            versions: parsed.versions.keys().cloned().collect(),
            declared_author: parsed.author.map(|a| match a {
                AuthorField::Name(name) => name,
                AuthorField::Object { name } => name.unwrap_or_default(),
            }),
            declared_license: parsed.license,
            declared_dependencies: dependencies,
            declared_keywords: parsed.keywords,
            latest_upload_time: None,
            classifiers: Vec::new(),
            description: parsed.description,
            homepage: parsed.homepage.clone(),
            repository_url: parsed.repository.as_ref().map(|r| r.url().to_string()),
        };

        let repo = match registry.repository_url.as_deref().and_then(github::parse_owner_repo) {
            Some((owner, repo_name)) => {
                github::fetch_repo_record(&self.fetcher, &owner, &repo_name, self.github_token.as_deref()).await
            }
            None => None,
        };

        let mut doc_urls = Vec::new();
        if let Some(homepage) = &parsed.homepage {
            doc_urls.push(homepage.clone());
        }
        doc_urls.push(format!("https://docs.npmjs.com/package/{}", candidate.identifier));
        let docs = crawler_protocol::DocsBundle {
            pages: github::fetch_doc_pages(&self.fetcher, &doc_urls, DOC_BUDGET).await,
        };

        Ok(ScrapedBundle {
            registry,
            repo,
            docs,
            install_hints: vec![format!("npx {}", candidate.identifier)],
            auth_hints: Vec::new(),
        })
    }
}
