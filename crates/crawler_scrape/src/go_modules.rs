use std::sync::Arc;

use async_trait::async_trait;
use crawler_http::Fetcher;
use crawler_protocol::{Candidate, RegistryRecord};

use crate::bundle::ScrapedBundle;
use crate::github;
use crate::trait_def::{ScrapeError, Scraper};

const DOC_BUDGET: usize = 4;

/// Go module scraper. Go module paths synthesized by discovery
/// are already `github.com/<owner>/<repo>` coordinates, so there is no
/// separate registry detail fetch; repo metadata and README *are* the
/// registry record for this ecosystem.
pub struct GoScraper {
    fetcher: Arc<Fetcher>,
    github_token: Option<String>,
}

impl GoScraper {
    pub fn new(fetcher: Arc<Fetcher>, github_token: Option<String>) -> Self {
        Self { fetcher, github_token }
    }
}

#[async_trait]
impl Scraper for GoScraper {
    async fn scrape(&self, candidate: &Candidate) -> Result<ScrapedBundle, ScrapeError> {
        let (owner, repo_name) = github::parse_owner_repo(&candidate.identifier).ok_or_else(|| {
            ScrapeError::RegistryRecordMissing {
                identifier: candidate.identifier.clone(),
            }
        })?;

        let repo = github::fetch_repo_record(&self.fetcher, &owner, &repo_name, self.github_token.as_deref())
            .await
            .ok_or_else(|| ScrapeError::RegistryRecordMissing {
                identifier: candidate.identifier.clone(),
            })?;

        let registry = RegistryRecord {
            versions: Vec::new(),
            declared_author: repo.owner_login.clone(),
            declared_license: repo.license.clone(),
            declared_dependencies: Vec::new(),
            declared_keywords: repo.topics.clone(),
            latest_upload_time: repo.updated_at,
            classifiers: Vec::new(),
            description: candidate.declared_description.clone(),
            homepage: candidate.declared_repository_url.clone(),
            repository_url: candidate.declared_repository_url.clone(),
        };

        let doc_urls = vec![format!("https://pkg.go.dev/{}", candidate.identifier)];
        let docs = crawler_protocol::DocsBundle {
            pages: github::fetch_doc_pages(&self.fetcher, &doc_urls, DOC_BUDGET).await,
        };

        Ok(ScrapedBundle {
            registry,
            repo: Some(repo),
            docs,
            install_hints: vec![format!("go install {}@latest", candidate.identifier)],
            auth_hints: Vec::new(),
        })
    }
}
