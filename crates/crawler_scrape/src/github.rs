use chrono::{DateTime, Utc};
use crawler_http::{FetchRequest, Fetcher, HostCategory};
use crawler_protocol::{DocPage, RepoRecord};
use serde::Deserialize;

/// Extracts `(owner, repo)` from a GitHub URL of any common shape
/// (`https://github.com/owner/repo`, with or without a `.git` suffix or
/// trailing path segments).
pub fn parse_owner_repo(url: &str) -> Option<(String, String)> {
    let trimmed = url
        .trim_end_matches('/')
        .trim_end_matches(".git")
        .trim_start_matches("git+")
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("git://")
        .trim_start_matches("github.com/")
        .trim_start_matches("www.github.com/");
    if !url.contains("github.com") {
        return None;
    }
    let mut parts = trimmed.splitn(3, '/');
    let owner = parts.next()?.to_string();
    let repo = parts.next()?.to_string();
    if owner.is_empty() || repo.is_empty() {
        None
    } else {
        Some((owner, repo))
    }
}

#[derive(Debug, Deserialize)]
struct GithubRepoResponse {
    stargazers_count: u64,
    forks_count: u64,
    #[serde(default)]
    topics: Vec<String>,
    default_branch: String,
    archived: bool,
    license: Option<GithubLicense>,
    owner: GithubOwner,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GithubLicense {
    spdx_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubOwner {
    login: String,
}

/// Best-effort repo metadata fetch: any failure returns `None` rather than
/// propagating. A repo record's absence is never fatal to the candidate.
pub async fn fetch_repo_record(
    fetcher: &Fetcher,
    owner: &str,
    repo: &str,
    github_token: Option<&str>,
) -> Option<RepoRecord> {
    let url = format!("https://api.github.com/repos/{owner}/{repo}");
    let mut request = FetchRequest::get(url, HostCategory::RepoApi)
        .with_header("Accept", "application/vnd.github+json");
    if let Some(token) = github_token {
        request = request.with_header("Authorization", format!("Bearer {token}"));
    }

    let response = fetcher.fetch(request).await.ok()?;
    let parsed: GithubRepoResponse = serde_json::from_str(&response.body).ok()?;

    let readme_text = fetch_readme(fetcher, owner, repo, github_token).await;

    Some(RepoRecord {
        stars: parsed.stargazers_count,
        forks: parsed.forks_count,
        topics: parsed.topics,
        default_branch: parsed.default_branch,
        archived: parsed.archived,
        license: parsed.license.and_then(|l| l.spdx_id),
        readme_text,
        owner_login: Some(parsed.owner.login),
        created_at: parsed.created_at,
        updated_at: parsed.updated_at,
    })
}

#[derive(Debug, Deserialize)]
struct GithubReadmeResponse {
    content: String,
    encoding: String,
}

async fn fetch_readme(fetcher: &Fetcher, owner: &str, repo: &str, github_token: Option<&str>) -> Option<String> {
    let url = format!("https://api.github.com/repos/{owner}/{repo}/readme");
    let mut request = FetchRequest::get(url, HostCategory::RepoApi)
        .with_header("Accept", "application/vnd.github+json");
    if let Some(token) = github_token {
        request = request.with_header("Authorization", format!("Bearer {token}"));
    }

    let response = fetcher.fetch(request).await.ok()?;
    let parsed: GithubReadmeResponse = serde_json::from_str(&response.body).ok()?;
    if parsed.encoding != "base64" {
        return Some(parsed.content);
    }
    let cleaned: String = parsed.content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64_decode(&cleaned)?;
    String::from_utf8(bytes).ok()
}

/// Fetches up to `budget` documentation URLs, skipping any that fail.
/// Any single fetch may fail without failing the whole candidate; the
/// scraper returns a partial bundle instead.
pub async fn fetch_doc_pages(fetcher: &Fetcher, urls: &[String], budget: usize) -> Vec<DocPage> {
    let mut pages = Vec::new();
    for url in urls.iter().take(budget) {
        let request = FetchRequest::get(url.clone(), HostCategory::DocSite);
        match fetcher.fetch(request).await {
            Ok(response) => {
                let text = strip_html_tags(&response.body);
                let word_count = text.split_whitespace().count();
                pages.push(DocPage {
                    url: url.clone(),
                    title: extract_title(&response.body),
                    markdown: response.body,
                    text,
                    word_count,
                    links: Vec::new(),
                });
            }
            Err(error) => {
                tracing::debug!(url, %error, "doc fetch failed, continuing with partial bundle");
            }
        }
    }
    pages
}

fn extract_title(html: &str) -> Option<String> {
    let lower = html.to_lowercase();
    let start = lower.find("<title>")? + "<title>".len();
    let end = lower[start..].find("</title>")? + start;
    Some(html[start..end].trim().to_string())
}

fn strip_html_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

const B64_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

fn base64_decode(input: &str) -> Option<Vec<u8>> {
    let input = input.trim_end_matches('=');
    let mut bits: u32 = 0;
    let mut bit_count = 0;
    let mut out = Vec::with_capacity(input.len() * 3 / 4);
    for ch in input.bytes() {
        let value = B64_ALPHABET.iter().position(|&b| b == ch)? as u32;
        bits = (bits << 6) | value;
        bit_count += 6;
        if bit_count >= 8 {
            bit_count -= 8;
            out.push((bits >> bit_count) as u8);
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_repo_from_plain_url() {
        assert_eq!(
            parse_owner_repo("https://github.com/modelcontextprotocol/servers"),
            Some(("modelcontextprotocol".to_string(), "servers".to_string()))
        );
    }

    #[test]
    fn parses_owner_repo_with_git_suffix() {
        assert_eq!(
            parse_owner_repo("git+https://github.com/foo/bar.git"),
            Some(("foo".to_string(), "bar".to_string()))
        );
    }

    #[test]
    fn rejects_non_github_url() {
        assert_eq!(parse_owner_repo("https://gitlab.com/foo/bar"), None);
    }

    #[test]
    fn strips_tags_and_collapses_whitespace() {
        assert_eq!(strip_html_tags("<p>Hello   <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn base64_decode_round_trips_known_value() {
        assert_eq!(base64_decode("aGVsbG8=").unwrap(), b"hello".to_vec());
    }
}
