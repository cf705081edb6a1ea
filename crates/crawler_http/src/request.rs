use std::collections::HashMap;
use std::time::Duration;

/// The rate-limiting and backoff domain a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostCategory {
    Registry,
    RepoApi,
    DocSite,
    Generic,
}

impl HostCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostCategory::Registry => "registry",
            HostCategory::RepoApi => "repo_api",
            HostCategory::DocSite => "doc_site",
            HostCategory::Generic => "generic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Whether the fetcher should attempt a static fetch or fall back to a
/// post-render browser navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Static,
    Browser,
}

#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub method: Method,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub host_category: HostCategory,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub render_mode: RenderMode,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>, host_category: HostCategory) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            headers: HashMap::new(),
            body: None,
            host_category,
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            render_mode: RenderMode::Static,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_browser_render(mut self) -> Self {
        self.render_mode = RenderMode::Browser;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
