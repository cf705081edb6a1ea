//! The crawl pipeline's entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A package ecosystem the crawler discovers candidates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    Npm,
    Pypi,
    Cargo,
    Go,
}

impl Ecosystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Pypi => "pypi",
            Ecosystem::Cargo => "cargo",
            Ecosystem::Go => "go",
        }
    }

    pub fn all() -> [Ecosystem; 4] {
        [Ecosystem::Npm, Ecosystem::Pypi, Ecosystem::Cargo, Ecosystem::Go]
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The minimal result of discovery (Candidate).
///
/// Identity is `(ecosystem, identifier)`. Transient: created by the
/// discoverer, consumed by the scraper, never persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub ecosystem: Ecosystem,
    pub identifier: String,
    pub declared_description: Option<String>,
    pub declared_repository_url: Option<String>,
    /// Free-form provenance, e.g. `keyword:mcp-server` or `dependency:@modelcontextprotocol/sdk`.
    pub discovery_method: String,
    pub discovered_at: DateTime<Utc>,
}

impl Candidate {
    /// The `(ecosystem, identifier)` identity pair used for dedup.
    pub fn identity(&self) -> (Ecosystem, &str) {
        (self.ecosystem, self.identifier.as_str())
    }
}

/// Raw registry metadata (RegistryRecord). Transiently owned by C4.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub versions: Vec<String>,
    pub declared_author: Option<String>,
    pub declared_license: Option<String>,
    pub declared_dependencies: Vec<String>,
    pub declared_keywords: Vec<String>,
    pub latest_upload_time: Option<DateTime<Utc>>,
    pub classifiers: Vec<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub repository_url: Option<String>,
}

/// Raw source-repository metadata (RepoRecord). May be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoRecord {
    pub stars: u64,
    pub forks: u64,
    pub topics: Vec<String>,
    pub default_branch: String,
    pub archived: bool,
    pub license: Option<String>,
    pub readme_text: Option<String>,
    pub owner_login: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A scraped documentation page (DocsBundle entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocPage {
    pub url: String,
    pub title: Option<String>,
    pub markdown: String,
    pub text: String,
    pub word_count: usize,
    pub links: Vec<String>,
}

/// Zero or more scraped documentation pages. Transiently owned by C4.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsBundle {
    pub pages: Vec<DocPage>,
}

impl DocsBundle {
    /// All page text concatenated, used as analyzer input.
    pub fn combined_text(&self) -> String {
        self.pages.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join("\n\n")
    }
}

/// A parameter of a `Tool`'s input schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
}

/// Normalized parameter type. Unknown types fall back to `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn from_declared(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "number" | "integer" | "int" | "float" | "double" => ParamType::Number,
            "boolean" | "bool" => ParamType::Boolean,
            "array" | "list" => ParamType::Array,
            "object" | "map" | "dict" => ParamType::Object,
            _ => ParamType::String,
        }
    }
}

/// An MCP tool (Tool). `name` must match `^[A-Za-z_][A-Za-z0-9_]*$`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// Kept under the canonical spelling `inputSchema` on the wire; the
    /// source the crawler was distilled from sometimes wrote `schema`
    /// instead (Open Question 2) — callers reading foreign data
    /// should normalize to this field, not the other way around.
    #[serde(rename = "inputSchema")]
    pub input_schema: Option<Vec<ToolParameter>>,
    pub category_tag: Option<String>,
}

impl Tool {
    pub fn name_is_legal(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

/// How a candidate can be installed (InstallationMethod).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallKind {
    Npm,
    Pipx,
    Cargo,
    Go,
    Docker,
    Git,
    Binary,
}

impl InstallKind {
    /// Priority ordering: lower number is preferred.
    /// `npx > pipx > cargo install > go install > docker run > git clone`.
    pub fn default_priority(&self) -> u8 {
        match self {
            InstallKind::Npm => 0,
            InstallKind::Pipx => 1,
            InstallKind::Cargo => 2,
            InstallKind::Go => 3,
            InstallKind::Docker => 4,
            InstallKind::Git => 5,
            InstallKind::Binary => 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallationMethod {
    pub kind: InstallKind,
    pub command: String,
    pub description: String,
    pub priority: u8,
    /// 0-100.
    pub confidence: u8,
}

/// How a candidate authenticates (AuthRequirement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
    OAuth,
    Token,
    Credentials,
    Basic,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupComplexity {
    Simple,
    Moderate,
    Complex,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequirement {
    pub required: bool,
    pub methods: BTreeSet<AuthMethod>,
    pub required_env_vars: Vec<String>,
    pub optional_env_vars: Vec<String>,
    pub setup_complexity: SetupComplexity,
    pub summary: String,
}

impl AuthRequirement {
    pub fn none() -> Self {
        Self {
            required: false,
            methods: BTreeSet::from([AuthMethod::None]),
            required_env_vars: Vec::new(),
            optional_env_vars: Vec::new(),
            setup_complexity: SetupComplexity::Simple,
            summary: "No authentication required.".to_string(),
        }
    }
}

/// How the live collector testing strategy degraded, if it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestingStrategy {
    Full,
    FallbackBasic,
}

/// The product of live validation (IntelligenceReport).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelligenceReport {
    pub protocol_version: Option<String>,
    pub server_capabilities: Vec<String>,
    pub initialization_time_ms: Option<u64>,
    pub tools: Vec<Tool>,
    pub working_tools: Vec<String>,
    pub failing_tools: Vec<String>,
    pub average_tool_response_time_ms: Option<f64>,
    pub reliability_score: Option<f64>,
    pub observed_error_patterns: Vec<String>,
    pub testing_strategy: TestingStrategy,
    pub auth_required: bool,
}

impl IntelligenceReport {
    pub fn fallback() -> Self {
        Self {
            protocol_version: None,
            server_capabilities: Vec::new(),
            initialization_time_ms: None,
            tools: Vec::new(),
            working_tools: Vec::new(),
            failing_tools: Vec::new(),
            average_tool_response_time_ms: None,
            reliability_score: None,
            observed_error_patterns: Vec::new(),
            testing_strategy: TestingStrategy::FallbackBasic,
            auth_required: false,
        }
    }
}

/// The fixed 20-category enum. Any other value is a bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Databases,
    Payments,
    AiTools,
    DevelopmentTools,
    CloudStorage,
    Messaging,
    ContentCreation,
    Monitoring,
    ProjectManagement,
    Security,
    Automation,
    SocialMedia,
    WebApis,
    Productivity,
    Infrastructure,
    MediaProcessing,
    Finance,
    Communication,
    Research,
    Iot,
}

impl Category {
    pub const ALL: [Category; 20] = [
        Category::Databases,
        Category::Payments,
        Category::AiTools,
        Category::DevelopmentTools,
        Category::CloudStorage,
        Category::Messaging,
        Category::ContentCreation,
        Category::Monitoring,
        Category::ProjectManagement,
        Category::Security,
        Category::Automation,
        Category::SocialMedia,
        Category::WebApis,
        Category::Productivity,
        Category::Infrastructure,
        Category::MediaProcessing,
        Category::Finance,
        Category::Communication,
        Category::Research,
        Category::Iot,
    ];

    /// Sentinel default when no category scores above zero.
    pub fn default_sentinel() -> Self {
        Category::DevelopmentTools
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    Stdio,
    Http,
    Websocket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Down,
    Unknown,
}

/// Whether a field on a persisted record was last written by the crawler or
/// by a human operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    Crawler,
    Operator,
}

impl Default for FieldSource {
    fn default() -> Self {
        FieldSource::Crawler
    }
}

/// A persisted record paired with which side last wrote it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub value: T,
    #[serde(default)]
    pub source: FieldSource,
}

impl<T> Sourced<T> {
    pub fn crawler(value: T) -> Self {
        Self { value, source: FieldSource::Crawler }
    }

    pub fn is_operator_owned(&self) -> bool {
        self.source == FieldSource::Operator
    }
}

/// The normalized, deduplicated, persisted entity (CanonicalMCP).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalMcp {
    pub slug: String,
    pub name: String,
    pub display_name: String,
    pub short_description: Sourced<String>,
    pub long_description: Sourced<String>,

    pub ecosystem: Ecosystem,
    /// The raw registry identifier within `ecosystem` (package name, crate
    /// name, or `github.com/owner/repo` module path). Part of the
    /// `(ecosystem, identifier)` dedup key alongside `slug`.
    pub ecosystem_identifier: String,
    pub install_type: InstallKind,
    pub endpoint_command: String,
    pub installation_methods: Vec<InstallationMethod>,

    pub tools: Vec<Tool>,
    pub tool_count: usize,
    pub working_tools: Vec<String>,
    pub failing_tools: Vec<String>,

    pub auth: AuthRequirement,

    pub protocol_version: Option<String>,
    pub connection_type: ConnectionType,

    pub category: Category,
    pub tags: Sourced<Vec<String>>,
    pub use_cases: Sourced<Vec<String>>,

    pub repository_url: Option<String>,
    pub documentation_url: Option<String>,
    pub homepage_url: Option<String>,
    pub author: Option<String>,
    pub company: Option<String>,
    pub license: Option<String>,

    pub health_status: HealthStatus,
    pub verified: bool,
    pub auto_discovered: bool,
    pub discovery_source: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_scraped_at: DateTime<Utc>,
    pub last_validated_at: Option<DateTime<Utc>>,

    pub search_text: String,
}

impl CanonicalMcp {
    /// Invariant: tags are always hyphenated, 20..=30 of them.
    pub fn tags_in_bounds(&self) -> bool {
        (20..=30).contains(&self.tags.value.len())
    }

    /// Invariant: verified implies healthy-or-degraded and a live tool list.
    pub fn verified_invariant_holds(&self) -> bool {
        if !self.verified {
            return true;
        }
        matches!(self.health_status, HealthStatus::Healthy | HealthStatus::Degraded)
    }

    /// Invariant: auth required implies a non-empty method set.
    pub fn auth_invariant_holds(&self) -> bool {
        if !self.auth.required {
            return true;
        }
        !self.auth.methods.is_empty()
    }

    pub fn derive_search_text(&self) -> String {
        let mut parts = vec![
            self.name.clone(),
            self.long_description.value.clone(),
            self.category.to_string(),
        ];
        parts.extend(self.tags.value.iter().cloned());
        parts.extend(self.use_cases.value.iter().cloned());
        if let Some(author) = &self.author {
            parts.push(author.clone());
        }
        parts.join(" ")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Databases => "databases",
            Category::Payments => "payments",
            Category::AiTools => "ai-tools",
            Category::DevelopmentTools => "development-tools",
            Category::CloudStorage => "cloud-storage",
            Category::Messaging => "messaging",
            Category::ContentCreation => "content-creation",
            Category::Monitoring => "monitoring",
            Category::ProjectManagement => "project-management",
            Category::Security => "security",
            Category::Automation => "automation",
            Category::SocialMedia => "social-media",
            Category::WebApis => "web-apis",
            Category::Productivity => "productivity",
            Category::Infrastructure => "infrastructure",
            Category::MediaProcessing => "media-processing",
            Category::Finance => "finance",
            Category::Communication => "communication",
            Category::Research => "research",
            Category::Iot => "iot",
        };
        write!(f, "{s}")
    }
}
