//! Immutable run configuration. There is no global mutable configuration;
//! configuration is immutable for the duration of a run.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-host-category rate limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub registry_qps: f64,
    pub repo_api_qps: f64,
    pub doc_site_qps: f64,
    pub generic_qps: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            registry_qps: 2.0,
            repo_api_qps: 2.0,
            doc_site_qps: 1.0,
            generic_qps: 1.0,
        }
    }
}

/// Timeouts across the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub http_request_secs: u64,
    pub install_secs: u64,
    pub spawn_first_byte_secs: u64,
    pub handshake_secs: u64,
    pub per_tool_invocation_secs: u64,
    pub per_candidate_budget_secs: u64,
    pub run_wall_clock_secs: u64,
    pub cancellation_grace_secs: u64,
    pub subprocess_kill_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            http_request_secs: 30,
            install_secs: 120,
            spawn_first_byte_secs: 10,
            handshake_secs: 10,
            per_tool_invocation_secs: 5,
            per_candidate_budget_secs: 180,
            run_wall_clock_secs: 30 * 60,
            cancellation_grace_secs: 5,
            subprocess_kill_grace_secs: 2,
        }
    }
}

impl TimeoutConfig {
    pub fn http_request(&self) -> Duration {
        Duration::from_secs(self.http_request_secs)
    }
    pub fn install(&self) -> Duration {
        Duration::from_secs(self.install_secs)
    }
    pub fn spawn_first_byte(&self) -> Duration {
        Duration::from_secs(self.spawn_first_byte_secs)
    }
    pub fn handshake(&self) -> Duration {
        Duration::from_secs(self.handshake_secs)
    }
    pub fn per_tool_invocation(&self) -> Duration {
        Duration::from_secs(self.per_tool_invocation_secs)
    }
    pub fn per_candidate_budget(&self) -> Duration {
        Duration::from_secs(self.per_candidate_budget_secs)
    }
    pub fn run_wall_clock(&self) -> Duration {
        Duration::from_secs(self.run_wall_clock_secs)
    }
    pub fn cancellation_grace(&self) -> Duration {
        Duration::from_secs(self.cancellation_grace_secs)
    }
    pub fn subprocess_kill_grace(&self) -> Duration {
        Duration::from_secs(self.subprocess_kill_grace_secs)
    }
}

/// Bounded worker-pool sizes per stage. No global unbounded task spray.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConcurrencyConfig {
    pub discovery_workers: usize,
    pub scrape_workers: usize,
    pub analyzer_workers: usize,
    pub intel_pool_size: usize,
    pub stage_queue_capacity: usize,
    pub max_retry_attempts: u32,
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            discovery_workers: 4,
            scrape_workers: 8,
            analyzer_workers: 4,
            intel_pool_size: 4,
            stage_queue_capacity: 64,
            max_retry_attempts: 3,
        }
    }
}

/// Candidate filter token lists. Configuration-driven, not
/// hardcoded, per spec: "Its policy is data-driven; the exact token lists
/// belong in configuration, not code."
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub strong_positive_tokens: Vec<String>,
    pub known_mcp_sdk_dependencies: Vec<String>,
    pub heuristic_subject_tokens: Vec<String>,
    pub heuristic_role_tokens: Vec<String>,
    pub exclusion_tokens: Vec<String>,
    pub seed_keywords: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            strong_positive_tokens: vec![
                "mcp-server".into(),
                "model context protocol".into(),
                "model-context-protocol".into(),
                "@modelcontextprotocol/".into(),
            ],
            known_mcp_sdk_dependencies: vec![
                "@modelcontextprotocol/sdk".into(),
                "mcp".into(),
                "modelcontextprotocol".into(),
                "rmcp".into(),
            ],
            heuristic_subject_tokens: vec!["mcp".into(), "claude".into(), "anthropic".into()],
            heuristic_role_tokens: vec![
                "server".into(),
                "tool".into(),
                "cli".into(),
                "agent".into(),
                "service".into(),
                "bot".into(),
            ],
            exclusion_tokens: vec![
                "web framework".into(),
                "tensorflow".into(),
                "pytorch".into(),
                "boilerplate".into(),
                "eslint".into(),
                "webpack".into(),
                "starter template".into(),
            ],
            seed_keywords: vec![
                "mcp-server".into(),
                "model-context-protocol".into(),
                "anthropic mcp".into(),
                "claude".into(),
            ],
        }
    }
}

/// The full immutable configuration for one crawl run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub enabled: bool,
    pub db_url: String,
    pub github_token: Option<String>,
    pub log_level: String,
    pub max_candidates_per_run: usize,
    pub rate_limits: RateLimitConfig,
    pub timeouts: TimeoutConfig,
    pub concurrency: ConcurrencyConfig,
    pub filter: FilterConfig,
    pub schedule_cron: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            db_url: "sqlite://crawler.db?mode=rwc".to_string(),
            github_token: None,
            log_level: "info".to_string(),
            max_candidates_per_run: 50,
            rate_limits: RateLimitConfig::default(),
            timeouts: TimeoutConfig::default(),
            concurrency: ConcurrencyConfig::default(),
            filter: FilterConfig::default(),
            schedule_cron: "daily".to_string(),
        }
    }
}

impl CrawlerConfig {
    /// Layer environment variables over a base config, then an
    /// optional TOML file contents over that. Later layers win.
    pub fn from_env_and_file(file_contents: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(contents) = file_contents {
            config = toml::from_str(contents).map_err(ConfigError::Toml)?;
        }

        if let Ok(enabled) = std::env::var("CRAWLER_ENABLED") {
            config.enabled = is_truthy(&enabled);
        }
        if let Ok(token) = std::env::var("CRAWLER_GITHUB_TOKEN") {
            if !token.is_empty() {
                config.github_token = Some(token);
            }
        }
        if let Ok(url) = std::env::var("CRAWLER_DB_URL") {
            if !url.is_empty() {
                config.db_url = url;
            }
        }
        if let Ok(level) = std::env::var("CRAWLER_LOG_LEVEL") {
            if !level.is_empty() {
                config.log_level = level;
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Configuration sanity checks exercised by the `test` CLI command.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_url.trim().is_empty() {
            return Err(ConfigError::Invalid("db_url must not be empty".into()));
        }
        if !["debug", "info", "warn", "error"].contains(&self.log_level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "log_level must be one of debug/info/warn/error, got {:?}",
                self.log_level
            )));
        }
        for (name, qps) in [
            ("registry_qps", self.rate_limits.registry_qps),
            ("repo_api_qps", self.rate_limits.repo_api_qps),
            ("doc_site_qps", self.rate_limits.doc_site_qps),
            ("generic_qps", self.rate_limits.generic_qps),
        ] {
            if qps <= 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {qps}")));
            }
        }
        if self.filter.seed_keywords.is_empty() {
            return Err(ConfigError::Invalid("filter.seed_keywords must not be empty".into()));
        }
        if self.max_candidates_per_run == 0 {
            return Err(ConfigError::Invalid("max_candidates_per_run must be positive".into()));
        }
        Ok(())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("could not parse configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        CrawlerConfig::default().validate().expect("default config must validate");
    }

    #[test]
    fn rejects_zero_qps() {
        let mut config = CrawlerConfig::default();
        config.rate_limits.doc_site_qps = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_defaults() {
        std::env::set_var("CRAWLER_LOG_LEVEL", "debug");
        std::env::set_var("CRAWLER_ENABLED", "true");
        let config = CrawlerConfig::from_env_and_file(None).unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(config.enabled);
        std::env::remove_var("CRAWLER_LOG_LEVEL");
        std::env::remove_var("CRAWLER_ENABLED");
    }
}
