use std::path::PathBuf;
use std::time::{Duration, Instant};

use crawler_ids::CollectionId;
use crawler_protocol::{Candidate, HealthStatus, IntelligenceReport, ParamType, TestingStrategy, Tool, TimeoutConfig, ToolParameter};
use tracing::{info, warn};

use crate::mcp_client::McpClient;
use crate::process;
use crate::scratch::ScratchDir;

const AUTH_ERROR_MARKERS: &[&str] = &[
    "unauthorized",
    "forbidden",
    "401",
    "403",
    "api key",
    "apikey",
    "api_key",
    "missing credential",
    "authentication",
    "access denied",
    "invalid token",
];

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub scratch_base_dir: PathBuf,
    pub timeouts: TimeoutConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            scratch_base_dir: std::env::temp_dir().join("mcp-registry-crawler-scratch"),
            timeouts: TimeoutConfig::default(),
        }
    }
}

fn looks_auth_like(text: &str) -> bool {
    let lower = text.to_lowercase();
    AUTH_ERROR_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Classifies server health from a completed report. Pure function so
/// normalization (downstream) can re-derive the status without re-running
/// anything live.
pub fn classify_health(handshake_ok: bool, report: &IntelligenceReport) -> HealthStatus {
    if !handshake_ok {
        return HealthStatus::Unknown;
    }
    let total = report.tools.len();
    let working = report.working_tools.len();
    let failing = report.failing_tools.len();

    if total == 0 {
        return if report.auth_required { HealthStatus::Degraded } else { HealthStatus::Healthy };
    }
    if working == total {
        return HealthStatus::Healthy;
    }
    if working > 0 && failing > 0 {
        return HealthStatus::Degraded;
    }
    if report.auth_required {
        return HealthStatus::Degraded;
    }
    HealthStatus::Down
}

/// Installs, spawns, and speaks MCP to one candidate. Every exit path —
/// success, any phase error, or the caller dropping the future — tears down
/// the scratch directory and subprocess.
pub async fn collect(
    candidate: &Candidate,
    install_command: &str,
    run_command: &str,
    collection_id: &CollectionId,
    config: &CollectorConfig,
) -> IntelligenceReport {
    let started = Instant::now();
    let budget = config.timeouts.per_candidate_budget();

    match tokio::time::timeout(budget, run_phases(candidate, install_command, run_command, collection_id, config)).await {
        Ok(report) => report,
        Err(_) => {
            warn!(
                identifier = %candidate.identifier,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "intelligence collection exceeded per-candidate budget"
            );
            IntelligenceReport::fallback()
        }
    }
}

async fn run_phases(
    candidate: &Candidate,
    install_command: &str,
    run_command: &str,
    collection_id: &CollectionId,
    config: &CollectorConfig,
) -> IntelligenceReport {
    let scratch = match ScratchDir::provision(&config.scratch_base_dir, collection_id).await {
        Ok(s) => s,
        Err(e) => {
            warn!(identifier = %candidate.identifier, error = %e, "failed to provision scratch directory");
            return IntelligenceReport::fallback();
        }
    };

    if let Err(stderr) = process::run_install(install_command, scratch.path(), config.timeouts.install()).await {
        warn!(identifier = %candidate.identifier, %stderr, "install phase failed");
        let mut report = IntelligenceReport::fallback();
        report.auth_required = looks_auth_like(&stderr);
        return report;
    }

    let mut child = match process::spawn_server(run_command, scratch.path()) {
        Ok(c) => c,
        Err(e) => {
            warn!(identifier = %candidate.identifier, error = %e, "failed to spawn subprocess");
            return IntelligenceReport::fallback();
        }
    };

    let stdin = match child.stdin.take() {
        Some(s) => s,
        None => {
            process::terminate(&mut child, config.timeouts.subprocess_kill_grace()).await;
            return IntelligenceReport::fallback();
        }
    };
    let stdout = match child.stdout.take() {
        Some(s) => s,
        None => {
            process::terminate(&mut child, config.timeouts.subprocess_kill_grace()).await;
            return IntelligenceReport::fallback();
        }
    };
    let mut stderr = child.stderr.take();

    let mut client = McpClient::new(stdin, stdout);

    let init_started = Instant::now();
    let init_result = client.initialize(config.timeouts.handshake()).await;
    let mut report = IntelligenceReport::fallback();

    let init = match init_result {
        Ok(init) => init,
        Err(e) => {
            let stderr_text = drain_stderr(&mut stderr).await;
            warn!(identifier = %candidate.identifier, error = %e, stderr = %stderr_text, "handshake failed");
            process::terminate(&mut child, config.timeouts.subprocess_kill_grace()).await;
            report.auth_required = looks_auth_like(&stderr_text) || looks_auth_like(&e.to_string());
            return report;
        }
    };

    report.protocol_version = init.protocol_version;
    report.server_capabilities = init.capabilities;
    report.initialization_time_ms = Some(init_started.elapsed().as_millis() as u64);
    report.testing_strategy = TestingStrategy::Full;

    let raw_tools = match client.list_tools(config.timeouts.handshake()).await {
        Ok(tools) => tools,
        Err(e) => {
            warn!(identifier = %candidate.identifier, error = %e, "tools/list failed");
            process::terminate(&mut child, config.timeouts.subprocess_kill_grace()).await;
            return report_with_handshake_only(report);
        }
    };

    report.tools = raw_tools.iter().filter_map(parse_tool).collect();

    let mut response_times = Vec::new();
    for tool in &report.tools {
        let probe_started = Instant::now();
        match client.call_tool(&tool.name, config.timeouts.per_tool_invocation()).await {
            Ok(_) => {
                report.working_tools.push(tool.name.clone());
                response_times.push(probe_started.elapsed().as_secs_f64() * 1000.0);
            }
            Err(e) => {
                if looks_auth_like(&e.to_string()) {
                    report.auth_required = true;
                }
                report.observed_error_patterns.push(e.to_string());
                report.failing_tools.push(tool.name.clone());
            }
        }
    }

    if !response_times.is_empty() {
        report.average_tool_response_time_ms = Some(response_times.iter().sum::<f64>() / response_times.len() as f64);
    }
    if !report.tools.is_empty() {
        report.reliability_score = Some(report.working_tools.len() as f64 / report.tools.len() as f64);
    }

    info!(
        identifier = %candidate.identifier,
        tools = report.tools.len(),
        working = report.working_tools.len(),
        failing = report.failing_tools.len(),
        "intelligence collection complete"
    );

    process::terminate(&mut child, config.timeouts.subprocess_kill_grace()).await;
    report
}

fn report_with_handshake_only(mut report: IntelligenceReport) -> IntelligenceReport {
    report.testing_strategy = TestingStrategy::FallbackBasic;
    report
}

async fn drain_stderr(stderr: &mut Option<tokio::process::ChildStderr>) -> String {
    use tokio::io::AsyncReadExt;
    let Some(handle) = stderr else { return String::new() };
    let mut buf = String::new();
    let _ = tokio::time::timeout(Duration::from_millis(500), handle.read_to_string(&mut buf)).await;
    buf
}

fn parse_tool(raw: &serde_json::Value) -> Option<Tool> {
    let name = raw.get("name")?.as_str()?.to_string();
    if !Tool::name_is_legal(&name) {
        return None;
    }
    let description = raw.get("description").and_then(|d| d.as_str()).unwrap_or_default().to_string();
    let input_schema = parse_input_schema(raw);
    Some(Tool {
        name,
        description,
        input_schema,
        category_tag: None,
    })
}

/// Servers are supposed to return `inputSchema`; some in the wild still
/// write `schema`. Accept either and normalize to the former on `Tool`.
fn parse_input_schema(raw: &serde_json::Value) -> Option<Vec<ToolParameter>> {
    let schema = raw.get("inputSchema").or_else(|| raw.get("schema"))?;
    let properties = schema.get("properties")?.as_object()?;
    let required: std::collections::HashSet<&str> = schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|values| values.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();

    Some(
        properties
            .iter()
            .map(|(name, prop)| ToolParameter {
                name: name.clone(),
                param_type: prop
                    .get("type")
                    .and_then(|t| t.as_str())
                    .map(ParamType::from_declared)
                    .unwrap_or(ParamType::String),
                required: required.contains(name.as_str()),
                description: prop.get("description").and_then(|d| d.as_str()).unwrap_or_default().to_string(),
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crawler_protocol::AuthMethod;
    use std::collections::BTreeSet;

    fn report_with(tools: usize, working: usize, failing: usize, auth_required: bool) -> IntelligenceReport {
        let mut report = IntelligenceReport::fallback();
        report.tools = (0..tools)
            .map(|i| Tool {
                name: format!("tool_{i}"),
                description: String::new(),
                input_schema: None,
                category_tag: None,
            })
            .collect();
        report.working_tools = (0..working).map(|i| format!("tool_{i}")).collect();
        report.failing_tools = (0..failing).map(|i| format!("tool_{}", tools - i - 1)).collect();
        report.auth_required = auth_required;
        report
    }

    #[test]
    fn zero_tools_without_auth_is_healthy() {
        let report = report_with(0, 0, 0, false);
        assert_eq!(classify_health(true, &report), HealthStatus::Healthy);
    }

    #[test]
    fn all_tools_working_is_healthy() {
        let report = report_with(3, 3, 0, false);
        assert_eq!(classify_health(true, &report), HealthStatus::Healthy);
    }

    #[test]
    fn mixed_results_is_degraded() {
        let report = report_with(3, 1, 2, false);
        assert_eq!(classify_health(true, &report), HealthStatus::Degraded);
    }

    #[test]
    fn auth_required_with_no_creds_is_degraded() {
        let report = report_with(0, 0, 0, true);
        assert_eq!(classify_health(true, &report), HealthStatus::Degraded);
    }

    #[test]
    fn all_tools_failing_without_auth_is_down() {
        let report = report_with(2, 0, 2, false);
        assert_eq!(classify_health(true, &report), HealthStatus::Down);
    }

    #[test]
    fn failed_handshake_is_unknown_regardless_of_report_contents() {
        let report = report_with(5, 5, 0, false);
        assert_eq!(classify_health(false, &report), HealthStatus::Unknown);
    }

    #[test]
    fn looks_auth_like_matches_common_markers() {
        assert!(looks_auth_like("Error: 401 Unauthorized"));
        assert!(looks_auth_like("missing HUBSPOT_API_KEY"));
        assert!(!looks_auth_like("connection refused"));
    }

    #[test]
    fn auth_methods_set_is_not_accidentally_empty() {
        let methods: BTreeSet<AuthMethod> = BTreeSet::from([AuthMethod::ApiKey]);
        assert!(!methods.is_empty());
    }
}
