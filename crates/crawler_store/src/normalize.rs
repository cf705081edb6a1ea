use chrono::Utc;
use crawler_analyzer::AnalysisRecord;
use crawler_protocol::{
    Candidate, CanonicalMcp, ConnectionType, FieldSource, HealthStatus, InstallKind, IntelligenceReport, Sourced,
};
use crawler_scrape::ScrapedBundle;

/// Builds (or re-derives) a `CanonicalMcp` from analyzer output, optional
/// live intelligence, and any previously-persisted record by the same slug.
///
/// Operator-edited fields on `existing` are never overwritten. For
/// crawler-owned fields, the new value wins only if it's non-empty and
/// differs from what's already there.
pub fn normalize_and_merge(
    candidate: &Candidate,
    bundle: &ScrapedBundle,
    analysis: &AnalysisRecord,
    intelligence: Option<&IntelligenceReport>,
    health_status: HealthStatus,
    existing: Option<CanonicalMcp>,
) -> CanonicalMcp {
    let now = Utc::now();

    let primary_install = analysis
        .installation_methods
        .iter()
        .min_by_key(|m| m.priority)
        .cloned()
        .unwrap_or_else(|| crawler_protocol::InstallationMethod {
            kind: InstallKind::Git,
            command: candidate.identifier.clone(),
            description: "Fallback install method; none could be derived.".to_string(),
            priority: InstallKind::Git.default_priority(),
            confidence: 0,
        });

    // `analysis.tools` already carries the live `tools/list` result merged
    // with documentation descriptions (the analyzer was re-run with the
    // live report before this call), so the live case takes it directly
    // rather than the raw, description-less `intelligence.tools`.
    let live_present = intelligence.map(|r| !r.tools.is_empty()).unwrap_or(false);
    let tools = match (live_present, existing.as_ref()) {
        (true, _) => analysis.tools.clone(),
        (false, Some(existing)) if is_subset_by_name(&analysis.tools, &existing.tools) => existing.tools.clone(),
        (false, _) => analysis.tools.clone(),
    };

    let (working_tools, failing_tools, verified, protocol_version, connection_type) = match intelligence {
        Some(report) => (
            report.working_tools.clone(),
            report.failing_tools.clone(),
            matches!(health_status, HealthStatus::Healthy | HealthStatus::Degraded),
            report.protocol_version.clone(),
            ConnectionType::Stdio,
        ),
        None => (
            existing.as_ref().map(|e| e.working_tools.clone()).unwrap_or_default(),
            existing.as_ref().map(|e| e.failing_tools.clone()).unwrap_or_default(),
            false,
            existing.as_ref().and_then(|e| e.protocol_version.clone()),
            existing.as_ref().map(|e| e.connection_type).unwrap_or(ConnectionType::Stdio),
        ),
    };

    let repository_url = bundle.registry.repository_url.clone().or_else(|| candidate.declared_repository_url.clone());
    let documentation_url = bundle.docs.pages.first().map(|p| p.url.clone());
    let homepage_url = bundle.registry.homepage.clone();
    let author = bundle.registry.declared_author.clone().or_else(|| existing.as_ref().and_then(|e| e.author.clone()));
    let license = bundle.registry.declared_license.clone().or_else(|| existing.as_ref().and_then(|e| e.license.clone()));

    let tags = merge_crawler_owned_list(existing.as_ref().map(|e| &e.tags), analysis.tags.clone(), |merged| {
        let mut merged = merged;
        merged.sort();
        merged.dedup();
        merged.truncate(30);
        merged
    });

    let use_cases = merge_use_cases(existing.as_ref().map(|e| &e.use_cases), analysis.use_cases.clone());

    let short_description =
        merge_crawler_owned_scalar(existing.as_ref().map(|e| &e.short_description), analysis.short_description.clone());
    let long_description =
        merge_crawler_owned_scalar(existing.as_ref().map(|e| &e.long_description), analysis.long_description.clone());

    let slug = existing.as_ref().map(|e| e.slug.clone()).unwrap_or_else(|| analysis.slug_base.clone());
    let name = candidate.identifier.clone();
    let display_name = existing.as_ref().map(|e| e.display_name.clone()).unwrap_or_else(|| name.clone());

    let created_at = existing.as_ref().map(|e| e.created_at).unwrap_or(now);
    let last_scraped_at = now;
    let last_validated_at = if intelligence.is_some() { Some(now) } else { existing.as_ref().and_then(|e| e.last_validated_at) };

    let mut canonical = CanonicalMcp {
        slug,
        name,
        display_name,
        short_description,
        long_description,

        ecosystem: candidate.ecosystem,
        ecosystem_identifier: candidate.identifier.clone(),
        install_type: primary_install.kind,
        endpoint_command: primary_install.command.clone(),
        installation_methods: analysis.installation_methods.clone(),

        tools: tools.clone(),
        tool_count: tools.len(),
        working_tools,
        failing_tools,

        auth: analysis.auth.clone(),

        protocol_version,
        connection_type,

        category: analysis.category,
        tags,
        use_cases,

        repository_url,
        documentation_url,
        homepage_url,
        author,
        company: existing.as_ref().and_then(|e| e.company.clone()),
        license,

        health_status,
        verified,
        auto_discovered: existing.as_ref().map(|e| e.auto_discovered).unwrap_or(true),
        discovery_source: existing.as_ref().map(|e| e.discovery_source.clone()).unwrap_or_else(|| candidate.discovery_method.clone()),

        created_at,
        updated_at: created_at,
        last_scraped_at,
        last_validated_at,

        search_text: String::new(),
    };

    let changed = existing.as_ref().map(|e| !records_equal(e, &canonical)).unwrap_or(true);
    canonical.updated_at = if changed {
        now
    } else {
        existing.as_ref().map(|e| e.updated_at).unwrap_or(created_at)
    };
    canonical.search_text = canonical.derive_search_text();
    canonical
}

fn is_subset_by_name(candidate: &[crawler_protocol::Tool], existing: &[crawler_protocol::Tool]) -> bool {
    use std::collections::HashSet;
    let existing_names: HashSet<&str> = existing.iter().map(|t| t.name.as_str()).collect();
    !candidate.is_empty() && candidate.iter().all(|t| existing_names.contains(t.name.as_str()))
}

fn merge_crawler_owned_scalar(existing: Option<&Sourced<String>>, new_value: String) -> Sourced<String> {
    match existing {
        Some(existing) if existing.is_operator_owned() => existing.clone(),
        Some(existing) if new_value.is_empty() || new_value == existing.value => existing.clone(),
        _ => Sourced::crawler(new_value),
    }
}

fn merge_crawler_owned_list(
    existing: Option<&Sourced<Vec<String>>>,
    new_value: Vec<String>,
    finalize: impl Fn(Vec<String>) -> Vec<String>,
) -> Sourced<Vec<String>> {
    match existing {
        Some(existing) if existing.is_operator_owned() => existing.clone(),
        Some(existing) => {
            let mut merged = existing.value.clone();
            merged.extend(new_value);
            Sourced::crawler(finalize(merged))
        }
        None => Sourced::crawler(finalize(new_value)),
    }
}

fn merge_use_cases(existing: Option<&Sourced<Vec<String>>>, new_value: Vec<String>) -> Sourced<Vec<String>> {
    match existing {
        Some(existing) if existing.is_operator_owned() => existing.clone(),
        Some(existing) if new_value.is_empty() => existing.clone(),
        _ => Sourced::crawler(new_value),
    }
}

/// Cheap equality check over the fields that matter for `updated_at`
/// bumping; ignores timestamps themselves.
fn records_equal(a: &CanonicalMcp, b: &CanonicalMcp) -> bool {
    a.short_description.value == b.short_description.value
        && a.long_description.value == b.long_description.value
        && a.tool_count == b.tool_count
        && a.working_tools == b.working_tools
        && a.failing_tools == b.failing_tools
        && a.tags.value == b.tags.value
        && a.use_cases.value == b.use_cases.value
        && a.health_status as u8 == b.health_status as u8
        && a.verified == b.verified
        && a.repository_url == b.repository_url
}
