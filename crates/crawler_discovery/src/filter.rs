use crawler_protocol::{Candidate, FilterConfig, RegistryRecord};

/// Pure candidate filter. Runs before any expensive scraping.
///
/// Strong positives accept immediately. Exclusions override heuristic
/// positives but never strong positives. Otherwise a heuristic positive
/// requires one subject token and one server-role token to co-occur.
pub fn likely_mcp(candidate: &Candidate, registry_record: &RegistryRecord, config: &FilterConfig) -> bool {
    let haystack = combined_text(candidate, registry_record);

    if config
        .strong_positive_tokens
        .iter()
        .any(|token| haystack.contains(&token.to_lowercase()))
    {
        return true;
    }
    if registry_record
        .declared_dependencies
        .iter()
        .any(|dep| config.known_mcp_sdk_dependencies.iter().any(|sdk| dep.eq_ignore_ascii_case(sdk)))
    {
        return true;
    }

    let excluded = config
        .exclusion_tokens
        .iter()
        .any(|token| haystack.contains(&token.to_lowercase()));
    if excluded {
        return false;
    }

    let has_subject = config
        .heuristic_subject_tokens
        .iter()
        .any(|token| haystack.contains(&token.to_lowercase()));
    let has_role = config
        .heuristic_role_tokens
        .iter()
        .any(|token| haystack.contains(&token.to_lowercase()));

    has_subject && has_role
}

fn combined_text(candidate: &Candidate, registry_record: &RegistryRecord) -> String {
    let mut text = String::new();
    text.push_str(&candidate.identifier.to_lowercase());
    text.push(' ');
    if let Some(description) = &candidate.declared_description {
        text.push_str(&description.to_lowercase());
        text.push(' ');
    }
    for keyword in &registry_record.declared_keywords {
        text.push_str(&keyword.to_lowercase());
        text.push(' ');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crawler_protocol::Ecosystem;

    fn candidate(identifier: &str, description: &str) -> Candidate {
        Candidate {
            ecosystem: Ecosystem::Npm,
            identifier: identifier.to_string(),
            declared_description: Some(description.to_string()),
            declared_repository_url: None,
            discovery_method: "keyword:mcp-server".to_string(),
            discovered_at: Utc::now(),
        }
    }

    #[test]
    fn strong_positive_token_accepts() {
        let config = FilterConfig::default();
        let record = RegistryRecord::default();
        let c = candidate("@modelcontextprotocol/server-filesystem", "filesystem tools");
        assert!(likely_mcp(&c, &record, &config));
    }

    #[test]
    fn known_sdk_dependency_accepts() {
        let config = FilterConfig::default();
        let mut record = RegistryRecord::default();
        record.declared_dependencies = vec!["@modelcontextprotocol/sdk".to_string()];
        let c = candidate("some-random-package", "does stuff");
        assert!(likely_mcp(&c, &record, &config));
    }

    #[test]
    fn heuristic_needs_both_subject_and_role() {
        let config = FilterConfig::default();
        let record = RegistryRecord::default();
        let subject_only = candidate("claude-notes", "keeps notes about claude");
        assert!(!likely_mcp(&subject_only, &record, &config));

        let both = candidate("claude-agent-tool", "an agent server for claude");
        assert!(likely_mcp(&both, &record, &config));
    }

    #[test]
    fn exclusion_overrides_heuristic_but_not_strong_positive() {
        let config = FilterConfig::default();
        let record = RegistryRecord::default();
        let excluded = candidate("mcp-eslint-plugin", "an eslint boilerplate agent server");
        assert!(!likely_mcp(&excluded, &record, &config));

        let strong = candidate("mcp-server-eslint-helper", "an eslint boilerplate tool");
        assert!(likely_mcp(&strong, &record, &config));
    }
}
