use crawler_protocol::Ecosystem;

const TAG_FLOOR: usize = 20;
const TAG_CEILING: usize = 30;

const SERVICE_EXPANSIONS: &[(&str, &[&str])] = &[
    ("stripe", &["stripe", "payments", "billing", "transactions"]),
    ("slack", &["slack", "messaging", "chat", "notifications"]),
    ("github", &["github", "git", "version-control", "repositories"]),
    ("postgres", &["postgres", "postgresql", "sql", "database"]),
    ("aws", &["aws", "cloud", "infrastructure"]),
];

const CAPABILITY_VERBS: &[&str] = &["create", "read", "update", "delete", "search", "list", "execute", "sync"];

const TECHNOLOGY_TAGS: &[(&str, &[&str])] = &[
    ("postgres", &["postgresql", "sql"]),
    ("express", &["express", "http"]),
    ("docker", &["docker", "containers"]),
    ("react", &["react", "frontend"]),
];

/// Ranked fallback tokens appended until the floor of 20 is met. Ordered
/// from most to least generically applicable.
const FALLBACK_TAGS: &[&str] = &[
    "integration", "api", "automation", "productivity", "developer-tools", "cli", "server",
    "data", "workflow", "utility", "connector", "client", "tooling", "assistant", "agent-tools",
    "extension", "plugin", "sdk", "backend", "service",
];

/// Tag generation. Always returns 20..=30 lowercase,
/// hyphenated, deduplicated tags.
pub fn generate_tags(
    identifier: &str,
    registry_keywords: &[String],
    tool_names: &[String],
    dependencies: &[String],
    ecosystem: Ecosystem,
) -> Vec<String> {
    let mut tags = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut push = |tags: &mut Vec<String>, seen: &mut std::collections::HashSet<String>, tag: String| {
        let cleaned = crawler_protocol::naming::clean(&tag);
        if !cleaned.is_empty() && seen.insert(cleaned.clone()) {
            tags.push(cleaned);
        }
    };

    for token in identifier.split(|c| c == '@' || c == '/' || c == '-' || c == '_') {
        if !token.is_empty() {
            push(&mut tags, &mut seen, token.to_string());
        }
    }

    for keyword in registry_keywords {
        push(&mut tags, &mut seen, keyword.clone());
    }

    let lower_identifier = identifier.to_lowercase();
    for (service, expansions) in SERVICE_EXPANSIONS {
        if lower_identifier.contains(service) {
            for tag in *expansions {
                push(&mut tags, &mut seen, tag.to_string());
            }
        }
    }

    for tool_name in tool_names {
        let lower = tool_name.to_lowercase();
        for verb in CAPABILITY_VERBS {
            if lower.contains(verb) {
                push(&mut tags, &mut seen, verb.to_string());
            }
        }
    }

    for dependency in dependencies {
        let lower = dependency.to_lowercase();
        for (tech, tags_for_tech) in TECHNOLOGY_TAGS {
            if lower.contains(tech) {
                for tag in *tags_for_tech {
                    push(&mut tags, &mut seen, tag.to_string());
                }
            }
        }
    }

    push(&mut tags, &mut seen, "mcp".to_string());
    push(&mut tags, &mut seen, "model-context-protocol".to_string());
    push(&mut tags, &mut seen, ecosystem.as_str().to_string());

    for fallback in FALLBACK_TAGS {
        if tags.len() >= TAG_FLOOR {
            break;
        }
        push(&mut tags, &mut seen, fallback.to_string());
    }

    tags.truncate(TAG_CEILING);
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_is_always_within_bounds() {
        let tags = generate_tags("x", &[], &[], &[], Ecosystem::Npm);
        assert!((TAG_FLOOR..=TAG_CEILING).contains(&tags.len()), "{}", tags.len());
    }

    #[test]
    fn rich_input_still_respects_ceiling() {
        let keywords: Vec<String> = (0..50).map(|i| format!("keyword-{i}")).collect();
        let tags = generate_tags("stripe-mcp-server", &keywords, &[], &[], Ecosystem::Npm);
        assert_eq!(tags.len(), TAG_CEILING);
    }

    #[test]
    fn service_expansion_adds_related_tags() {
        let tags = generate_tags("acme-stripe-connector", &[], &[], &[], Ecosystem::Npm);
        assert!(tags.contains(&"payments".to_string()));
        assert!(tags.contains(&"billing".to_string()));
    }

    #[test]
    fn tags_are_deduplicated() {
        let tags = generate_tags("mcp-mcp-server", &["mcp".to_string()], &[], &[], Ecosystem::Npm);
        assert_eq!(tags.iter().filter(|t| *t == "mcp").count(), 1);
    }
}
