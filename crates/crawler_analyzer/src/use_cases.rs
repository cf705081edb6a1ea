const MAX_USE_CASES: usize = 8;
const MIN_LEN: usize = 15;
const MAX_LEN: usize = 150;

const SERVICE_TEMPLATES: &[(&str, &str)] = &[
    ("slack", "Send automated notifications to Slack channels"),
    ("stripe", "Process payments and manage billing programmatically"),
    ("github", "Automate repository and pull request workflows"),
    ("postgres", "Query and manage PostgreSQL databases from an agent"),
    ("email", "Send and manage email on behalf of a user"),
];

const VERB_EXPANSIONS: &[(&str, &str)] = &[
    ("create", "Create new records"),
    ("read", "Read existing data"),
    ("update", "Update existing records"),
    ("delete", "Delete records"),
    ("search", "Search across available data"),
    ("list", "List available resources"),
    ("execute", "Execute operations against the underlying service"),
    ("sync", "Synchronize data between systems"),
];

/// Use case generation. Ranked by specificity: identifier
/// mention > business-value verb > generic; sentences outside 15..=150
/// characters are discarded; capped at 8.
pub fn generate_use_cases(identifier: &str, description: &str, tool_names: &[String]) -> Vec<String> {
    let lower_identifier = identifier.to_lowercase();
    let mut ranked: Vec<(u8, String)> = Vec::new();

    for (service, template) in SERVICE_TEMPLATES {
        if lower_identifier.contains(service) {
            ranked.push((0, template.to_string()));
        }
    }

    for tool_name in tool_names {
        let readable = tool_name.replace(['_', '-'], " ");
        let sentence = format!("Use the {identifier} server to {readable}");
        ranked.push((1, sentence));
    }

    for (verb, sentence) in VERB_EXPANSIONS {
        if tool_names.iter().any(|t| t.to_lowercase().contains(verb)) {
            ranked.push((1, sentence.to_string()));
        }
    }

    if !description.trim().is_empty() {
        ranked.push((2, description.trim().to_string()));
    }

    ranked.sort_by_key(|(rank, _)| *rank);

    let mut seen = std::collections::HashSet::new();
    ranked
        .into_iter()
        .map(|(_, sentence)| sentence)
        .filter(|sentence| (MIN_LEN..=MAX_LEN).contains(&sentence.len()))
        .filter(|sentence| seen.insert(sentence.clone()))
        .take(MAX_USE_CASES)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_template_ranks_above_generic_description() {
        let use_cases = generate_use_cases(
            "acme-slack-mcp",
            "A server that does things",
            &[],
        );
        assert_eq!(use_cases[0], "Send automated notifications to Slack channels");
    }

    #[test]
    fn out_of_range_sentences_are_discarded() {
        let use_cases = generate_use_cases("x", "ok", &[]);
        assert!(use_cases.iter().all(|s| s.len() >= MIN_LEN && s.len() <= MAX_LEN));
    }

    #[test]
    fn caps_at_eight() {
        let tool_names: Vec<String> = (0..20).map(|i| format!("do_thing_{i}")).collect();
        let use_cases = generate_use_cases("acme-tool", "A server", &tool_names);
        assert!(use_cases.len() <= MAX_USE_CASES);
    }
}
