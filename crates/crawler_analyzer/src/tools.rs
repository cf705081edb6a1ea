use std::collections::HashMap;

use crawler_protocol::{IntelligenceReport, ParamType, Tool, ToolParameter};
use regex::Regex;

const STOPWORDS: &[&str] = &["get", "set", "is", "has", "can", "will"];

fn name_is_usable(name: &str) -> bool {
    Tool::name_is_legal(name) && name.len() >= 3 && !STOPWORDS.contains(&name.to_lowercase().as_str())
}

/// Tool extraction. Sources are tried in descending authority;
/// a live `tools/list` capture (source 1) is authoritative and later sources
/// only enrich descriptions for names it already returned. MCP-style JSON
/// blobs printed to stdout/stderr are folded into the live capture: live
/// validation already parses any `tools/list`-shaped JSON it observes
/// during the handshake into the same `IntelligenceReport.tools`.
pub fn extract_tools(
    identifier: &str,
    combined_text: &str,
    intelligence: Option<&IntelligenceReport>,
) -> Vec<Tool> {
    if let Some(report) = intelligence {
        if !report.tools.is_empty() {
            return merge_descriptions(report.tools.clone(), documentation_tools(combined_text));
        }
    }

    let documented = documentation_tools(combined_text);
    if !documented.is_empty() {
        return documented;
    }

    identifier_inferred_tools(identifier)
}

fn merge_descriptions(live: Vec<Tool>, documented: Vec<Tool>) -> Vec<Tool> {
    let doc_by_name: HashMap<String, Tool> = documented
        .into_iter()
        .map(|t| (t.name.to_lowercase(), t))
        .collect();

    live.into_iter()
        .map(|mut tool| {
            if tool.description.trim().is_empty() {
                if let Some(doc_tool) = doc_by_name.get(&tool.name.to_lowercase()) {
                    tool.description = doc_tool.description.clone();
                }
            }
            tool
        })
        .collect()
}

/// Pattern 1: `### tool_name(params)` or `### tool_name` + `Parameters:` block.
/// Pattern 2: `- **tool_name**: description` or `| tool_name | description |`.
fn documentation_tools(text: &str) -> Vec<Tool> {
    let mut by_name: HashMap<String, Tool> = HashMap::new();

    let heading_with_params = Regex::new(r"(?m)^###\s+([A-Za-z_][A-Za-z0-9_]*)\(([^)]*)\)").unwrap();
    for caps in heading_with_params.captures_iter(text) {
        let name = caps[1].to_string();
        if !name_is_usable(&name) {
            continue;
        }
        let params = parse_paren_params(&caps[2]);
        insert_richest(&mut by_name, Tool {
            name,
            description: String::new(),
            input_schema: Some(params),
            category_tag: None,
        });
    }

    let bullet = Regex::new(r"(?m)^[-*]\s+\*\*([A-Za-z_][A-Za-z0-9_]*)\*\*:?\s*(.*)$").unwrap();
    for caps in bullet.captures_iter(text) {
        let name = caps[1].to_string();
        if !name_is_usable(&name) {
            continue;
        }
        insert_richest(&mut by_name, Tool {
            name,
            description: caps[2].trim().to_string(),
            input_schema: None,
            category_tag: None,
        });
    }

    let table_row = Regex::new(r"(?m)^\|\s*`?([A-Za-z_][A-Za-z0-9_]*)`?\s*\|\s*([^|]+)\|").unwrap();
    for caps in table_row.captures_iter(text) {
        let name = caps[1].to_string();
        if !name_is_usable(&name) {
            continue;
        }
        insert_richest(&mut by_name, Tool {
            name,
            description: caps[2].trim().to_string(),
            input_schema: None,
            category_tag: None,
        });
    }

    by_name.into_values().collect()
}

/// Duplicates are collapsed by lowercase name, keeping the entry with the
/// richest description and richest parameter list.
fn insert_richest(by_name: &mut HashMap<String, Tool>, candidate: Tool) {
    let key = candidate.name.to_lowercase();
    match by_name.get(&key) {
        Some(existing) if richness(existing) >= richness(&candidate) => {}
        _ => {
            by_name.insert(key, candidate);
        }
    }
}

fn richness(tool: &Tool) -> usize {
    tool.description.len() + tool.input_schema.as_ref().map(|p| p.len()).unwrap_or(0) * 10
}

fn parse_paren_params(raw: &str) -> Vec<ToolParameter> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|part| {
            let is_optional = part.to_lowercase().contains("optional") || part.trim_start().starts_with('?');
            let (name, declared_type) = match part.split_once(':') {
                Some((n, t)) => (n.trim(), t.trim()),
                None => (part, "string"),
            };
            let name = name
                .trim_start_matches('?')
                .trim()
                .trim_start_matches("optional")
                .trim()
                .to_string();
            ToolParameter {
                name,
                param_type: ParamType::from_declared(declared_type),
                required: !is_optional,
                description: String::new(),
            }
        })
        .collect()
}

/// Inference from well-known package-identifier shapes (source 4).
/// Used only when no higher-authority source produced any tools.
fn identifier_inferred_tools(identifier: &str) -> Vec<Tool> {
    let lower = identifier.to_lowercase();
    let shapes: &[(&str, &[&str])] = &[
        ("filesystem", &["read_file", "write_file", "list_directory"]),
        ("database", &["execute_query", "list_tables", "describe_table"]),
        ("sql", &["execute_query", "list_tables", "describe_table"]),
        ("git", &["git_status", "git_diff", "git_commit"]),
        ("search", &["search", "fetch_result"]),
        ("slack", &["send_message", "list_channels"]),
    ];

    for (keyword, tool_names) in shapes {
        if lower.contains(keyword) {
            return tool_names
                .iter()
                .map(|name| Tool {
                    name: name.to_string(),
                    description: String::new(),
                    input_schema: None,
                    category_tag: None,
                })
                .collect();
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_with_params_extracts_tool_and_params() {
        let text = "### read_file(path: string, optional encoding: string)\nReads a file.";
        let tools = documentation_tools(text);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "read_file");
        let params = tools[0].input_schema.as_ref().unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "path");
        assert!(params[0].required);
        assert_eq!(params[1].name, "encoding");
        assert!(!params[1].required);
    }

    #[test]
    fn bullet_list_extracts_name_and_description() {
        let text = "- **write_file**: Writes content to a file on disk";
        let tools = documentation_tools(text);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "write_file");
        assert!(tools[0].description.contains("Writes content"));
    }

    #[test]
    fn stopwords_and_short_names_are_rejected() {
        let text = "- **is**: a helper\n- **ab**: too short";
        assert!(documentation_tools(text).is_empty());
    }

    #[test]
    fn identifier_inference_is_last_resort() {
        let tools = identifier_inferred_tools("acme-filesystem-server");
        assert_eq!(tools.len(), 3);
        assert!(tools.iter().any(|t| t.name == "read_file"));
    }

    #[test]
    fn duplicates_keep_richest_entry() {
        let text = "- **search**: basic\n| `search` | A much richer and more detailed description of the search tool |";
        let tools = documentation_tools(text);
        assert_eq!(tools.len(), 1);
        assert!(tools[0].description.contains("richer"));
    }
}
