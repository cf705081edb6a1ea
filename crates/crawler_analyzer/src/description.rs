const MIN_SUBSTANTIVE_LEN: usize = 20;
const SHORT_DESCRIPTION_LEN: usize = 160;

const BOILERPLATE_PHRASES: &[&str] = &["mcp server", "model context protocol server"];

/// Description extraction. Starts from the registry-declared
/// description if substantive, otherwise synthesizes from service keywords
/// and a tool-count summary.
pub fn build_descriptions(
    identifier: &str,
    declared_description: Option<&str>,
    tool_count: usize,
) -> (String, String) {
    let long = match declared_description {
        Some(declared) if is_substantive(declared) => declared.trim().to_string(),
        _ => synthesize(identifier, tool_count),
    };
    let short = truncate_on_word_boundary(&long, SHORT_DESCRIPTION_LEN);
    (short, long)
}

fn is_substantive(description: &str) -> bool {
    let trimmed = description.trim();
    if trimmed.len() <= MIN_SUBSTANTIVE_LEN {
        return false;
    }
    let lower = trimmed.to_lowercase();
    !BOILERPLATE_PHRASES.iter().any(|phrase| lower == *phrase)
}

fn synthesize(identifier: &str, tool_count: usize) -> String {
    let words: Vec<String> = identifier
        .split(|c| c == '@' || c == '/' || c == '-' || c == '_')
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("mcp") && !s.eq_ignore_ascii_case("server"))
        .map(|s| s.to_string())
        .collect();
    let service = if words.is_empty() { "this service".to_string() } else { words.join(" ") };

    if tool_count > 0 {
        format!(
            "An MCP server for {service}, exposing {tool_count} tool{}.",
            if tool_count == 1 { "" } else { "s" }
        )
    } else {
        format!("An MCP server for {service}.")
    }
}

fn truncate_on_word_boundary(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut cut = max_len;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    match text[..cut].rfind(char::is_whitespace) {
        Some(boundary) => text[..boundary].trim_end().to_string(),
        None => text[..cut].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substantive_description_is_kept_verbatim() {
        let (short, long) = build_descriptions(
            "acme-tool",
            Some("Query and manage customer records in the Acme CRM platform"),
            3,
        );
        assert_eq!(long, "Query and manage customer records in the Acme CRM platform");
        assert_eq!(short, long);
    }

    #[test]
    fn boilerplate_description_is_synthesized_instead() {
        let (_, long) = build_descriptions("acme-stripe-server", Some("MCP server"), 4);
        assert!(long.contains("acme stripe") || long.contains("stripe"));
        assert!(long.contains("4 tools"));
    }

    #[test]
    fn missing_description_is_synthesized() {
        let (_, long) = build_descriptions("filesystem-mcp-server", None, 0);
        assert!(long.starts_with("An MCP server for filesystem"));
    }

    #[test]
    fn long_description_truncates_on_word_boundary() {
        let long = "word ".repeat(50);
        let (short, _) = build_descriptions("x", Some(long.trim()), 0);
        assert!(short.len() <= SHORT_DESCRIPTION_LEN);
        assert!(!short.ends_with(' '));
    }
}
