use crawler_protocol::naming;

/// Slug generation. Thin pass-through to the shared naming
/// module so the analyzer and the orchestrator's collision resolver agree on
/// one implementation.
pub fn base_slug(identifier: &str, repository_url: Option<&str>) -> String {
    naming::base_slug(identifier, repository_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn official_package_gets_bare_slug() {
        let slug = base_slug(
            "@modelcontextprotocol/server-filesystem",
            Some("https://github.com/modelcontextprotocol/servers"),
        );
        assert_eq!(slug, "server-filesystem");
    }

    #[test]
    fn community_package_appends_owner() {
        let slug = base_slug("hubspot-mcp-server", Some("https://github.com/acme/hubspot-mcp-server"));
        assert_eq!(slug, "hubspot-mcp-server-acme");
    }
}
