//! Slug generation and collision resolution.

use crate::types::Ecosystem;
use std::collections::HashMap;

/// Clean a raw string into a lowercase, hyphenated, URL-safe token.
///
/// Idempotent: `clean(clean(s)) == clean(s)` for all `s`.
pub fn clean(raw: &str) -> String {
    let lowered = raw.to_ascii_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_was_dash = false;
    for ch in lowered.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_was_dash = false;
        } else if !last_was_dash {
            out.push('-');
            last_was_dash = true;
        }
    }
    out.trim_matches('-').to_string()
}

/// Extract the owner login from a repository URL, e.g.
/// `https://github.com/acme/hubspot-mcp-server` -> `acme`.
pub fn owner_from_repo_url(url: &str) -> Option<String> {
    let trimmed = url.trim_end_matches('/');
    let without_scheme = trimmed.split("://").last().unwrap_or(trimmed);
    let mut segments = without_scheme.split('/');
    let _host = segments.next()?;
    let owner = segments.next()?;
    if owner.is_empty() {
        None
    } else {
        Some(owner.to_string())
    }
}

/// Known official vendor scopes / orgs whose packages get a bare slug
///. Kept small and explicit; real deployments would load this
/// from configuration alongside the filter token lists.
pub const OFFICIAL_SCOPES: &[&str] = &["@modelcontextprotocol", "@anthropic"];
pub const OFFICIAL_ORGS: &[&str] = &["modelcontextprotocol", "anthropics"];

pub fn is_official(identifier: &str, repo_owner: Option<&str>) -> bool {
    if OFFICIAL_SCOPES.iter().any(|scope| identifier.starts_with(scope)) {
        return true;
    }
    if let Some(owner) = repo_owner {
        return OFFICIAL_ORGS.iter().any(|org| org.eq_ignore_ascii_case(owner));
    }
    false
}

/// Generate the base slug for a candidate before collision resolution.
pub fn base_slug(identifier: &str, repository_url: Option<&str>) -> String {
    let owner = repository_url.and_then(owner_from_repo_url);

    if is_official(identifier, owner.as_deref()) {
        // Official packages drop their scope/vendor prefix: the scope
        // itself is not part of the public-facing slug.
        let unscoped = OFFICIAL_SCOPES
            .iter()
            .find_map(|scope| identifier.strip_prefix(scope))
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(identifier);
        return clean(unscoped);
    }

    let cleaned_identifier = clean(identifier);
    match owner {
        Some(owner) => format!("{}-{}", cleaned_identifier, clean(&owner)),
        None => cleaned_identifier,
    }
}

/// Resolves slug collisions by suffixing `-2`, `-3`, ... until unique,
/// pairwise-distinct for any sequence of conflicting inputs. Holds one
/// `(ecosystem, identifier)` per resolved slug so a re-submission of the
/// same candidate gets back its existing slug instead of minting a new one.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    taken: HashMap<String, (Ecosystem, String)>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry with slugs already present in the store.
    pub fn seed(&mut self, slug: impl Into<String>, ecosystem: Ecosystem, identifier: impl Into<String>) {
        self.taken.insert(slug.into(), (ecosystem, identifier.into()));
    }

    /// Resolve `candidate_slug` to a unique slug for `(ecosystem, identifier)`.
    ///
    /// If the same identity already owns this base slug (or a previously
    /// resolved variant), that slug is returned unchanged so re-crawling a
    /// known candidate is idempotent.
    pub fn resolve(&mut self, base: &str, ecosystem: Ecosystem, identifier: &str) -> String {
        if let Some((existing_eco, existing_id)) = self.taken.get(base) {
            if *existing_eco == ecosystem && existing_id == identifier {
                return base.to_string();
            }
        } else {
            self.taken.insert(base.to_string(), (ecosystem, identifier.to_string()));
            return base.to_string();
        }

        let mut n = 2u32;
        loop {
            let candidate = format!("{base}-{n}");
            match self.taken.get(&candidate) {
                Some((existing_eco, existing_id))
                    if *existing_eco == ecosystem && existing_id == identifier =>
                {
                    return candidate;
                }
                Some(_) => n += 1,
                None => {
                    self.taken.insert(candidate.clone(), (ecosystem, identifier.to_string()));
                    return candidate;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_is_idempotent() {
        for raw in ["@modelcontextprotocol/server-filesystem", "Hubspot_MCP--Server!!", "", "---"] {
            let once = clean(raw);
            let twice = clean(&once);
            assert_eq!(once, twice, "clean should be idempotent for {raw:?}");
        }
    }

    #[test]
    fn owner_extraction() {
        assert_eq!(
            owner_from_repo_url("https://github.com/acme/hubspot-mcp-server"),
            Some("acme".to_string())
        );
        assert_eq!(owner_from_repo_url("https://github.com/"), None);
    }

    #[test]
    fn official_scope_gets_bare_slug() {
        let slug = base_slug("@modelcontextprotocol/server-filesystem", None);
        assert_eq!(slug, "server-filesystem");
    }

    #[test]
    fn community_package_appends_owner() {
        let slug = base_slug(
            "hubspot-mcp-server",
            Some("https://github.com/acme/hubspot-mcp-server"),
        );
        assert_eq!(slug, "hubspot-mcp-server-acme");
    }

    #[test]
    fn collisions_resolve_to_distinct_slugs() {
        let mut registry = SlugRegistry::new();
        let a = registry.resolve("widget", Ecosystem::Npm, "widget-one");
        let b = registry.resolve("widget", Ecosystem::Pypi, "widget-two");
        let c = registry.resolve("widget", Ecosystem::Cargo, "widget-three");
        assert_eq!(a, "widget");
        assert_eq!(b, "widget-2");
        assert_eq!(c, "widget-3");
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn same_identity_reuses_its_slug() {
        let mut registry = SlugRegistry::new();
        let first = registry.resolve("widget", Ecosystem::Npm, "widget-one");
        let second = registry.resolve("widget", Ecosystem::Npm, "widget-one");
        assert_eq!(first, second);
    }
}
