use crawler_protocol::{CanonicalMcp, Ecosystem};

/// Which key matched an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupMatch {
    Slug,
    Identity,
    Fingerprint,
}

/// Lowercases, strips the scheme and a trailing `.git`/`/`, for comparing
/// repository URLs from different sources that point at the same repo.
pub fn normalized_repo_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }
    let without_scheme = trimmed
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("git+");
    let without_suffix = without_scheme.trim_end_matches('/').trim_end_matches(".git");
    Some(without_suffix.to_ascii_lowercase())
}

/// Checks whether `existing` matches a candidate under any of the three
/// dedup keys. Checked in priority order: slug is the strongest
/// signal, then identity, then the repo+command fingerprint.
pub fn find_match(
    existing: &CanonicalMcp,
    slug: &str,
    ecosystem: Ecosystem,
    identifier: &str,
    repo_url: Option<&str>,
    primary_install_command: Option<&str>,
) -> Option<DedupMatch> {
    if existing.slug == slug {
        return Some(DedupMatch::Slug);
    }
    if existing.ecosystem == ecosystem && existing.ecosystem_identifier == identifier {
        return Some(DedupMatch::Identity);
    }
    let existing_repo = existing.repository_url.as_deref().and_then(normalized_repo_url);
    let candidate_repo = repo_url.and_then(normalized_repo_url);
    let existing_command = existing.installation_methods.iter().min_by_key(|m| m.priority).map(|m| m.command.as_str());

    if let (Some(er), Some(cr), Some(ec), Some(cc)) =
        (existing_repo.as_deref(), candidate_repo.as_deref(), existing_command, primary_install_command)
    {
        if er == cr && ec == cc {
            return Some(DedupMatch::Fingerprint);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_scheme_and_git_suffix() {
        assert_eq!(
            normalized_repo_url("https://github.com/Acme/widget.git"),
            Some("github.com/acme/widget".to_string())
        );
    }

    #[test]
    fn normalizes_trailing_slash() {
        assert_eq!(normalized_repo_url("http://github.com/acme/widget/"), Some("github.com/acme/widget".to_string()));
    }

    #[test]
    fn empty_url_has_no_normalized_form() {
        assert_eq!(normalized_repo_url("  "), None);
    }
}
