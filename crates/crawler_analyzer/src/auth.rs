use std::collections::BTreeSet;

use crawler_protocol::{AuthMethod, AuthRequirement, SetupComplexity};
use regex::Regex;

/// Deterministic auth scanner over combined README/docs/stderr text
///.
pub fn extract_auth(combined_text: &str) -> AuthRequirement {
    let lower = combined_text.to_lowercase();
    let mut methods = BTreeSet::new();

    if lower.contains("no auth") || lower.contains("anonymous") {
        methods.insert(AuthMethod::None);
    }
    if lower.contains("api_key") || lower.contains("api key") {
        methods.insert(AuthMethod::ApiKey);
    }
    if lower.contains("oauth") || lower.contains("authorization code") {
        methods.insert(AuthMethod::OAuth);
    }
    if lower.contains("token") || lower.contains("bearer") {
        methods.insert(AuthMethod::Token);
    }
    if lower.contains("credentials") || (lower.contains("username") && lower.contains("password")) {
        methods.insert(AuthMethod::Credentials);
    }

    // Explicit "no auth" wins over any other token matched in the same text
    // (a README that says "no auth required (no API key needed)" should not
    // also claim `api_key`).
    if methods.contains(&AuthMethod::None) {
        methods = BTreeSet::from([AuthMethod::None]);
    }

    let required_env_vars = extract_env_vars(combined_text);
    let required = !methods.is_empty() && !methods.contains(&AuthMethod::None);

    let setup_complexity = classify_complexity(&methods, required_env_vars.len());

    let summary = if !required {
        "No authentication required.".to_string()
    } else {
        format!(
            "Requires {} ({} env var{}).",
            methods
                .iter()
                .map(describe_method)
                .collect::<Vec<_>>()
                .join(", "),
            required_env_vars.len(),
            if required_env_vars.len() == 1 { "" } else { "s" }
        )
    };

    AuthRequirement {
        required,
        methods: if methods.is_empty() { BTreeSet::from([AuthMethod::None]) } else { methods },
        required_env_vars,
        optional_env_vars: Vec::new(),
        setup_complexity,
        summary,
    }
}

fn describe_method(method: &AuthMethod) -> &'static str {
    match method {
        AuthMethod::None => "no credentials",
        AuthMethod::ApiKey => "an API key",
        AuthMethod::OAuth => "OAuth",
        AuthMethod::Token => "a bearer token",
        AuthMethod::Credentials => "username/password credentials",
        AuthMethod::Basic => "basic auth",
        AuthMethod::Custom => "custom authentication",
    }
}

/// `[A-Z][A-Z0-9_]{2,}_(?:KEY|TOKEN|SECRET|ID|URL)`, deduplicated, order
/// preserved.
fn extract_env_vars(text: &str) -> Vec<String> {
    let pattern = Regex::new(r"\b[A-Z][A-Z0-9_]{2,}_(?:KEY|TOKEN|SECRET|ID|URL)\b").unwrap();
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for m in pattern.find_iter(text) {
        let value = m.as_str().to_string();
        if seen.insert(value.clone()) {
            out.push(value);
        }
    }
    out
}

/// *simple* if method is `none`/`api_key` and ≤1 env var; *complex* if
/// `oauth` or ≥4 env vars; else *moderate*.
fn classify_complexity(methods: &BTreeSet<AuthMethod>, env_var_count: usize) -> SetupComplexity {
    if methods.contains(&AuthMethod::OAuth) || env_var_count >= 4 {
        return SetupComplexity::Complex;
    }
    let simple_method = methods.is_empty()
        || methods.contains(&AuthMethod::None)
        || (methods.len() == 1 && methods.contains(&AuthMethod::ApiKey));
    if simple_method && env_var_count <= 1 {
        return SetupComplexity::Simple;
    }
    SetupComplexity::Moderate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_auth_phrase_yields_none_method() {
        let auth = extract_auth("This server requires no auth to use.");
        assert!(!auth.required);
        assert_eq!(auth.methods, BTreeSet::from([AuthMethod::None]));
    }

    #[test]
    fn api_key_with_env_var_is_simple() {
        let auth = extract_auth("Set the HUBSPOT_API_KEY environment variable to use this api_key.");
        assert!(auth.required);
        assert!(auth.methods.contains(&AuthMethod::ApiKey));
        assert_eq!(auth.required_env_vars, vec!["HUBSPOT_API_KEY"]);
        assert_eq!(auth.setup_complexity, SetupComplexity::Simple);
    }

    #[test]
    fn oauth_is_always_complex() {
        let auth = extract_auth("Authenticate via oauth using your CLIENT_ID.");
        assert_eq!(auth.setup_complexity, SetupComplexity::Complex);
    }

    #[test]
    fn four_or_more_env_vars_is_complex() {
        let auth = extract_auth(
            "Requires an api_key via FOO_KEY, BAR_TOKEN, BAZ_SECRET, and QUX_URL.",
        );
        assert_eq!(auth.setup_complexity, SetupComplexity::Complex);
    }

    #[test]
    fn env_vars_are_deduplicated_in_order() {
        let auth = extract_auth("Needs FOO_API_KEY and FOO_API_KEY again, then BAR_TOKEN.");
        assert_eq!(auth.required_env_vars, vec!["FOO_API_KEY", "BAR_TOKEN"]);
    }
}
