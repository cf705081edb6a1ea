use crawler_protocol::{Ecosystem, InstallKind, InstallationMethod};
use regex::Regex;

/// Installation-method extraction. Parses fenced shell-like
/// code blocks, maps each first token to a kind, fixes up flag
/// concatenation, assigns priority from [`InstallKind::default_priority`],
/// and always appends an ecosystem-idiomatic fallback.
pub fn extract_install_methods(
    doc_text: &str,
    install_hints: &[String],
    identifier: &str,
    ecosystem: Ecosystem,
) -> Vec<InstallationMethod> {
    let mut methods = Vec::new();

    for block in fenced_code_blocks(doc_text) {
        if let Some(method) = parse_command_line(&block, 95) {
            methods.push(method);
        }
    }

    for hint in install_hints {
        if let Some(method) = parse_command_line(hint, 80) {
            methods.push(method);
        }
    }

    dedup_by_kind(&mut methods);

    methods.push(fallback_method(identifier, ecosystem));
    dedup_by_kind(&mut methods);

    for method in &mut methods {
        method.priority = method.kind.default_priority();
    }
    methods.sort_by_key(|m| m.priority);
    methods
}

fn dedup_by_kind(methods: &mut Vec<InstallationMethod>) {
    let mut seen = std::collections::HashSet::new();
    methods.retain(|m| seen.insert(m.kind));
}

fn fenced_code_blocks(text: &str) -> Vec<String> {
    let fence = Regex::new(r"(?s)```(?:bash|sh|shell|console)?\n(.*?)```").unwrap();
    fence
        .captures_iter(text)
        .map(|caps| caps[1].trim().lines().next().unwrap_or("").to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

fn parse_command_line(line: &str, confidence: u8) -> Option<InstallationMethod> {
    let normalized = normalize_command(line);
    let first_token = normalized.split_whitespace().next()?;

    let kind = match first_token {
        "npx" | "npm" => InstallKind::Npm,
        "pipx" | "pip" | "pip3" => InstallKind::Pipx,
        "uvx" | "uv" => InstallKind::Pipx,
        "cargo" => InstallKind::Cargo,
        "go" => InstallKind::Go,
        "docker" => InstallKind::Docker,
        "git" => InstallKind::Git,
        _ => return None,
    };

    Some(InstallationMethod {
        kind,
        command: normalized,
        description: String::new(),
        priority: kind.default_priority(),
        confidence,
    })
}

/// Fixes parameter concatenation: inserts a space between an alphanumeric
/// character and a following `-X`/`--X` flag, and collapses whitespace runs
/// (e.g. `docker run -i--rm-e VAR` → `docker run -i --rm -e VAR`).
fn normalize_command(raw: &str) -> String {
    let flag_glue = Regex::new(r"([A-Za-z0-9])(--?[A-Za-z])").unwrap();
    let spaced = flag_glue.replace_all(raw, "$1 $2");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fallback_method(identifier: &str, ecosystem: Ecosystem) -> InstallationMethod {
    let (kind, command) = match ecosystem {
        Ecosystem::Npm => (InstallKind::Npm, format!("npx {identifier}")),
        Ecosystem::Pypi => (InstallKind::Pipx, format!("pipx install {identifier}")),
        Ecosystem::Cargo => (InstallKind::Cargo, format!("cargo install {identifier}")),
        Ecosystem::Go => (InstallKind::Go, format!("go install {identifier}@latest")),
    };
    InstallationMethod {
        kind,
        command,
        description: "Ecosystem-idiomatic fallback install.".to_string(),
        priority: kind.default_priority(),
        confidence: 50,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixes_concatenated_docker_flags() {
        let fixed = normalize_command("docker run -i--rm-e TOKEN ghcr.io/acme/server");
        assert_eq!(fixed, "docker run -i --rm -e TOKEN ghcr.io/acme/server");
    }

    #[test]
    fn always_includes_ecosystem_fallback() {
        let methods = extract_install_methods("no code blocks here", &[], "acme-tool", Ecosystem::Npm);
        assert!(methods.iter().any(|m| m.kind == InstallKind::Npm));
    }

    #[test]
    fn docker_and_git_both_present_docker_has_lower_priority() {
        let doc = "```bash\ndocker run -i --rm ghcr.io/acme/server\n```\n\n```bash\ngit clone https://github.com/acme/server\n```";
        let methods = extract_install_methods(doc, &[], "acme-server", Ecosystem::Go);
        let docker_priority = methods.iter().find(|m| m.kind == InstallKind::Docker).unwrap().priority;
        let git_priority = methods.iter().find(|m| m.kind == InstallKind::Git).unwrap().priority;
        assert!(docker_priority < git_priority);
    }
}
