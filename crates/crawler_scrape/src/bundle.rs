use crawler_protocol::{DocsBundle, RegistryRecord, RepoRecord};

/// Everything C4 could gather about one candidate. `repo` and
/// the pages inside `docs` are best-effort: absence is never fatal, only a
/// missing `registry` is.
#[derive(Debug, Clone, Default)]
pub struct ScrapedBundle {
    pub registry: RegistryRecord,
    pub repo: Option<RepoRecord>,
    pub docs: DocsBundle,
    /// Raw shell-like snippets pulled from READMEs/docs, fed to the analyzer's
    /// installation-method extraction.
    pub install_hints: Vec<String>,
    /// Raw text spans (env var mentions, auth-flow prose) fed to the
    /// analyzer's auth extraction.
    pub auth_hints: Vec<String>,
}
