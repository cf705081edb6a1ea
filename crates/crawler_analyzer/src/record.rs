use crawler_protocol::{AuthRequirement, Candidate, Category, InstallationMethod, IntelligenceReport, Tool};
use crawler_scrape::ScrapedBundle;

use crate::{auth, category, description, install, slug, tags, tools, use_cases};

/// The analyzer's output: everything C7 needs to build a
/// `CanonicalMcp`, independent of merge-with-existing concerns.
#[derive(Debug, Clone)]
pub struct AnalysisRecord {
    pub slug_base: String,
    pub short_description: String,
    pub long_description: String,
    pub tools: Vec<Tool>,
    pub auth: AuthRequirement,
    pub category: Category,
    pub tags: Vec<String>,
    pub use_cases: Vec<String>,
    pub installation_methods: Vec<InstallationMethod>,
}

/// Runs every extractor in explicit order over one candidate's scraped
/// bundle and optional live intelligence report. Pure: no I/O, no hidden
/// state.
pub fn analyze(
    candidate: &Candidate,
    bundle: &ScrapedBundle,
    intelligence: Option<&IntelligenceReport>,
) -> AnalysisRecord {
    let readme = bundle.repo.as_ref().and_then(|r| r.readme_text.clone()).unwrap_or_default();
    let doc_text = bundle.docs.combined_text();
    let combined_text = format!("{readme}\n\n{doc_text}\n\n{}", bundle.auth_hints.join("\n"));

    let extracted_tools = tools::extract_tools(&candidate.identifier, &combined_text, intelligence);
    let tool_names: Vec<String> = extracted_tools.iter().map(|t| t.name.clone()).collect();

    let auth_requirement = auth::extract_auth(&combined_text);

    let description = bundle.registry.description.clone().or_else(|| candidate.declared_description.clone());
    let category = category::select_category(
        &candidate.identifier,
        description.as_deref().unwrap_or(""),
        &readme,
        &tool_names,
        &bundle.registry.declared_dependencies,
    );

    let generated_tags = tags::generate_tags(
        &candidate.identifier,
        &bundle.registry.declared_keywords,
        &tool_names,
        &bundle.registry.declared_dependencies,
        candidate.ecosystem,
    );

    let generated_use_cases = use_cases::generate_use_cases(
        &candidate.identifier,
        description.as_deref().unwrap_or(""),
        &tool_names,
    );

    let installation_methods = install::extract_install_methods(
        &format!("{readme}\n\n{doc_text}"),
        &bundle.install_hints,
        &candidate.identifier,
        candidate.ecosystem,
    );

    let (short_description, long_description) =
        description::build_descriptions(&candidate.identifier, description.as_deref(), extracted_tools.len());

    let repository_url = bundle.registry.repository_url.as_deref().or(candidate.declared_repository_url.as_deref());
    let slug_base = slug::base_slug(&candidate.identifier, repository_url);

    AnalysisRecord {
        slug_base,
        short_description,
        long_description,
        tools: extracted_tools,
        auth: auth_requirement,
        category,
        tags: generated_tags,
        use_cases: generated_use_cases,
        installation_methods,
    }
}
