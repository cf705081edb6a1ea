use crawler_protocol::Category;

/// Keyword table used to score each category. These mappings are
/// opinionated and deliberately data-shaped so they could move to
/// configuration without a code change; they stay inline here because
/// nothing downstream overrides them yet.
fn keyword_table() -> Vec<(Category, &'static [&'static str])> {
    vec![
        (Category::Databases, &["database", "sql", "postgres", "mysql", "mongodb", "redis", "sqlite"]),
        (Category::Payments, &["payment", "stripe", "billing", "invoice", "checkout", "paypal"]),
        (Category::AiTools, &["llm", "embedding", "ai-tools", "llmops", "vector", "openai", "anthropic"]),
        (Category::DevelopmentTools, &["git", "github", "ci", "build", "lint", "devtools"]),
        (Category::CloudStorage, &["s3", "storage", "bucket", "blob", "gcs", "azure-storage"]),
        (Category::Messaging, &["slack", "discord", "telegram", "chat", "webhook"]),
        (Category::ContentCreation, &["blog", "content", "markdown", "cms", "publish"]),
        (Category::Monitoring, &["metrics", "monitoring", "observability", "grafana", "prometheus"]),
        (Category::ProjectManagement, &["jira", "trello", "asana", "project management", "kanban"]),
        (Category::Security, &["security", "vulnerability", "secrets", "auth0", "compliance"]),
        (Category::Automation, &["automation", "workflow", "zapier", "cron", "devops"]),
        (Category::SocialMedia, &["twitter", "facebook", "instagram", "social media", "linkedin"]),
        (Category::WebApis, &["rest api", "web api", "http api", "graphql"]),
        (Category::Productivity, &["calendar", "notes", "todo", "productivity", "notion"]),
        (Category::Infrastructure, &["kubernetes", "docker", "terraform", "infrastructure", "devops"]),
        (Category::MediaProcessing, &["video", "audio", "image", "media processing", "ffmpeg"]),
        (Category::Finance, &["finance", "accounting", "tax", "ledger", "banking"]),
        (Category::Communication, &["email", "sms", "communication", "twilio", "voice"]),
        (Category::Research, &["research", "academic", "arxiv", "paper", "citation"]),
        (Category::Iot, &["iot", "sensor", "mqtt", "home assistant", "smart home"]),
    ]
}

/// Category selection: score each category across identifier,
/// description, README, observed tools, and dependencies; default to
/// `development-tools` if nothing scores above zero.
pub fn select_category(
    identifier: &str,
    description: &str,
    readme: &str,
    tool_names: &[String],
    dependencies: &[String],
) -> Category {
    let haystack = format!(
        "{} {} {} {} {}",
        identifier.to_lowercase(),
        description.to_lowercase(),
        readme.to_lowercase(),
        tool_names.join(" ").to_lowercase(),
        dependencies.join(" ").to_lowercase(),
    );

    let mut best: Option<(Category, usize)> = None;
    for (category, keywords) in keyword_table() {
        let score: usize = keywords.iter().filter(|kw| haystack.contains(*kw)).count();
        if score > 0 {
            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((category, score)),
            }
        }
    }

    best.map(|(category, _)| category).unwrap_or_else(Category::default_sentinel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_keyword_selects_databases() {
        let category = select_category("acme-postgres-mcp", "Query your postgres database", "", &[], &[]);
        assert_eq!(category, Category::Databases);
    }

    #[test]
    fn no_match_defaults_to_development_tools_sentinel() {
        let category = select_category("obscure-widget", "does something unusual", "", &[], &[]);
        assert_eq!(category, Category::default_sentinel());
    }

    #[test]
    fn category_is_always_in_the_closed_enum() {
        for (identifier, description) in [
            ("stripe-mcp", "payments"),
            ("random-thing", "mystery"),
            ("slack-bot", "messaging"),
        ] {
            let category = select_category(identifier, description, "", &[], &[]);
            assert!(Category::ALL.contains(&category));
        }
    }
}
