//! Schema creation for the crawler's two tables and one read-side view.
//! Single source of truth for `CREATE TABLE`/`CREATE VIEW` statements.

use crate::error::StoreError;
use crate::pool::DbPool;

pub async fn ensure_schema(pool: &DbPool) -> Result<(), StoreError> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS mcps (
            slug TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            display_name TEXT NOT NULL,
            short_description TEXT NOT NULL,
            short_description_source TEXT NOT NULL,
            long_description TEXT NOT NULL,
            long_description_source TEXT NOT NULL,

            ecosystem TEXT NOT NULL,
            install_type TEXT NOT NULL,
            endpoint_command TEXT NOT NULL,
            installation_methods TEXT NOT NULL,

            tools TEXT NOT NULL,
            tool_count INTEGER NOT NULL,
            working_tools TEXT NOT NULL,
            failing_tools TEXT NOT NULL,

            auth TEXT NOT NULL,

            protocol_version TEXT,
            connection_type TEXT NOT NULL,

            category TEXT NOT NULL,
            tags TEXT NOT NULL,
            tags_source TEXT NOT NULL,
            use_cases TEXT NOT NULL,
            use_cases_source TEXT NOT NULL,

            repository_url TEXT,
            documentation_url TEXT,
            homepage_url TEXT,
            author TEXT,
            company TEXT,
            license TEXT,

            health_status TEXT NOT NULL,
            verified INTEGER NOT NULL,
            auto_discovered INTEGER NOT NULL,
            discovery_source TEXT NOT NULL,

            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            last_scraped_at TEXT NOT NULL,
            last_validated_at TEXT,

            search_text TEXT NOT NULL,

            ecosystem_identifier TEXT NOT NULL,
            fingerprint TEXT
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS mcps_ecosystem_identifier_idx ON mcps(ecosystem, ecosystem_identifier)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS mcps_fingerprint_idx ON mcps(fingerprint)").execute(pool).await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS mcps_search_text_idx ON mcps(search_text)").execute(pool).await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS crawler_runs (
            id TEXT PRIMARY KEY,
            started_at TEXT NOT NULL,
            completed_at TEXT,
            candidates_discovered INTEGER NOT NULL DEFAULT 0,
            candidates_filtered INTEGER NOT NULL DEFAULT 0,
            candidates_scraped INTEGER NOT NULL DEFAULT 0,
            candidates_validated INTEGER NOT NULL DEFAULT 0,
            records_upserted INTEGER NOT NULL DEFAULT 0,
            errors INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE VIEW IF NOT EXISTS agent_ready_mcps AS
            SELECT * FROM mcps
            WHERE health_status IN ('healthy', 'degraded')
              AND verified = 1
              AND use_cases != '[]'"#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
