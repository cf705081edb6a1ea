use std::sync::Arc;

use chrono::{DateTime, Utc};
use crawler_ids::RunId;
use crawler_protocol::{
    AuthRequirement, CanonicalMcp, Category, ConnectionType, Ecosystem, HealthStatus, InstallKind, InstallationMethod,
    Sourced, Tool,
};
use sqlx::Row;
use tokio::sync::Mutex;

use crate::dedup::{find_match, DedupMatch};
use crate::error::StoreError;
use crate::pool::DbPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    MergedBySlug,
    /// Matched by identity or fingerprint under a different slug; merged,
    /// but the slug was not silently rewritten.
    MergedUnderReview(DedupMatch),
}

/// Per-slug write serialization: upserts are serialized per slug. A
/// single process-wide mutex is adequate for the crawler's own
/// write path; cross-process contention is handled by the database's own
/// row-level locking on the unique slug index.
pub struct Store {
    pool: DbPool,
    write_lock: Arc<Mutex<()>>,
}

impl Store {
    pub fn new(pool: DbPool) -> Self {
        Self { pool, write_lock: Arc::new(Mutex::new(())) }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<CanonicalMcp>, StoreError> {
        let row = sqlx::query("SELECT * FROM mcps WHERE slug = ?").bind(slug).fetch_optional(&self.pool).await?;
        row.map(row_to_canonical).transpose()
    }

    /// Every persisted record, for the health-check command's "every MCP"
    /// mode. Unpaginated: the registry is small enough that this is
    /// expected to be cheap.
    pub async fn list_all(&self) -> Result<Vec<CanonicalMcp>, StoreError> {
        let rows = sqlx::query("SELECT * FROM mcps ORDER BY slug").fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_canonical).collect()
    }

    /// Finds an existing record matching the candidate's slug, identity, or
    /// fingerprint — in that priority order.
    pub async fn find_existing(
        &self,
        slug: &str,
        ecosystem: Ecosystem,
        identifier: &str,
        repo_url: Option<&str>,
        primary_install_command: Option<&str>,
    ) -> Result<Option<(CanonicalMcp, DedupMatch)>, StoreError> {
        if let Some(existing) = self.get_by_slug(slug).await? {
            return Ok(Some((existing, DedupMatch::Slug)));
        }

        let row =
            sqlx::query("SELECT * FROM mcps WHERE ecosystem = ? AND ecosystem_identifier = ?")
                .bind(ecosystem.as_str())
                .bind(identifier)
                .fetch_optional(&self.pool)
                .await?;
        if let Some(row) = row {
            return Ok(Some((row_to_canonical(row)?, DedupMatch::Identity)));
        }

        let rows = sqlx::query("SELECT * FROM mcps WHERE repository_url IS NOT NULL").fetch_all(&self.pool).await?;
        for row in rows {
            let candidate_record = row_to_canonical(row)?;
            if let Some(m) = find_match(&candidate_record, slug, ecosystem, identifier, repo_url, primary_install_command) {
                if m == DedupMatch::Fingerprint {
                    return Ok(Some((candidate_record, m)));
                }
            }
        }
        Ok(None)
    }

    /// Writes `canonical`, serialized per slug. Idempotent: a repeat call
    /// with the identical record is a no-op beyond `updated_at` semantics,
    /// which `normalize_and_merge` already decided before this is called.
    pub async fn upsert(&self, canonical: &CanonicalMcp, match_kind: Option<DedupMatch>) -> Result<UpsertOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;

        let tools_json = serde_json::to_string(&canonical.tools)?;
        let working_tools_json = serde_json::to_string(&canonical.working_tools)?;
        let failing_tools_json = serde_json::to_string(&canonical.failing_tools)?;
        let auth_json = serde_json::to_string(&canonical.auth)?;
        let tags_json = serde_json::to_string(&canonical.tags.value)?;
        let use_cases_json = serde_json::to_string(&canonical.use_cases.value)?;
        let installation_methods_json = serde_json::to_string(&canonical.installation_methods)?;
        let fingerprint = canonical
            .repository_url
            .as_deref()
            .and_then(crate::dedup::normalized_repo_url)
            .map(|r| format!("{r}|{}", canonical.endpoint_command));

        sqlx::query(
            r#"INSERT INTO mcps (
                slug, name, display_name,
                short_description, short_description_source, long_description, long_description_source,
                ecosystem, install_type, endpoint_command, installation_methods,
                tools, tool_count, working_tools, failing_tools,
                auth,
                protocol_version, connection_type,
                category, tags, tags_source, use_cases, use_cases_source,
                repository_url, documentation_url, homepage_url, author, company, license,
                health_status, verified, auto_discovered, discovery_source,
                created_at, updated_at, last_scraped_at, last_validated_at,
                search_text, ecosystem_identifier, fingerprint
            ) VALUES (
                ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?, ?, ?,
                ?,
                ?, ?,
                ?, ?, ?, ?, ?,
                ?, ?, ?, ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?, ?, ?,
                ?, ?, ?
            )
            ON CONFLICT(slug) DO UPDATE SET
                name = excluded.name,
                display_name = excluded.display_name,
                short_description = excluded.short_description,
                short_description_source = excluded.short_description_source,
                long_description = excluded.long_description,
                long_description_source = excluded.long_description_source,
                install_type = excluded.install_type,
                endpoint_command = excluded.endpoint_command,
                installation_methods = excluded.installation_methods,
                tools = excluded.tools,
                tool_count = excluded.tool_count,
                working_tools = excluded.working_tools,
                failing_tools = excluded.failing_tools,
                auth = excluded.auth,
                protocol_version = excluded.protocol_version,
                connection_type = excluded.connection_type,
                category = excluded.category,
                tags = excluded.tags,
                tags_source = excluded.tags_source,
                use_cases = excluded.use_cases,
                use_cases_source = excluded.use_cases_source,
                repository_url = excluded.repository_url,
                documentation_url = excluded.documentation_url,
                homepage_url = excluded.homepage_url,
                author = excluded.author,
                company = excluded.company,
                license = excluded.license,
                health_status = excluded.health_status,
                verified = excluded.verified,
                updated_at = excluded.updated_at,
                last_scraped_at = excluded.last_scraped_at,
                last_validated_at = excluded.last_validated_at,
                search_text = excluded.search_text,
                fingerprint = excluded.fingerprint"#,
        )
        .bind(&canonical.slug)
        .bind(&canonical.name)
        .bind(&canonical.display_name)
        .bind(&canonical.short_description.value)
        .bind(source_str(&canonical.short_description))
        .bind(&canonical.long_description.value)
        .bind(source_str(&canonical.long_description))
        .bind(canonical.ecosystem.as_str())
        .bind(install_kind_str(canonical.install_type))
        .bind(&canonical.endpoint_command)
        .bind(&installation_methods_json)
        .bind(&tools_json)
        .bind(canonical.tool_count as i64)
        .bind(&working_tools_json)
        .bind(&failing_tools_json)
        .bind(&auth_json)
        .bind(&canonical.protocol_version)
        .bind(connection_type_str(canonical.connection_type))
        .bind(canonical.category.to_string())
        .bind(&tags_json)
        .bind(source_str(&canonical.tags))
        .bind(&use_cases_json)
        .bind(source_str(&canonical.use_cases))
        .bind(&canonical.repository_url)
        .bind(&canonical.documentation_url)
        .bind(&canonical.homepage_url)
        .bind(&canonical.author)
        .bind(&canonical.company)
        .bind(&canonical.license)
        .bind(health_status_str(canonical.health_status))
        .bind(canonical.verified)
        .bind(canonical.auto_discovered)
        .bind(&canonical.discovery_source)
        .bind(canonical.created_at.to_rfc3339())
        .bind(canonical.updated_at.to_rfc3339())
        .bind(canonical.last_scraped_at.to_rfc3339())
        .bind(canonical.last_validated_at.map(|t| t.to_rfc3339()))
        .bind(&canonical.search_text)
        .bind(&canonical.ecosystem_identifier)
        .bind(&fingerprint)
        .execute(&self.pool)
        .await?;

        Ok(match match_kind {
            None => UpsertOutcome::Inserted,
            Some(DedupMatch::Slug) => UpsertOutcome::MergedBySlug,
            Some(other) => UpsertOutcome::MergedUnderReview(other),
        })
    }

    pub async fn record_run_start(&self, run_id: &RunId) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO crawler_runs (id, started_at, status) VALUES (?, ?, 'running')")
            .bind(run_id.as_str())
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn record_run_complete(&self, run_id: &RunId, counters: &RunCounters, status: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"UPDATE crawler_runs SET
                completed_at = ?,
                candidates_discovered = ?,
                candidates_filtered = ?,
                candidates_scraped = ?,
                candidates_validated = ?,
                records_upserted = ?,
                errors = ?,
                status = ?
            WHERE id = ?"#,
        )
        .bind(Utc::now().to_rfc3339())
        .bind(counters.candidates_discovered as i64)
        .bind(counters.candidates_filtered as i64)
        .bind(counters.candidates_scraped as i64)
        .bind(counters.candidates_validated as i64)
        .bind(counters.records_upserted as i64)
        .bind(counters.errors as i64)
        .bind(status)
        .bind(run_id.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn history(&self, limit: u32) -> Result<Vec<RunRecord>, StoreError> {
        let rows = sqlx::query("SELECT * FROM crawler_runs ORDER BY started_at DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_run_record).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunCounters {
    pub candidates_discovered: usize,
    pub candidates_filtered: usize,
    pub candidates_scraped: usize,
    pub candidates_validated: usize,
    pub records_upserted: usize,
    pub errors: usize,
}

#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub counters: RunCounters,
    pub status: String,
}

fn row_to_run_record(row: sqlx::sqlite::SqliteRow) -> Result<RunRecord, StoreError> {
    Ok(RunRecord {
        id: row.try_get("id")?,
        started_at: parse_timestamp(&row.try_get::<String, _>("started_at")?),
        completed_at: row.try_get::<Option<String>, _>("completed_at")?.map(|s| parse_timestamp(&s)),
        counters: RunCounters {
            candidates_discovered: row.try_get::<i64, _>("candidates_discovered")? as usize,
            candidates_filtered: row.try_get::<i64, _>("candidates_filtered")? as usize,
            candidates_scraped: row.try_get::<i64, _>("candidates_scraped")? as usize,
            candidates_validated: row.try_get::<i64, _>("candidates_validated")? as usize,
            records_upserted: row.try_get::<i64, _>("records_upserted")? as usize,
            errors: row.try_get::<i64, _>("errors")? as usize,
        },
        status: row.try_get("status")?,
    })
}

fn row_to_canonical(row: sqlx::sqlite::SqliteRow) -> Result<CanonicalMcp, StoreError> {
    let tools: Vec<Tool> = serde_json::from_str(&row.try_get::<String, _>("tools")?)?;
    let working_tools: Vec<String> = serde_json::from_str(&row.try_get::<String, _>("working_tools")?)?;
    let failing_tools: Vec<String> = serde_json::from_str(&row.try_get::<String, _>("failing_tools")?)?;
    let auth: AuthRequirement = serde_json::from_str(&row.try_get::<String, _>("auth")?)?;
    let tags: Vec<String> = serde_json::from_str(&row.try_get::<String, _>("tags")?)?;
    let use_cases: Vec<String> = serde_json::from_str(&row.try_get::<String, _>("use_cases")?)?;
    let installation_methods: Vec<InstallationMethod> = serde_json::from_str(&row.try_get::<String, _>("installation_methods")?)?;

    Ok(CanonicalMcp {
        slug: row.try_get("slug")?,
        name: row.try_get("name")?,
        display_name: row.try_get("display_name")?,
        short_description: Sourced {
            value: row.try_get("short_description")?,
            source: parse_field_source(&row.try_get::<String, _>("short_description_source")?),
        },
        long_description: Sourced {
            value: row.try_get("long_description")?,
            source: parse_field_source(&row.try_get::<String, _>("long_description_source")?),
        },
        ecosystem: parse_ecosystem(&row.try_get::<String, _>("ecosystem")?),
        ecosystem_identifier: row.try_get("ecosystem_identifier")?,
        install_type: parse_install_kind(&row.try_get::<String, _>("install_type")?),
        endpoint_command: row.try_get("endpoint_command")?,
        installation_methods,
        tools: tools.clone(),
        tool_count: tools.len(),
        working_tools,
        failing_tools,
        auth,
        protocol_version: row.try_get("protocol_version")?,
        connection_type: parse_connection_type(&row.try_get::<String, _>("connection_type")?),
        category: parse_category(&row.try_get::<String, _>("category")?),
        tags: Sourced { value: tags, source: parse_field_source(&row.try_get::<String, _>("tags_source")?) },
        use_cases: Sourced {
            value: use_cases,
            source: parse_field_source(&row.try_get::<String, _>("use_cases_source")?),
        },
        repository_url: row.try_get("repository_url")?,
        documentation_url: row.try_get("documentation_url")?,
        homepage_url: row.try_get("homepage_url")?,
        author: row.try_get("author")?,
        company: row.try_get("company")?,
        license: row.try_get("license")?,
        health_status: parse_health_status(&row.try_get::<String, _>("health_status")?),
        verified: row.try_get("verified")?,
        auto_discovered: row.try_get("auto_discovered")?,
        discovery_source: row.try_get("discovery_source")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?),
        updated_at: parse_timestamp(&row.try_get::<String, _>("updated_at")?),
        last_scraped_at: parse_timestamp(&row.try_get::<String, _>("last_scraped_at")?),
        last_validated_at: row.try_get::<Option<String>, _>("last_validated_at")?.map(|s| parse_timestamp(&s)),
        search_text: row.try_get("search_text")?,
    })
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc)).unwrap_or_else(|_| Utc::now())
}

fn source_str(sourced: &Sourced<impl Clone>) -> &'static str {
    match sourced.source {
        crawler_protocol::FieldSource::Crawler => "crawler",
        crawler_protocol::FieldSource::Operator => "operator",
    }
}

fn parse_field_source(raw: &str) -> crawler_protocol::FieldSource {
    match raw {
        "operator" => crawler_protocol::FieldSource::Operator,
        _ => crawler_protocol::FieldSource::Crawler,
    }
}

fn install_kind_str(kind: InstallKind) -> &'static str {
    match kind {
        InstallKind::Npm => "npm",
        InstallKind::Pipx => "pipx",
        InstallKind::Cargo => "cargo",
        InstallKind::Go => "go",
        InstallKind::Docker => "docker",
        InstallKind::Git => "git",
        InstallKind::Binary => "binary",
    }
}

fn parse_install_kind(raw: &str) -> InstallKind {
    match raw {
        "npm" => InstallKind::Npm,
        "pipx" => InstallKind::Pipx,
        "cargo" => InstallKind::Cargo,
        "go" => InstallKind::Go,
        "docker" => InstallKind::Docker,
        "git" => InstallKind::Git,
        _ => InstallKind::Binary,
    }
}

fn connection_type_str(conn: ConnectionType) -> &'static str {
    match conn {
        ConnectionType::Stdio => "stdio",
        ConnectionType::Http => "http",
        ConnectionType::Websocket => "websocket",
    }
}

fn parse_connection_type(raw: &str) -> ConnectionType {
    match raw {
        "http" => ConnectionType::Http,
        "websocket" => ConnectionType::Websocket,
        _ => ConnectionType::Stdio,
    }
}

fn health_status_str(status: HealthStatus) -> &'static str {
    match status {
        HealthStatus::Healthy => "healthy",
        HealthStatus::Degraded => "degraded",
        HealthStatus::Down => "down",
        HealthStatus::Unknown => "unknown",
    }
}

fn parse_health_status(raw: &str) -> HealthStatus {
    match raw {
        "healthy" => HealthStatus::Healthy,
        "degraded" => HealthStatus::Degraded,
        "down" => HealthStatus::Down,
        _ => HealthStatus::Unknown,
    }
}

fn parse_ecosystem(raw: &str) -> Ecosystem {
    match raw {
        "npm" => Ecosystem::Npm,
        "pypi" => Ecosystem::Pypi,
        "cargo" => Ecosystem::Cargo,
        _ => Ecosystem::Go,
    }
}

fn parse_category(raw: &str) -> Category {
    Category::ALL.into_iter().find(|c| c.to_string() == raw).unwrap_or_else(Category::default_sentinel)
}
