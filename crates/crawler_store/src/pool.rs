use tracing::info;

use crate::error::StoreError;
use crate::schema::ensure_schema;

pub type DbPool = sqlx::SqlitePool;

/// Connects to `db_url`, applies connection-level pragmas, and ensures the
/// schema exists. One call per process; the returned pool is cloned freely.
pub async fn create_pool(db_url: &str, max_connections: u32) -> Result<DbPool, StoreError> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new().max_connections(max_connections).connect(db_url).await?;
    sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
    sqlx::query("PRAGMA synchronous=NORMAL").execute(&pool).await?;
    sqlx::query("PRAGMA foreign_keys=ON").execute(&pool).await?;
    ensure_schema(&pool).await?;
    info!(%db_url, "connected to store");
    Ok(pool)
}
