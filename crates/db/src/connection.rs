use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(database_url, 5, 30).await
}

/// Opens a pool, creating the database file on first use. Every SQLite
/// in-memory connection is its own database, so in-memory pools are capped at a
/// single connection.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let url = normalize_url(database_url);
    let max_connections = if is_memory(url) { 1 } else { max_connections.max(1) };
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .connect_with(options)
        .await
}

fn normalize_url(database_url: &str) -> &str {
    let trimmed = database_url.trim();
    if trimmed == ":memory:" {
        "sqlite::memory:"
    } else {
        trimmed
    }
}

fn is_memory(url: &str) -> bool {
    url.starts_with("sqlite::memory:") || url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::connect_with_settings;

    #[tokio::test]
    async fn creates_missing_database_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("fresh.db");
        let url = format!("sqlite://{}", path.display());

        let pool = connect_with_settings(&url, 1, 5).await.expect("connect");
        let one = sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&pool).await.expect("query");

        assert_eq!(one, 1);
        assert!(path.exists());
        pool.close().await;
    }

    #[tokio::test]
    async fn memory_pool_shares_one_database() {
        let pool = connect_with_settings(":memory:", 5, 5).await.expect("connect");
        sqlx::query("CREATE TABLE probe (id INTEGER)").execute(&pool).await.expect("create");

        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM probe")
            .fetch_one(&pool)
            .await
            .expect("table visible through the pool");
        assert_eq!(count, 0);
        assert_eq!(pool.options().get_max_connections(), 1);
        pool.close().await;
    }
}
