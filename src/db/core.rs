use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    Pool, Sqlite,
};
use std::str::FromStr;
use tracing::{info, instrument};

use crate::environment::Settings;
use crate::TARGET_DB;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Get access to the database pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

impl Database {
    /// Opens (creating if missing) the SQLite database named in `settings`
    /// and brings its schema up to date.
    #[instrument(target = "db_query", level = "info", skip(settings), fields(path = %settings.database_path))]
    pub async fn new(settings: &Settings) -> Result<Self, sqlx::Error> {
        info!(target: TARGET_DB, "Creating database pool for: {}", settings.database_path);

        let connect_options =
            SqliteConnectOptions::from_str(&format!("sqlite://{}", settings.database_path))?
                .create_if_missing(true)
                .foreign_keys(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(settings.busy_timeout)
                .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(connect_options)
            .await?;

        info!(target: TARGET_DB, "Database pool created");

        let db = Database { pool };
        db.initialize_schema().await?;

        Ok(db)
    }

    /// Opens the database at `path` with default pool settings.
    pub async fn open(path: &str) -> Result<Self, sqlx::Error> {
        Self::new(&Settings::default().with_database_path(path)).await
    }

    /// Count of technologies, tags and projects, joined with `:`.
    pub async fn collect_stats(&self) -> Result<String, sqlx::Error> {
        let queries = [
            "SELECT COUNT(*) FROM technologies;",
            "SELECT COUNT(*) FROM tags;",
            "SELECT COUNT(*) FROM projects;",
        ];

        let mut results = vec![];
        for query in queries {
            let count: i64 = sqlx::query_scalar(query).fetch_one(&self.pool).await?;
            results.push(count);
        }

        Ok(results
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(":"))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Database;
    use tempfile::TempDir;

    /// A database in a throwaway directory; keep the `TempDir` alive for the
    /// duration of the test.
    pub async fn temp_database() -> (TempDir, Database) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("folio-test.db");
        let db = Database::open(path.to_str().expect("utf-8 temp path"))
            .await
            .expect("open test database");
        (dir, db)
    }
}
