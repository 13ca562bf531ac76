use tracing::info;

use super::core::Database;
use crate::TARGET_DB;

impl Database {
    pub(crate) async fn initialize_schema(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.pool().acquire().await?;
        sqlx::query(
            r#"
            -- Shared taxonomies; name and slug are each unique so concurrent
            -- find-or-create calls collapse onto one row.
            CREATE TABLE IF NOT EXISTS technologies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                slug TEXT NOT NULL UNIQUE,
                category TEXT NOT NULL DEFAULT 'Other', -- Language, Framework, Database, Tool, Library, Platform, Other
                icon TEXT,
                docs_link TEXT
            );

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                slug TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL,
                thumbnail TEXT,
                gallery TEXT NOT NULL DEFAULT '[]', -- JSON array of {url, caption?}
                repo_link TEXT,
                demo_link TEXT,
                details TEXT,
                problem_statement TEXT,
                dev_status TEXT NOT NULL DEFAULT 'In Progress',
                dev_start_date TEXT,
                dev_end_date TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_projects_dev_start_date ON projects (dev_start_date);
            CREATE INDEX IF NOT EXISTS idx_projects_dev_end_date ON projects (dev_end_date);

            CREATE TABLE IF NOT EXISTS project_technologies (
                project_id INTEGER NOT NULL,
                technology_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (project_id, technology_id),
                FOREIGN KEY (project_id) REFERENCES projects (id) ON DELETE CASCADE,
                FOREIGN KEY (technology_id) REFERENCES technologies (id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_project_technologies_technology_id ON project_technologies (technology_id);

            CREATE TABLE IF NOT EXISTS project_tags (
                project_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                PRIMARY KEY (project_id, tag_id),
                FOREIGN KEY (project_id) REFERENCES projects (id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags (id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_project_tags_tag_id ON project_tags (tag_id);
            "#,
        )
        .execute(&mut *conn)
        .await?;

        info!(target: TARGET_DB, "Database schema initialized");
        Ok(())
    }
}
