use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};
use tracing::{debug, info};

use super::core::Database;
use crate::error::StoreError;
use crate::project::types::{
    DevStatus, DevelopmentPhase, GalleryItem, Project, ProjectDetails, ProjectPayload,
    ProjectSummary,
};
use crate::taxonomy::types::Taxonomy;
use crate::TARGET_DB;

const PROJECT_COLUMNS: &str = r#"
    id, name, slug, description, thumbnail, gallery, repo_link, demo_link,
    details, problem_statement, dev_status, dev_start_date, dev_end_date,
    created_at, updated_at
"#;

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn parse_stored_date(value: Option<String>) -> Result<Option<NaiveDate>, StoreError> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|e| StoreError::Corrupt(format!("invalid stored date '{}': {}", v, e)))
        })
        .transpose()
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("invalid stored timestamp '{}': {}", value, e)))
}

fn dev_phase_from_row(row: &SqliteRow) -> Result<DevelopmentPhase, StoreError> {
    let status: String = row.get("dev_status");
    let status = DevStatus::parse(&status)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown dev status '{}'", status)))?;

    Ok(DevelopmentPhase {
        status,
        start_date: parse_stored_date(row.get("dev_start_date"))?,
        end_date: parse_stored_date(row.get("dev_end_date"))?,
    })
}

/// Decodes a `projects` row; taxonomy ids come from the link tables.
fn project_from_row(
    row: &SqliteRow,
    technologies: Vec<i64>,
    tags: Vec<i64>,
) -> Result<Project, StoreError> {
    let gallery: String = row.get("gallery");
    let gallery: Vec<GalleryItem> = serde_json::from_str(&gallery)?;
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Project {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        thumbnail: row.get("thumbnail"),
        gallery,
        repo_link: row.get("repo_link"),
        demo_link: row.get("demo_link"),
        technologies,
        tags,
        details: row.get("details"),
        problem_statement: row.get("problem_statement"),
        dev_phase: dev_phase_from_row(row)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Replaces the links between `project_id` and one taxonomy.
async fn replace_links(
    tx: &mut Transaction<'_, Sqlite>,
    taxonomy: Taxonomy,
    project_id: i64,
    entity_ids: &[i64],
) -> Result<(), sqlx::Error> {
    let (link_table, link_column) = taxonomy.link_table();

    sqlx::query(&format!("DELETE FROM {} WHERE project_id = ?1", link_table))
        .bind(project_id)
        .execute(&mut **tx)
        .await?;

    let insert = format!(
        "INSERT OR IGNORE INTO {} (project_id, {}, position) VALUES (?1, ?2, ?3)",
        link_table, link_column
    );
    for (position, entity_id) in entity_ids.iter().enumerate() {
        sqlx::query(&insert)
            .bind(project_id)
            .bind(*entity_id)
            .bind(position as i64)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

impl Database {
    /// Inserts a project and its taxonomy links in one transaction.
    pub async fn insert_project(&self, payload: &ProjectPayload) -> Result<Project, StoreError> {
        let now = Utc::now();
        let gallery = serde_json::to_string(&payload.gallery)?;
        let mut tx = self.pool().begin().await?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO projects (
                name, slug, description, thumbnail, gallery, repo_link, demo_link,
                details, problem_statement, dev_status, dev_start_date, dev_end_date,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
            RETURNING id
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.slug)
        .bind(&payload.description)
        .bind(&payload.thumbnail)
        .bind(&gallery)
        .bind(&payload.repo_link)
        .bind(&payload.demo_link)
        .bind(&payload.details)
        .bind(&payload.problem_statement)
        .bind(payload.dev_phase.status.as_str())
        .bind(format_date(payload.dev_phase.start_date))
        .bind(format_date(payload.dev_phase.end_date))
        .bind(now.to_rfc3339())
        .fetch_one(&mut *tx)
        .await?;

        replace_links(&mut tx, Taxonomy::Technology, id, &payload.technologies).await?;
        replace_links(&mut tx, Taxonomy::Tag, id, &payload.tags).await?;
        tx.commit().await?;

        info!(target: TARGET_DB, "Inserted project {} ('{}')", id, payload.slug);

        // Reload so timestamps carry exactly what was stored.
        self.get_project(id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("project {} vanished after insert", id)))
    }

    /// Overwrites every mutable column of project `id` and replaces its links.
    /// Returns `None` (and writes nothing) when the project does not exist.
    pub async fn overwrite_project(
        &self,
        id: i64,
        payload: &ProjectPayload,
    ) -> Result<Option<Project>, StoreError> {
        let gallery = serde_json::to_string(&payload.gallery)?;
        let mut tx = self.pool().begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE projects
            SET name = ?2, slug = ?3, description = ?4, thumbnail = ?5, gallery = ?6,
                repo_link = ?7, demo_link = ?8, details = ?9, problem_statement = ?10,
                dev_status = ?11, dev_start_date = ?12, dev_end_date = ?13, updated_at = ?14
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&payload.name)
        .bind(&payload.slug)
        .bind(&payload.description)
        .bind(&payload.thumbnail)
        .bind(&gallery)
        .bind(&payload.repo_link)
        .bind(&payload.demo_link)
        .bind(&payload.details)
        .bind(&payload.problem_statement)
        .bind(payload.dev_phase.status.as_str())
        .bind(format_date(payload.dev_phase.start_date))
        .bind(format_date(payload.dev_phase.end_date))
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated == 0 {
            tx.rollback().await?;
            debug!(target: TARGET_DB, "Project {} not found for update", id);
            return Ok(None);
        }

        replace_links(&mut tx, Taxonomy::Technology, id, &payload.technologies).await?;
        replace_links(&mut tx, Taxonomy::Tag, id, &payload.tags).await?;
        tx.commit().await?;

        info!(target: TARGET_DB, "Overwrote project {} ('{}')", id, payload.slug);

        self.get_project(id).await
    }

    /// Removes a project; its links cascade. Returns whether a row was deleted.
    pub async fn delete_project(&self, id: i64) -> Result<bool, sqlx::Error> {
        let rows_affected = sqlx::query("DELETE FROM projects WHERE id = ?1")
            .bind(id)
            .execute(self.pool())
            .await?
            .rows_affected();

        info!(target: TARGET_DB, "Delete of project {} removed {} rows", id, rows_affected);
        Ok(rows_affected > 0)
    }

    async fn linked_ids(&self, taxonomy: Taxonomy, project_id: i64) -> Result<Vec<i64>, sqlx::Error> {
        let (link_table, link_column) = taxonomy.link_table();
        sqlx::query_scalar::<_, i64>(&format!(
            "SELECT {} FROM {} WHERE project_id = ?1 ORDER BY position ASC",
            link_column, link_table
        ))
        .bind(project_id)
        .fetch_all(self.pool())
        .await
    }

    async fn project_with_ids(&self, row: &SqliteRow) -> Result<Project, StoreError> {
        let id: i64 = row.get("id");
        let technologies = self.linked_ids(Taxonomy::Technology, id).await?;
        let tags = self.linked_ids(Taxonomy::Tag, id).await?;
        project_from_row(row, technologies, tags)
    }

    async fn populate(&self, project: Project) -> Result<ProjectDetails, StoreError> {
        let technologies = self
            .entities_for_project(Taxonomy::Technology, project.id)
            .await?;
        let tags = self.entities_for_project(Taxonomy::Tag, project.id).await?;
        Ok(ProjectDetails::new(project, technologies, tags))
    }

    async fn populate_rows(&self, rows: Vec<SqliteRow>) -> Result<Vec<ProjectDetails>, StoreError> {
        let mut projects = Vec::with_capacity(rows.len());
        for row in &rows {
            let project = self.project_with_ids(row).await?;
            projects.push(self.populate(project).await?);
        }
        Ok(projects)
    }

    pub async fn get_project(&self, id: i64) -> Result<Option<Project>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLUMNS))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => Ok(Some(self.project_with_ids(&row).await?)),
            None => Ok(None),
        }
    }

    /// A project with technologies and tags populated, looked up by slug.
    pub async fn get_project_by_slug(&self, slug: &str) -> Result<Option<ProjectDetails>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM projects WHERE slug = ?1",
            PROJECT_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => {
                let project = self.project_with_ids(&row).await?;
                Ok(Some(self.populate(project).await?))
            }
            None => Ok(None),
        }
    }

    /// All projects, most recently started first; undated projects last.
    pub async fn list_projects(&self) -> Result<Vec<ProjectDetails>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM projects
            ORDER BY dev_start_date IS NULL, dev_start_date DESC, id DESC
            "#,
            PROJECT_COLUMNS
        ))
        .fetch_all(self.pool())
        .await?;

        self.populate_rows(rows).await
    }

    /// The `limit` most recently finished projects; unfinished ones last.
    pub async fn featured_projects(&self, limit: i64) -> Result<Vec<ProjectDetails>, StoreError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {}
            FROM projects
            ORDER BY dev_end_date IS NULL, dev_end_date DESC, id DESC
            LIMIT ?1
            "#,
            PROJECT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(self.pool())
        .await?;

        self.populate_rows(rows).await
    }

    /// Short entries for every project that references `technology_id`.
    pub async fn projects_by_technology(
        &self,
        technology_id: i64,
    ) -> Result<Vec<ProjectSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.slug, p.thumbnail, p.dev_status, p.dev_start_date, p.dev_end_date
            FROM projects p
            JOIN project_technologies pt ON pt.project_id = p.id
            WHERE pt.technology_id = ?1
            ORDER BY p.dev_start_date IS NULL, p.dev_start_date DESC, p.id DESC
            "#,
        )
        .bind(technology_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ProjectSummary {
                    id: row.get("id"),
                    name: row.get("name"),
                    slug: row.get("slug"),
                    thumbnail: row.get("thumbnail"),
                    dev_phase: dev_phase_from_row(row)?,
                })
            })
            .collect()
    }
}
