use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, warn};

use super::core::Database;
use crate::error::StoreError;
use crate::taxonomy::types::{NewEntity, Taxonomy, TaxonomyEntity, TechnologyCategory};
use crate::TARGET_DB;

// A lost insert race re-reads the winner; a vanished winner (deleted in
// between) is retried this many times before giving up.
const FIND_OR_CREATE_ATTEMPTS: usize = 3;

/// Names offered as suggestions in submission forms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AvailableLabels {
    pub technologies: Vec<String>,
    pub tags: Vec<String>,
}

/// Select list for an entity table, optionally qualified with `alias.`.
fn entity_columns(taxonomy: Taxonomy, alias: &str) -> String {
    match taxonomy {
        Taxonomy::Technology => format!(
            "{a}id, {a}name, {a}slug, {a}category, {a}icon, {a}docs_link",
            a = alias
        ),
        Taxonomy::Tag => format!(
            "{a}id, {a}name, {a}slug, NULL AS category, NULL AS icon, NULL AS docs_link",
            a = alias
        ),
    }
}

fn entity_from_row(taxonomy: Taxonomy, row: &SqliteRow) -> TaxonomyEntity {
    let category: Option<String> = row.get("category");
    TaxonomyEntity {
        id: row.get("id"),
        taxonomy,
        name: row.get("name"),
        slug: row.get("slug"),
        category: category.as_deref().map(TechnologyCategory::from),
        icon: row.get("icon"),
        docs_link: row.get("docs_link"),
    }
}

impl Database {
    /// Looks up an entity by slug or exact name. A slug match wins over a
    /// different row that only matches by name.
    pub async fn find_entity(
        &self,
        taxonomy: Taxonomy,
        slug: &str,
        name: &str,
    ) -> Result<Option<TaxonomyEntity>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {}
            FROM {}
            WHERE slug = ?1 OR name = ?2
            ORDER BY (slug = ?1) DESC, id ASC
            LIMIT 1
            "#,
            entity_columns(taxonomy, ""),
            taxonomy.table()
        );

        let row = sqlx::query(&sql)
            .bind(slug)
            .bind(name)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(|row| entity_from_row(taxonomy, &row)))
    }

    /// Inserts `entity` unless its name or slug is already taken, in which
    /// case nothing is written and `None` is returned.
    async fn insert_entity_if_absent(
        &self,
        taxonomy: Taxonomy,
        entity: &NewEntity,
    ) -> Result<Option<TaxonomyEntity>, sqlx::Error> {
        let row = match taxonomy {
            Taxonomy::Technology => {
                let category = entity.category.unwrap_or_default().to_string();
                sqlx::query(
                    r#"
                    INSERT OR IGNORE INTO technologies (name, slug, category)
                    VALUES (?1, ?2, ?3)
                    RETURNING id, name, slug, category, icon, docs_link
                    "#,
                )
                .bind(&entity.name)
                .bind(&entity.slug)
                .bind(category)
                .fetch_optional(self.pool())
                .await?
            }
            Taxonomy::Tag => {
                sqlx::query(
                    r#"
                    INSERT OR IGNORE INTO tags (name, slug)
                    VALUES (?1, ?2)
                    RETURNING id, name, slug, NULL AS category, NULL AS icon, NULL AS docs_link
                    "#,
                )
                .bind(&entity.name)
                .bind(&entity.slug)
                .fetch_optional(self.pool())
                .await?
            }
        };

        Ok(row.map(|row| entity_from_row(taxonomy, &row)))
    }

    /// Atomic find-or-create keyed on slug OR name.
    ///
    /// The unique constraints on `name` and `slug` make the insert the
    /// check-and-set: when a concurrent writer wins, our insert is ignored
    /// and the winner's row is read back.
    pub async fn find_or_create_entity(
        &self,
        taxonomy: Taxonomy,
        entity: &NewEntity,
    ) -> Result<TaxonomyEntity, StoreError> {
        for attempt in 1..=FIND_OR_CREATE_ATTEMPTS {
            if let Some(existing) = self.find_entity(taxonomy, &entity.slug, &entity.name).await? {
                return Ok(existing);
            }

            if let Some(created) = self.insert_entity_if_absent(taxonomy, entity).await? {
                debug!(
                    target: TARGET_DB,
                    "Created {} '{}' ({}) with id {}", taxonomy, created.name, created.slug, created.id
                );
                return Ok(created);
            }

            debug!(
                target: TARGET_DB,
                "Insert of {} '{}' lost a race (attempt {}), re-reading", taxonomy, entity.slug, attempt
            );
        }

        warn!(
            target: TARGET_DB,
            "Could not find or create {} '{}' after {} attempts", taxonomy, entity.slug, FIND_OR_CREATE_ATTEMPTS
        );
        Err(StoreError::Corrupt(format!(
            "{} '{}' could neither be found nor created",
            taxonomy, entity.slug
        )))
    }

    /// All entities of a taxonomy, sorted by name.
    pub async fn list_entities(&self, taxonomy: Taxonomy) -> Result<Vec<TaxonomyEntity>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY name COLLATE NOCASE ASC, id ASC",
            entity_columns(taxonomy, ""),
            taxonomy.table()
        );

        let rows = sqlx::query(&sql).fetch_all(self.pool()).await?;
        Ok(rows
            .iter()
            .map(|row| entity_from_row(taxonomy, row))
            .collect())
    }

    /// Entities linked to a project, in submission order.
    pub async fn entities_for_project(
        &self,
        taxonomy: Taxonomy,
        project_id: i64,
    ) -> Result<Vec<TaxonomyEntity>, sqlx::Error> {
        let (link_table, link_column) = taxonomy.link_table();
        let columns = entity_columns(taxonomy, "e.");
        let sql = format!(
            r#"
            SELECT {columns}
            FROM {link_table} l
            JOIN {table} e ON e.id = l.{link_column}
            WHERE l.project_id = ?1
            ORDER BY l.position ASC
            "#,
            table = taxonomy.table(),
        );

        let rows = sqlx::query(&sql)
            .bind(project_id)
            .fetch_all(self.pool())
            .await?;
        Ok(rows
            .iter()
            .map(|row| entity_from_row(taxonomy, row))
            .collect())
    }

    /// Technology and tag names for suggestion lists.
    pub async fn available_labels(&self) -> Result<AvailableLabels, sqlx::Error> {
        let technologies = self
            .list_entities(Taxonomy::Technology)
            .await?
            .into_iter()
            .map(|e| e.name)
            .collect();
        let tags = self
            .list_entities(Taxonomy::Tag)
            .await?
            .into_iter()
            .map(|e| e.name)
            .collect();

        Ok(AvailableLabels { technologies, tags })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::core::testing::temp_database;
    use crate::taxonomy::slugify;

    fn request(taxonomy: Taxonomy, label: &str) -> NewEntity {
        NewEntity::from_label(taxonomy, label, slugify(label))
    }

    #[tokio::test]
    async fn test_find_or_create_is_idempotent() {
        let (_dir, db) = temp_database().await;

        let first = db
            .find_or_create_entity(Taxonomy::Technology, &request(Taxonomy::Technology, "Next.js"))
            .await
            .unwrap();
        let second = db
            .find_or_create_entity(Taxonomy::Technology, &request(Taxonomy::Technology, "Next.js"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.category, Some(TechnologyCategory::Other));
        assert_eq!(db.list_entities(Taxonomy::Technology).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_slug_match_reuses_first_writer() {
        let (_dir, db) = temp_database().await;

        let go = db
            .find_or_create_entity(Taxonomy::Tag, &request(Taxonomy::Tag, "Go"))
            .await
            .unwrap();
        let shouting = db
            .find_or_create_entity(Taxonomy::Tag, &request(Taxonomy::Tag, "GO!"))
            .await
            .unwrap();

        assert_eq!(go.id, shouting.id);
        assert_eq!(shouting.name, "Go");
        assert_eq!(shouting.category, None);
    }

    #[tokio::test]
    async fn test_name_match_without_slug_match() {
        let (_dir, db) = temp_database().await;
        sqlx::query("INSERT INTO tags (name, slug) VALUES ('C#', 'csharp')")
            .execute(db.pool())
            .await
            .unwrap();

        let found = db
            .find_or_create_entity(Taxonomy::Tag, &request(Taxonomy::Tag, "C#"))
            .await
            .unwrap();

        assert_eq!(found.slug, "csharp");
        assert_eq!(db.list_entities(Taxonomy::Tag).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_find_or_create_yields_one_row() {
        let (_dir, db) = temp_database().await;
        let entity = request(Taxonomy::Technology, "Svelte");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            let entity = entity.clone();
            handles.push(tokio::spawn(async move {
                db.find_or_create_entity(Taxonomy::Technology, &entity).await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.dedup();

        assert_eq!(ids.len(), 1);
        assert_eq!(db.list_entities(Taxonomy::Technology).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_available_labels_are_sorted() {
        let (_dir, db) = temp_database().await;
        for label in ["rust", "Axum", "SQLite"] {
            db.find_or_create_entity(Taxonomy::Technology, &request(Taxonomy::Technology, label))
                .await
                .unwrap();
        }
        db.find_or_create_entity(Taxonomy::Tag, &request(Taxonomy::Tag, "backend"))
            .await
            .unwrap();

        let labels = db.available_labels().await.unwrap();
        assert_eq!(labels.technologies, vec!["Axum", "rust", "SQLite"]);
        assert_eq!(labels.tags, vec!["backend"]);
    }
}
