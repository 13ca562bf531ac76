use async_trait::async_trait;

use super::core::Database;
use crate::error::StoreError;
use crate::project::types::{Project, ProjectPayload};
use crate::store::ProjectStore;
use crate::taxonomy::types::{NewEntity, Taxonomy, TaxonomyEntity};

#[async_trait]
impl ProjectStore for Database {
    async fn find_or_create_entity(
        &self,
        taxonomy: Taxonomy,
        entity: &NewEntity,
    ) -> Result<TaxonomyEntity, StoreError> {
        Database::find_or_create_entity(self, taxonomy, entity).await
    }

    async fn create_project(&self, payload: &ProjectPayload) -> Result<Project, StoreError> {
        self.insert_project(payload).await
    }

    async fn update_project_by_id(
        &self,
        id: i64,
        payload: &ProjectPayload,
    ) -> Result<Option<Project>, StoreError> {
        self.overwrite_project(id, payload).await
    }
}
