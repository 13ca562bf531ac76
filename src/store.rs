//! Persistence gateway consumed by the submission pipeline.
//!
//! The pipeline never caches taxonomy state itself; every lookup goes through
//! a [`ProjectStore`], which owns the atomicity of find-or-create.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::project::types::{Project, ProjectPayload};
use crate::taxonomy::types::{NewEntity, Taxonomy, TaxonomyEntity};

#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Returns the entity whose slug equals `entity.slug` or whose name equals
    /// `entity.name`, creating it from `entity` when neither exists.
    ///
    /// Existing records are returned unmodified. A concurrent creation of the
    /// same entity must resolve to the winning record, never to an error.
    async fn find_or_create_entity(
        &self,
        taxonomy: Taxonomy,
        entity: &NewEntity,
    ) -> Result<TaxonomyEntity, StoreError>;

    /// Inserts a new project. A taken slug is a [`StoreError::Conflict`].
    async fn create_project(&self, payload: &ProjectPayload) -> Result<Project, StoreError>;

    /// Overwrites every mutable field of project `id`, including its taxonomy
    /// references. Returns `Ok(None)` when no such project exists.
    async fn update_project_by_id(
        &self,
        id: i64,
        payload: &ProjectPayload,
    ) -> Result<Option<Project>, StoreError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process stores for exercising the pipeline without SQLite.

    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryState {
        entities: Vec<TaxonomyEntity>,
        projects: Vec<Project>,
        next_id: i64,
    }

    /// Mutex-guarded store; the lock makes find-or-create a single
    /// check-and-set like the SQLite unique constraints do.
    #[derive(Default)]
    pub struct MemoryStore {
        state: Mutex<MemoryState>,
        calls: AtomicUsize,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of gateway calls made so far.
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn entities(&self, taxonomy: Taxonomy) -> Vec<TaxonomyEntity> {
            let state = self.state.lock().unwrap();
            state
                .entities
                .iter()
                .filter(|e| e.taxonomy == taxonomy)
                .cloned()
                .collect()
        }

        pub fn projects(&self) -> Vec<Project> {
            self.state.lock().unwrap().projects.clone()
        }

        pub fn seed_entity(&self, taxonomy: Taxonomy, name: &str, slug: &str) -> i64 {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            let id = state.next_id;
            state.entities.push(TaxonomyEntity {
                id,
                taxonomy,
                name: name.to_string(),
                slug: slug.to_string(),
                category: None,
                icon: None,
                docs_link: None,
            });
            id
        }
    }

    #[async_trait]
    impl ProjectStore for MemoryStore {
        async fn find_or_create_entity(
            &self,
            taxonomy: Taxonomy,
            entity: &NewEntity,
        ) -> Result<TaxonomyEntity, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Yield so concurrent resolutions genuinely interleave.
            tokio::task::yield_now().await;

            let mut state = self.state.lock().unwrap();
            let existing = state
                .entities
                .iter()
                .filter(|e| e.taxonomy == taxonomy)
                .find(|e| e.slug == entity.slug)
                .or_else(|| {
                    state
                        .entities
                        .iter()
                        .filter(|e| e.taxonomy == taxonomy)
                        .find(|e| e.name == entity.name)
                })
                .cloned();
            if let Some(found) = existing {
                return Ok(found);
            }

            state.next_id += 1;
            let created = TaxonomyEntity {
                id: state.next_id,
                taxonomy,
                name: entity.name.clone(),
                slug: entity.slug.clone(),
                category: entity.category,
                icon: None,
                docs_link: None,
            };
            state.entities.push(created.clone());
            Ok(created)
        }

        async fn create_project(&self, payload: &ProjectPayload) -> Result<Project, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            if state.projects.iter().any(|p| p.slug == payload.slug) {
                return Err(StoreError::Conflict(format!(
                    "project slug '{}' already exists",
                    payload.slug
                )));
            }
            state.next_id += 1;
            let now = Utc::now();
            let project = Project::from_payload(state.next_id, payload.clone(), now, now);
            state.projects.push(project.clone());
            Ok(project)
        }

        async fn update_project_by_id(
            &self,
            id: i64,
            payload: &ProjectPayload,
        ) -> Result<Option<Project>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut state = self.state.lock().unwrap();
            if state
                .projects
                .iter()
                .any(|p| p.slug == payload.slug && p.id != id)
            {
                return Err(StoreError::Conflict(format!(
                    "project slug '{}' already exists",
                    payload.slug
                )));
            }
            let Some(existing) = state.projects.iter_mut().find(|p| p.id == id) else {
                return Ok(None);
            };
            *existing = Project::from_payload(id, payload.clone(), existing.created_at, Utc::now());
            Ok(Some(existing.clone()))
        }
    }

    /// Store whose every call fails as if the database were down.
    #[derive(Default)]
    pub struct UnavailableStore;

    #[async_trait]
    impl ProjectStore for UnavailableStore {
        async fn find_or_create_entity(
            &self,
            _taxonomy: Taxonomy,
            _entity: &NewEntity,
        ) -> Result<TaxonomyEntity, StoreError> {
            Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
        }

        async fn create_project(&self, _payload: &ProjectPayload) -> Result<Project, StoreError> {
            Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
        }

        async fn update_project_by_id(
            &self,
            _id: i64,
            _payload: &ProjectPayload,
        ) -> Result<Option<Project>, StoreError> {
            Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
        }
    }

    /// [`MemoryStore`] whose tag lookups can be switched off.
    ///
    /// A failing tag lookup waits until in-flight technology lookups have
    /// finished, so technologies are always written before the failure.
    #[derive(Default)]
    pub struct TagOutageStore {
        pub inner: MemoryStore,
        tags_down: AtomicBool,
        technologies_in_flight: AtomicUsize,
    }

    impl TagOutageStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn take_tags_down(&self) {
            self.tags_down.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ProjectStore for TagOutageStore {
        async fn find_or_create_entity(
            &self,
            taxonomy: Taxonomy,
            entity: &NewEntity,
        ) -> Result<TaxonomyEntity, StoreError> {
            match taxonomy {
                Taxonomy::Technology => {
                    self.technologies_in_flight.fetch_add(1, Ordering::SeqCst);
                    let result = self.inner.find_or_create_entity(taxonomy, entity).await;
                    self.technologies_in_flight.fetch_sub(1, Ordering::SeqCst);
                    result
                }
                Taxonomy::Tag if self.tags_down.load(Ordering::SeqCst) => {
                    tokio::task::yield_now().await;
                    while self.technologies_in_flight.load(Ordering::SeqCst) > 0 {
                        tokio::task::yield_now().await;
                    }
                    Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut))
                }
                Taxonomy::Tag => self.inner.find_or_create_entity(taxonomy, entity).await,
            }
        }

        async fn create_project(&self, payload: &ProjectPayload) -> Result<Project, StoreError> {
            self.inner.create_project(payload).await
        }

        async fn update_project_by_id(
            &self,
            id: i64,
            payload: &ProjectPayload,
        ) -> Result<Option<Project>, StoreError> {
            self.inner.update_project_by_id(id, payload).await
        }
    }
}
