use futures::future::try_join_all;
use std::collections::HashSet;
use tracing::{debug, error, info};

use super::slug::slugify;
use super::types::{NewEntity, Taxonomy};
use crate::error::PipelineError;
use crate::store::ProjectStore;
use crate::TARGET_RESOLVER;

/// Entity ids resolved for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLabels {
    pub technologies: Vec<i64>,
    pub tags: Vec<i64>,
}

/// Builds find-or-create requests for `labels`, failing on any label that
/// has no usable slug. No store call is made here.
pub fn label_requests(taxonomy: Taxonomy, labels: &[String]) -> Result<Vec<NewEntity>, PipelineError> {
    labels
        .iter()
        .map(|label| {
            let slug = slugify(label);
            if slug.is_empty() {
                return Err(PipelineError::field(
                    taxonomy.field(),
                    format!("'{}' does not contain any letters or digits", label),
                ));
            }
            Ok(NewEntity::from_label(taxonomy, label, slug))
        })
        .collect()
}

/// Resolves every request concurrently and returns one id per distinct
/// entity, in request order.
///
/// Two labels can land on the same entity (e.g. "Go" and "go"); the repeat is
/// dropped so a project never references an entity twice. Any store failure
/// fails the whole batch. Entities created before the failure are left as
/// reusable orphans.
pub async fn resolve_requests<S>(
    store: &S,
    taxonomy: Taxonomy,
    requests: &[NewEntity],
) -> Result<Vec<i64>, PipelineError>
where
    S: ProjectStore + ?Sized,
{
    if requests.is_empty() {
        return Ok(Vec::new());
    }

    let entities = try_join_all(
        requests
            .iter()
            .map(|request| store.find_or_create_entity(taxonomy, request)),
    )
    .await
    .map_err(|e| {
        error!(
            target: TARGET_RESOLVER,
            "Failed to resolve {} labels: {}", taxonomy, e
        );
        PipelineError::from(e)
    })?;

    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(entities.len());
    for (request, entity) in requests.iter().zip(&entities) {
        if request.name != entity.name {
            debug!(
                target: TARGET_RESOLVER,
                "Label '{}' reused existing {} '{}' ({})", request.name, taxonomy, entity.name, entity.id
            );
        }
        if seen.insert(entity.id) {
            ids.push(entity.id);
        }
    }

    info!(
        target: TARGET_RESOLVER,
        "Resolved {} {} labels to {} entities", requests.len(), taxonomy, ids.len()
    );

    Ok(ids)
}

/// Returns existing-or-new entity ids for `labels` within `taxonomy`.
///
/// Distinct labels that resolve to the same entity (`Go` and `GO!`) yield one
/// id, so the result can be shorter than `labels`. Order follows first
/// occurrence.
pub async fn resolve_labels<S>(
    store: &S,
    taxonomy: Taxonomy,
    labels: &[String],
) -> Result<Vec<i64>, PipelineError>
where
    S: ProjectStore + ?Sized,
{
    let requests = label_requests(taxonomy, labels)?;
    resolve_requests(store, taxonomy, &requests).await
}

/// Resolves the technology and tag requests of one submission concurrently.
pub async fn resolve_taxonomies<S>(
    store: &S,
    technologies: &[NewEntity],
    tags: &[NewEntity],
) -> Result<ResolvedLabels, PipelineError>
where
    S: ProjectStore + ?Sized,
{
    let (technologies, tags) = tokio::try_join!(
        resolve_requests(store, Taxonomy::Technology, technologies),
        resolve_requests(store, Taxonomy::Tag, tags),
    )?;

    Ok(ResolvedLabels { technologies, tags })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{MemoryStore, UnavailableStore};
    use crate::taxonomy::labels::split_labels;
    use crate::taxonomy::types::TechnologyCategory;
    use std::sync::Arc;

    fn labels(text: &str) -> Vec<String> {
        split_labels(Some(text))
    }

    #[tokio::test]
    async fn test_empty_labels_make_no_store_call() {
        let store = MemoryStore::new();
        let ids = resolve_labels(&store, Taxonomy::Tag, &[]).await.unwrap();
        assert!(ids.is_empty());
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_resolving_twice_creates_one_entity() {
        let store = MemoryStore::new();
        let first = resolve_labels(&store, Taxonomy::Technology, &labels("Next.js"))
            .await
            .unwrap();
        let second = resolve_labels(&store, Taxonomy::Technology, &labels("Next.js"))
            .await
            .unwrap();

        assert_eq!(first, second);
        let stored = store.entities(Taxonomy::Technology);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].slug, "next-js");
        assert_eq!(stored[0].category, Some(TechnologyCategory::Other));
    }

    #[tokio::test]
    async fn test_existing_entity_is_reused_by_slug_and_name() {
        let store = MemoryStore::new();
        let go = store.seed_entity(Taxonomy::Technology, "Go", "go");

        let ids = resolve_labels(&store, Taxonomy::Technology, &labels("Go, go, GO!"))
            .await
            .unwrap();

        assert_eq!(ids, vec![go]);
        let stored = store.entities(Taxonomy::Technology);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Go");
    }

    #[tokio::test]
    async fn test_concurrent_resolution_yields_one_entity() {
        let store = Arc::new(MemoryStore::new());
        let label = labels("Svelte");

        let a = {
            let store = Arc::clone(&store);
            let label = label.clone();
            tokio::spawn(async move { resolve_labels(store.as_ref(), Taxonomy::Tag, &label).await })
        };
        let b = {
            let store = Arc::clone(&store);
            let label = label.clone();
            tokio::spawn(async move { resolve_labels(store.as_ref(), Taxonomy::Tag, &label).await })
        };

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
        assert_eq!(a, b);
        assert_eq!(store.entities(Taxonomy::Tag).len(), 1);
    }

    #[tokio::test]
    async fn test_taxonomies_are_separate() {
        let store = MemoryStore::new();
        let techs = label_requests(Taxonomy::Technology, &labels("Rust")).unwrap();
        let tags = label_requests(Taxonomy::Tag, &labels("Rust")).unwrap();
        let resolved = resolve_taxonomies(&store, &techs, &tags).await.unwrap();

        assert_eq!(resolved.technologies.len(), 1);
        assert_eq!(resolved.tags.len(), 1);
        assert_eq!(store.entities(Taxonomy::Technology).len(), 1);
        assert_eq!(store.entities(Taxonomy::Tag).len(), 1);
    }

    #[tokio::test]
    async fn test_unusable_label_fails_before_any_store_call() {
        let store = MemoryStore::new();
        let err = resolve_labels(&store, Taxonomy::Technology, &labels("Rust, ???"))
            .await
            .unwrap_err();

        let errors = err.field_errors().expect("validation failure");
        assert!(errors["technologies"][0].contains("???"));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_fails_the_batch() {
        let err = resolve_labels(&UnavailableStore, Taxonomy::Technology, &labels("Rust, Go"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Unavailable(_)));
    }
}
