use serde::Serialize;
use tracing::{info, instrument, warn};

use super::composer::{compose_dev_phase, compose_payload};
use super::types::{Project, ProjectPayload, ProjectSubmission};
use crate::error::{FieldErrors, PipelineError};
use crate::store::ProjectStore;
use crate::taxonomy::resolver::{label_requests, resolve_taxonomies};
use crate::taxonomy::{slugify, split_labels, Taxonomy};
use crate::TARGET_PIPELINE;

/// Outcome handed back to the submitting collaborator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
}

impl SubmissionResponse {
    pub fn saved(project: Project, message: &str) -> Self {
        SubmissionResponse {
            success: true,
            message: message.to_string(),
            errors: None,
            project_slug: Some(project.slug.clone()),
            project: Some(project),
        }
    }

    pub fn failed(err: &PipelineError) -> Self {
        let message = match err {
            PipelineError::NotFound(_) | PipelineError::SlugNotFound(_) => {
                "Project not found".to_string()
            }
            other => other.to_string(),
        };
        SubmissionResponse {
            success: false,
            message,
            errors: err.field_errors().cloned(),
            project_slug: None,
            project: None,
        }
    }
}

/// Runs structural checks, resolves labels and composes the payload.
///
/// Every structural problem (unusable name, bad dates, labels without letters
/// or digits) is reported together, before any store call.
pub async fn prepare_payload<S>(
    store: &S,
    submission: &ProjectSubmission,
) -> Result<ProjectPayload, PipelineError>
where
    S: ProjectStore + ?Sized,
{
    let mut errors = FieldErrors::new();

    let slug = slugify(&submission.name);
    if slug.is_empty() {
        errors
            .entry("name".to_string())
            .or_default()
            .push("Project name must contain letters or digits".to_string());
    }

    let dev_phase = absorb(&mut errors, compose_dev_phase(submission));

    let technologies = split_labels(submission.technologies.as_deref());
    let tags = split_labels(submission.tags.as_deref());
    let tech_requests = absorb(&mut errors, label_requests(Taxonomy::Technology, &technologies));
    let tag_requests = absorb(&mut errors, label_requests(Taxonomy::Tag, &tags));

    let (Some(dev_phase), Some(tech_requests), Some(tag_requests)) =
        (dev_phase, tech_requests, tag_requests)
    else {
        return Err(PipelineError::validation(errors));
    };
    if !errors.is_empty() {
        return Err(PipelineError::validation(errors));
    }

    let resolved = resolve_taxonomies(store, &tech_requests, &tag_requests).await?;

    Ok(compose_payload(submission, slug, dev_phase, resolved))
}

/// Creates a project from a submission. A taken slug is a conflict; no
/// suffix is invented.
#[instrument(target = "pipeline", level = "info", skip(store, submission), fields(name = %submission.name))]
pub async fn create_project<S>(
    store: &S,
    submission: &ProjectSubmission,
) -> Result<Project, PipelineError>
where
    S: ProjectStore + ?Sized,
{
    let payload = prepare_payload(store, submission).await?;
    let project = store.create_project(&payload).await.map_err(|e| {
        warn!(target: TARGET_PIPELINE, "Failed to create project '{}': {}", payload.slug, e);
        PipelineError::from(e)
    })?;

    info!(
        target: TARGET_PIPELINE,
        "Created project {} ('{}') with {} technologies and {} tags",
        project.id,
        project.slug,
        project.technologies.len(),
        project.tags.len()
    );

    Ok(project)
}

/// Overwrites project `id` with a submission.
///
/// Taxonomy references, gallery and dev phase are replaced wholesale, and
/// the slug is re-derived from the submitted name.
#[instrument(target = "pipeline", level = "info", skip(store, submission), fields(name = %submission.name))]
pub async fn update_project<S>(
    store: &S,
    id: i64,
    submission: &ProjectSubmission,
) -> Result<Project, PipelineError>
where
    S: ProjectStore + ?Sized,
{
    let payload = prepare_payload(store, submission).await?;
    let updated = store.update_project_by_id(id, &payload).await.map_err(|e| {
        warn!(target: TARGET_PIPELINE, "Failed to update project {}: {}", id, e);
        PipelineError::from(e)
    })?;

    let Some(project) = updated else {
        info!(target: TARGET_PIPELINE, "Project {} no longer exists", id);
        return Err(PipelineError::NotFound(id));
    };

    info!(
        target: TARGET_PIPELINE,
        "Updated project {} ('{}')", project.id, project.slug
    );

    Ok(project)
}

/// Creates (no `id`) or updates (`Some(id)`) a project and folds the result
/// into a [`SubmissionResponse`].
pub async fn submit<S>(store: &S, id: Option<i64>, submission: &ProjectSubmission) -> SubmissionResponse
where
    S: ProjectStore + ?Sized,
{
    let result = match id {
        Some(id) => update_project(store, id, submission)
            .await
            .map(|p| SubmissionResponse::saved(p, "Project updated successfully!")),
        None => create_project(store, submission)
            .await
            .map(|p| SubmissionResponse::saved(p, "Project created successfully!")),
    };

    result.unwrap_or_else(|err| SubmissionResponse::failed(&err))
}

fn absorb<T>(errors: &mut FieldErrors, result: Result<T, PipelineError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(PipelineError::Validation { errors: more, .. }) => {
            for (field, messages) in more {
                errors.entry(field).or_default().extend(messages);
            }
            None
        }
        Err(other) => {
            errors
                .entry("_".to_string())
                .or_default()
                .push(other.to_string());
            None
        }
    }
}
