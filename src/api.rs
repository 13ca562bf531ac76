use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::db::Database;
use crate::error::{PipelineError, StoreError};
use crate::project::{self, parse_submission, validate_submission, SubmissionResponse};
use crate::taxonomy::Taxonomy;
use crate::TARGET_WEB_REQUEST;

const DEFAULT_FEATURED_LIMIT: i64 = 6;

#[derive(Debug, Deserialize)]
pub struct FeaturedParams {
    limit: Option<i64>,
}

fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::NotFound(_) | PipelineError::SlugNotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::Conflict(_) => StatusCode::CONFLICT,
        PipelineError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PipelineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Wraps pipeline failures so handlers can use `?`.
pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError(err.into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError(StoreError::from(err).into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!(target: TARGET_WEB_REQUEST, "Request failed: {}", self.0);
        } else {
            warn!(target: TARGET_WEB_REQUEST, "Request rejected: {}", self.0);
        }
        (status, Json(SubmissionResponse::failed(&self.0))).into_response()
    }
}

/// Routes for project submission and browsing.
pub fn router(db: Database) -> Router {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/featured", get(featured_projects))
        .route(
            "/projects/{key}",
            get(show_project).put(update_project).delete(delete_project),
        )
        .route("/technologies", get(list_technologies))
        .route("/technologies/{id}/projects", get(projects_by_technology))
        .route("/labels", get(available_labels))
        .with_state(db)
}

/// Binds `0.0.0.0:port` and serves the API until the process stops.
pub async fn serve(db: Database, port: u16) -> Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(target: TARGET_WEB_REQUEST, "Server running on http://{}", addr);

    axum::serve(listener, router(db).into_make_service())
        .await
        .context("API server stopped unexpectedly")?;

    Ok(())
}

async fn create_project(State(db): State<Database>, body: Bytes) -> Result<Response, ApiError> {
    let submission = parse_submission(&body)?;
    info!(target: TARGET_WEB_REQUEST, "Create project '{}'", submission.name);
    validate_submission(&submission)?;

    let project = project::create_project(&db, &submission).await?;
    let body = SubmissionResponse::saved(project, "Project created successfully!");
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

async fn update_project(
    State(db): State<Database>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Response, ApiError> {
    info!(target: TARGET_WEB_REQUEST, "Update project {}", id);
    let submission = parse_submission(&body)?;
    validate_submission(&submission)?;

    let project = project::update_project(&db, id, &submission).await?;
    let body = SubmissionResponse::saved(project, "Project updated successfully!");
    Ok(Json(body).into_response())
}

async fn delete_project(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    info!(target: TARGET_WEB_REQUEST, "Delete project {}", id);
    if !db.delete_project(id).await? {
        return Err(PipelineError::NotFound(id).into());
    }
    Ok(Json(json!({ "message": "Project deleted successfully!" })).into_response())
}

async fn show_project(
    State(db): State<Database>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    match db.get_project_by_slug(&slug).await? {
        Some(project) => Ok(Json(project).into_response()),
        None => Err(PipelineError::SlugNotFound(slug).into()),
    }
}

async fn list_projects(State(db): State<Database>) -> Result<Response, ApiError> {
    Ok(Json(db.list_projects().await?).into_response())
}

async fn featured_projects(
    State(db): State<Database>,
    Query(params): Query<FeaturedParams>,
) -> Result<Response, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_FEATURED_LIMIT).max(0);
    Ok(Json(db.featured_projects(limit).await?).into_response())
}

async fn list_technologies(State(db): State<Database>) -> Result<Response, ApiError> {
    Ok(Json(db.list_entities(Taxonomy::Technology).await?).into_response())
}

async fn projects_by_technology(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    Ok(Json(db.projects_by_technology(id).await?).into_response())
}

async fn available_labels(State(db): State<Database>) -> Result<Response, ApiError> {
    Ok(Json(db.available_labels().await?).into_response())
}
