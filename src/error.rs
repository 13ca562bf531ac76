use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to the list of messages reported for it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Failures raised by a [`crate::store::ProjectStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write (e.g. project slug taken).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached or failed the query.
    #[error("store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// A stored row could not be decoded back into the domain model.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            _ => StoreError::Unavailable(err),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

/// Caller-facing failure of a project submission.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Structural or rule failure, keyed by submitted field name.
    #[error("{message}")]
    Validation { message: String, errors: FieldErrors },

    #[error("project {0} not found")]
    NotFound(i64),

    #[error("project '{0}' not found")]
    SlugNotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Builds a validation failure carrying a single field message.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        PipelineError::Validation {
            message: "Validation failed".to_string(),
            errors,
        }
    }

    /// Builds a validation failure from an already collected error map.
    pub fn validation(errors: FieldErrors) -> Self {
        PipelineError::Validation {
            message: "Validation failed".to_string(),
            errors,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            PipelineError::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(detail) => PipelineError::Conflict(detail),
            StoreError::Unavailable(source) => PipelineError::Unavailable(source.to_string()),
            StoreError::Corrupt(detail) => PipelineError::Internal(detail),
        }
    }
}
