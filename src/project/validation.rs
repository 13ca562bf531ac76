//! Submission rule set shared by every inbound collaborator (HTTP handlers,
//! the admin CLI). The pipeline itself only performs structural checks; the
//! business rules live here once so the entry points cannot drift apart.

use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

use super::types::{DevStatus, GalleryInput, ProjectSubmission};
use crate::error::{FieldErrors, PipelineError};

pub const DESCRIPTION_MIN_CHARS: usize = 10;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

const INVALID_URL: &str = "Please enter a valid url";

/// Checks a submission against the form rules, reporting every failing field.
pub fn validate_submission(submission: &ProjectSubmission) -> Result<(), PipelineError> {
    let mut errors = FieldErrors::new();
    let mut fail = |field: &str, message: &str| {
        errors
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    };

    if submission.name.trim().is_empty() {
        fail("name", "Project name is required");
    }

    let description_len = submission.description.chars().count();
    if description_len < DESCRIPTION_MIN_CHARS {
        fail("description", "Description must be at least 10 characters");
    } else if description_len > DESCRIPTION_MAX_CHARS {
        fail("description", "Description must be within 500 characters.");
    }

    match submission.thumbnail.as_deref() {
        Some(thumbnail) if is_url(thumbnail) => {}
        _ => fail("thumbnail", INVALID_URL),
    }

    if let Some(repo_link) = submission.repo_link.as_deref() {
        if !repo_link.is_empty() && !is_url(repo_link) {
            fail("repoLink", INVALID_URL);
        }
    }

    let has_technologies = submission
        .technologies
        .as_deref()
        .is_some_and(|t| !t.trim().is_empty());
    if !has_technologies {
        fail("technologies", "Please list technologies used");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::validation(errors))
    }
}

/// Decodes a raw JSON submission.
///
/// Shape failures come back as field-keyed validation errors, like every
/// other rejected submission. Problems not tied to one field go under `"_"`.
pub fn parse_submission(raw: &[u8]) -> Result<ProjectSubmission, PipelineError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| PipelineError::field("_", format!("Malformed JSON: {}", e)))?;
    let Value::Object(fields) = &value else {
        return Err(PipelineError::field("_", "Submission must be a JSON object"));
    };

    match ProjectSubmission::deserialize(&value) {
        Ok(submission) => Ok(submission),
        Err(err) => {
            let mut errors = shape_errors(fields);
            if errors.is_empty() {
                errors.insert("_".to_string(), vec![err.to_string()]);
            }
            Err(PipelineError::validation(errors))
        }
    }
}

fn shape_errors(fields: &Map<String, Value>) -> FieldErrors {
    let mut errors = FieldErrors::new();

    let name = fields.get("name").or_else(|| fields.get("pname"));
    match name {
        None | Some(Value::Null) => push(&mut errors, "name", "Project name is required"),
        Some(value) if String::deserialize(value).is_err() => {
            push(&mut errors, "name", "Project name must be text")
        }
        Some(_) => {}
    }
    match fields.get("description") {
        None | Some(Value::Null) => push(&mut errors, "description", "Description is required"),
        Some(value) if String::deserialize(value).is_err() => {
            push(&mut errors, "description", "Description must be text")
        }
        Some(_) => {}
    }

    for (field, value) in fields {
        match field.as_str() {
            "name" | "pname" | "description" => {}
            "devStatus" => {
                if DevStatus::deserialize(value).is_err() {
                    let known: Vec<&str> = DevStatus::ALL.iter().map(|s| s.as_str()).collect();
                    push(
                        &mut errors,
                        field,
                        &format!("Unknown development status; expected one of: {}", known.join(", ")),
                    );
                }
            }
            "gallery" => {
                if Option::<GalleryInput>::deserialize(value).is_err() {
                    push(
                        &mut errors,
                        field,
                        "Gallery must be comma-separated URLs or a list of { url, caption } items",
                    );
                }
            }
            "thumbnail" | "repoLink" | "siteUrl" | "technologies" | "tags" | "details"
            | "problemStatement" | "startDate" | "endDate" => {
                if Option::<String>::deserialize(value).is_err() {
                    push(&mut errors, field, "Expected text");
                }
            }
            _ => {}
        }
    }

    errors
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

fn is_url(value: &str) -> bool {
    Url::parse(value.trim()).is_ok()
}
