pub mod composer;
pub mod pipeline;
pub mod types;
pub mod validation;

pub use pipeline::{create_project, submit, update_project, SubmissionResponse};
pub use types::*;
pub use validation::{parse_submission, validate_submission};
