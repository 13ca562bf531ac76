pub mod api;
pub mod db;
pub mod environment;
pub mod error;
pub mod logging;
pub mod project;
pub mod store;
pub mod taxonomy;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_DB: &str = "db_query";
pub const TARGET_RESOLVER: &str = "resolver";
pub const TARGET_PIPELINE: &str = "pipeline";

pub use error::{PipelineError, StoreError};
