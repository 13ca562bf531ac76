pub mod labels;
pub mod resolver;
pub mod slug;
pub mod types;

pub use labels::split_labels;
pub use resolver::{resolve_labels, resolve_taxonomies, ResolvedLabels};
pub use slug::slugify;
pub use types::*;
