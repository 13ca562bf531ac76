pub mod core;
mod project;
mod schema;
mod store;
pub mod taxonomy;

pub use self::core::Database;
pub use self::taxonomy::AvailableLabels;
