pub mod entry;
pub mod schema;
