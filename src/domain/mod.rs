pub mod directory;
pub mod links;
