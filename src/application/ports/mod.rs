pub mod directory_port;
pub mod link_repository;
