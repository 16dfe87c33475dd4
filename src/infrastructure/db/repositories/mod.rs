pub mod link_repository_sqlx;
