pub mod add_link;
pub mod delete_link;
pub mod get_links;
pub mod remove_links;
pub mod search_candidates;
