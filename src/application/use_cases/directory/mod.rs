pub mod preview_users;
