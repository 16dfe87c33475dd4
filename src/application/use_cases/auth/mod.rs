pub mod directory_login;
