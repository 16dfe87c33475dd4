pub mod db;
pub mod ldap;
