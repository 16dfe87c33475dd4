// Module layout (Clean Architecture style)
// - bootstrap: configuration and startup
// - infrastructure: Postgres link store and LDAP adapters
// - presentation: HTTP handlers and routing
// - application: ports, directory flows and use cases
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
