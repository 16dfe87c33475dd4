//! Probes against a live `rroemhild/test-openldap` container:
//!
//! docker run --rm -p 389:10389 -p 636:10636 rroemhild/test-openldap
//!
//! Ignored by default; run with `cargo test --test ldap_directory -- --ignored`.

use std::env::var;
use std::time::Duration;

use doclinks::application::ports::directory_port::{DirectoryConnector, DirectoryError};
use doclinks::application::services::directory;
use doclinks::bootstrap::config::{Encryption, LdapConfig};
use doclinks::domain::directory::schema::{AttributeMap, DirectorySchema};
use doclinks::infrastructure::ldap::LdapConnector;
use pretty_assertions::assert_eq;

fn config() -> LdapConfig {
    let env = |k: &str, default: &str| var(k).unwrap_or_else(|_| default.to_string());
    LdapConfig {
        host: env("TEST_LDAP_HOST", "127.0.0.1"),
        port: env("TEST_LDAP_PORT", "389").parse().unwrap(),
        encryption: Encryption::StartTls,
        bind_dn: env("TEST_LDAP_BIND_DN", "cn=admin,dc=planetexpress,dc=com"),
        bind_password: env("TEST_LDAP_BIND_PASSWORD", "GoodNewsEveryone"),
        tls_skip_verify: true,
        conn_timeout: Duration::from_secs(5),
        schema: DirectorySchema {
            base_dn: "dc=planetexpress,dc=com".into(),
            user_filter: String::new(),
            group_filter: String::new(),
            attributes: AttributeMap::default(),
        },
    }
}

#[tokio::test]
#[ignore = "needs the test-openldap container"]
async fn lists_people_under_base_dn() {
    let mut cfg = config();
    cfg.schema.base_dn = "ou=people,dc=planetexpress,dc=com".into();
    let connector = LdapConnector::new(cfg);
    let mut session = connector.open().await.unwrap();
    let users = directory::list_users(session.as_mut(), connector.schema())
        .await
        .unwrap();
    session.close().await;

    let professor = users.iter().find(|u| u.user_id == "professor").unwrap();
    assert_eq!(professor.email, "professor@planetexpress.com");
    assert_eq!(professor.last_name, "Farnsworth");
    assert!(users.len() >= 7);
}

#[tokio::test]
#[ignore = "needs the test-openldap container"]
async fn lists_ship_crew_members() {
    let mut cfg = config();
    cfg.schema.group_filter = "(&(objectClass=group)(cn=ship_crew))".into();
    let connector = LdapConnector::new(cfg);
    let mut session = connector.open().await.unwrap();
    let members = directory::list_group_members(session.as_mut(), connector.schema())
        .await
        .unwrap();
    session.close().await;

    let mut ids: Vec<_> = members.iter().map(|m| m.user_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["bender", "fry", "leela"]);
}

#[tokio::test]
#[ignore = "needs the test-openldap container"]
async fn authenticates_professor() {
    let connector = LdapConnector::new(config());
    let mut session = connector.open().await.unwrap();
    let user = directory::authenticate(session.as_mut(), connector.schema(), "professor", "professor")
        .await
        .unwrap();
    session.close().await;
    assert_eq!(
        user.dn,
        "cn=Hubert J. Farnsworth,ou=people,dc=planetexpress,dc=com"
    );
}

#[tokio::test]
#[ignore = "needs the test-openldap container"]
async fn rejects_wrong_password_and_unknown_user() {
    let connector = LdapConnector::new(config());
    let mut session = connector.open().await.unwrap();
    let schema = connector.schema();

    let err = directory::authenticate(session.as_mut(), schema, "professor", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::InvalidCredentials(Some(_))));

    // the failed bind leaves the session anonymous; reopen for the lookup
    session.close().await;
    let mut session = connector.open().await.unwrap();
    let err = directory::authenticate(session.as_mut(), schema, "zoidberg", "whoop")
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound { .. }));
    session.close().await;
}

#[tokio::test]
#[ignore = "needs the test-openldap container"]
async fn non_unique_identifier_is_ambiguous() {
    let mut cfg = config();
    cfg.schema.attributes.user_rdn = "objectClass".into();
    let connector = LdapConnector::new(cfg);
    let mut session = connector.open().await.unwrap();
    let err = directory::authenticate(session.as_mut(), connector.schema(), "inetOrgPerson", "x")
        .await
        .unwrap_err();
    session.close().await;
    assert!(matches!(err, DirectoryError::Ambiguous { .. }));
}

#[tokio::test]
#[ignore = "needs the test-openldap container"]
async fn wrong_service_password_fails_to_open() {
    let mut cfg = config();
    cfg.bind_password = "BadNewsEveryone".into();
    let err = match LdapConnector::new(cfg).open().await {
        Ok(_) => panic!("bind with a wrong service password succeeded"),
        Err(e) => e,
    };
    assert!(matches!(err, DirectoryError::Bind { .. }));
}
