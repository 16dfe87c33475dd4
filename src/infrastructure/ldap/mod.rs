use anyhow::anyhow;
use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapError, Scope, SearchEntry};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::application::ports::directory_port::{
    DirectoryConnector, DirectoryError, DirectorySession,
};
use crate::bootstrap::config::{Encryption, LdapConfig};
use crate::domain::directory::entry::DirectoryEntry;
use crate::domain::directory::schema::DirectorySchema;

/// Opens ldap3 sessions bound as the configured service identity.
pub struct LdapConnector {
    cfg: LdapConfig,
}

impl LdapConnector {
    pub fn new(cfg: LdapConfig) -> Self {
        Self { cfg }
    }

    fn settings(&self) -> LdapConnSettings {
        LdapConnSettings::new()
            .set_conn_timeout(self.cfg.conn_timeout)
            .set_starttls(self.cfg.encryption == Encryption::StartTls)
            .set_no_tls_verify(self.cfg.tls_skip_verify)
    }

    /// Reachability check ahead of ldap3's own connect, so that a failure
    /// inside `with_settings` can be attributed to TLS negotiation.
    async fn dial(&self) -> Result<(), DirectoryError> {
        let addr = (self.cfg.host.as_str(), self.cfg.port);
        match tokio::time::timeout(self.cfg.conn_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(DirectoryError::Connect(e.into())),
            Err(_) => Err(DirectoryError::Connect(anyhow!(
                "connect to {}:{} timed out after {:?}",
                self.cfg.host,
                self.cfg.port,
                self.cfg.conn_timeout
            ))),
        }
    }

    /// Classifies a `with_settings` failure once the server is known to be
    /// reachable. ldap3 reports rustls handshake errors as `Io`.
    fn classify_connect_error(&self, err: LdapError) -> DirectoryError {
        match (&err, self.cfg.encryption) {
            (LdapError::UrlParsing { .. }, _) | (_, Encryption::None) => {
                DirectoryError::Connect(err.into())
            }
            _ => DirectoryError::StartTls(err.into()),
        }
    }
}

#[async_trait]
impl DirectoryConnector for LdapConnector {
    async fn open(&self) -> Result<Box<dyn DirectorySession>, DirectoryError> {
        let url = self.cfg.url();
        debug!(%url, encryption = ?self.cfg.encryption, "ldap_connect");
        self.dial().await?;
        let (conn, ldap) = LdapConnAsync::with_settings(self.settings(), &url)
            .await
            .map_err(|e| self.classify_connect_error(e))?;
        ldap3::drive!(conn);

        let mut session = LdapSession { ldap };
        if let Err(e) = session.bind(&self.cfg.bind_dn, &self.cfg.bind_password).await {
            Box::new(session).close().await;
            return Err(e);
        }
        Ok(Box::new(session))
    }

    fn schema(&self) -> &DirectorySchema {
        &self.cfg.schema
    }
}

pub struct LdapSession {
    ldap: Ldap,
}

#[async_trait]
impl DirectorySession for LdapSession {
    async fn bind(&mut self, dn: &str, password: &str) -> Result<(), DirectoryError> {
        let bind_err = |e: LdapError| DirectoryError::Bind {
            dn: dn.to_string(),
            source: e.into(),
        };
        self.ldap
            .simple_bind(dn, password)
            .await
            .map_err(bind_err)?
            .success()
            .map_err(bind_err)?;
        Ok(())
    }

    async fn search(
        &mut self,
        base_dn: &str,
        filter: &str,
        attrs: &[&str],
    ) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let (entries, _res) = self
            .ldap
            .search(base_dn, Scope::Subtree, filter, attrs.to_vec())
            .await
            .and_then(|r| r.success())
            .map_err(|e| DirectoryError::Search(e.into()))?;
        Ok(entries
            .into_iter()
            .map(|re| {
                let entry = SearchEntry::construct(re);
                DirectoryEntry {
                    dn: entry.dn,
                    attrs: entry.attrs,
                }
            })
            .collect())
    }

    async fn close(mut self: Box<Self>) {
        if let Err(e) = self.ldap.unbind().await {
            warn!(error = ?e, "ldap_unbind_failed");
        }
    }
}
