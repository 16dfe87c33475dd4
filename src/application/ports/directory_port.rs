use async_trait::async_trait;

use crate::domain::directory::entry::DirectoryEntry;
use crate::domain::directory::schema::DirectorySchema;

#[derive(thiserror::Error, Debug)]
pub enum DirectoryError {
    #[error("unable to dial directory server")]
    Connect(#[source] anyhow::Error),
    #[error("unable to negotiate TLS with directory server")]
    StartTls(#[source] anyhow::Error),
    #[error("unable to bind to directory as {dn}")]
    Bind {
        dn: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("unable to execute directory search")]
    Search(#[source] anyhow::Error),
    #[error("no directory entries matched {filter}")]
    NotFound { filter: String },
    #[error("{count} directory entries matched {filter}, expected one")]
    Ambiguous { filter: String, count: usize },
    #[error("invalid credentials")]
    InvalidCredentials(#[source] Option<anyhow::Error>),
}

/// A connection to the directory that is already bound as the service
/// identity.
#[async_trait]
pub trait DirectorySession: Send {
    async fn bind(&mut self, dn: &str, password: &str) -> Result<(), DirectoryError>;

    /// Subtree search below `base_dn`.
    async fn search(
        &mut self,
        base_dn: &str,
        filter: &str,
        attrs: &[&str],
    ) -> Result<Vec<DirectoryEntry>, DirectoryError>;

    async fn close(self: Box<Self>);
}

#[async_trait]
pub trait DirectoryConnector: Send + Sync {
    async fn open(&self) -> Result<Box<dyn DirectorySession>, DirectoryError>;

    fn schema(&self) -> &DirectorySchema;
}
