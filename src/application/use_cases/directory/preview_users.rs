use crate::application::ports::directory_port::{DirectoryConnector, DirectoryError};
use crate::application::services::directory;
use crate::domain::directory::entry::DirectoryUser;

/// Users the directory would provide: the user filter's matches, or the
/// members of the configured groups when a group filter is set.
pub struct PreviewDirectoryUsers<'a, C: DirectoryConnector + ?Sized> {
    pub directory: &'a C,
}

impl<'a, C: DirectoryConnector + ?Sized> PreviewDirectoryUsers<'a, C> {
    pub async fn execute(&self) -> Result<Vec<DirectoryUser>, DirectoryError> {
        let schema = self.directory.schema();
        let mut session = self.directory.open().await?;
        let result = if schema.group_filter.trim().is_empty() {
            directory::list_users(session.as_mut(), schema).await
        } else {
            directory::list_group_members(session.as_mut(), schema).await
        };
        session.close().await;
        result
    }
}
