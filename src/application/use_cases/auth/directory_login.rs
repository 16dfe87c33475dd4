use crate::application::ports::directory_port::{DirectoryConnector, DirectoryError};
use crate::application::services::directory;
use crate::domain::directory::entry::DirectoryUser;

pub struct DirectoryLogin<'a, C: DirectoryConnector + ?Sized> {
    pub directory: &'a C,
}

#[derive(Debug, Clone)]
pub struct DirectoryLoginRequest {
    pub username: String,
    pub password: String,
}

impl<'a, C: DirectoryConnector + ?Sized> DirectoryLogin<'a, C> {
    pub async fn execute(
        &self,
        req: &DirectoryLoginRequest,
    ) -> Result<DirectoryUser, DirectoryError> {
        let mut session = self.directory.open().await?;
        let result = directory::authenticate(
            session.as_mut(),
            self.directory.schema(),
            &req.username,
            &req.password,
        )
        .await;
        session.close().await;
        result
    }
}
