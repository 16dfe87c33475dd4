use std::sync::Arc;

use crate::application::ports::directory_port::DirectoryConnector;
use crate::application::ports::link_repository::LinkRepository;
use crate::bootstrap::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

#[derive(Clone)]
pub struct AppServices {
    link_repo: Arc<dyn LinkRepository>,
    directory: Arc<dyn DirectoryConnector>,
}

impl AppServices {
    pub fn new(link_repo: Arc<dyn LinkRepository>, directory: Arc<dyn DirectoryConnector>) -> Self {
        Self {
            link_repo,
            directory,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn link_repo(&self) -> Arc<dyn LinkRepository> {
        self.services.link_repo.clone()
    }

    pub fn directory(&self) -> Arc<dyn DirectoryConnector> {
        self.services.directory.clone()
    }
}
