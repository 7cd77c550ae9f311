use std::sync::Arc;

use crate::config::AppConfig;
use crate::replication::RegistryStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RegistryStore>,
    pub config: AppConfig,
}
