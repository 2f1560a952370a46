use crate::config::AppConfig;
use crate::store::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: FileStore,
}
