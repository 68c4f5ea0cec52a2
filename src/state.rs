use std::sync::Arc;

use sqlx::SqlitePool;

use crate::notify::Notifier;
use crate::websoc::CatalogClient;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub catalog: Arc<dyn CatalogClient>,
    pub notifier: Arc<dyn Notifier>,
}
