//! Persistent store implementations

pub mod json_file;
pub mod memory;
pub mod postgres;

use std::sync::Arc;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

use crate::common::errors::{MonitorError, Result};
use crate::common::traits::MonitorStore;
use crate::config::types::{AppConfig, StorageBackend};

/// Build and initialise the configured store
///
/// A failure here is the only fatal error of the service.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn MonitorStore>> {
    let store: Arc<dyn MonitorStore> = match config.storage.backend {
        StorageBackend::Json => Arc::new(JsonFileStore::new(&config.storage.data_dir)),
        StorageBackend::Postgres => {
            let database = config.database.as_ref().ok_or_else(|| {
                MonitorError::Configuration("postgres backend needs [database]".to_string())
            })?;
            Arc::new(PostgresStore::connect(database).await?)
        }
    };

    store.init().await?;
    Ok(store)
}
