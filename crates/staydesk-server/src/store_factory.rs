//! Booking store factory
//!
//! Creates the `BookingStore` implementation selected by the `database`
//! config section.

use staydesk_core::{BookingStore, MemoryBookingStore, Result};
use staydesk_store_sqlite::SqliteBookingStore;
use std::sync::Arc;

use crate::config::{DatabaseConfig, StoreBackend};

/// Create a booking store based on configuration
///
/// # Errors
/// - `Error::Io` if the database directory cannot be created
/// - `Error::Database` if the SQLite database cannot be opened
pub async fn create_booking_store(config: &DatabaseConfig) -> Result<Arc<dyn BookingStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory booking store; data is lost on restart");
            Ok(Arc::new(MemoryBookingStore::new()))
        }
        StoreBackend::Sqlite => {
            tracing::info!(path = %config.path, "Initializing SQLite booking store");
            let store = SqliteBookingStore::new(&config.path, config.max_connections).await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use staydesk_core::ResourceKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_backend() {
        let config = DatabaseConfig {
            backend: StoreBackend::Memory,
            ..DatabaseConfig::default()
        };
        let store = create_booking_store(&config).await.unwrap();
        assert!(store.ping().await.is_ok());
        assert!(store
            .list_records(None, ResourceKind::Rooms)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_backend_creates_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("desk.db");
        let config = DatabaseConfig {
            backend: StoreBackend::Sqlite,
            path: path.to_string_lossy().to_string(),
            max_connections: 2,
        };

        let store = create_booking_store(&config).await.unwrap();
        assert!(store.ping().await.is_ok());
        assert!(path.exists());
    }
}
