//! Data storage layer
//!
//! - `filters` - Typed conditions, the filter grammar and filter fingerprints
//! - `sql` - Filter compilation to SQL predicates
//! - `pagination` - Page cursor shared by every backend
//! - `memory` - In-process store
//! - `postgres` - PostgreSQL store
//! - `types` - Users, ordering and pagination types
//! - `traits` - The `UserStore` contract
//! - `error` - Unified error type for all backends

pub mod cancel;
pub mod error;
pub mod filters;
pub mod memory;
pub mod pagination;
pub mod postgres;
pub mod sql;
pub mod traits;
pub mod types;

pub use error::DataError;
pub use memory::MemoryStore;
pub use postgres::{PostgresService, PostgresStore};
pub use traits::{PageIterator, UserStore};

use std::sync::Arc;

use crate::core::config::{PostgresConfig, StoreBackend};

/// Store service enum
///
/// Wraps the backend selected by configuration and hands out the store as a
/// `UserStore` trait object.
pub enum StoreService {
    /// In-memory backend (default, nothing persisted)
    Memory(Arc<MemoryStore>),
    /// PostgreSQL backend
    Postgres {
        service: Arc<PostgresService>,
        store: Arc<PostgresStore>,
    },
}

impl StoreService {
    /// Initialize the store for `backend`
    ///
    /// The PostgreSQL backend requires a `PostgresConfig`.
    pub async fn init(
        backend: StoreBackend,
        postgres_config: Option<&PostgresConfig>,
    ) -> Result<Self, DataError> {
        match backend {
            StoreBackend::Memory => Ok(Self::Memory(Arc::new(MemoryStore::new()))),
            StoreBackend::Postgres => {
                let config = postgres_config.ok_or_else(|| {
                    DataError::Config("PostgreSQL configuration required".to_string())
                })?;
                let service = PostgresService::init(config).await?;
                let store = PostgresStore::new(service.pool().clone());
                Ok(Self::Postgres {
                    service: Arc::new(service),
                    store: Arc::new(store),
                })
            }
        }
    }

    /// The store as a trait object
    pub fn store(&self) -> Arc<dyn UserStore> {
        match self {
            Self::Memory(store) => store.clone() as Arc<dyn UserStore>,
            Self::Postgres { store, .. } => store.clone() as Arc<dyn UserStore>,
        }
    }

    /// Get the backend name
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres { .. } => "postgres",
        }
    }

    /// Release backend resources
    pub async fn close(&self) {
        if let Self::Postgres { service, .. } = self {
            service.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_memory_backend() {
        let service = StoreService::init(StoreBackend::Memory, None).await.unwrap();
        assert_eq!(service.backend_name(), "memory");

        let store = service.store();
        assert_eq!(store.name(), "memory");
        let it = store.list(None, 10).await.unwrap();
        assert!(it.next(&CancellationToken::new()).await.unwrap().is_none());
        service.close().await;
    }

    #[tokio::test]
    async fn test_postgres_backend_requires_config() {
        let err = StoreService::init(StoreBackend::Postgres, None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, DataError::Config(_)));
    }
}
