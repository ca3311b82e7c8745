//! Shared application state for the miigate gateway.
//!
//! Built once at startup from the validated config; every handler gets a
//! cheap clone.

use std::sync::Arc;

use miigate_core::error::Result;

use crate::config::GatewayConfig;
use crate::store::{InMemoryStore, StoreDataSource};
use crate::transport::backend::BackendClient;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    backend: BackendClient,
    store: Option<Arc<dyn StoreDataSource>>,
}

impl AppState {
    /// Build state with the in-config store (if `store` is configured).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let store = match &cfg.store {
            Some(section) => {
                let store = InMemoryStore::from_config(section)?;
                tracing::info!(entries = store.len(), "nnid store loaded");
                Some(Arc::new(store) as Arc<dyn StoreDataSource>)
            }
            None => None,
        };
        Ok(Self::with_store(cfg, store))
    }

    /// Build state around an externally provided store source.
    pub fn with_store(cfg: GatewayConfig, store: Option<Arc<dyn StoreDataSource>>) -> Self {
        let backend = BackendClient::new(cfg.upstream.addr.clone(), cfg.upstream.timeout());
        Self {
            inner: Arc::new(AppStateInner { cfg, backend, store }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    pub fn store(&self) -> Option<Arc<dyn StoreDataSource>> {
        self.inner.store.clone()
    }
}
