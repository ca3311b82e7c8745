//! Store-data lookup by nnid.
//!
//! The gateway only needs a key -> bytes fetch; where the bytes live is behind
//! [`StoreDataSource`]. The in-memory source is built from `store.entries`.

use std::collections::HashMap;

use async_trait::async_trait;

use miigate_core::error::Result;
use miigate_core::params::payload;

use crate::config::StoreSection;

#[async_trait]
pub trait StoreDataSource: Send + Sync {
    /// `Ok(None)` is a lookup miss.
    async fn fetch(&self, nnid: &str) -> Result<Option<Vec<u8>>>;
}

/// Lowercase with `-`, `_` and `.` removed.
pub fn normalize_nnid(nnid: &str) -> String {
    nnid.chars()
        .filter(|c| !matches!(c, '-' | '_' | '.'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(section: &StoreSection) -> Result<Self> {
        let mut store = Self::new();
        for (nnid, raw) in &section.entries {
            let data = payload::decode_store_data(raw)?;
            payload::check_length(&data)?;
            store.insert(nnid, data);
        }
        Ok(store)
    }

    pub fn insert(&mut self, nnid: &str, data: Vec<u8>) {
        self.entries.insert(normalize_nnid(nnid), data);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[async_trait]
impl StoreDataSource for InMemoryStore {
    async fn fetch(&self, nnid: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(&normalize_nnid(nnid)).cloned())
    }
}
