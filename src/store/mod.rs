//! Hash store abstraction
//!
//! Handlers talk to a [`HashStore`]; production wires in [`RedisStore`],
//! tests use the in-memory store.

pub mod remote;

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::config::ConfigError;

pub use remote::RedisStore;

/// Field/value pairs of a single hash
pub type Fields = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("field '{field}' not found under key '{key}'")]
    NotFound { key: String, field: String },

    #[error("no fields to write under key '{key}'")]
    EmptyPayload { key: String },
}

/// Operations on string hashes keyed by name
#[async_trait]
pub trait HashStore: Send + Sync {
    /// Write `fields` into the hash at `key`, returning how many fields were newly created
    async fn set(&self, key: &str, fields: &Fields) -> Result<u64, StoreError>;

    /// Read a single field
    async fn get(&self, key: &str, field: &str) -> Result<String, StoreError>;

    /// Read every field; a missing key yields an empty map
    async fn get_all(&self, key: &str) -> Result<Fields, StoreError>;
}
