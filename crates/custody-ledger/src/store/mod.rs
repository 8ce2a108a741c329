//! Storage substrate for ledger state
//!
//! The ledger reads and writes through a synchronous key-value store.
//! Values are bincode-encoded; keys follow a flat, path-like layout:
//!
//! ```text
//! committee                         -> CommitteeRecord
//! actions/count                     -> u64
//! actions/{id}                      -> Action
//! confirmations/{id}/{principal}   -> bool
//! ```

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::InMemoryStore;

use std::sync::Arc;

use custody_common::{ActionId, PrincipalId, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Synchronous key-value storage backend
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Write `value` under `key`, replacing any previous value
    fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn delete(&self, key: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

/// Key layout
pub mod keys {
    use super::*;

    pub const COMMITTEE: &str = "committee";
    pub const ACTION_COUNT: &str = "actions/count";

    pub fn action(id: ActionId) -> String {
        format!("actions/{}", id)
    }

    pub fn confirmation(id: ActionId, principal: &PrincipalId) -> String {
        format!("confirmations/{}/{}", id, principal.to_hex())
    }
}

/// Read and decode a typed value
pub fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
        None => Ok(None),
    }
}

/// Encode and write a typed value
pub fn save<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value)?;
    store.put(key, bytes)
}
