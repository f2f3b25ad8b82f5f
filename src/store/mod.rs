pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Durable key/value persistence for the access credential and the cached
/// user snapshot. Implementations do no validation — any string may be
/// stored — and must never swallow medium failures.
///
/// All credential mutation funnels through `SessionService`; nothing else in
/// the crate touches a store directly.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// The persistence medium is inaccessible (disk error, permissions,
    /// quota). Propagated, never mapped to "no value".
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// The two logical keys, namespaced by the configured prefix.
#[derive(Debug, Clone)]
pub struct StoreKeys {
    pub access_token: String,
    pub user: String,
}

impl StoreKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            access_token: format!("{prefix}access_token"),
            user: format!("{prefix}user"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        let keys = StoreKeys::with_prefix("culturalite.");
        assert_eq!(keys.access_token, "culturalite.access_token");
        assert_eq!(keys.user, "culturalite.user");
    }
}
