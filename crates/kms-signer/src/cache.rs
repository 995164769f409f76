use dashmap::DashMap;

use crate::types::PublicKey;

/// Public keys already fetched from the key service, by key identifier.
///
/// Entries are trusted on first use: once a key identifier has a key, later
/// inserts for it are ignored and nothing is ever evicted.
#[derive(Debug, Default)]
pub struct PublicKeyCache {
    keys: DashMap<String, PublicKey>,
}

impl PublicKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key_id: &str) -> Option<PublicKey> {
        self.keys.get(key_id).map(|entry| *entry)
    }

    /// Inserts `key` unless `key_id` is already present. Returns the key that
    /// ends up cached, which is the earlier one if there was a race.
    pub fn put(&self, key_id: &str, key: PublicKey) -> PublicKey {
        *self.keys.entry(key_id.to_owned()).or_insert(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
