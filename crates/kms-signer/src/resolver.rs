use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::PublicKeyCache;
use crate::encoding::decode_public_key;
use crate::error::SignerError;
use crate::service::{KeyService, RequestContext};
use crate::types::PublicKey;

/// Turns key identifiers into public keys, asking the key service only on a
/// cache miss.
pub struct PublicKeyResolver<K> {
    service: Arc<K>,
    cache: Arc<PublicKeyCache>,
}

impl<K> Clone for PublicKeyResolver<K> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<K: KeyService> PublicKeyResolver<K> {
    pub fn new(service: Arc<K>, cache: Arc<PublicKeyCache>) -> Self {
        Self { service, cache }
    }

    pub fn service(&self) -> &Arc<K> {
        &self.service
    }

    pub fn cache(&self) -> &Arc<PublicKeyCache> {
        &self.cache
    }

    pub async fn resolve(&self, ctx: &RequestContext, key_id: &str) -> Result<PublicKey, SignerError> {
        if let Some(key) = self.cache.get(key_id) {
            debug!(key_id, "public key cache hit");
            return Ok(key);
        }
        debug!(key_id, "public key cache miss");

        // The cache holds no lock here; two concurrent misses may both fetch,
        // and `put` keeps whichever landed first.
        let der = ctx
            .run(self.service.get_public_key(key_id))
            .await
            .map_err(|source| SignerError::KeyResolutionFailed {
                key_id: key_id.to_owned(),
                source,
            })?;

        let key = decode_public_key(&der)
            .and_then(PublicKey::from_sec1_bytes)
            .map_err(|e| e.with_key_id(key_id))?;
        let key = self.cache.put(key_id, key);

        info!(key_id, address = %key.address(), "resolved public key");
        Ok(key)
    }
}
