use std::sync::Arc;

use tracing::instrument;

use crate::cache::PublicKeyCache;
use crate::config::SignerConfig;
use crate::encoding::decode_signature;
use crate::error::SignerError;
use crate::resolver::PublicKeyResolver;
use crate::service::{KeyService, RequestContext, SignRequest};
use crate::types::{Digest, FinalSignature, PublicKey};

use super::normalize::canonicalize;
use super::recovery::finalize;
use super::transactor::TransactionSigner;

/// Produces recoverable secp256k1 signatures from a custodial key service.
///
/// Cheap to clone; clones share the key service and the public key cache.
pub struct KmsSigner<K> {
    resolver: PublicKeyResolver<K>,
    config: SignerConfig,
}

impl<K> Clone for KmsSigner<K> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            config: self.config.clone(),
        }
    }
}

impl<K: KeyService> KmsSigner<K> {
    pub fn new(service: K, config: SignerConfig) -> Self {
        Self::with_cache(Arc::new(service), Arc::new(PublicKeyCache::new()), config)
    }

    /// Builds a signer around an existing cache, e.g. to share it between
    /// signers or to inspect it in tests.
    pub fn with_cache(service: Arc<K>, cache: Arc<PublicKeyCache>, config: SignerConfig) -> Self {
        Self {
            resolver: PublicKeyResolver::new(service, cache),
            config,
        }
    }

    pub fn config(&self) -> &SignerConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<PublicKeyCache> {
        self.resolver.cache()
    }

    /// Fresh request context bounded by the configured timeout.
    pub fn context(&self) -> RequestContext {
        RequestContext::default().with_timeout(self.config.request_timeout)
    }

    pub async fn public_key(&self, ctx: &RequestContext, key_id: &str) -> Result<PublicKey, SignerError> {
        self.resolver.resolve(ctx, key_id).await
    }

    /// Signs `digest` with `key_id` and returns `r || s || v` with a low `s`
    /// and the recovery id that reproduces the key's public key.
    #[instrument(skip(self, ctx, digest), fields(digest = %digest))]
    pub async fn sign_digest(
        &self,
        ctx: &RequestContext,
        key_id: &str,
        digest: &Digest,
    ) -> Result<FinalSignature, SignerError> {
        let public_key = self.resolver.resolve(ctx, key_id).await?;

        let der = ctx
            .run(self.resolver.service().sign(SignRequest::digest(key_id, digest)))
            .await
            .map_err(|source| SignerError::SigningTransportFailed {
                key_id: key_id.to_owned(),
                source,
            })?;

        decode_signature(&der)
            .and_then(canonicalize)
            .and_then(|canonical| finalize(digest, &canonical, &public_key))
            .map_err(|e| e.with_key_id(key_id))
    }

    /// Resolves `key_id` now and returns a transaction signer for `chain_id`
    /// that only signs on behalf of the key's address.
    pub async fn transactor(
        &self,
        ctx: &RequestContext,
        key_id: &str,
        chain_id: u64,
    ) -> Result<TransactionSigner<K>, SignerError> {
        if chain_id == 0 {
            return Err(SignerError::MissingChainId {
                key_id: key_id.to_owned(),
            });
        }
        let public_key = self.resolver.resolve(ctx, key_id).await?;
        Ok(TransactionSigner::new(
            self.clone(),
            key_id.to_owned(),
            public_key.address(),
            chain_id,
        ))
    }
}
