use alloy_primitives::Address;
use tracing::{debug, instrument};

use crate::error::SignerError;
use crate::service::{KeyService, RequestContext};
use crate::types::{Digest, FinalSignature};

use super::signer::KmsSigner;

/// The slice of a transaction library this crate relies on: a chain-bound
/// signing hash and a way to attach the finished signature.
pub trait SignableTransaction {
    type Signed;

    fn signature_hash(&self, chain_id: u64) -> Digest;

    fn into_signed(
        self,
        chain_id: u64,
        signature: FinalSignature,
    ) -> Result<Self::Signed, Box<dyn std::error::Error + Send + Sync + 'static>>;
}

/// Signs transactions for one key on one chain.
///
/// The key's address is fixed when the signer is built; requests for any
/// other address are refused before the key service is contacted.
pub struct TransactionSigner<K> {
    signer: KmsSigner<K>,
    key_id: String,
    address: Address,
    chain_id: u64,
}

impl<K> Clone for TransactionSigner<K> {
    fn clone(&self) -> Self {
        Self {
            signer: self.signer.clone(),
            key_id: self.key_id.clone(),
            address: self.address,
            chain_id: self.chain_id,
        }
    }
}

impl<K: KeyService> TransactionSigner<K> {
    pub(crate) fn new(signer: KmsSigner<K>, key_id: String, address: Address, chain_id: u64) -> Self {
        Self {
            signer,
            key_id,
            address,
            chain_id,
        }
    }

    /// Address derived from the key; the only one this signer signs for.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    #[instrument(skip(self, ctx, tx), fields(key_id = %self.key_id, chain_id = self.chain_id))]
    pub async fn sign_transaction<T>(
        &self,
        ctx: &RequestContext,
        address: Address,
        tx: T,
    ) -> Result<T::Signed, SignerError>
    where
        T: SignableTransaction,
    {
        if address != self.address {
            return Err(SignerError::UnauthorizedAddress {
                key_id: self.key_id.clone(),
                requested: address,
                expected: self.address,
            });
        }

        let digest = tx.signature_hash(self.chain_id);
        debug!(%digest, "signing transaction hash");

        let signature = self.signer.sign_digest(ctx, &self.key_id, &digest).await?;
        tx.into_signed(self.chain_id, signature)
            .map_err(|source| SignerError::AttachSignature {
                key_id: self.key_id.clone(),
                source,
            })
    }
}
