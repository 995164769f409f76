use k256::ecdsa::{Signature, SigningKey, signature::hazmat::PrehashSigner};
use k256::pkcs8::EncodePublicKey;
use sha2::{Digest as _, Sha256};

use crate::service::{KeyService, ServiceError, SignRequest};
use crate::types::PublicKey;

/// A key service backed by a secp256k1 key held in this process.
///
/// Answers with the same DER shapes a remote service would, so the usual
/// resolve / canonicalize / finalize path applies unchanged. Only the one
/// key identifier it was built with is known.
pub struct LocalKeyService {
    key_id: String,
    signing_key: SigningKey,
}

impl LocalKeyService {
    pub fn new(key_id: impl Into<String>, signing_key: SigningKey) -> Self {
        Self {
            key_id: key_id.into(),
            signing_key,
        }
    }

    /// The SHA-256 hash of the seed becomes the 32-byte private key.
    pub fn from_seed(key_id: impl Into<String>, seed: &str) -> Result<Self, ServiceError> {
        let hash = Sha256::digest(seed.as_bytes());
        let signing_key = SigningKey::from_bytes(&hash)
            .map_err(|e| ServiceError::remote(format!("invalid seed: {e}")))?;
        Ok(Self::new(key_id, signing_key))
    }

    /// Accepts a 32-byte private key as hex, with or without `0x`.
    pub fn from_private_key_hex(key_id: impl Into<String>, private_key: &str) -> Result<Self, ServiceError> {
        let hex_str = private_key.strip_prefix("0x").unwrap_or(private_key);
        let bytes = hex::decode(hex_str)
            .map_err(|e| ServiceError::remote(format!("invalid private key hex: {e}")))?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| ServiceError::remote(format!("invalid private key: {e}")))?;
        Ok(Self::new(key_id, signing_key))
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_verifying_key(self.signing_key.verifying_key())
    }

    fn check_key_id(&self, key_id: &str) -> Result<(), ServiceError> {
        if key_id == self.key_id {
            Ok(())
        } else {
            Err(ServiceError::UnknownKey(key_id.to_owned()))
        }
    }
}

impl KeyService for LocalKeyService {
    async fn get_public_key(&self, key_id: &str) -> Result<Vec<u8>, ServiceError> {
        self.check_key_id(key_id)?;
        let der = self
            .signing_key
            .verifying_key()
            .to_public_key_der()
            .map_err(|e| ServiceError::remote(format!("encoding public key to DER: {e}")))?;
        Ok(der.as_bytes().to_vec())
    }

    async fn sign(&self, request: SignRequest<'_>) -> Result<Vec<u8>, ServiceError> {
        self.check_key_id(request.key_id)?;
        let signature: Signature = self
            .signing_key
            .sign_prehash(request.digest.as_slice())
            .map_err(|e| ServiceError::remote(format!("secp256k1 sign_prehash failed: {e}")))?;
        Ok(signature.to_der().as_bytes().to_vec())
    }
}
