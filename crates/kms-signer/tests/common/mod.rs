#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use alloy_primitives::keccak256;
use k256::ecdsa::{Signature, SigningKey, signature::hazmat::PrehashSigner};
use k256::pkcs8::EncodePublicKey;
use kms_signer::{Digest, KeyService, PublicKey, ServiceError, SignRequest};
use sha2::{Digest as _, Sha256};

/// How the mock answers `Sign`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignMode {
    /// Low-S signature, as k256 produces it.
    Canonical,
    /// Same signature with `s` replaced by `n - s`.
    HighS,
    /// Signs a different digest than the one requested.
    WrongDigest,
    /// Returns bytes that are not DER.
    Garbage,
    /// Never answers.
    Hang,
}

pub struct MockKms {
    keys: HashMap<String, SigningKey>,
    mode: SignMode,
    get_public_key_calls: AtomicUsize,
    sign_calls: AtomicUsize,
    fetch_delay: Option<Duration>,
}

impl MockKms {
    pub fn new(mode: SignMode) -> Self {
        Self {
            keys: HashMap::new(),
            mode,
            get_public_key_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            fetch_delay: None,
        }
    }

    pub fn with_key(mut self, key_id: &str, seed: &str) -> Self {
        self.keys.insert(key_id.to_owned(), signing_key(seed));
        self
    }

    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    pub fn public_key(&self, key_id: &str) -> PublicKey {
        let point = self.keys[key_id].verifying_key().to_encoded_point(false);
        PublicKey::from_sec1_bytes(point.as_bytes()).unwrap()
    }

    pub fn get_public_key_calls(&self) -> usize {
        self.get_public_key_calls.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    fn key(&self, key_id: &str) -> Result<&SigningKey, ServiceError> {
        self.keys
            .get(key_id)
            .ok_or_else(|| ServiceError::UnknownKey(key_id.to_owned()))
    }
}

impl KeyService for MockKms {
    async fn get_public_key(&self, key_id: &str) -> Result<Vec<u8>, ServiceError> {
        self.get_public_key_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }
        let der = self
            .key(key_id)?
            .verifying_key()
            .to_public_key_der()
            .map_err(|e| ServiceError::remote(e.to_string()))?;
        Ok(der.as_bytes().to_vec())
    }

    async fn sign(&self, request: SignRequest<'_>) -> Result<Vec<u8>, ServiceError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(request.algorithm, "ECDSA_SHA_256");
        assert_eq!(request.message_type, "DIGEST");
        let key = self.key(request.key_id)?;

        match self.mode {
            SignMode::Canonical => Ok(sign_der(key, request.digest, false)),
            SignMode::HighS => Ok(sign_der(key, request.digest, true)),
            SignMode::WrongDigest => {
                let other = keccak256(request.digest);
                Ok(sign_der(key, &other, false))
            }
            SignMode::Garbage => Ok(vec![0x30, 0x02, 0x05, 0x00]),
            SignMode::Hang => std::future::pending().await,
        }
    }
}

pub fn signing_key(seed: &str) -> SigningKey {
    let hash = Sha256::digest(seed.as_bytes());
    SigningKey::from_bytes(&hash).unwrap()
}

/// DER signature over `digest`, optionally with `s` moved to the upper half.
pub fn sign_der(key: &SigningKey, digest: &Digest, high_s: bool) -> Vec<u8> {
    let signature: Signature = key.sign_prehash(digest.as_slice()).unwrap();
    let signature = if high_s {
        let (r, s) = signature.split_scalars();
        Signature::from_scalars(r.to_bytes(), (-s).to_bytes()).unwrap()
    } else {
        signature
    };
    signature.to_der().as_bytes().to_vec()
}

/// Fixed digest used by the end-to-end scenarios.
pub fn test_digest() -> Digest {
    Digest::from_slice(
        &hex::decode("4f1d0c9c2b6bdbb5d8d1b0aa6a0e0b7c2d2f5b0c9e8a7d6c5b4a392817161514").unwrap(),
    )
}
