use alloy_primitives::{Address, keccak256};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::error::SignerError;

/// 32-byte hash handed to the key service for signing.
pub type Digest = alloy_primitives::B256;

/// secp256k1 public key as 64 raw bytes: X followed by Y, no SEC1 prefix.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey([u8; 64]);

impl PublicKey {
    /// Builds a key from SEC1 bytes (compressed or uncompressed).
    ///
    /// The point is checked to lie on the curve before it is accepted.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, SignerError> {
        let point = k256::PublicKey::from_sec1_bytes(bytes)
            .map_err(|e| SignerError::malformed_key(format!("not a secp256k1 point: {e}")))?;
        let encoded = point.to_encoded_point(false);
        let mut raw = [0u8; 64];
        raw.copy_from_slice(&encoded.as_bytes()[1..]);
        Ok(Self(raw))
    }

    pub(crate) fn from_verifying_key(key: &k256::ecdsa::VerifyingKey) -> Self {
        let encoded = key.to_encoded_point(false);
        let mut raw = [0u8; 64];
        raw.copy_from_slice(&encoded.as_bytes()[1..]);
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// Uncompressed SEC1 encoding (65 bytes, `0x04` prefix).
    pub fn to_uncompressed(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = 0x04;
        out[1..].copy_from_slice(&self.0);
        out
    }

    /// Account address: the last 20 bytes of keccak256 over the raw point.
    pub fn address(&self) -> Address {
        let hash = keccak256(self.0);
        Address::from_slice(&hash[12..])
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PublicKey(0x{})", hex::encode(self.0))
    }
}

/// `(r, s)` exactly as they came out of the DER signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSignature<'a> {
    pub r: &'a [u8],
    pub s: &'a [u8],
}

/// Fixed-width `(r, s)` with `s` in the lower half of the curve order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalSignature {
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl CanonicalSignature {
    pub(crate) fn with_recovery_id(&self, v: u8) -> FinalSignature {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = v;
        FinalSignature(bytes)
    }
}

/// 65-byte recoverable signature: `r || s || v`, with `v` in {0, 1}.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FinalSignature([u8; 65]);

impl FinalSignature {
    pub fn r(&self) -> &[u8] {
        &self.0[..32]
    }

    pub fn s(&self) -> &[u8] {
        &self.0[32..64]
    }

    pub fn v(&self) -> u8 {
        self.0[64]
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    pub fn into_bytes(self) -> [u8; 65] {
        self.0
    }
}

impl std::fmt::Debug for FinalSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FinalSignature(0x{})", hex::encode(self.0))
    }
}
