use alloy_primitives::{U256, uint};

use crate::error::SignerError;
use crate::types::{CanonicalSignature, RawSignature};

/// Order of the secp256k1 group.
pub const SECP256K1_N: U256 =
    uint!(0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141_U256);
/// `SECP256K1_N / 2`, the largest `s` a canonical signature may carry.
pub const SECP256K1_HALF_N: U256 =
    uint!(0x7FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF5D576E7357A4501DDFE92F46681B20A0_U256);

/// Fits a big-endian integer into exactly 32 bytes.
///
/// Leading zero bytes are dropped before the length check, so a 33-byte
/// value carrying a DER sign byte is fine. Anything still wider than 32
/// bytes is rejected rather than truncated.
pub fn normalize_integer(raw: &[u8]) -> Result<[u8; 32], SignerError> {
    let first_significant = raw.iter().position(|b| *b != 0).unwrap_or(raw.len());
    let significant = &raw[first_significant..];
    if significant.len() > 32 {
        return Err(SignerError::IntegerTooLong {
            key_id: String::new(),
            len: significant.len(),
        });
    }

    let mut out = [0u8; 32];
    out[32 - significant.len()..].copy_from_slice(significant);
    Ok(out)
}

/// Normalizes `r` and `s` to 32 bytes and flips `s` into the lower half of
/// the curve order. `r` keeps its value.
pub fn canonicalize(raw: RawSignature<'_>) -> Result<CanonicalSignature, SignerError> {
    let r = normalize_integer(raw.r)?;
    let s = normalize_integer(raw.s)?;

    let s_value = U256::from_be_bytes(s);
    if s_value >= SECP256K1_N {
        return Err(SignerError::malformed_signature("s is not below the curve order"));
    }

    let s = if s_value > SECP256K1_HALF_N {
        (SECP256K1_N - s_value).to_be_bytes::<32>()
    } else {
        s
    };

    Ok(CanonicalSignature { r, s })
}
