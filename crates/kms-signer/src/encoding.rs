//! Decoding of the two DER structures a key service hands back: the
//! SubjectPublicKeyInfo wrapping an EC public key, and the ECDSA-Sig-Value
//! `SEQUENCE { r INTEGER, s INTEGER }`.

use der::asn1::{ObjectIdentifier, UintRef};
use der::{Decode, Sequence};
use spki::SubjectPublicKeyInfoRef;

use crate::error::SignerError;
use crate::types::RawSignature;

/// id-ecPublicKey (RFC 5480).
const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
/// secp256k1 named curve (SEC 2).
const SECP256K1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.10");

#[derive(Sequence)]
struct EcdsaSigValue<'a> {
    r: UintRef<'a>,
    s: UintRef<'a>,
}

/// Returns the BIT STRING payload of an EC SubjectPublicKeyInfo, i.e. the
/// SEC1-encoded point.
pub fn decode_public_key(der_bytes: &[u8]) -> Result<&[u8], SignerError> {
    let info = SubjectPublicKeyInfoRef::try_from(der_bytes)
        .map_err(|e| SignerError::malformed_key(format!("can not parse asn1 public key: {e}")))?;

    if info.algorithm.oid != EC_PUBLIC_KEY_OID {
        return Err(SignerError::malformed_key(format!(
            "unexpected key algorithm {}",
            info.algorithm.oid
        )));
    }
    let curve = info
        .algorithm
        .parameters_oid()
        .map_err(|e| SignerError::malformed_key(format!("missing curve parameter: {e}")))?;
    if curve != SECP256K1_OID {
        return Err(SignerError::malformed_key(format!("unexpected curve {curve}")));
    }

    info.subject_public_key
        .as_bytes()
        .ok_or_else(|| SignerError::malformed_key("public key bit string is not octet aligned"))
}

/// Splits a DER ECDSA signature into its big-endian `r` and `s` magnitudes.
///
/// Trailing bytes after the sequence, a third element, or a negative
/// integer all count as malformed.
pub fn decode_signature(der_bytes: &[u8]) -> Result<RawSignature<'_>, SignerError> {
    let sig = EcdsaSigValue::from_der(der_bytes)
        .map_err(|e| SignerError::malformed_signature(format!("can not parse asn1 signature: {e}")))?;
    Ok(RawSignature {
        r: sig.r.as_bytes(),
        s: sig.s.as_bytes(),
    })
}
