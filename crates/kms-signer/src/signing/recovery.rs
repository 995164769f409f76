use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use tracing::{debug, warn};

use crate::error::SignerError;
use crate::types::{CanonicalSignature, Digest, FinalSignature, PublicKey};

/// Recovery ids tried by [`finalize`], in this order.
pub const RECOVERY_ID_ORDER: [u8; 2] = [0, 1];

/// Recovers the public key that produced `signature` over `digest`.
pub fn recover_public_key(
    digest: &Digest,
    signature: &FinalSignature,
) -> Result<PublicKey, k256::ecdsa::Error> {
    let sig = Signature::from_slice(&signature.as_bytes()[..64])?;
    let recovery_id = RecoveryId::from_byte(signature.v()).ok_or_else(k256::ecdsa::Error::new)?;
    let recovered = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)?;
    Ok(PublicKey::from_verifying_key(&recovered))
}

/// Picks the recovery id under which `canonical` recovers `expected` and
/// returns the assembled 65-byte signature.
///
/// Fails with `SignatureReconstructionFailed` when neither id recovers
/// `expected`. A candidate the recovery primitive rejects outright counts as
/// a mismatch.
pub fn finalize(
    digest: &Digest,
    canonical: &CanonicalSignature,
    expected: &PublicKey,
) -> Result<FinalSignature, SignerError> {
    for v in RECOVERY_ID_ORDER {
        let candidate = canonical.with_recovery_id(v);
        match recover_public_key(digest, &candidate) {
            Ok(recovered) if recovered.as_bytes() == expected.as_bytes() => {
                debug!(v, "recovery id matched expected public key");
                return Ok(candidate);
            }
            Ok(_) => debug!(v, "recovery id recovered a different public key"),
            Err(e) => debug!(v, error = %e, "recovery id rejected"),
        }
    }

    let expected = expected.address();
    warn!(%digest, %expected, "no recovery id reproduces the expected public key");
    Err(SignerError::SignatureReconstructionFailed {
        key_id: String::new(),
        expected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::{SigningKey, signature::hazmat::PrehashSigner};
    use sha2::{Digest as _, Sha256};

    fn signing_key(seed: &str) -> SigningKey {
        let hash = Sha256::digest(seed.as_bytes());
        SigningKey::from_bytes((&hash).into()).unwrap()
    }

    fn sign(key: &SigningKey, digest: &Digest) -> (CanonicalSignature, RecoveryId) {
        let (signature, recovery_id): (Signature, RecoveryId) =
            key.sign_prehash(digest.as_slice()).unwrap();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&signature.r().to_bytes());
        s.copy_from_slice(&signature.s().to_bytes());
        (CanonicalSignature { r, s }, recovery_id)
    }

    #[test]
    fn finalize_recovers_signer_key() {
        for i in 0..16 {
            let key = signing_key("recovery");
            let digest = Digest::from_slice(&Sha256::digest(format!("message {i}")));
            let (canonical, _) = sign(&key, &digest);
            let expected = PublicKey::from_verifying_key(key.verifying_key());

            let signature = finalize(&digest, &canonical, &expected).unwrap();
            assert!(signature.v() <= 1);
            assert_eq!(recover_public_key(&digest, &signature).unwrap(), expected);
        }
    }

    #[test]
    fn finalize_matches_k256_recovery_id() {
        let key = signing_key("agree");
        let digest = Digest::from_slice(&Sha256::digest(b"agree"));
        let (canonical, recovery_id) = sign(&key, &digest);
        let expected = PublicKey::from_verifying_key(key.verifying_key());

        let signature = finalize(&digest, &canonical, &expected).unwrap();
        assert_eq!(signature.v(), recovery_id.to_byte());
    }

    #[test]
    fn tampered_digest_fails() {
        let key = signing_key("tamper");
        let digest = Digest::from_slice(&Sha256::digest(b"original"));
        let (canonical, _) = sign(&key, &digest);
        let expected = PublicKey::from_verifying_key(key.verifying_key());

        let tampered = Digest::from_slice(&Sha256::digest(b"tampered"));
        let err = finalize(&tampered, &canonical, &expected).unwrap_err();
        assert!(matches!(err, SignerError::SignatureReconstructionFailed { .. }));
    }

    #[test]
    fn wrong_key_fails() {
        let key = signing_key("signer");
        let other = signing_key("someone-else");
        let digest = Digest::from_slice(&Sha256::digest(b"payload"));
        let (canonical, _) = sign(&key, &digest);
        let expected = PublicKey::from_verifying_key(other.verifying_key());

        assert!(finalize(&digest, &canonical, &expected).is_err());
    }

    #[test]
    fn zero_signature_is_rejected_by_primitive() {
        let digest = Digest::repeat_byte(0x01);
        let canonical = CanonicalSignature { r: [0u8; 32], s: [0u8; 32] };
        assert!(recover_public_key(&digest, &canonical.with_recovery_id(0)).is_err());

        let expected = PublicKey::from_verifying_key(signing_key("zero").verifying_key());
        assert!(finalize(&digest, &canonical, &expected).is_err());
    }

    #[test]
    fn ids_are_tried_in_ascending_order() {
        assert_eq!(RECOVERY_ID_ORDER, [0, 1]);

        let key = signing_key("order");
        let expected = PublicKey::from_verifying_key(key.verifying_key());
        let mut seen = [0usize; 2];

        for i in 0..64 {
            let digest = Digest::from_slice(&Sha256::digest(format!("order {i}")));
            let (canonical, recovery_id) = sign(&key, &digest);
            let signature = finalize(&digest, &canonical, &expected).unwrap();
            assert_eq!(signature.v(), recovery_id.to_byte(), "digest {i}");

            let id_zero = recover_public_key(&digest, &canonical.with_recovery_id(0));
            if signature.v() == 0 {
                assert_eq!(id_zero.unwrap(), expected);
            } else {
                // v=1 is only returned after id 0 failed to reproduce the key.
                assert!(id_zero.map_or(true, |key| key != expected));
            }
            seen[signature.v() as usize] += 1;
        }

        assert!(seen[0] > 0 && seen[1] > 0, "both ids should occur: {seen:?}");
    }
}
