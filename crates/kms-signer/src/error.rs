use alloy_primitives::Address;

use crate::service::ServiceError;

/// Every variant names the key it was raised for; the variant itself names
/// the stage. The pure codec and normalizer functions do not know the key and
/// leave `key_id` empty until [`SignerError::with_key_id`] fills it in.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("Malformed public key for key_id={key_id}: {reason}")]
    MalformedKey { key_id: String, reason: String },
    #[error("Malformed signature from key_id={key_id}: {reason}")]
    MalformedSignature { key_id: String, reason: String },
    #[error("Signature integer from key_id={key_id} has {len} significant bytes, expected at most 32")]
    IntegerTooLong { key_id: String, len: usize },
    #[error("Can not get public key from key service for key_id={key_id}: {source}")]
    KeyResolutionFailed {
        key_id: String,
        #[source]
        source: ServiceError,
    },
    #[error("Key service failed to sign for key_id={key_id}: {source}")]
    SigningTransportFailed {
        key_id: String,
        #[source]
        source: ServiceError,
    },
    #[error("Can not reconstruct public key {expected} of key_id={key_id} from signature")]
    SignatureReconstructionFailed { key_id: String, expected: Address },
    #[error("Signer for {expected} (key_id={key_id}) is not authorized to sign for {requested}")]
    UnauthorizedAddress {
        key_id: String,
        requested: Address,
        expected: Address,
    },
    #[error("Chain id is required to sign transactions with key_id={key_id}")]
    MissingChainId { key_id: String },
    #[error("Failed to attach signature from key_id={key_id} to transaction: {source}")]
    AttachSignature {
        key_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// Coarse grouping of [`SignerError`] that tells a caller what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The key service could not be reached or did not answer in time.
    /// Retrying is reasonable.
    Transient,
    /// The signature could not be tied back to the key. Never retry blindly.
    Integrity,
    /// The key service returned bytes that do not decode.
    Malformed,
    /// The caller asked for something this signer can not do.
    Caller,
}

impl SignerError {
    pub(crate) fn malformed_key(reason: impl Into<String>) -> Self {
        SignerError::MalformedKey {
            key_id: String::new(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_signature(reason: impl Into<String>) -> Self {
        SignerError::MalformedSignature {
            key_id: String::new(),
            reason: reason.into(),
        }
    }

    /// Key the error was raised for. Empty only for errors straight out of
    /// the codec or normalizer that were never tied to a key.
    pub fn key_id(&self) -> &str {
        match self {
            SignerError::MalformedKey { key_id, .. }
            | SignerError::MalformedSignature { key_id, .. }
            | SignerError::IntegerTooLong { key_id, .. }
            | SignerError::KeyResolutionFailed { key_id, .. }
            | SignerError::SigningTransportFailed { key_id, .. }
            | SignerError::SignatureReconstructionFailed { key_id, .. }
            | SignerError::UnauthorizedAddress { key_id, .. }
            | SignerError::MissingChainId { key_id }
            | SignerError::AttachSignature { key_id, .. } => key_id.as_str(),
        }
    }

    /// Tags the error with `key_id` unless it already names a key.
    pub fn with_key_id(mut self, key: &str) -> Self {
        match &mut self {
            SignerError::MalformedKey { key_id, .. }
            | SignerError::MalformedSignature { key_id, .. }
            | SignerError::IntegerTooLong { key_id, .. }
            | SignerError::KeyResolutionFailed { key_id, .. }
            | SignerError::SigningTransportFailed { key_id, .. }
            | SignerError::SignatureReconstructionFailed { key_id, .. }
            | SignerError::UnauthorizedAddress { key_id, .. }
            | SignerError::MissingChainId { key_id }
            | SignerError::AttachSignature { key_id, .. } => {
                if key_id.is_empty() {
                    key.clone_into(key_id);
                }
            }
        }
        self
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            SignerError::KeyResolutionFailed { .. } | SignerError::SigningTransportFailed { .. } => {
                ErrorClass::Transient
            }
            SignerError::SignatureReconstructionFailed { .. } | SignerError::IntegerTooLong { .. } => {
                ErrorClass::Integrity
            }
            SignerError::MalformedKey { .. } | SignerError::MalformedSignature { .. } => {
                ErrorClass::Malformed
            }
            SignerError::UnauthorizedAddress { .. }
            | SignerError::MissingChainId { .. }
            | SignerError::AttachSignature { .. } => ErrorClass::Caller,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}
