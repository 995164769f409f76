pub mod cache;
pub mod config;
pub mod encoding;
pub mod error;
pub mod resolver;
pub mod service;
pub mod signing;
pub mod types;

#[cfg(feature = "aws")]
pub mod aws;

pub use cache::PublicKeyCache;
pub use config::SignerConfig;
pub use error::{ErrorClass, SignerError};
pub use resolver::PublicKeyResolver;
pub use service::{KeyService, RequestContext, ServiceError, SignRequest};
pub use signing::{KmsSigner, LocalKeyService, SignableTransaction, TransactionSigner};
pub use types::{CanonicalSignature, Digest, FinalSignature, PublicKey, RawSignature};

#[cfg(feature = "aws")]
pub use aws::AwsKms;
