use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::types::Digest;

/// Signing algorithm requested from the key service.
pub const SIGNING_ALGORITHM: &str = "ECDSA_SHA_256";
/// The message handed to the key service is already a digest.
pub const MESSAGE_TYPE: &str = "DIGEST";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("unknown key {0}")]
    UnknownKey(String),
    #[error("{0} response carried no payload")]
    EmptyResponse(&'static str),
    #[error("request cancelled")]
    Cancelled,
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
    #[error(transparent)]
    Remote(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl ServiceError {
    pub fn remote<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self::Remote(error.into())
    }
}

/// A sign call as the key service receives it.
#[derive(Debug, Clone, Copy)]
pub struct SignRequest<'a> {
    pub key_id: &'a str,
    pub digest: &'a Digest,
    pub algorithm: &'static str,
    pub message_type: &'static str,
}

impl<'a> SignRequest<'a> {
    pub fn digest(key_id: &'a str, digest: &'a Digest) -> Self {
        Self {
            key_id,
            digest,
            algorithm: SIGNING_ALGORITHM,
            message_type: MESSAGE_TYPE,
        }
    }
}

/// The two operations this crate needs from a custodial key service.
///
/// Both return raw DER: a SubjectPublicKeyInfo for `get_public_key`, an
/// ECDSA-Sig-Value for `sign`.
pub trait KeyService: Send + Sync {
    fn get_public_key(
        &self,
        key_id: &str,
    ) -> impl Future<Output = Result<Vec<u8>, ServiceError>> + Send;

    fn sign(
        &self,
        request: SignRequest<'_>,
    ) -> impl Future<Output = Result<Vec<u8>, ServiceError>> + Send;
}

/// Cancellation and deadline for remote calls made on a caller's behalf.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl RequestContext {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel, timeout: None }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Drives `call` until it finishes, the token fires, or the timeout
    /// elapses. In the latter two cases the call future is dropped.
    pub async fn run<T, F>(&self, call: F) -> Result<T, ServiceError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        let bounded = async {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(result) => result,
                    Err(_) => Err(ServiceError::TimedOut(limit)),
                },
                None => call.await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ServiceError::Cancelled),
            result = bounded => result,
        }
    }
}
