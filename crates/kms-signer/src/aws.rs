//! AWS KMS as a [`KeyService`]. Enabled with the `aws` crate feature.

use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_sdk_kms::Client;
use aws_sdk_kms::config::Region;
use aws_sdk_kms::primitives::Blob;
use aws_sdk_kms::types::{MessageType, SigningAlgorithmSpec};

use crate::service::{KeyService, ServiceError, SignRequest};

#[derive(Debug, Clone)]
pub struct AwsKms {
    client: Client,
}

impl AwsKms {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Loads credentials from the default provider chain. `region` wins over
    /// the environment when given.
    pub async fn from_env(region: Option<String>) -> Self {
        let region_provider = RegionProviderChain::first_try(region.map(Region::new)).or_default_provider();
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;
        Self::new(Client::new(&config))
    }
}

impl KeyService for AwsKms {
    async fn get_public_key(&self, key_id: &str) -> Result<Vec<u8>, ServiceError> {
        let output = self
            .client
            .get_public_key()
            .key_id(key_id)
            .send()
            .await
            .map_err(|e| ServiceError::remote(aws_sdk_kms::Error::from(e)))?;

        output
            .public_key
            .map(Blob::into_inner)
            .ok_or(ServiceError::EmptyResponse("GetPublicKey"))
    }

    async fn sign(&self, request: SignRequest<'_>) -> Result<Vec<u8>, ServiceError> {
        let output = self
            .client
            .sign()
            .key_id(request.key_id)
            .message(Blob::new(request.digest.as_slice()))
            .message_type(MessageType::from(request.message_type))
            .signing_algorithm(SigningAlgorithmSpec::from(request.algorithm))
            .send()
            .await
            .map_err(|e| ServiceError::remote(aws_sdk_kms::Error::from(e)))?;

        output
            .signature
            .map(Blob::into_inner)
            .ok_or(ServiceError::EmptyResponse("Sign"))
    }
}
