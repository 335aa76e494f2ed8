//! Client for the validation collaborator.
//!
//! Synchronous request/response with a bounded deadline. The write path
//! treats an unreachable validator as a rejection, so errors here must stay
//! distinguishable from verdicts.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tonic::transport::Channel;
use tracing::debug;

use crate::config::ValidationConfig;
use crate::constants::MAX_MESSAGE_SIZE_BYTES;
use crate::NetworkError;
use konfig_proto::validation::validation_service_client::ValidationServiceClient;
use konfig_proto::validation::ValidateConfigRequest;
use konfig_proto::validation::ValidateConfigResponse;

#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ConfigValidator: Send + Sync {
    async fn validate(
        &self,
        request: ValidateConfigRequest,
    ) -> Result<ValidateConfigResponse, NetworkError>;
}

/// gRPC validator client with lazy connection and a per-request deadline.
pub struct GrpcValidator {
    endpoint: String,
    timeout: Duration,
    client: Mutex<Option<ValidationServiceClient<Channel>>>,
}

impl GrpcValidator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
            client: Mutex::new(None),
        }
    }

    async fn client(&self) -> Result<ValidationServiceClient<Channel>, NetworkError> {
        let mut guard = self.client.lock().await;
        if let Some(client) = guard.as_ref() {
            return Ok(client.clone());
        }

        let channel = Channel::from_shared(self.endpoint.clone())
            .map_err(|_| NetworkError::InvalidUri(self.endpoint.clone()))?
            .connect_timeout(self.timeout)
            .connect()
            .await
            .map_err(|e| {
                debug!(endpoint = %self.endpoint, error = %e, "validator connect failed");
                NetworkError::ConnectError(e.to_string())
            })?;

        let client = ValidationServiceClient::new(channel)
            .max_decoding_message_size(MAX_MESSAGE_SIZE_BYTES)
            .max_encoding_message_size(MAX_MESSAGE_SIZE_BYTES);

        *guard = Some(client.clone());
        Ok(client)
    }
}

#[async_trait]
impl ConfigValidator for GrpcValidator {
    async fn validate(
        &self,
        request: ValidateConfigRequest,
    ) -> Result<ValidateConfigResponse, NetworkError> {
        let mut client = self.client().await?;

        let mut request = tonic::Request::new(request);
        request.set_timeout(self.timeout);

        match client.validate_config(request).await {
            Ok(response) => Ok(response.into_inner()),
            Err(status) => {
                // Drop the cached channel so the next call reconnects.
                *self.client.lock().await = None;
                Err(NetworkError::Status(Box::new(status)))
            }
        }
    }
}
