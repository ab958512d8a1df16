//! Transport to the external edit service.
//!
//! [`EditService`] is the seam between the editor session and the network.
//! [`HttpEditService`] speaks the service's HTTP JSON protocol with `reqwest`;
//! tests substitute their own implementations.

use std::future::Future;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::schema::{error_message, ProgramStatus, ServiceRequest};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub trait EditService {
    /// Performs one call. On success the service returns the full program
    /// status that replaces the client's snapshot.
    fn call(
        &self,
        request: ServiceRequest,
        request_id: Uuid,
    ) -> impl Future<Output = Result<ProgramStatus, ClientError>> + Send;
}

/// HTTP implementation of [`EditService`].
#[derive(Debug, Clone)]
pub struct HttpEditService {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpEditService {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ClientError::Transport(format!("client setup failed: {}", err)))?;
        Ok(HttpEditService { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl EditService for HttpEditService {
    async fn call(
        &self,
        request: ServiceRequest,
        request_id: Uuid,
    ) -> Result<ProgramStatus, ClientError> {
        let endpoint = self.config.endpoint(request.action());
        debug!(%request_id, %endpoint, "sending edit service request");

        let mut req = self
            .client
            .post(&endpoint)
            .header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(body) = request.body()? {
            req = req.json(&body);
        }

        let response = req.send().await.map_err(|err| {
            warn!(%request_id, error = %err, "edit service request failed");
            ClientError::Transport(err.to_string())
        })?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|err| ClientError::Transport(format!("response read failed: {}", err)))?;

        if !status.is_success() {
            return Err(ClientError::CommandRejected {
                status: status.as_u16(),
                message: error_message(&body_text),
            });
        }

        serde_json::from_str(&body_text).map_err(|err| ClientError::Decode(err.to_string()))
    }
}
