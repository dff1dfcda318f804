use async_trait::async_trait;
use reqwest::{StatusCode, Url};

use super::TransportSender;
use crate::error::DeliveryError;
use crate::models::event::ReplyContext;

/// Posts messages to a WebSocket gateway's connection-management endpoint:
/// `POST {scheme}://{domain}/{stage}/@connections/{id}`.
pub struct ManagementApiTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl ManagementApiTransport {
    /// `client` is shared and should be built once per execution context.
    pub fn new(client: reqwest::Client, scheme: &str, reply_context: &ReplyContext) -> Self {
        Self {
            client,
            endpoint: format!(
                "{scheme}://{}/{}",
                reply_context.domain, reply_context.stage
            ),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connection_url(&self, connection_id: &str) -> Result<Url, DeliveryError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| DeliveryError::InvalidEndpoint(format!("{}: {e}", self.endpoint)))?;
        url.path_segments_mut()
            .map_err(|_| DeliveryError::InvalidEndpoint(self.endpoint.clone()))?
            .pop_if_empty()
            .push("@connections")
            .push(connection_id);
        Ok(url)
    }
}

#[async_trait]
impl TransportSender for ManagementApiTransport {
    async fn send(&self, connection_id: &str, data: &[u8]) -> Result<(), DeliveryError> {
        let url = self.connection_url(connection_id)?;
        let response = self.client.post(url).body(data.to_vec()).send().await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::GONE => Err(DeliveryError::Gone),
            status => Err(DeliveryError::Rejected(status)),
        }
    }
}
