pub mod hub;
pub mod management;

use async_trait::async_trait;

use crate::error::DeliveryError;

/// Delivers one message to one connection. Failures are per recipient.
#[async_trait]
pub trait TransportSender: Send + Sync {
    async fn send(&self, connection_id: &str, data: &[u8]) -> Result<(), DeliveryError>;
}
