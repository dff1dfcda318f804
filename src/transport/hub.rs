use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::TransportSender;
use crate::error::DeliveryError;

/// Outbound channels for sockets attached to this process.
///
/// This only routes bytes to sockets; which connections are active is always
/// decided by the directory.
#[derive(Clone, Default)]
pub struct SocketHub {
    sockets: Arc<DashMap<String, mpsc::UnboundedSender<String>>>,
}

impl SocketHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, connection_id: &str, tx: mpsc::UnboundedSender<String>) {
        self.sockets.insert(connection_id.to_string(), tx);
    }

    pub fn unregister(&self, connection_id: &str) {
        self.sockets.remove(connection_id);
    }

    pub fn len(&self) -> usize {
        self.sockets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sockets.is_empty()
    }
}

#[async_trait]
impl TransportSender for SocketHub {
    async fn send(&self, connection_id: &str, data: &[u8]) -> Result<(), DeliveryError> {
        let tx = self
            .sockets
            .get(connection_id)
            .map(|entry| entry.value().clone())
            .ok_or(DeliveryError::Gone)?;
        tx.send(String::from_utf8_lossy(data).into_owned())
            .map_err(|_| DeliveryError::ChannelClosed)
    }
}
