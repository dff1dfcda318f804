use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Connect,
    Disconnect,
    Message,
}

impl EventKind {
    /// Accepts both the plain kind names and the `$connect` / `$disconnect` /
    /// `$default` route keys used by WebSocket gateways.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "connect" | "$connect" => Some(EventKind::Connect),
            "disconnect" | "$disconnect" => Some(EventKind::Disconnect),
            "message" | "$default" => Some(EventKind::Message),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connect => "connect",
            EventKind::Disconnect => "disconnect",
            EventKind::Message => "message",
        }
    }
}

/// Addressing needed to reach the transport that delivers to a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyContext {
    pub domain: String,
    pub stage: String,
}

/// One unit of work. `kind` stays a raw string so an unknown kind reaches the
/// router and is reported there instead of failing to decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    pub kind: String,
    pub connection_id: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub reply_context: ReplyContext,
}

impl InboundEvent {
    pub fn new(kind: EventKind, connection_id: &str, body: String, reply_context: ReplyContext) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            connection_id: connection_id.to_string(),
            body,
            reply_context,
        }
    }
}
