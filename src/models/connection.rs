use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Active,
    Closed,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Active => "active",
            ConnectionStatus::Closed => "closed",
        }
    }

    /// Anything other than `active` is treated as closed so it never reaches
    /// the active set.
    pub fn from_db(value: &str) -> Self {
        if value == ConnectionStatus::Active.as_str() {
            ConnectionStatus::Active
        } else {
            ConnectionStatus::Closed
        }
    }
}

/// One client session as recorded by the connection directory. Records are
/// retained after the session closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub connection_id: String,
    pub created_at: String,
    pub disconnected_at: Option<String>,
    pub status: ConnectionStatus,
}

impl Connection {
    pub fn is_active(&self) -> bool {
        self.status == ConnectionStatus::Active
    }
}
