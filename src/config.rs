use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum TransportMode {
    /// Deliver through sockets held by this process (`GET /ws`).
    Local,
    /// Deliver through an HTTP connection-management endpoint derived from
    /// each event's reply context.
    Gateway,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub transport: TransportMode,
    pub gateway_scheme: String,
    pub stage: String,
    /// Ceiling applied to caller-supplied delays. `None` leaves them unbounded.
    pub max_delay: Option<Duration>,
    pub invocation_timeout: Duration,
}

const DEFAULT_PORT: u16 = 39100;
const DEFAULT_DATABASE_URL: &str = "sqlite:echocast.db?mode=rwc";
const DEFAULT_MAX_DELAY_SECS: u64 = 900;
const DEFAULT_INVOCATION_TIMEOUT_SECS: u64 = 930;

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            transport: TransportMode::Local,
            gateway_scheme: "https".to_string(),
            stage: "local".to_string(),
            max_delay: Some(Duration::from_secs(DEFAULT_MAX_DELAY_SECS)),
            invocation_timeout: Duration::from_secs(DEFAULT_INVOCATION_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let transport = match std::env::var("ECHO_TRANSPORT")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "gateway" => TransportMode::Gateway,
            _ => TransportMode::Local,
        };

        let max_delay = match std::env::var("ECHO_MAX_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.max_delay,
        };

        let invocation_timeout = std::env::var("ECHO_INVOCATION_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.invocation_timeout);

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_url: std::env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            transport,
            gateway_scheme: std::env::var("ECHO_GATEWAY_SCHEME")
                .unwrap_or(defaults.gateway_scheme),
            stage: std::env::var("ECHO_STAGE").unwrap_or(defaults.stage),
            max_delay,
            invocation_timeout,
        }
    }
}
