use std::{env, net::SocketAddr, time::Duration};

pub const SERVICE_NAME: &str = "users-api";

const BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);
const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Upper bound on reading request headers and on handling a request.
    pub request_timeout: Duration,
    /// Keep-alive budget for idle connections.
    pub idle_timeout: Duration,
    /// Export traces and metrics over OTLP.
    pub otlp_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(BIND_ADDR),
            request_timeout: REQUEST_TIMEOUT,
            idle_timeout: IDLE_TIMEOUT,
            otlp_enabled: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            otlp_enabled: otlp_enabled(env::var(OTLP_ENDPOINT_VAR).ok()),
            ..Self::default()
        }
    }
}

fn otlp_enabled(endpoint: Option<String>) -> bool {
    endpoint.is_some_and(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_server_settings() {
        let config = Config::default();

        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert!(!config.otlp_enabled);
    }

    #[test]
    fn otlp_needs_a_non_empty_endpoint() {
        assert!(!otlp_enabled(None));
        assert!(!otlp_enabled(Some("  ".into())));
        assert!(otlp_enabled(Some("http://localhost:4317".into())));
    }
}
