//! Server configuration.

use std::net::SocketAddr;

use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: usize = 1000;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    ///
    /// `ARENA_BIND_ADDR` and `ARENA_MAX_CONNECTIONS`; unset or unparsable
    /// values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("ARENA_BIND_ADDR") {
            match raw.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(e) => warn!(
                    "Invalid ARENA_BIND_ADDR {:?} ({}), using {}",
                    raw, e, DEFAULT_BIND_ADDR
                ),
            }
        }

        if let Some(raw) = lookup("ARENA_MAX_CONNECTIONS") {
            match raw.parse::<usize>() {
                Ok(n) if n > 0 => config.max_connections = n,
                _ => warn!(
                    "Invalid ARENA_MAX_CONNECTIONS {:?}, using {}",
                    raw, DEFAULT_MAX_CONNECTIONS
                ),
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.max_connections, 1000);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("ARENA_BIND_ADDR", "127.0.0.1:9000"),
            ("ARENA_MAX_CONNECTIONS", "16"),
        ]));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.max_connections, 16);
    }

    #[test]
    fn test_from_lookup_invalid_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("ARENA_BIND_ADDR", "not an address"),
            ("ARENA_MAX_CONNECTIONS", "0"),
        ]));
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }
}
