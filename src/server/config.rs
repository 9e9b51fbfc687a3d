//! Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::{Error, Result};

/// Port used when a bind address does not name one
pub const DEFAULT_PORT: u16 = 8000;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Path that accepts published payloads (POST)
    pub ingress_path: String,

    /// Path that upgrades subscribers to WebSocket (GET)
    pub subscribe_path: String,

    /// Per-delivery write deadline; a subscriber that misses it is dropped
    pub write_timeout: Duration,

    /// Largest accepted payload in bytes
    pub max_payload_size: usize,

    /// Maximum concurrent subscribers (0 = unlimited)
    pub max_subscribers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            ingress_path: "/fluent".to_string(),
            subscribe_path: "/client".to_string(),
            write_timeout: Duration::from_secs(10),
            max_payload_size: 2 * 1024 * 1024, // 2MB
            max_subscribers: 0, // Unlimited
        }
    }
}

impl ServerConfig {
    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the ingress path
    pub fn ingress_path(mut self, path: impl Into<String>) -> Self {
        self.ingress_path = path.into();
        self
    }

    /// Set the subscriber path
    pub fn subscribe_path(mut self, path: impl Into<String>) -> Self {
        self.subscribe_path = path.into();
        self
    }

    /// Set the per-delivery write deadline
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the maximum payload size
    pub fn max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }

    /// Set maximum concurrent subscribers
    pub fn max_subscribers(mut self, max: usize) -> Self {
        self.max_subscribers = max;
        self
    }

    /// Check that the config can be turned into a router
    pub fn validate(&self) -> Result<()> {
        for path in [&self.ingress_path, &self.subscribe_path] {
            if !path.starts_with('/') {
                return Err(Error::InvalidConfig(format!(
                    "path must start with '/': {:?}",
                    path
                )));
            }
        }
        if self.ingress_path == self.subscribe_path {
            return Err(Error::InvalidConfig(format!(
                "ingress and subscribe paths are both {}",
                self.ingress_path
            )));
        }
        if self.write_timeout.is_zero() {
            return Err(Error::InvalidConfig("write timeout must be non-zero".into()));
        }
        Ok(())
    }
}

/// Parse a bind address from the command line
///
/// Accepts `host:port`, `:port` (all interfaces) and a bare host, which gets
/// [`DEFAULT_PORT`]. `localhost` maps to the IPv4 loopback.
pub fn parse_bind_addr(input: &str) -> Result<SocketAddr> {
    let input = input.trim();

    if let Ok(addr) = input.parse::<SocketAddr>() {
        return Ok(addr);
    }

    // Bare IPs first: an IPv6 host such as "::1" also starts with ':'
    if let Ok(ip) = input.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    if let Some(port) = input.strip_prefix(':') {
        let port: u16 = port
            .parse()
            .map_err(|_| Error::InvalidAddress(input.to_string()))?;
        return Ok(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port));
    }

    let (host, port) = match input.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => {
            let port: u16 = port
                .parse()
                .map_err(|_| Error::InvalidAddress(input.to_string()))?;
            (host, port)
        }
        _ => (input, DEFAULT_PORT),
    };

    let ip = if host.eq_ignore_ascii_case("localhost") {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        host.parse::<IpAddr>()
            .map_err(|_| Error::InvalidAddress(input.to_string()))?
    };

    Ok(SocketAddr::new(ip, port))
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.ingress_path, "/fluent");
        assert_eq!(config.subscribe_path, "/client");
        assert_eq!(config.write_timeout, Duration::from_secs(10));
        assert_eq!(config.max_subscribers, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chaining() {
        let addr: SocketAddr = "127.0.0.1:8004".parse().unwrap();
        let config = ServerConfig::default()
            .bind(addr)
            .ingress_path("/publish")
            .subscribe_path("/ws")
            .write_timeout(Duration::from_secs(2))
            .max_payload_size(1024)
            .max_subscribers(50);

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.ingress_path, "/publish");
        assert_eq!(config.subscribe_path, "/ws");
        assert_eq!(config.write_timeout, Duration::from_secs(2));
        assert_eq!(config.max_payload_size, 1024);
        assert_eq!(config.max_subscribers, 50);
    }

    #[test]
    fn test_validate_rejects_same_paths() {
        let config = ServerConfig::default().subscribe_path("/fluent");
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_relative_path() {
        let config = ServerConfig::default().ingress_path("fluent");
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ServerConfig::default().write_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bind_addr() {
        let cases = [
            ("127.0.0.1:8004", "127.0.0.1:8004"),
            (":9000", "0.0.0.0:9000"),
            ("localhost", "127.0.0.1:8000"),
            ("localhost:8080", "127.0.0.1:8080"),
            ("10.0.0.1", "10.0.0.1:8000"),
            ("[::1]:7000", "[::1]:7000"),
            ("::1", "[::1]:8000"),
            ("::", "[::]:8000"),
        ];

        for (input, expected) in cases {
            let addr = assert_ok!(parse_bind_addr(input));
            assert_eq!(addr, expected.parse::<SocketAddr>().unwrap(), "input {}", input);
        }
    }

    #[test]
    fn test_parse_bind_addr_invalid() {
        assert!(matches!(
            parse_bind_addr("not-a-host"),
            Err(Error::InvalidAddress(_))
        ));
        assert!(matches!(
            parse_bind_addr("127.0.0.1:http"),
            Err(Error::InvalidAddress(_))
        ));
        assert_err!(parse_bind_addr(":99999"));
    }
}
