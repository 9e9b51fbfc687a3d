//! Event relay server
//!
//! Run with: event-relay [BIND_ADDR]
//!
//! Examples:
//!   event-relay                    # binds to 0.0.0.0:8000
//!   event-relay localhost          # binds to 127.0.0.1:8000
//!   event-relay 127.0.0.1:8004     # binds to 127.0.0.1:8004
//!   event-relay :9000              # binds to 0.0.0.0:9000
//!
//! ## Publishing
//!
//!   curl -X POST --data '{"msg":"hello"}' http://localhost:8000/fluent
//!
//! ## Subscribing
//!
//!   websocat ws://localhost:8000/client
//!
//! Log levels are controlled with `RUST_LOG` (default `event_relay=info`).

use event_relay::server::parse_bind_addr;
use event_relay::{RelayServer, ServerConfig};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset, empty or unparsable
const DEFAULT_LOG_FILTER: &str = "event_relay=info";

fn print_usage() {
    eprintln!("Usage: event-relay [BIND_ADDR]");
    eprintln!();
    eprintln!("BIND_ADDR may be host:port, :port or host (port defaults to 8000)");
}

/// `RUST_LOG` wins whenever it is set and valid
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    match rust_log {
        Some(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives)
            .unwrap_or_else(|e| {
                eprintln!("Ignoring invalid RUST_LOG ({}), using {}", e, DEFAULT_LOG_FILTER);
                EnvFilter::new(DEFAULT_LOG_FILTER)
            }),
        _ => EnvFilter::new(DEFAULT_LOG_FILTER),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }

    let mut config = ServerConfig::default();
    if let Some(addr_str) = args.get(1) {
        match parse_bind_addr(addr_str) {
            Ok(addr) => config = config.bind(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .init();

    tracing::info!(
        addr = %config.bind_addr,
        ingress = %config.ingress_path,
        subscribe = %config.subscribe_path,
        "Starting event relay"
    );

    let server = RelayServer::new(config);

    // Run with Ctrl+C handling
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_default() {
        assert_eq!(log_filter(None).to_string(), "event_relay=info");
        assert_eq!(log_filter(Some("  ")).to_string(), "event_relay=info");
    }

    #[test]
    fn test_log_filter_keeps_rust_log_level() {
        assert_eq!(
            log_filter(Some("event_relay=trace")).to_string(),
            "event_relay=trace"
        );
        assert_eq!(log_filter(Some("debug")).to_string(), "debug");
    }

    #[test]
    fn test_log_filter_invalid_falls_back() {
        assert_eq!(
            log_filter(Some("event_relay=loud")).to_string(),
            "event_relay=info"
        );
    }
}
