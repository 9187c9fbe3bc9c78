//! Process configuration: RTSP bind address, client limits, the advertised
//! device name, and the settings-store id. Loadable from the environment
//! (`MELO_*` variables) and overridable by a CLI, the same layering
//! `yara-blue-mpdhaj/src/cli.rs`'s `clap::Parser` struct uses for its own
//! `--proxy`/port flags.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

use crate::rtsp::context::Credentials;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_CLIENTS: usize = 8;
const DEFAULT_DEVICE_NAME: &str = "Melo";
const DEFAULT_SETTINGS_ID: &str = "melo";

/// Resolved runtime configuration for the `melod` binary.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_clients: usize,
    pub device_name: String,
    pub settings_id: String,
    pub credentials: Option<Credentials>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_clients: DEFAULT_MAX_CLIENTS,
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            settings_id: DEFAULT_SETTINGS_ID.to_string(),
            credentials: None,
        }
    }
}

impl Config {
    /// Build configuration from environment variables, then let `cli`
    /// override whatever it explicitly set. Mirrors the environment-then-CLI
    /// precedence the settings store itself uses for `ini` defaults.
    #[must_use]
    pub fn resolve(cli: &Cli) -> Self {
        let mut config = Self::default();

        if let Ok(port) = std::env::var("MELO_PORT") {
            if let Ok(port) = port.parse() {
                config.bind_addr.set_port(port);
            }
        }
        if let Ok(max_clients) = std::env::var("MELO_MAX_CLIENTS") {
            if let Ok(max_clients) = max_clients.parse() {
                config.max_clients = max_clients;
            }
        }
        if let Ok(name) = std::env::var("MELO_DEVICE_NAME") {
            config.device_name = name;
        }
        if let Ok(id) = std::env::var("MELO_SETTINGS_ID") {
            config.settings_id = id;
        }
        if let Ok(password) = std::env::var("MELO_PASSWORD") {
            config.credentials = Some(Credentials { username: None, password });
        }

        if let Some(port) = cli.port {
            config.bind_addr.set_port(port);
        }
        if let Some(max_clients) = cli.max_clients {
            config.max_clients = max_clients;
        }
        if let Some(name) = &cli.device_name {
            config.device_name = name.clone();
        }
        if let Some(password) = &cli.password {
            config.credentials = Some(Credentials { username: None, password: password.clone() });
        }

        config
    }
}

/// Command-line flags for the `melod` binary.
#[derive(Parser, Debug)]
#[command(name = "melod", about = "A headless multi-room AirPlay receiver")]
pub struct Cli {
    /// RTSP port to listen on (default 5000, or `MELO_PORT`).
    #[arg(long)]
    pub port: Option<u16>,

    /// Maximum concurrent RTSP clients (default 8, or `MELO_MAX_CLIENTS`).
    #[arg(long)]
    pub max_clients: Option<usize>,

    /// Advertised device name (default "Melo", or `MELO_DEVICE_NAME`).
    #[arg(long)]
    pub device_name: Option<String>,

    /// Require this password for RTSP digest/basic auth (or `MELO_PASSWORD`).
    #[arg(long)]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_beat_defaults() {
        let cli = Cli { port: Some(5555), max_clients: Some(3), device_name: Some("Lounge".to_string()), password: None };
        let config = Config::resolve(&cli);
        assert_eq!(config.bind_addr.port(), 5555);
        assert_eq!(config.max_clients, 3);
        assert_eq!(config.device_name, "Lounge");
    }

    #[test]
    fn defaults_without_overrides() {
        let cli = Cli { port: None, max_clients: None, device_name: None, password: None };
        let config = Config::resolve(&cli);
        assert_eq!(config.bind_addr.port(), DEFAULT_PORT);
        assert_eq!(config.max_clients, DEFAULT_MAX_CLIENTS);
        assert_eq!(config.device_name, DEFAULT_DEVICE_NAME);
    }
}
