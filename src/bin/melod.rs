//! Thin process entry point: parse CLI/environment, wire the settings
//! store, player registry, playlist registry and RTSP engine together, and
//! run the accept loop. Grounded on `yara-blue-mpdhaj/src/main.rs`'s
//! `setup_tracing` + `Cli::parse` + dispatch shape.

use std::sync::Arc;

use clap::Parser;

use melo::config::{Cli, Config};
use melo::players::registry::PlayerRegistry;
use melo::playlist::PlaylistRegistry;
use melo::rtsp::context::{default_context, Credentials};
use melo::rtsp::RtspServer;
use melo::settings::{SettingsRegistry, SettingsStore};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let cli = Cli::parse();
    let config = Config::resolve(&cli);
    tracing::info!(?config, "melod: starting");

    // Client-facing wire transport and module loading are external
    // collaborators; this binary only stands the shared process state up.
    let _player_registry = Arc::new(PlayerRegistry::new());
    let _playlist_registry = Arc::new(PlaylistRegistry::new());

    let settings_registry = SettingsRegistry::new();
    settings_registry.register(SettingsStore::new(config.settings_id.clone()));

    let credentials: Option<Credentials> = config.credentials.clone();
    let context = default_context(config.device_name.clone(), credentials, config.max_clients, config.bind_addr.ip())?
        .with_setup_hook(Box::new(|client_instance, stream, sockets| {
            tracing::info!(client_instance, codec = ?stream.codec, audio_port = sockets.audio_port, "melod: stream negotiated");
        }));
    let server = RtspServer::new(Arc::new(context));

    tracing::info!(addr = %config.bind_addr, "melod: rtsp engine listening");
    server.start(config.bind_addr).await?;

    Ok(())
}

fn setup_tracing() {
    use tracing_subscriber::filter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = filter::EnvFilter::builder()
        .with_default_directive(filter::LevelFilter::INFO.into())
        .from_env_lossy();
    let fmt = fmt::layer().with_target(false);

    let _ignore_err = tracing_subscriber::registry().with(fmt).with(filter).try_init();
}
