//! mpd-mpris - bridges a running MPD to the MPRIS D-Bus interface.
//!
//! Exits non-zero when the connection to MPD is lost so a supervisor can
//! restart it.

use std::{error::Error, process, sync::Arc};

use clap::Parser;
use tokio::signal;
use tracing::{error, info, instrument, warn};

use mpd_mpris::{
    Result,
    cli::Cli,
    config::{Config, ConfigPaths, MpdEnvironment},
    services::{
        mpd::MpdClient,
        mpris::{Instance, InstanceOptions, Shutdown, art::ArtCache, monitoring},
    },
    tracing_config,
};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing_config::init(config.general.log_level)?;
    info!("Starting mpd-mpris {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(config).await {
        error!("{e}");
        process::exit(1);
    }

    info!("mpd-mpris stopped");
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => match ConfigPaths::main_config() {
            Ok(path) => Config::load_or_default(&path)?,
            Err(_) => Config::default(),
        },
    };
    cli.apply(&mut config);
    Ok(config)
}

#[instrument(skip_all)]
async fn run(config: Config) -> Result<()> {
    let bus_name = config.mpris.bus_name()?;
    let endpoint = config.mpd.endpoint(&MpdEnvironment::from_process())?;

    let client = MpdClient::connect(endpoint.address, endpoint.password.as_deref()).await?;

    let options = InstanceOptions {
        bus_name,
        thresholds: config.sync.thresholds(),
        keepalive: monitoring::keepalive_interval(config.sync.keepalive()),
        interpolate: config.sync.position_interpolation,
        art_dir: config.mpris.album_art.then(ArtCache::default_dir),
    };

    let shutdown = Shutdown::new();
    tokio::spawn(stop_on_signal(shutdown.clone()));

    let instance = Instance::new(Arc::new(client), options, shutdown);
    info!("mpd-mpris running as {}", instance.name());
    instance.run().await?;

    Ok(())
}

async fn stop_on_signal(shutdown: Shutdown) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Cannot listen for Ctrl-C: {e}");
                return;
            }
        }
        () = terminate => {}
        () = shutdown.triggered() => return,
    }

    info!("Signal received, stopping");
    shutdown.stop();
}
