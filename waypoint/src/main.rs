#![deny(clippy::all)]
// use log crate
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

use std::{path::Path, sync::Arc, time::Instant};

#[cfg(not(unix))]
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use waypoint::{WaypointServer, init_log, stop_proxy};
use waypoint_config::ProxyConfiguration;
use waypoint_protocol::{CURRENT_MC_VERSION, ProtocolVersion};

const CONFIG_FILE: &str = "waypoint.toml";
const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    let time = Instant::now();

    init_log();

    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default_panic(info);
        std::process::exit(1);
    }));

    log::info!(
        "Starting Waypoint {CARGO_PKG_VERSION} for Minecraft {CURRENT_MC_VERSION} (Protocol {})",
        ProtocolVersion::CURRENT.0
    );

    let config = match ProxyConfiguration::read(Path::new(CONFIG_FILE)) {
        Ok(config) => config,
        Err(err) => {
            log::error!("Unable to load your configuration: {err}");
            std::process::exit(1);
        }
    };

    if !config.validate() {
        log::error!("Your configuration is invalid. Resolve the issues above and restart.");
        std::process::exit(1);
    }

    tokio::spawn(async {
        setup_sighandler()
            .await
            .expect("Unable to setup signal handlers");
    });

    let server = match WaypointServer::bind(Arc::new(config)).await {
        Ok(server) => server,
        Err(err) => {
            log::error!("Unable to bind the proxy listener: {err}");
            std::process::exit(1);
        }
    };

    log::info!("Started the proxy in {}ms", time.elapsed().as_millis());
    log::info!("You can now connect, listening on {}", server.server_addr);

    server.start().await;
    log::info!("The proxy has stopped.");
}

fn handle_interrupt() {
    log::warn!("Received interrupt, shutting down");
    stop_proxy();
}

#[cfg(unix)]
async fn setup_sighandler() -> std::io::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = interrupt.recv() => handle_interrupt(),
        _ = terminate.recv() => handle_interrupt(),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn setup_sighandler() -> std::io::Result<()> {
    ctrl_c().await?;
    handle_interrupt();
    Ok(())
}
