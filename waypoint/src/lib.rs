use std::{
    net::SocketAddr,
    str::FromStr,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicBool, Ordering},
    },
};

use log::LevelFilter;
use tokio::{net::TcpListener, select, sync::Notify};

use waypoint_config::ProxyConfiguration;
use waypoint_util::text::TextComponent;

use crate::net::Connection;

pub mod net;

pub static SHOULD_STOP: AtomicBool = AtomicBool::new(false);
pub static STOP_INTERRUPT: LazyLock<Notify> = LazyLock::new(Notify::new);

pub fn stop_proxy() {
    SHOULD_STOP.store(true, Ordering::Relaxed);
    STOP_INTERRUPT.notify_waiters();
}

/// Installs the global logger. `RUST_LOG` picks the level, defaulting to info.
pub fn init_log() {
    let mut config = simplelog::ConfigBuilder::new();
    config.set_time_format_custom(time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ));
    config.set_time_level(LevelFilter::Trace);
    config.set_thread_level(LevelFilter::Off);

    let level = std::env::var("RUST_LOG")
        .ok()
        .as_deref()
        .map(LevelFilter::from_str)
        .and_then(Result::ok)
        .unwrap_or(LevelFilter::Info);

    let _ = simplelog::SimpleLogger::init(level, config.build());
}

pub struct WaypointServer {
    pub config: Arc<ProxyConfiguration>,
    pub listener: TcpListener,
    pub server_addr: SocketAddr,
}

impl WaypointServer {
    pub async fn bind(config: Arc<ProxyConfiguration>) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.bind_address()?).await?;
        // In the event the user puts 0 for their port, this tells us what port
        // the proxy actually got
        let server_addr = listener.local_addr()?;
        Ok(Self {
            config,
            listener,
            server_addr,
        })
    }

    /// Accepts connections until [`stop_proxy`] is called.
    pub async fn start(self) {
        let mut master_client_id: usize = 0;

        while !SHOULD_STOP.load(Ordering::Relaxed) {
            let accepted = select! {
                client = self.listener.accept() => Some(client),
                () = STOP_INTERRUPT.notified() => None,
            };
            let Some(accepted) = accepted else { break };

            let (stream, client_addr) = match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    log::warn!("Failed to accept connection: {err}");
                    continue;
                }
            };

            if let Err(e) = stream.set_nodelay(true) {
                log::warn!("failed to set TCP_NODELAY {e}");
            }

            let id = master_client_id;
            master_client_id = master_client_id.wrapping_add(1);

            let formatted_address = if self.config.enable_player_address_logging {
                format!("{client_addr}")
            } else {
                scrub_address(&format!("{client_addr}"))
            };
            log::info!("Accepted connection from: {formatted_address} (id {id})");

            let (connection, mut decoder) = Connection::new(stream, client_addr, id);
            let config = self.config.clone();
            tokio::spawn(async move {
                while !connection.closed.load(Ordering::Relaxed) {
                    let Some(packet) = connection.get_packet(&mut decoder).await else {
                        break;
                    };
                    if let Err(err) = connection.handle_packet(&config, &packet) {
                        log::error!(
                            "Failed to read incoming packet with id {}: {}",
                            packet.id,
                            err
                        );
                        connection.kick(TextComponent::text(format!(
                            "Error while reading incoming packet {err}"
                        )));
                    }
                }
                connection.close();
                connection.await_tasks().await;
                log::debug!("Cleaned up connection for id {}", connection.id);
            });
        }

        log::info!("Stopped accepting incoming connections");
    }
}

fn scrub_address(ip: &str) -> String {
    ip.chars()
        .map(|ch| if ch == '.' || ch == ':' { ch } else { 'x' })
        .collect()
}
