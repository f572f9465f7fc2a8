use waypoint_config::ProxyConfiguration;
use waypoint_protocol::server::login::SLoginStart;
use waypoint_util::text::TextComponent;

use crate::net::Connection;

impl Connection {
    pub fn handle_login_start(&self, config: &ProxyConfiguration, login_start: SLoginStart) {
        if config.advanced.log_player_connections {
            if config.enable_player_address_logging {
                log::info!(
                    "{} ({}) is connecting (protocol {})",
                    login_start.name,
                    self.address,
                    self.protocol_version().0
                );
            } else {
                log::info!(
                    "{} is connecting (protocol {})",
                    login_start.name,
                    self.protocol_version().0
                );
            }
        }

        let Some(server) = self.initial_server(config) else {
            self.kick(TextComponent::text(
                "There are no available servers to connect you to.",
            ));
            return;
        };

        // The backend broker picks the session up from here; without one
        // attached, the connection attempt ends like a failed backend dial
        log::debug!("Routing {} to server {server}", login_start.name);
        self.kick(TextComponent::text(format!(
            "Unable to connect you to {server}."
        )));
    }

    /// The first backend to try for this connection: the forced-host mapping
    /// of the requested virtual host when one matches, the configured try
    /// order otherwise.
    fn initial_server(&self, config: &ProxyConfiguration) -> Option<String> {
        let host = self.server_address.lock().unwrap().to_lowercase();
        if let Some(candidates) = config.forced_hosts.forced_hosts.get(&host) {
            if let Some(server) = candidates.first() {
                return Some(server.clone());
            }
        }
        config.servers.attempt_connection_order.first().cloned()
    }
}
