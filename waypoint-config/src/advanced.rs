use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Advanced {
    /// How large a Minecraft packet has to be before the proxy compresses it.
    pub compression_threshold: i32,
    /// zlib level, -1 picks the library default.
    pub compression_level: i32,
    /// Minimum milliseconds between login attempts from one address. 0 disables
    /// the limit.
    pub login_ratelimit: i32,
    pub connection_timeout: i32,
    pub read_timeout: i32,
    #[serde(alias = "haproxy-protocol")]
    proxy_protocol: AtomicBool,
    pub tcp_fast_open: bool,
    pub bungee_plugin_message_channel: bool,
    pub show_ping_requests: bool,
    pub failover_on_unexpected_server_disconnect: bool,
    pub announce_proxy_commands: bool,
    pub log_command_executions: bool,
    pub log_player_connections: bool,
    pub accepts_transfers: bool,
}

impl Default for Advanced {
    fn default() -> Self {
        Self {
            compression_threshold: 256,
            compression_level: -1,
            login_ratelimit: 3000,
            connection_timeout: 5000,
            read_timeout: 30000,
            proxy_protocol: AtomicBool::new(false),
            tcp_fast_open: false,
            bungee_plugin_message_channel: true,
            show_ping_requests: false,
            failover_on_unexpected_server_disconnect: true,
            announce_proxy_commands: true,
            log_command_executions: false,
            log_player_connections: true,
            accepts_transfers: false,
        }
    }
}

impl Advanced {
    /// The one toggle that may flip after the snapshot is frozen. A single-word
    /// atomic, so readers can never observe a torn value.
    pub fn is_proxy_protocol(&self) -> bool {
        self.proxy_protocol.load(Ordering::Relaxed)
    }

    pub fn set_proxy_protocol(&self, proxy_protocol: bool) {
        self.proxy_protocol.store(proxy_protocol, Ordering::Relaxed);
    }
}
