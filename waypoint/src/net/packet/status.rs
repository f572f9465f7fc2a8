use waypoint_config::ProxyConfiguration;
use waypoint_protocol::{
    CURRENT_MC_VERSION, Players, ProtocolVersion, StatusResponse, Version,
    client::status::{CPingResponse, CStatusResponse},
    server::status::SStatusPingRequest,
};

use crate::net::Connection;

impl Connection {
    pub fn handle_status_request(&self, config: &ProxyConfiguration) {
        if config.advanced.show_ping_requests {
            log::info!("{} is pinging the proxy", self.address);
        }

        let response = StatusResponse {
            version: Some(Version {
                name: CURRENT_MC_VERSION.to_string(),
                protocol: ProtocolVersion::CURRENT.0 as u32,
            }),
            players: Some(Players {
                max: config.show_max_players,
                online: 0,
                sample: vec![],
            }),
            description: config.motd.clone(),
            favicon: None,
            enforce_secure_chat: config.force_key_authentication,
        };

        match serde_json::to_string(&response) {
            Ok(json) => self.enqueue_packet(&CStatusResponse::new(&json)),
            Err(err) => log::error!("Failed to serialize status response: {err}"),
        }
    }

    pub fn handle_ping_request(&self, ping: SStatusPingRequest) {
        self.enqueue_packet(&CPingResponse::new(ping.payload));
        self.close();
    }
}
