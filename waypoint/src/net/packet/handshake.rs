use std::sync::atomic::Ordering;

use waypoint_protocol::{
    CURRENT_MC_VERSION, ConnectionState, ProtocolVersion, server::handshake::SHandShake,
};
use waypoint_util::text::TextComponent;

use crate::net::Connection;

impl Connection {
    pub fn handle_handshake(&self, handshake: SHandShake) {
        let version = handshake.protocol_version.0;
        self.protocol_version.store(version, Ordering::Relaxed);
        *self.server_address.lock().unwrap() = handshake.server_address;

        log::debug!("Handshake: next state {:?}", &handshake.next_state);
        self.connection_state.store(handshake.next_state);

        // Status pings are answered for any version; everything else has to
        // speak a revision the proxy knows
        if self.connection_state.load() != ConnectionState::Status {
            let protocol = ProtocolVersion(version);
            if !protocol.is_supported() {
                let key = if protocol < ProtocolVersion::OLDEST_SUPPORTED {
                    "multiplayer.disconnect.outdated_client"
                } else {
                    "multiplayer.disconnect.incompatible"
                };
                self.kick(TextComponent::translate(
                    key,
                    vec![TextComponent::text(CURRENT_MC_VERSION)],
                ));
            }
        }
    }
}
