use std::io::{Read, Write};

use uuid::Uuid;

use waypoint_util::text::TextComponent;

use crate::{
    ClientPacket, GameProfile, Property, RemoteChatSession, ServerPacket,
    packet_id::clientbound::PLAY_PLAYER_INFO_UPDATE,
    ser::{NetworkReadExt, NetworkWriteExt, ReadingError, WritingError, packet::Packet},
};

/// One per-field action of the player-info upsert packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerInfoAction {
    AddPlayer,
    InitializeChat,
    UpdateGameMode,
    UpdateListed,
    UpdateLatency,
    UpdateDisplayName,
    UpdateListOrder,
}

impl PlayerInfoAction {
    /// Every action in wire bit order.
    pub const ALL: [Self; 7] = [
        Self::AddPlayer,
        Self::InitializeChat,
        Self::UpdateGameMode,
        Self::UpdateListed,
        Self::UpdateLatency,
        Self::UpdateDisplayName,
        Self::UpdateListOrder,
    ];

    fn get_mask(self) -> u8 {
        match self {
            Self::AddPlayer => 1 << 0,
            Self::InitializeChat => 1 << 1,
            Self::UpdateGameMode => 1 << 2,
            Self::UpdateListed => 1 << 3,
            Self::UpdateLatency => 1 << 4,
            Self::UpdateDisplayName => 1 << 5,
            Self::UpdateListOrder => 1 << 6,
        }
    }
}

/// The action bitset carried in the packet header. Every entry of one packet
/// shares the same set.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlayerInfoActions(u8);

impl PlayerInfoActions {
    pub fn of(action: PlayerInfoAction) -> Self {
        Self(action.get_mask())
    }

    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, action: PlayerInfoAction) -> bool {
        self.0 & action.get_mask() != 0
    }

    pub fn insert(&mut self, action: PlayerInfoAction) {
        self.0 |= action.get_mask();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl FromIterator<PlayerInfoAction> for PlayerInfoActions {
    fn from_iter<T: IntoIterator<Item = PlayerInfoAction>>(iter: T) -> Self {
        let mut actions = Self::default();
        for action in iter {
            actions.insert(action);
        }
        actions
    }
}

/// One entry delta. Only the fields whose action is present in the packet's
/// action set are meaningful; the rest stay `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfoEntry {
    pub profile_id: Uuid,
    pub profile: Option<GameProfile>,
    pub chat_session: Option<RemoteChatSession>,
    pub game_mode: Option<i32>,
    pub listed: Option<bool>,
    pub latency: Option<i32>,
    pub display_name: Option<TextComponent>,
    pub list_order: Option<i32>,
}

impl PlayerInfoEntry {
    pub fn new(profile_id: Uuid) -> Self {
        Self {
            profile_id,
            profile: None,
            chat_session: None,
            game_mode: None,
            listed: None,
            latency: None,
            display_name: None,
            list_order: None,
        }
    }
}

pub struct CPlayerInfoUpdate {
    pub actions: PlayerInfoActions,
    pub entries: Vec<PlayerInfoEntry>,
}

impl CPlayerInfoUpdate {
    pub fn new(actions: PlayerInfoActions, entries: Vec<PlayerInfoEntry>) -> Self {
        Self { actions, entries }
    }
}

impl Packet for CPlayerInfoUpdate {
    const PACKET_ID: i32 = PLAY_PLAYER_INFO_UPDATE;
}

fn missing(action: PlayerInfoAction) -> WritingError {
    WritingError::Message(format!("entry is missing the field for {action:?}"))
}

impl ClientPacket for CPlayerInfoUpdate {
    fn write_packet_data(&self, write: impl Write) -> Result<(), WritingError> {
        let mut write = write;
        let actions = self.actions;

        write.write_u8_be(actions.bits())?;
        write.write_list::<PlayerInfoEntry>(&self.entries, |w, entry| {
            w.write_uuid(&entry.profile_id)?;
            if actions.contains(PlayerInfoAction::AddPlayer) {
                let profile = entry
                    .profile
                    .as_ref()
                    .ok_or_else(|| missing(PlayerInfoAction::AddPlayer))?;
                w.write_string(&profile.name)?;
                w.write_list::<Property>(&profile.properties, |w, property| {
                    w.write_string(&property.name)?;
                    w.write_string(&property.value)?;
                    w.write_option(&property.signature, |w, signature| w.write_string(signature))
                })?;
            }
            if actions.contains(PlayerInfoAction::InitializeChat) {
                w.write_option(&entry.chat_session, |w, session| {
                    w.write_uuid(&session.session_id)?;
                    w.write_i64_be(session.expires_at)?;
                    w.write_var_int(&session.public_key.len().into())?;
                    w.write_slice(&session.public_key)?;
                    w.write_var_int(&session.key_signature.len().into())?;
                    w.write_slice(&session.key_signature)
                })?;
            }
            if actions.contains(PlayerInfoAction::UpdateGameMode) {
                let game_mode = entry
                    .game_mode
                    .ok_or_else(|| missing(PlayerInfoAction::UpdateGameMode))?;
                w.write_var_int(&game_mode.into())?;
            }
            if actions.contains(PlayerInfoAction::UpdateListed) {
                let listed = entry
                    .listed
                    .ok_or_else(|| missing(PlayerInfoAction::UpdateListed))?;
                w.write_bool(listed)?;
            }
            if actions.contains(PlayerInfoAction::UpdateLatency) {
                let latency = entry
                    .latency
                    .ok_or_else(|| missing(PlayerInfoAction::UpdateLatency))?;
                w.write_var_int(&latency.into())?;
            }
            if actions.contains(PlayerInfoAction::UpdateDisplayName) {
                w.write_option(&entry.display_name, |w, name| {
                    let json = serde_json::to_string(name)
                        .map_err(|err| WritingError::Serde(err.to_string()))?;
                    w.write_string(&json)
                })?;
            }
            if actions.contains(PlayerInfoAction::UpdateListOrder) {
                let list_order = entry
                    .list_order
                    .ok_or_else(|| missing(PlayerInfoAction::UpdateListOrder))?;
                w.write_var_int(&list_order.into())?;
            }

            Ok(())
        })
    }
}

impl ServerPacket for CPlayerInfoUpdate {
    fn read(read: impl Read) -> Result<Self, ReadingError> {
        let mut read = read;
        let actions = PlayerInfoActions::from_bits(read.get_u8_be()?);

        let entries = read.get_list(|r| {
            let mut entry = PlayerInfoEntry::new(r.get_uuid()?);
            if actions.contains(PlayerInfoAction::AddPlayer) {
                let name = r.get_string()?;
                let properties = r.get_list(|r| {
                    let name = r.get_string()?;
                    let value = r.get_string()?;
                    let signature = r.get_option(NetworkReadExt::get_string)?;
                    Ok(Property {
                        name,
                        value,
                        signature,
                    })
                })?;
                entry.profile = Some(GameProfile {
                    id: entry.profile_id,
                    name,
                    properties,
                });
            }
            if actions.contains(PlayerInfoAction::InitializeChat) {
                entry.chat_session = r.get_option(|r| {
                    let session_id = r.get_uuid()?;
                    let expires_at = r.get_i64_be()?;
                    let public_key_len = r.get_var_int()?.0 as usize;
                    let public_key = r.read_boxed_slice(public_key_len)?;
                    let key_signature_len = r.get_var_int()?.0 as usize;
                    let key_signature = r.read_boxed_slice(key_signature_len)?;
                    Ok(RemoteChatSession {
                        session_id,
                        expires_at,
                        public_key,
                        key_signature,
                    })
                })?;
            }
            if actions.contains(PlayerInfoAction::UpdateGameMode) {
                entry.game_mode = Some(r.get_var_int()?.0);
            }
            if actions.contains(PlayerInfoAction::UpdateListed) {
                entry.listed = Some(r.get_bool()?);
            }
            if actions.contains(PlayerInfoAction::UpdateLatency) {
                entry.latency = Some(r.get_var_int()?.0);
            }
            if actions.contains(PlayerInfoAction::UpdateDisplayName) {
                entry.display_name = r
                    .get_option(|r| {
                        let json = r.get_string()?;
                        serde_json::from_str(&json)
                            .map_err(|err| ReadingError::Message(err.to_string()))
                    })?;
            }
            if actions.contains(PlayerInfoAction::UpdateListOrder) {
                entry.list_order = Some(r.get_var_int()?.0);
            }
            Ok(entry)
        })?;

        Ok(Self { actions, entries })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ClientPacket;

    fn roundtrip(packet: &CPlayerInfoUpdate) -> CPlayerInfoUpdate {
        let mut buf = Vec::new();
        packet.write_packet_data(&mut buf).unwrap();
        CPlayerInfoUpdate::read(buf.as_slice()).unwrap()
    }

    #[test]
    fn test_bitfield_order() {
        let actions: PlayerInfoActions = PlayerInfoAction::ALL.into_iter().collect();
        assert_eq!(actions.bits(), 0x7F);
        assert_eq!(
            PlayerInfoActions::of(PlayerInfoAction::AddPlayer).bits() | 0x08,
            0x01 | 0x08
        );
    }

    #[test]
    fn test_full_entry_roundtrip() {
        let profile_id = Uuid::new_v4();
        let mut entry = PlayerInfoEntry::new(profile_id);
        entry.profile = Some(GameProfile {
            id: profile_id,
            name: "Steve".to_string(),
            properties: vec![Property {
                name: "textures".to_string(),
                value: "dGV4dHVyZXM=".to_string(),
                signature: Some("c2ln".to_string()),
            }],
        });
        entry.chat_session = Some(RemoteChatSession {
            session_id: Uuid::new_v4(),
            expires_at: 1234567890,
            public_key: vec![1, 2, 3].into(),
            key_signature: vec![4, 5].into(),
        });
        entry.game_mode = Some(1);
        entry.listed = Some(true);
        entry.latency = Some(42);
        entry.display_name = Some(TextComponent::text("Steve"));
        entry.list_order = Some(-3);

        let packet = CPlayerInfoUpdate::new(
            PlayerInfoAction::ALL.into_iter().collect(),
            vec![entry.clone()],
        );
        let decoded = roundtrip(&packet);

        assert_eq!(decoded.actions, packet.actions);
        assert_eq!(decoded.entries, vec![entry]);
    }

    #[test]
    fn test_partial_entry_roundtrip() {
        let profile_id = Uuid::new_v4();
        let mut entry = PlayerInfoEntry::new(profile_id);
        entry.latency = Some(99);

        let packet = CPlayerInfoUpdate::new(
            PlayerInfoActions::of(PlayerInfoAction::UpdateLatency),
            vec![entry.clone()],
        );
        let decoded = roundtrip(&packet);

        assert_eq!(decoded.actions, packet.actions);
        assert_eq!(decoded.entries[0].latency, Some(99));
        assert_eq!(decoded.entries[0].profile, None);
    }

    #[test]
    fn test_cleared_display_name_roundtrip() {
        // An UPDATE_DISPLAY_NAME action with no component resets the row to
        // the profile name
        let mut entry = PlayerInfoEntry::new(Uuid::new_v4());
        entry.display_name = None;

        let packet = CPlayerInfoUpdate::new(
            PlayerInfoActions::of(PlayerInfoAction::UpdateDisplayName),
            vec![entry],
        );
        let decoded = roundtrip(&packet);
        assert_eq!(decoded.entries[0].display_name, None);
    }

    #[test]
    fn test_missing_field_is_a_write_error() {
        let entry = PlayerInfoEntry::new(Uuid::new_v4());
        let packet = CPlayerInfoUpdate::new(
            PlayerInfoActions::of(PlayerInfoAction::UpdateLatency),
            vec![entry],
        );

        let mut buf = Vec::new();
        assert!(packet.write_packet_data(&mut buf).is_err());
    }
}
