use std::{
    collections::HashMap,
    sync::{Arc, Mutex, Weak},
};

use thiserror::Error;
use uuid::Uuid;

use waypoint_protocol::{
    GameProfile, ProtocolVersion, RemoteChatSession,
    client::play::{
        CPlayerInfoUpdate, CPlayerListHeader, CRemovePlayerInfo, PlayerInfoAction,
        PlayerInfoActions, PlayerInfoEntry,
    },
};
use waypoint_util::text::TextComponent;

use super::Connection;

mod entry;
pub use entry::TabListEntry;

/// Sentinel meaning the backend never specified a game mode.
pub const GAME_MODE_NOT_SET: i32 = -1;
/// Legacy sentinel some backends still send for "unspecified". Nothing in the
/// current protocol produces it, but the gate has to keep honoring it.
pub const GAME_MODE_LEGACY_UNSET: i32 = 256;

#[derive(Debug, Error)]
pub enum TabListError {
    #[error("tab list entries must carry a profile id")]
    InvalidEntry,
}

/// The server-authoritative mirror of one player's player-list UI.
///
/// Local edits and inbound backend updates both land in `entries`; the diff,
/// action-set construction and store for one profile id happen under the map
/// lock as one step, and the resulting packet is handed to the connection's
/// outbound queue after the lock is released.
pub struct TabList {
    connection: Arc<Connection>,
    entries: Mutex<HashMap<Uuid, TabListEntry>>,
}

impl TabList {
    pub fn new(connection: Arc<Connection>) -> Arc<Self> {
        Arc::new(Self {
            connection,
            entries: Mutex::new(HashMap::new()),
        })
    }

    pub fn set_header_and_footer(&self, header: TextComponent, footer: TextComponent) {
        self.connection
            .enqueue_packet(&CPlayerListHeader::new(header, footer));
    }

    pub fn clear_header_and_footer(&self) {
        self.set_header_and_footer(TextComponent::empty(), TextComponent::empty());
    }

    /// Inserts or merges an entry. A fresh id sends an `ADD_PLAYER` upsert; a
    /// known id sends exactly the `UPDATE_*` actions for the fields that
    /// changed, and an identical entry sends nothing at all.
    pub fn add_entry(self: &Arc<Self>, entry: TabListEntry) -> Result<(), TabListError> {
        // Entries built against another engine are copied into this one
        let entry = if entry.is_bound_to(self) {
            entry
        } else {
            entry.rebind(Arc::downgrade(self))
        };

        if entry.profile().id.is_nil() {
            return Err(TabListError::InvalidEntry);
        }

        let profile_id = entry.profile().id;
        let protocol = self.connection.protocol_version();
        let mut actions = PlayerInfoActions::default();
        let mut delta = PlayerInfoEntry::new(profile_id);

        {
            let mut entries = self.entries.lock().unwrap();
            let store = match entries.get(&profile_id) {
                // Nothing else to do, the stored entry already matches
                Some(previous) if *previous == entry => false,
                Some(previous) => {
                    if previous.display_name() != entry.display_name() {
                        actions.insert(PlayerInfoAction::UpdateDisplayName);
                        delta.display_name = entry.display_name().cloned();
                    }
                    if previous.latency() != entry.latency() {
                        actions.insert(PlayerInfoAction::UpdateLatency);
                        delta.latency = Some(entry.latency());
                    }
                    if previous.game_mode() != entry.game_mode() {
                        actions.insert(PlayerInfoAction::UpdateGameMode);
                        delta.game_mode = Some(entry.game_mode());
                    }
                    if previous.listed() != entry.listed() {
                        actions.insert(PlayerInfoAction::UpdateListed);
                        delta.listed = Some(entry.listed());
                    }
                    if previous.list_order() != entry.list_order()
                        && protocol >= ProtocolVersion::MINECRAFT_1_21_2
                    {
                        actions.insert(PlayerInfoAction::UpdateListOrder);
                        delta.list_order = Some(entry.list_order());
                    }
                    if previous.chat_session() != entry.chat_session() {
                        // There is no action for clearing a chat session
                        if let Some(session) = entry.chat_session() {
                            actions.insert(PlayerInfoAction::InitializeChat);
                            delta.chat_session = Some(session.clone());
                        }
                    }
                    true
                }
                None => {
                    actions.insert(PlayerInfoAction::AddPlayer);
                    actions.insert(PlayerInfoAction::UpdateLatency);
                    actions.insert(PlayerInfoAction::UpdateListed);
                    delta.profile = Some(entry.profile().clone());
                    delta.latency = Some(entry.latency());
                    delta.listed = Some(entry.listed());
                    if let Some(display_name) = entry.display_name() {
                        actions.insert(PlayerInfoAction::UpdateDisplayName);
                        delta.display_name = Some(display_name.clone());
                    }
                    if let Some(session) = entry.chat_session() {
                        actions.insert(PlayerInfoAction::InitializeChat);
                        delta.chat_session = Some(session.clone());
                    }
                    if entry.game_mode() != GAME_MODE_NOT_SET
                        && entry.game_mode() != GAME_MODE_LEGACY_UNSET
                    {
                        actions.insert(PlayerInfoAction::UpdateGameMode);
                        delta.game_mode = Some(entry.game_mode());
                    }
                    if entry.list_order() != 0 && protocol >= ProtocolVersion::MINECRAFT_1_21_2 {
                        actions.insert(PlayerInfoAction::UpdateListOrder);
                        delta.list_order = Some(entry.list_order());
                    }
                    true
                }
            };

            if store {
                entries.insert(profile_id, entry);
            }
        }

        if !actions.is_empty() {
            self.connection
                .enqueue_packet(&CPlayerInfoUpdate::new(actions, vec![delta]));
        }
        Ok(())
    }

    /// Removes an entry from the mirror, returning it if it was present. The
    /// remove packet goes out either way.
    pub fn remove_entry(&self, profile_id: Uuid) -> Option<TabListEntry> {
        self.connection
            .enqueue_packet(&CRemovePlayerInfo::new(vec![profile_id]));
        self.entries.lock().unwrap().remove(&profile_id)
    }

    pub fn contains_entry(&self, profile_id: Uuid) -> bool {
        self.entries.lock().unwrap().contains_key(&profile_id)
    }

    pub fn get_entry(&self, profile_id: Uuid) -> Option<TabListEntry> {
        self.entries.lock().unwrap().get(&profile_id).cloned()
    }

    pub fn entries(&self) -> Vec<TabListEntry> {
        self.entries.lock().unwrap().values().cloned().collect()
    }

    /// Empties the mirror and tells the client to drop every row it knows.
    pub fn clear_all(&self) {
        let ids: Vec<Uuid> = {
            let mut entries = self.entries.lock().unwrap();
            entries.drain().map(|(profile_id, _)| profile_id).collect()
        };
        self.connection
            .enqueue_packet(&CRemovePlayerInfo::new(ids));
    }

    /// Empties the mirror without telling the client, used when the client is
    /// about to receive a fresh list from a new backend anyway.
    pub fn clear_all_silent(&self) {
        self.entries.lock().unwrap().clear();
    }

    #[allow(clippy::too_many_arguments)]
    pub fn build_entry(
        self: &Arc<Self>,
        profile: GameProfile,
        display_name: Option<TextComponent>,
        latency: i32,
        game_mode: i32,
        chat_session: Option<RemoteChatSession>,
        listed: bool,
        list_order: i32,
    ) -> TabListEntry {
        TabListEntry::new(
            Arc::downgrade(self),
            profile,
            display_name,
            latency,
            game_mode,
            chat_session,
            listed,
            list_order,
        )
    }

    /// Applies an upsert from the backend to the mirror. Nothing is re-emitted
    /// here; the packet itself is forwarded by the pipeline.
    pub fn process_update(self: &Arc<Self>, packet: &CPlayerInfoUpdate) {
        for entry in &packet.entries {
            self.process_upsert(packet.actions, entry);
        }
    }

    fn process_upsert(self: &Arc<Self>, actions: PlayerInfoActions, delta: &PlayerInfoEntry) {
        let mut entries = self.entries.lock().unwrap();
        let profile_id = delta.profile_id;

        if actions.contains(PlayerInfoAction::AddPlayer) {
            entries.entry(profile_id).or_insert_with(|| {
                TabListEntry::new(
                    Arc::downgrade(self),
                    delta.profile.clone().unwrap_or_else(|| GameProfile {
                        id: profile_id,
                        name: String::new(),
                        properties: Vec::new(),
                    }),
                    None,
                    0,
                    delta.game_mode.unwrap_or(GAME_MODE_NOT_SET),
                    None,
                    false,
                    0,
                )
            });
        } else if !entries.contains_key(&profile_id) {
            log::debug!("Received a partial player update before ADD_PLAYER for {profile_id}");
            return;
        }

        let Some(current) = entries.get_mut(&profile_id) else {
            return;
        };
        if actions.contains(PlayerInfoAction::UpdateGameMode) {
            if let Some(game_mode) = delta.game_mode {
                current.set_game_mode_without_update(game_mode);
            }
        }
        if actions.contains(PlayerInfoAction::UpdateLatency) {
            if let Some(latency) = delta.latency {
                current.set_latency_without_update(latency);
            }
        }
        if actions.contains(PlayerInfoAction::UpdateDisplayName) {
            current.set_display_name_without_update(delta.display_name.clone());
        }
        if actions.contains(PlayerInfoAction::InitializeChat) {
            current.set_chat_session(delta.chat_session.clone());
        }
        if actions.contains(PlayerInfoAction::UpdateListed) {
            if let Some(listed) = delta.listed {
                current.set_listed_without_update(listed);
            }
        }
        if actions.contains(PlayerInfoAction::UpdateListOrder) {
            if let Some(list_order) = delta.list_order {
                current.set_list_order_without_update(list_order);
            }
        }
    }

    /// Drops removed ids from the mirror.
    pub fn process_remove(&self, packet: &CRemovePlayerInfo) {
        let mut entries = self.entries.lock().unwrap();
        for profile_id in &packet.profiles_to_remove {
            entries.remove(profile_id);
        }
    }

    pub(crate) fn publish_display_name(
        &self,
        profile_id: Uuid,
        display_name: Option<TextComponent>,
    ) {
        if let Some(stored) = self.entries.lock().unwrap().get_mut(&profile_id) {
            stored.set_display_name_without_update(display_name.clone());
        }
        let mut delta = PlayerInfoEntry::new(profile_id);
        delta.display_name = display_name;
        self.emit_action(PlayerInfoAction::UpdateDisplayName, delta);
    }

    pub(crate) fn publish_latency(&self, profile_id: Uuid, latency: i32) {
        if let Some(stored) = self.entries.lock().unwrap().get_mut(&profile_id) {
            stored.set_latency_without_update(latency);
        }
        let mut delta = PlayerInfoEntry::new(profile_id);
        delta.latency = Some(latency);
        self.emit_action(PlayerInfoAction::UpdateLatency, delta);
    }

    pub(crate) fn publish_game_mode(&self, profile_id: Uuid, game_mode: i32) {
        if let Some(stored) = self.entries.lock().unwrap().get_mut(&profile_id) {
            stored.set_game_mode_without_update(game_mode);
        }
        let mut delta = PlayerInfoEntry::new(profile_id);
        delta.game_mode = Some(game_mode);
        self.emit_action(PlayerInfoAction::UpdateGameMode, delta);
    }

    pub(crate) fn publish_listed(&self, profile_id: Uuid, listed: bool) {
        if let Some(stored) = self.entries.lock().unwrap().get_mut(&profile_id) {
            stored.set_listed_without_update(listed);
        }
        let mut delta = PlayerInfoEntry::new(profile_id);
        delta.listed = Some(listed);
        self.emit_action(PlayerInfoAction::UpdateListed, delta);
    }

    pub(crate) fn publish_list_order(&self, profile_id: Uuid, list_order: i32) {
        if let Some(stored) = self.entries.lock().unwrap().get_mut(&profile_id) {
            stored.set_list_order_without_update(list_order);
        }
        // The action does not exist before 1.21.2; the stored value still
        // matters in case the connection is upgraded by a reconnect
        if self.connection.protocol_version() >= ProtocolVersion::MINECRAFT_1_21_2 {
            let mut delta = PlayerInfoEntry::new(profile_id);
            delta.list_order = Some(list_order);
            self.emit_action(PlayerInfoAction::UpdateListOrder, delta);
        }
    }

    fn emit_action(&self, action: PlayerInfoAction, delta: PlayerInfoEntry) {
        self.connection.enqueue_packet(&CPlayerInfoUpdate::new(
            PlayerInfoActions::of(action),
            vec![delta],
        ));
    }
}
