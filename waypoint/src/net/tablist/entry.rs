use std::sync::{Arc, Weak};

use waypoint_protocol::{GameProfile, RemoteChatSession};
use waypoint_util::text::TextComponent;

use super::TabList;

/// One row of one player's player-list UI.
///
/// The entry is a value object: the engine's map holds the authoritative copy,
/// and [`TabList::get_entry`] hands out clones. The publishing setters route
/// through the owning engine so the stored copy and the wire stay in sync with
/// whichever clone was mutated.
#[derive(Debug, Clone)]
pub struct TabListEntry {
    /// The owning engine; a callback handle, not an ownership edge.
    tab_list: Weak<TabList>,
    profile: GameProfile,
    display_name: Option<TextComponent>,
    latency: i32,
    game_mode: i32,
    listed: bool,
    list_order: i32,
    chat_session: Option<RemoteChatSession>,
}

/// Entries are compared by their visible fields; the engine handle does not
/// participate, so equal-valued entries from different engines merge cleanly.
impl PartialEq for TabListEntry {
    fn eq(&self, other: &Self) -> bool {
        self.profile == other.profile
            && self.display_name == other.display_name
            && self.latency == other.latency
            && self.game_mode == other.game_mode
            && self.listed == other.listed
            && self.list_order == other.list_order
            && self.chat_session == other.chat_session
    }
}

impl TabListEntry {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        tab_list: Weak<TabList>,
        profile: GameProfile,
        display_name: Option<TextComponent>,
        latency: i32,
        game_mode: i32,
        chat_session: Option<RemoteChatSession>,
        listed: bool,
        list_order: i32,
    ) -> Self {
        Self {
            tab_list,
            profile,
            display_name,
            latency,
            game_mode,
            listed,
            list_order,
            chat_session,
        }
    }

    /// The engine this entry publishes through, if it is still alive.
    pub fn tab_list(&self) -> Option<Arc<TabList>> {
        self.tab_list.upgrade()
    }

    pub(crate) fn is_bound_to(&self, tab_list: &Arc<TabList>) -> bool {
        Weak::ptr_eq(&self.tab_list, &Arc::downgrade(tab_list))
    }

    pub(crate) fn rebind(self, tab_list: Weak<TabList>) -> Self {
        Self { tab_list, ..self }
    }

    pub fn profile(&self) -> &GameProfile {
        &self.profile
    }

    pub fn display_name(&self) -> Option<&TextComponent> {
        self.display_name.as_ref()
    }

    pub fn latency(&self) -> i32 {
        self.latency
    }

    pub fn game_mode(&self) -> i32 {
        self.game_mode
    }

    pub fn listed(&self) -> bool {
        self.listed
    }

    pub fn list_order(&self) -> i32 {
        self.list_order
    }

    pub fn chat_session(&self) -> Option<&RemoteChatSession> {
        self.chat_session.as_ref()
    }

    /// Sets the display name and publishes the change. `None` makes the client
    /// fall back to the profile name.
    pub fn set_display_name(&mut self, display_name: Option<TextComponent>) {
        self.display_name = display_name.clone();
        if let Some(tab_list) = self.tab_list.upgrade() {
            tab_list.publish_display_name(self.profile.id, display_name);
        }
    }

    pub(crate) fn set_display_name_without_update(&mut self, display_name: Option<TextComponent>) {
        self.display_name = display_name;
    }

    /// Sets the latency in milliseconds and publishes the change.
    pub fn set_latency(&mut self, latency: i32) {
        self.latency = latency;
        if let Some(tab_list) = self.tab_list.upgrade() {
            tab_list.publish_latency(self.profile.id, latency);
        }
    }

    pub(crate) fn set_latency_without_update(&mut self, latency: i32) {
        self.latency = latency;
    }

    pub fn set_game_mode(&mut self, game_mode: i32) {
        self.game_mode = game_mode;
        if let Some(tab_list) = self.tab_list.upgrade() {
            tab_list.publish_game_mode(self.profile.id, game_mode);
        }
    }

    pub(crate) fn set_game_mode_without_update(&mut self, game_mode: i32) {
        self.game_mode = game_mode;
    }

    pub fn set_listed(&mut self, listed: bool) {
        self.listed = listed;
        if let Some(tab_list) = self.tab_list.upgrade() {
            tab_list.publish_listed(self.profile.id, listed);
        }
    }

    pub(crate) fn set_listed_without_update(&mut self, listed: bool) {
        self.listed = listed;
    }

    /// Sets the sort key. The field is always stored; the wire update only
    /// goes out on protocol 1.21.2 and newer, where the action exists.
    pub fn set_list_order(&mut self, list_order: i32) {
        self.list_order = list_order;
        if let Some(tab_list) = self.tab_list.upgrade() {
            tab_list.publish_list_order(self.profile.id, list_order);
        }
    }

    pub(crate) fn set_list_order_without_update(&mut self, list_order: i32) {
        self.list_order = list_order;
    }

    pub(crate) fn set_chat_session(&mut self, chat_session: Option<RemoteChatSession>) {
        self.chat_session = chat_session;
    }
}
