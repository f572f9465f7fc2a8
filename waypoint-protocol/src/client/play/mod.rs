mod disconnect;
mod player_info_update;
mod player_list_header;
mod player_remove;

pub use disconnect::CPlayDisconnect;
pub use player_info_update::{
    CPlayerInfoUpdate, PlayerInfoAction, PlayerInfoActions, PlayerInfoEntry,
};
pub use player_list_header::CPlayerListHeader;
pub use player_remove::CRemovePlayerInfo;
