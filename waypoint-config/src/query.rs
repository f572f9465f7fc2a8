use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Query {
    /// Whether to respond to GameSpy 4 queries.
    pub enabled: bool,
    pub port: u16,
    /// The map name reported to query services.
    pub map: String,
    pub show_plugins: bool,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 25565,
            map: "Waypoint".to_string(),
            show_plugins: false,
        }
    }
}
