use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Authentication {
    /// Whether to fall back to LittleSkin when Mojang authentication fails.
    pub enable_littleskin: bool,
    /// Only players in this list may use the LittleSkin fallback. An empty
    /// list disables the whitelist.
    pub littleskin_whitelist: Vec<String>,
}

impl Default for Authentication {
    fn default() -> Self {
        Self {
            enable_littleskin: true,
            littleskin_whitelist: Vec::new(),
        }
    }
}
