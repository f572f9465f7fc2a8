use std::fmt;
use std::str::FromStr;

/// Scheme by which the proxy conveys the real player identity to the backend
/// server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerInfoForwarding {
    #[default]
    None,
    Legacy,
    BungeeGuard,
    Modern,
}

impl FromStr for PlayerInfoForwarding {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "LEGACY" => Ok(Self::Legacy),
            "BUNGEEGUARD" => Ok(Self::BungeeGuard),
            "MODERN" => Ok(Self::Modern),
            _ => Err(()),
        }
    }
}

impl fmt::Display for PlayerInfoForwarding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "NONE",
            Self::Legacy => "LEGACY",
            Self::BungeeGuard => "BUNGEEGUARD",
            Self::Modern => "MODERN",
        })
    }
}

/// How much of a backend server's ping response the proxy forwards to the
/// client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PingPassthroughMode {
    #[default]
    Disabled,
    Mods,
    Description,
    All,
}

impl FromStr for PingPassthroughMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DISABLED" => Ok(Self::Disabled),
            "MODS" => Ok(Self::Mods),
            "DESCRIPTION" => Ok(Self::Description),
            "ALL" => Ok(Self::All),
            _ => Err(()),
        }
    }
}
