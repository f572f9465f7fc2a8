use std::{
    collections::HashMap,
    env, fs, io,
    net::{SocketAddr, ToSocketAddrs},
    path::{Path, PathBuf},
    str::FromStr,
};

use log::{error, warn};
use rand::Rng;
use serde::de::DeserializeOwned;
use thiserror::Error;
use toml::{Table, Value};

pub mod migration;

mod advanced;
mod authentication;
mod forwarding;
mod metrics;
mod query;

pub use advanced::Advanced;
pub use authentication::Authentication;
pub use forwarding::{PingPassthroughMode, PlayerInfoForwarding};
pub use metrics::Metrics;
pub use query::Query;

use migration::{
    ConfigurationMigration, ForwardingMigration, KeyAuthenticationMigration,
    LittleSkinAuthenticationMigration, MotdMigration, TransferIntegrationMigration,
};

/// The configuration written on first startup.
const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Overrides any file-based forwarding secret when set and non-empty.
pub const FORWARDING_SECRET_ENV: &str = "VELOCITY_FORWARDING_SECRET";

pub(crate) const DEFAULT_FORWARDING_SECRET_FILE: &str = "forwarding.secret";
pub(crate) const DEFAULT_MOTD: &str = "<#09add3>A Velocity Server";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to write migrated configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("the forwarding secret file {} does not exist", .0.display())]
    ForwardingSecretMissing(PathBuf),
    #[error("{} is not a valid file or it is a directory", .0.display())]
    ForwardingSecretPathInvalid(PathBuf),
    #[error("the forwarding secret must not be empty for this forwarding mode")]
    EmptyForwardingSecret,
    #[error("server entry {0} is not a string")]
    InvalidServerEntry(String),
    #[error("invalid value in forced hosts for {0}")]
    InvalidForcedHost(String),
    #[error("invalid value {value:?} for {key}")]
    InvalidEnum { key: String, value: String },
}

/// The immutable configuration snapshot the rest of the proxy consumes.
/// Produced once at boot by [`ProxyConfiguration::read`]; the proxy-protocol
/// toggle on [`Advanced`] is the only mutable bit.
#[derive(Debug)]
pub struct ProxyConfiguration {
    /// The `host:port` the proxy listens on.
    pub bind: String,
    /// The MOTD, a MiniMessage string.
    pub motd: String,
    pub show_max_players: u32,
    pub online_mode: bool,
    pub force_key_authentication: bool,
    pub prevent_client_proxy_connections: bool,
    pub announce_forge: bool,
    pub kick_existing_players: bool,
    pub enable_player_address_logging: bool,
    pub player_info_forwarding_mode: PlayerInfoForwarding,
    forwarding_secret: Box<[u8]>,
    pub ping_passthrough: PingPassthroughMode,
    pub servers: Servers,
    pub forced_hosts: ForcedHosts,
    pub advanced: Advanced,
    pub query: Query,
    pub metrics: Metrics,
    pub authentication: Authentication,
}

#[derive(Debug, Clone)]
pub struct Servers {
    /// Server name to `host:port`.
    pub servers: HashMap<String, String>,
    /// In what order we should try servers when a player logs in or is kicked
    /// from a server.
    pub attempt_connection_order: Vec<String>,
}

impl Default for Servers {
    fn default() -> Self {
        Self {
            servers: HashMap::from([
                ("lobby".to_string(), "127.0.0.1:30066".to_string()),
                ("factions".to_string(), "127.0.0.1:30067".to_string()),
                ("minigames".to_string(), "127.0.0.1:30068".to_string()),
            ]),
            attempt_connection_order: vec!["lobby".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForcedHosts {
    /// Lower-cased virtual host to the servers handling it.
    pub forced_hosts: HashMap<String, Vec<String>>,
}

impl Default for ForcedHosts {
    fn default() -> Self {
        Self {
            forced_hosts: HashMap::from([
                ("lobby.example.com".to_string(), vec!["lobby".to_string()]),
                ("factions.example.com".to_string(), vec!["factions".to_string()]),
                (
                    "minigames.example.com".to_string(),
                    vec!["minigames".to_string()],
                ),
            ]),
        }
    }
}

impl ProxyConfiguration {
    /// Reads the proxy configuration from `path`, bringing older files forward
    /// through the migration chain first. The default forwarding secret file
    /// lives next to the configuration file.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let default_secret_path = base_dir.join(DEFAULT_FORWARDING_SECRET_FILE);

        // Create the forwarding-secret file on first-time startup if it doesn't exist
        if !path.exists() && !default_secret_path.exists() {
            fs::write(&default_secret_path, generate_random_string(12))?;
        }

        let raw = if path.exists() {
            fs::read_to_string(path)?
        } else {
            fs::write(path, DEFAULT_CONFIG)?;
            DEFAULT_CONFIG.to_string()
        };

        let mut config: Table = raw.parse()?;

        let forwarding_migration = ForwardingMigration::new(default_secret_path.clone());
        let migrations: [&dyn ConfigurationMigration; 5] = [
            &forwarding_migration,
            &KeyAuthenticationMigration,
            &MotdMigration,
            &TransferIntegrationMigration,
            &LittleSkinAuthenticationMigration,
        ];

        let mut migrated = false;
        for migration in migrations {
            if migration.should_migrate(&config) {
                migration.migrate(&mut config)?;
                migrated = true;
            }
        }
        if migrated {
            fs::write(path, toml::to_string(&config)?)?;
        }

        let forwarding_secret = resolve_forwarding_secret(&config, &base_dir)?;
        Self::from_table(&config, forwarding_secret)
    }

    /// Materializes the snapshot from a migrated configuration tree.
    fn from_table(config: &Table, forwarding_secret: Box<[u8]>) -> Result<Self, ConfigError> {
        let player_info_forwarding_mode =
            get_enum(config, "player-info-forwarding-mode", PlayerInfoForwarding::None)?;
        let ping_passthrough = get_enum(config, "ping-passthrough", PingPassthroughMode::Disabled)?;

        // Fail fast when a forwarding mode depends on a secret nobody set
        if forwarding_secret.is_empty()
            && matches!(
                player_info_forwarding_mode,
                PlayerInfoForwarding::Modern | PlayerInfoForwarding::BungeeGuard
            )
        {
            return Err(ConfigError::EmptyForwardingSecret);
        }

        Ok(Self {
            bind: get_string(config, "bind", "0.0.0.0:25565"),
            motd: get_string(config, "motd", DEFAULT_MOTD),
            show_max_players: get_int(config, "show-max-players", 500) as u32,
            online_mode: get_bool(config, "online-mode", true),
            force_key_authentication: get_bool(config, "force-key-authentication", true),
            prevent_client_proxy_connections: get_bool(
                config,
                "prevent-client-proxy-connections",
                false,
            ),
            announce_forge: get_bool(config, "announce-forge", true),
            kick_existing_players: get_bool(config, "kick-existing-players", false),
            enable_player_address_logging: get_bool(
                config,
                "enable-player-address-logging",
                true,
            ),
            player_info_forwarding_mode,
            forwarding_secret,
            ping_passthrough,
            servers: read_servers(config.get("servers"))?,
            forced_hosts: read_forced_hosts(config.get("forced-hosts"))?,
            advanced: get_section(config, "advanced")?,
            query: get_section(config, "query")?,
            metrics: get_section(config, "metrics")?,
            authentication: get_section(config, "authentication")?,
        })
    }

    pub fn forwarding_secret(&self) -> &[u8] {
        &self.forwarding_secret
    }

    /// Resolves the configured bind string to a socket address.
    pub fn bind_address(&self) -> io::Result<SocketAddr> {
        self.bind.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("unable to resolve bind address {}", self.bind),
            )
        })
    }

    /// Checks the snapshot against everything the proxy assumes later. Every
    /// fault is logged; the caller decides whether a `false` aborts startup.
    pub fn validate(&self) -> bool {
        let mut valid = true;

        if self.bind.is_empty() {
            error!("'bind' option is empty.");
            valid = false;
        } else if split_host_port(&self.bind).is_none() {
            error!("'bind' option does not specify a valid address.");
            valid = false;
        }

        if !self.online_mode {
            warn!(
                "The proxy is running in offline mode! This is a security risk and you will NOT receive any support!"
            );
        }

        match self.player_info_forwarding_mode {
            PlayerInfoForwarding::None => {
                warn!(
                    "Player info forwarding is disabled! All players will appear to be connecting from the proxy and will have offline-mode UUIDs."
                );
            }
            PlayerInfoForwarding::Modern | PlayerInfoForwarding::BungeeGuard => {
                if self.forwarding_secret.is_empty() {
                    error!("You don't have a forwarding secret set. This is required for security.");
                    valid = false;
                }
            }
            PlayerInfoForwarding::Legacy => {}
        }

        if self.servers.servers.is_empty() {
            warn!("You don't have any servers configured.");
        }

        for (name, address) in &self.servers.servers {
            if split_host_port(address).is_none() {
                error!("Server {name} does not have a valid IP address.");
                valid = false;
            }
        }

        for name in &self.servers.attempt_connection_order {
            if !self.servers.servers.contains_key(name) {
                error!("Fallback server {name} is not registered in your configuration!");
                valid = false;
            }
        }

        for (host, servers) in &self.forced_hosts.forced_hosts {
            if servers.is_empty() {
                error!("Forced host '{host}' does not contain any servers");
                valid = false;
                continue;
            }

            for server in servers {
                if !self.servers.servers.contains_key(server) {
                    error!("Server '{server}' for forced host '{host}' does not exist");
                    valid = false;
                }
            }
        }

        if !(-1..=9).contains(&self.advanced.compression_level) {
            error!("Invalid compression level {}", self.advanced.compression_level);
            valid = false;
        } else if self.advanced.compression_level == 0 {
            warn!(
                "ALL packets going through the proxy will be uncompressed. This will increase bandwidth usage."
            );
        }

        if self.advanced.compression_threshold < -1 {
            error!(
                "Invalid compression threshold {}",
                self.advanced.compression_threshold
            );
            valid = false;
        } else if self.advanced.compression_threshold == 0 {
            warn!(
                "ALL packets going through the proxy will be compressed. This will compromise throughput and increase CPU usage!"
            );
        }

        if self.advanced.login_ratelimit < 0 {
            error!("Invalid login ratelimit {}ms", self.advanced.login_ratelimit);
            valid = false;
        }

        valid
    }
}

/// Resolution order: environment variable, then the `forwarding-secret-file`
/// key, then the default secret file next to the configuration.
fn resolve_forwarding_secret(config: &Table, base_dir: &Path) -> Result<Box<[u8]>, ConfigError> {
    let from_env = env::var(FORWARDING_SECRET_ENV).unwrap_or_default();
    if !from_env.is_empty() {
        return Ok(from_env.into_bytes().into());
    }

    let secret_path = config
        .get("forwarding-secret-file")
        .and_then(Value::as_str)
        .map_or_else(
            || base_dir.join(DEFAULT_FORWARDING_SECRET_FILE),
            |file| base_dir.join(file),
        );

    if !secret_path.exists() {
        return Err(ConfigError::ForwardingSecretMissing(secret_path));
    }
    if !secret_path.is_file() {
        return Err(ConfigError::ForwardingSecretPathInvalid(secret_path));
    }

    let secret: String = fs::read_to_string(&secret_path)?.lines().collect();
    Ok(secret.into_bytes().into())
}

/// TOML requires keys to match `[A-Za-z0-9_-]` unless they are quoted, and
/// some parsers hand the quotes back with the key. Strip them before server
/// registration so lookups behave.
fn clean_server_name(name: &str) -> String {
    name.replace('"', "")
}

fn read_servers(value: Option<&Value>) -> Result<Servers, ConfigError> {
    let Some(table) = value.and_then(Value::as_table) else {
        return Ok(Servers::default());
    };

    let mut servers = HashMap::new();
    for (key, value) in table {
        if let Some(address) = value.as_str() {
            servers.insert(clean_server_name(key), address.to_string());
        } else if !key.eq_ignore_ascii_case("try") {
            return Err(ConfigError::InvalidServerEntry(key.clone()));
        }
    }

    let attempt_connection_order = match table.get("try") {
        Some(Value::Array(order)) => order
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => vec!["lobby".to_string()],
    };

    Ok(Servers {
        servers,
        attempt_connection_order,
    })
}

fn read_forced_hosts(value: Option<&Value>) -> Result<ForcedHosts, ConfigError> {
    let Some(table) = value.and_then(Value::as_table) else {
        return Ok(ForcedHosts::default());
    };

    let mut forced_hosts = HashMap::new();
    for (key, value) in table {
        let host = key.to_lowercase();
        match value {
            Value::String(server) => {
                forced_hosts.insert(host, vec![server.clone()]);
            }
            Value::Array(servers) => {
                forced_hosts.insert(
                    host,
                    servers
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                );
            }
            _ => return Err(ConfigError::InvalidForcedHost(key.clone())),
        }
    }

    Ok(ForcedHosts { forced_hosts })
}

fn get_bool(config: &Table, key: &str, default: bool) -> bool {
    config.get(key).and_then(Value::as_bool).unwrap_or(default)
}

fn get_int(config: &Table, key: &str, default: i64) -> i64 {
    config
        .get(key)
        .and_then(Value::as_integer)
        .unwrap_or(default)
}

fn get_string(config: &Table, key: &str, default: &str) -> String {
    config
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn get_enum<T: FromStr<Err = ()>>(config: &Table, key: &str, default: T) -> Result<T, ConfigError> {
    match config.get(key).and_then(Value::as_str) {
        Some(value) => value.parse().map_err(|()| ConfigError::InvalidEnum {
            key: key.to_string(),
            value: value.to_string(),
        }),
        None => Ok(default),
    }
}

fn get_section<T: DeserializeOwned + Default>(config: &Table, key: &str) -> Result<T, ConfigError> {
    match config.get(key) {
        Some(value) => Ok(value.clone().try_into()?),
        None => Ok(T::default()),
    }
}

fn split_host_port(address: &str) -> Option<(&str, u16)> {
    let (host, port) = address.rsplit_once(':')?;
    if host.is_empty() {
        return None;
    }
    let port = port.parse().ok()?;
    Some((host, port))
}

/// Generates a random printable string, used for fresh forwarding secrets.
pub fn generate_random_string(length: usize) -> String {
    const CHARS: &[u8] = b"AaBbCcDdEeFfGgHhIiJjKkLlMmNnOoPpQqRrSsTtUuVvWwXxYyZz1234567890";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn secret() -> Box<[u8]> {
        b"hunter2hunter".to_vec().into()
    }

    fn table(raw: &str) -> Table {
        raw.parse().unwrap()
    }

    #[test]
    fn test_defaults_from_shipped_config() {
        let config =
            ProxyConfiguration::from_table(&table(DEFAULT_CONFIG), secret()).unwrap();

        assert_eq!(config.bind, "0.0.0.0:25565");
        assert_eq!(config.motd, DEFAULT_MOTD);
        assert_eq!(config.show_max_players, 500);
        assert!(config.online_mode);
        assert!(config.force_key_authentication);
        assert_eq!(
            config.player_info_forwarding_mode,
            PlayerInfoForwarding::None
        );
        assert_eq!(config.ping_passthrough, PingPassthroughMode::Disabled);
        assert_eq!(config.servers.servers.len(), 3);
        assert_eq!(config.servers.attempt_connection_order, vec!["lobby"]);
        assert_eq!(config.advanced.compression_threshold, 256);
        assert!(!config.advanced.is_proxy_protocol());
        assert_eq!(config.query.port, 25565);
        assert!(config.metrics.enabled);
        assert!(config.authentication.enable_littleskin);
        assert!(config.validate());
    }

    #[test]
    fn test_forwarding_mode_parsed_case_insensitively() {
        let config = ProxyConfiguration::from_table(
            &table("player-info-forwarding-mode = \"modern\""),
            secret(),
        )
        .unwrap();
        assert_eq!(
            config.player_info_forwarding_mode,
            PlayerInfoForwarding::Modern
        );
    }

    #[test]
    fn test_unknown_forwarding_mode_is_an_error() {
        let result = ProxyConfiguration::from_table(
            &table("player-info-forwarding-mode = \"CARRIER_PIGEON\""),
            secret(),
        );
        assert!(matches!(result, Err(ConfigError::InvalidEnum { .. })));
    }

    #[test]
    fn test_empty_secret_rejected_for_modern_forwarding() {
        let result = ProxyConfiguration::from_table(
            &table("player-info-forwarding-mode = \"MODERN\""),
            Vec::new().into(),
        );
        assert!(matches!(result, Err(ConfigError::EmptyForwardingSecret)));
    }

    #[test]
    fn test_server_names_are_cleaned() {
        let mut servers = Table::new();
        servers.insert(
            "\"lobby\"".to_string(),
            Value::String("127.0.0.1:30066".to_string()),
        );
        let mut config = Table::new();
        config.insert("servers".to_string(), Value::Table(servers));

        let config = ProxyConfiguration::from_table(&config, secret()).unwrap();
        assert_eq!(
            config.servers.servers.get("lobby").map(String::as_str),
            Some("127.0.0.1:30066")
        );
    }

    #[test]
    fn test_forced_host_keys_lowercased_and_strings_accepted() {
        let config = ProxyConfiguration::from_table(
            &table("[forced-hosts]\n\"Lobby.Example.COM\" = \"lobby\""),
            secret(),
        )
        .unwrap();
        assert_eq!(
            config.forced_hosts.forced_hosts.get("lobby.example.com"),
            Some(&vec!["lobby".to_string()])
        );
    }

    #[test]
    fn test_validate_rejects_unknown_try_server() {
        let config = ProxyConfiguration::from_table(
            &table("[servers]\nlobby = \"127.0.0.1:30066\"\ntry = [\"hub\"]"),
            secret(),
        )
        .unwrap();
        assert!(!config.validate());
    }

    #[test]
    fn test_validate_rejects_forced_host_with_unknown_server() {
        let config = ProxyConfiguration::from_table(
            &table(
                "[servers]\nlobby = \"127.0.0.1:30066\"\ntry = [\"lobby\"]\n\n[forced-hosts]\n\"hub.example.com\" = [\"hub\"]",
            ),
            secret(),
        )
        .unwrap();
        assert!(!config.validate());
    }

    #[test]
    fn test_validate_rejects_out_of_range_compression() {
        let config = ProxyConfiguration::from_table(
            &table("[advanced]\ncompression-level = 12"),
            secret(),
        )
        .unwrap();
        assert!(!config.validate());

        let config = ProxyConfiguration::from_table(
            &table("[advanced]\ncompression-threshold = -2"),
            secret(),
        )
        .unwrap();
        assert!(!config.validate());

        let config = ProxyConfiguration::from_table(
            &table("[advanced]\nlogin-ratelimit = -1"),
            secret(),
        )
        .unwrap();
        assert!(!config.validate());
    }

    #[test]
    fn test_validate_rejects_bad_bind() {
        let config =
            ProxyConfiguration::from_table(&table("bind = \"not-an-address\""), secret()).unwrap();
        assert!(!config.validate());
    }

    #[test]
    fn test_haproxy_protocol_alias() {
        let config = ProxyConfiguration::from_table(
            &table("[advanced]\nhaproxy-protocol = true"),
            secret(),
        )
        .unwrap();
        assert!(config.advanced.is_proxy_protocol());

        // The toggle is the one allowed post-freeze mutation
        config.advanced.set_proxy_protocol(false);
        assert!(!config.advanced.is_proxy_protocol());
    }

    #[test]
    fn test_first_run_writes_config_and_secret() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("waypoint.toml");

        let config = ProxyConfiguration::read(&config_path).unwrap();

        assert!(config_path.exists());
        let secret_file = dir.path().join("forwarding.secret");
        assert!(secret_file.exists());
        assert_eq!(fs::read_to_string(secret_file).unwrap().len(), 12);
        assert_eq!(config.forwarding_secret().len(), 12);
        assert!(config.validate());
    }

    #[test]
    fn test_read_migrates_old_config_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("waypoint.toml");
        fs::write(
            &config_path,
            "config-version = \"2.7\"\nbind = \"0.0.0.0:25577\"\n",
        )
        .unwrap();
        fs::write(dir.path().join("forwarding.secret"), "s3cr3t").unwrap();

        let config = ProxyConfiguration::read(&config_path).unwrap();

        assert_eq!(config.bind, "0.0.0.0:25577");
        assert!(config.authentication.enable_littleskin);
        assert_eq!(config.forwarding_secret(), b"s3cr3t");

        // The migrated tree must have been persisted
        let rewritten = fs::read_to_string(&config_path).unwrap();
        let rewritten: Table = rewritten.parse().unwrap();
        assert_eq!(
            rewritten.get("config-version").and_then(Value::as_str),
            Some("2.8")
        );
    }

    #[test]
    fn test_missing_secret_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("waypoint.toml");
        fs::write(
            &config_path,
            "config-version = \"2.8\"\nforwarding-secret-file = \"nope.secret\"\n",
        )
        .unwrap();

        let result = ProxyConfiguration::read(&config_path);
        assert!(matches!(
            result,
            Err(ConfigError::ForwardingSecretMissing(_))
        ));
    }

    #[test]
    fn test_secret_path_that_is_a_directory_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("waypoint.toml");
        fs::create_dir(dir.path().join("secret-dir")).unwrap();
        fs::write(
            &config_path,
            "config-version = \"2.8\"\nforwarding-secret-file = \"secret-dir\"\n",
        )
        .unwrap();

        let result = ProxyConfiguration::read(&config_path);
        assert!(matches!(
            result,
            Err(ConfigError::ForwardingSecretPathInvalid(_))
        ));
    }
}
