use toml::{Table, Value};

use crate::ConfigError;

mod forwarding;
mod key_authentication;
mod littleskin;
mod motd;
mod transfer;

pub use forwarding::ForwardingMigration;
pub use key_authentication::KeyAuthenticationMigration;
pub use littleskin::LittleSkinAuthenticationMigration;
pub use motd::MotdMigration;
pub use transfer::TransferIntegrationMigration;

/// One step of schema evolution over the mutable configuration tree.
///
/// The chain in [`crate::ProxyConfiguration::read`] is append-only: every
/// migration's target version is strictly greater than its predecessor's, its
/// `should_migrate` holds precisely while `config-version` is below that
/// target, and `migrate` bumps the version to the target when it runs. New
/// migrations go at the end, never in between.
pub trait ConfigurationMigration {
    fn should_migrate(&self, config: &Table) -> bool;

    fn migrate(&self, config: &mut Table) -> Result<(), ConfigError>;
}

/// The schema version of a configuration tree. Files from before versioning
/// count as 1.0.
pub(crate) fn config_version(config: &Table) -> f64 {
    match config.get("config-version") {
        Some(Value::String(version)) => version.parse().unwrap_or(1.0),
        Some(Value::Float(version)) => *version,
        Some(Value::Integer(version)) => *version as f64,
        _ => 1.0,
    }
}

pub(crate) fn set_version(config: &mut Table, version: &str) {
    config.insert(
        "config-version".to_string(),
        Value::String(version.to_string()),
    );
}

/// Sets a dotted path like `authentication.enable-littleskin`, creating
/// intermediate tables as needed.
pub(crate) fn set_path(config: &mut Table, path: &str, value: Value) {
    match path.split_once('.') {
        Some((parent, rest)) => {
            let child = config
                .entry(parent.to_string())
                .or_insert_with(|| Value::Table(Table::new()));
            if !child.is_table() {
                *child = Value::Table(Table::new());
            }
            if let Value::Table(child) = child {
                set_path(child, rest, value);
            }
        }
        None => {
            config.insert(path.to_string(), value);
        }
    }
}

pub(crate) fn get_path<'a>(config: &'a Table, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        Some((parent, rest)) => get_path(config.get(parent)?.as_table()?, rest),
        None => config.get(path),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn run_chain(config: &mut Table) {
        let dir = tempfile::tempdir().unwrap();
        let forwarding = ForwardingMigration::new(dir.path().join("forwarding.secret"));
        let migrations: [&dyn ConfigurationMigration; 5] = [
            &forwarding,
            &KeyAuthenticationMigration,
            &MotdMigration,
            &TransferIntegrationMigration,
            &LittleSkinAuthenticationMigration,
        ];
        for migration in migrations {
            if migration.should_migrate(config) {
                migration.migrate(config).unwrap();
            }
        }
    }

    #[test]
    fn test_version_parsing() {
        assert_eq!(config_version(&Table::new()), 1.0);
        assert_eq!(
            config_version(&"config-version = \"2.7\"".parse().unwrap()),
            2.7
        );
        assert_eq!(
            config_version(&"config-version = 2.5".parse().unwrap()),
            2.5
        );
        assert_eq!(config_version(&"config-version = 2".parse().unwrap()), 2.0);
    }

    #[test]
    fn test_set_path_creates_tables() {
        let mut config = Table::new();
        set_path(&mut config, "authentication.enable-littleskin", Value::Boolean(true));

        assert_eq!(
            get_path(&config, "authentication.enable-littleskin"),
            Some(&Value::Boolean(true))
        );
    }

    #[test]
    fn test_chain_from_scratch() {
        let mut config = Table::new();
        run_chain(&mut config);

        assert_eq!(config_version(&config), 2.8);
        assert_eq!(
            config.get("forwarding-secret-file").and_then(Value::as_str),
            Some("forwarding.secret")
        );
        assert_eq!(
            config.get("force-key-authentication"),
            Some(&Value::Boolean(true))
        );
        assert_eq!(
            get_path(&config, "advanced.accepts-transfers"),
            Some(&Value::Boolean(false))
        );
        assert_eq!(
            get_path(&config, "authentication.enable-littleskin"),
            Some(&Value::Boolean(true))
        );
        assert!(
            get_path(&config, "authentication.littleskin-whitelist")
                .and_then(Value::as_array)
                .is_some_and(|list| !list.is_empty())
        );
    }

    #[test]
    fn test_chain_is_idempotent() {
        let mut once = Table::new();
        run_chain(&mut once);
        let mut twice = once.clone();
        run_chain(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_littleskin_migration_from_2_7() {
        let mut config: Table = "config-version = \"2.7\"".parse().unwrap();
        run_chain(&mut config);

        assert_eq!(config_version(&config), 2.8);
        assert_eq!(
            get_path(&config, "authentication.enable-littleskin"),
            Some(&Value::Boolean(true))
        );
        // Earlier migrations must not have touched a 2.7 tree
        assert!(config.get("forwarding-secret-file").is_none());
    }

    #[test]
    fn test_migrations_preserve_user_values() {
        let mut config: Table =
            "config-version = \"2.0\"\nforce-key-authentication = false".parse().unwrap();
        run_chain(&mut config);

        assert_eq!(
            config.get("force-key-authentication"),
            Some(&Value::Boolean(false))
        );
    }

    #[test]
    fn test_forwarding_migration_moves_secret_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let secret_file = dir.path().join("forwarding.secret");
        let migration = ForwardingMigration::new(secret_file.clone());

        let mut config: Table = "forwarding-secret = \"hunter2\"".parse().unwrap();
        assert!(migration.should_migrate(&config));
        migration.migrate(&mut config).unwrap();

        assert_eq!(std::fs::read_to_string(secret_file).unwrap(), "hunter2");
        assert!(config.get("forwarding-secret").is_none());
        assert_eq!(
            config.get("forwarding-secret-file").and_then(Value::as_str),
            Some("forwarding.secret")
        );
        assert_eq!(config_version(&config), 2.0);
        assert!(!migration.should_migrate(&config));
    }

    #[test]
    fn test_motd_migration_rewrites_legacy_codes() {
        let mut config: Table =
            "config-version = \"2.1\"\nmotd = \"&3&lA Velocity Server\"".parse().unwrap();
        let migration = MotdMigration;
        assert!(migration.should_migrate(&config));
        migration.migrate(&mut config).unwrap();

        assert_eq!(
            config.get("motd").and_then(Value::as_str),
            Some("<dark_aqua><bold>A Velocity Server")
        );
        assert_eq!(config_version(&config), 2.6);
    }

    #[test]
    fn test_motd_migration_leaves_json_untouched() {
        let motd = r#"{"text":"hi"}"#;
        let mut config = Table::new();
        set_version(&mut config, "2.1");
        config.insert("motd".to_string(), Value::String(motd.to_string()));

        MotdMigration.migrate(&mut config).unwrap();
        assert_eq!(config.get("motd").and_then(Value::as_str), Some(motd));
        assert_eq!(config_version(&config), 2.6);
    }
}
