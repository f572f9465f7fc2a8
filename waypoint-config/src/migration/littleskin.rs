use toml::{Table, Value};

use super::{ConfigurationMigration, config_version, get_path, set_path, set_version};
use crate::ConfigError;

/// Creates the configuration options for LittleSkin authentication.
pub struct LittleSkinAuthenticationMigration;

impl ConfigurationMigration for LittleSkinAuthenticationMigration {
    fn should_migrate(&self, config: &Table) -> bool {
        config_version(config) < 2.8
    }

    fn migrate(&self, config: &mut Table) -> Result<(), ConfigError> {
        if get_path(config, "authentication.enable-littleskin").is_none() {
            set_path(
                config,
                "authentication.enable-littleskin",
                Value::Boolean(true),
            );
        }
        if get_path(config, "authentication.littleskin-whitelist").is_none() {
            set_path(
                config,
                "authentication.littleskin-whitelist",
                Value::Array(vec![
                    Value::String("example_player1".to_string()),
                    Value::String("example_player2".to_string()),
                ]),
            );
        }
        set_version(config, "2.8");
        Ok(())
    }
}
