use toml::{Table, Value};

use super::{ConfigurationMigration, config_version, set_version};
use crate::ConfigError;

/// Adds the `force-key-authentication` flag introduced with 1.19 signed chat.
pub struct KeyAuthenticationMigration;

impl ConfigurationMigration for KeyAuthenticationMigration {
    fn should_migrate(&self, config: &Table) -> bool {
        config_version(config) < 2.1
    }

    fn migrate(&self, config: &mut Table) -> Result<(), ConfigError> {
        config
            .entry("force-key-authentication".to_string())
            .or_insert(Value::Boolean(true));
        set_version(config, "2.1");
        Ok(())
    }
}
