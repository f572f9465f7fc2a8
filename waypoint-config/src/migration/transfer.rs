use toml::{Table, Value};

use super::{ConfigurationMigration, config_version, get_path, set_path, set_version};
use crate::ConfigError;

/// Adds the `advanced.accepts-transfers` flag for the 1.20.5 Transfer packet.
pub struct TransferIntegrationMigration;

impl ConfigurationMigration for TransferIntegrationMigration {
    fn should_migrate(&self, config: &Table) -> bool {
        config_version(config) < 2.7
    }

    fn migrate(&self, config: &mut Table) -> Result<(), ConfigError> {
        if get_path(config, "advanced.accepts-transfers").is_none() {
            set_path(config, "advanced.accepts-transfers", Value::Boolean(false));
        }
        set_version(config, "2.7");
        Ok(())
    }
}
