use std::{fs, path::PathBuf};

use toml::{Table, Value};

use super::{ConfigurationMigration, config_version, set_version};
use crate::{ConfigError, DEFAULT_FORWARDING_SECRET_FILE};

/// Moves the forwarding secret out of the configuration file into a secret
/// file of its own.
pub struct ForwardingMigration {
    secret_file: PathBuf,
}

impl ForwardingMigration {
    pub fn new(secret_file: PathBuf) -> Self {
        Self { secret_file }
    }
}

impl ConfigurationMigration for ForwardingMigration {
    fn should_migrate(&self, config: &Table) -> bool {
        config_version(config) < 2.0
    }

    fn migrate(&self, config: &mut Table) -> Result<(), ConfigError> {
        if let Some(Value::String(secret)) = config.remove("forwarding-secret") {
            if !secret.is_empty() {
                fs::write(&self.secret_file, secret)?;
                log::info!(
                    "Moved the forwarding secret to {}",
                    self.secret_file.display()
                );
            }
        }
        config.insert(
            "forwarding-secret-file".to_string(),
            Value::String(DEFAULT_FORWARDING_SECRET_FILE.to_string()),
        );
        set_version(config, "2.0");
        Ok(())
    }
}
