use toml::{Table, Value};

use super::{ConfigurationMigration, config_version, set_version};
use crate::{ConfigError, DEFAULT_MOTD};

/// Rewrites legacy `&`/`§` color codes in the MOTD to MiniMessage tags.
pub struct MotdMigration;

impl ConfigurationMigration for MotdMigration {
    fn should_migrate(&self, config: &Table) -> bool {
        config_version(config) < 2.6
    }

    fn migrate(&self, config: &mut Table) -> Result<(), ConfigError> {
        let motd = config
            .get("motd")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_MOTD)
            .to_string();

        if motd.trim_start().starts_with('{') {
            // A JSON component; there is no string-level rewrite for those
            log::warn!(
                "Your MOTD is a JSON component. Convert it to the MiniMessage format by hand."
            );
        } else if motd.contains('&') || motd.contains('§') {
            let migrated = upgrade_legacy_codes(&motd);
            log::info!("Your MOTD has been updated to the MiniMessage format.");
            config.insert("motd".to_string(), Value::String(migrated));
        }

        set_version(config, "2.6");
        Ok(())
    }
}

fn upgrade_legacy_codes(motd: &str) -> String {
    let mut out = String::with_capacity(motd.len());
    let mut chars = motd.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '&' || ch == '§' {
            if let Some(tag) = chars
                .peek()
                .and_then(|code| legacy_tag(code.to_ascii_lowercase()))
            {
                out.push('<');
                out.push_str(tag);
                out.push('>');
                chars.next();
                continue;
            }
        }
        out.push(ch);
    }
    out
}

fn legacy_tag(code: char) -> Option<&'static str> {
    match code {
        '0' => Some("black"),
        '1' => Some("dark_blue"),
        '2' => Some("dark_green"),
        '3' => Some("dark_aqua"),
        '4' => Some("dark_red"),
        '5' => Some("dark_purple"),
        '6' => Some("gold"),
        '7' => Some("gray"),
        '8' => Some("dark_gray"),
        '9' => Some("blue"),
        'a' => Some("green"),
        'b' => Some("aqua"),
        'c' => Some("red"),
        'd' => Some("light_purple"),
        'e' => Some("yellow"),
        'f' => Some("white"),
        'k' => Some("obfuscated"),
        'l' => Some("bold"),
        'm' => Some("strikethrough"),
        'n' => Some("underlined"),
        'o' => Some("italic"),
        'r' => Some("reset"),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unknown_codes_pass_through() {
        assert_eq!(upgrade_legacy_codes("100&&zpercent"), "100&&zpercent");
    }

    #[test]
    fn test_section_sign_codes() {
        assert_eq!(upgrade_legacy_codes("§cAlert§r!"), "<red>Alert<reset>!");
    }
}
