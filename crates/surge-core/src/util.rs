//! Utility functions for Surge
//!
//! Environment file loading shared by the daemon and the CLI.

use std::path::Path;

/// Load environment variables from the Surge env file if not already set.
/// Searches standard locations in order:
/// 1. /usr/local/etc/surge/surge.env
/// 2. User's config directory/surge/surge.env
/// 3. ~/.config/surge/surge.env
pub fn load_env_file() {
    let env_paths = [
        "/usr/local/etc/surge/surge.env".to_string(),
        dirs::config_dir()
            .map(|p| p.join("surge/surge.env").to_string_lossy().to_string())
            .unwrap_or_default(),
        dirs::home_dir()
            .map(|p| p.join(".config/surge/surge.env").to_string_lossy().to_string())
            .unwrap_or_default(),
    ];

    for path in &env_paths {
        if path.is_empty() {
            continue;
        }
        if Path::new(path).exists() {
            if let Ok(contents) = std::fs::read_to_string(path) {
                parse_env_file(&contents);
            }
            break;
        }
    }
}

/// Parse env file contents and set environment variables (only if not already set).
/// Supports formats:
/// - `KEY=value`
/// - `export KEY=value`
/// - `KEY="quoted value"`
/// - `KEY='single quoted'`
/// - Comments starting with #
pub fn parse_env_file(contents: &str) {
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim();
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_file() {
        std::env::remove_var("TEST_SURGE_VAR1");
        std::env::remove_var("TEST_SURGE_VAR2");
        std::env::remove_var("TEST_SURGE_VAR3");

        let contents = r#"
            # This is a comment
            TEST_SURGE_VAR1=value1
            export TEST_SURGE_VAR2="quoted value"
            TEST_SURGE_VAR3='single quoted'
        "#;

        parse_env_file(contents);

        assert_eq!(std::env::var("TEST_SURGE_VAR1").unwrap(), "value1");
        assert_eq!(std::env::var("TEST_SURGE_VAR2").unwrap(), "quoted value");
        assert_eq!(std::env::var("TEST_SURGE_VAR3").unwrap(), "single quoted");
    }

    #[test]
    fn test_parse_env_file_keeps_existing() {
        std::env::set_var("TEST_SURGE_EXISTING", "original");
        parse_env_file("TEST_SURGE_EXISTING=overridden");
        assert_eq!(std::env::var("TEST_SURGE_EXISTING").unwrap(), "original");
        std::env::remove_var("TEST_SURGE_EXISTING");
    }
}
