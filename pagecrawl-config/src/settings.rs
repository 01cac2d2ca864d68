//! Extension-wide settings.
//!
//! Loaded from a TOML file shaped like:
//! ```toml
//! [crawler]
//! max_compile_urls = 10000
//! ```
use crate::ConfigError;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::{fs, path};
use toml::Value;

pub const DEFAULT_MAX_COMPILE_URLS: usize = 10_000;
pub const MIN_COMPILE_URLS: i64 = 1;
pub const MAX_COMPILE_URLS: i64 = 1_000_000_000;

#[derive(Builder, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[builder(public, setter(into))]
pub struct ExtensionSettings {
    /// Upper bound on URLs compiled per configuration entry.
    #[builder(default = "DEFAULT_MAX_COMPILE_URLS")]
    pub max_compile_urls: usize,
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self {
            max_compile_urls: DEFAULT_MAX_COMPILE_URLS,
        }
    }
}

impl ExtensionSettings {
    /// Reads the `[crawler]` table. Missing keys fall back to defaults and
    /// `max_compile_urls` is forced into range the same way the host does.
    pub fn from_config(config: &Value) -> Self {
        let crawler = config.get("crawler").unwrap_or(config);
        let raw = crawler.get("max_compile_urls").and_then(integer_like);
        let max_compile_urls = force_integer_in_range(
            raw.unwrap_or(0),
            MIN_COMPILE_URLS,
            MAX_COMPILE_URLS,
            DEFAULT_MAX_COMPILE_URLS as i64,
        );
        Self {
            max_compile_urls: max_compile_urls as usize,
        }
    }

    pub fn load(path: impl AsRef<path::Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Value = toml::from_str(&content)?;
        let settings = Self::from_config(&config);
        tracing::debug!(?settings, "extension settings loaded");
        Ok(settings)
    }
}

fn integer_like(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Float(f) => Some(*f as i64),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Zero means "unset" and is replaced by `default` before clamping.
pub fn force_integer_in_range(value: i64, min: i64, max: i64, default: i64) -> i64 {
    let value = if value == 0 { default } else { value };
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn settings(toml: &str) -> ExtensionSettings {
        let config: Value = toml::from_str(toml).unwrap();
        ExtensionSettings::from_config(&config)
    }

    #[test]
    fn test_default_when_missing() {
        assert_eq!(settings("[crawler]\n").max_compile_urls, 10_000);
        assert_eq!(settings("").max_compile_urls, 10_000);
    }

    #[test]
    fn test_explicit_value() {
        assert_eq!(
            settings("[crawler]\nmax_compile_urls = 250").max_compile_urls,
            250
        );
        assert_eq!(
            settings("[crawler]\nmax_compile_urls = \"42\"").max_compile_urls,
            42
        );
    }

    #[test]
    fn test_clamped_into_range() {
        assert_eq!(
            settings("[crawler]\nmax_compile_urls = -5").max_compile_urls,
            1
        );
        assert_eq!(
            settings("[crawler]\nmax_compile_urls = 5000000000").max_compile_urls,
            1_000_000_000
        );
        assert_eq!(
            settings("[crawler]\nmax_compile_urls = \"lots\"").max_compile_urls,
            10_000
        );
    }

    #[test]
    fn test_force_integer_in_range() {
        assert_eq!(force_integer_in_range(0, 1, 10, 5), 5);
        assert_eq!(force_integer_in_range(11, 1, 10, 5), 10);
        assert_eq!(force_integer_in_range(-3, 1, 10, 5), 1);
        assert_eq!(force_integer_in_range(7, 1, 10, 5), 7);
    }

    #[test]
    fn test_builder_defaults() {
        let built = ExtensionSettingsBuilder::default().build().unwrap();
        assert_eq!(built, ExtensionSettings::default());

        let built = ExtensionSettingsBuilder::default()
            .max_compile_urls(3usize)
            .build()
            .unwrap();
        assert_eq!(built.max_compile_urls, 3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[crawler]\nmax_compile_urls = 77").unwrap();

        let loaded = ExtensionSettings::load(file.path()).unwrap();
        assert_eq!(loaded.max_compile_urls, 77);
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[crawler\nmax_compile_urls = ").unwrap();

        let loaded = ExtensionSettings::load(file.path());
        assert!(matches!(loaded, Err(ConfigError::TomlParse(_))));
    }
}
