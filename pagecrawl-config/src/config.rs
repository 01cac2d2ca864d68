use std::{fs, path};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Missing config value: {0}")]
    Missing(String),
    #[error("Invalid config value at {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Anything backed by a YAML document that is addressed with dot paths,
/// i.e. "site.pages" or "backend_user.admin".
pub trait Configurable {
    fn config(&self) -> &serde_yaml::Value;

    // read configuration from yaml file
    fn load_config(
        config_file_path: impl AsRef<path::Path>,
    ) -> Result<serde_yaml::Value, ConfigError> {
        let content: String = fs::read_to_string(config_file_path)?;
        let config: serde_yaml::Value = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Extract Value from config using dot notation i.e. "site.pages"
    fn get_config_value(&self, key: &str) -> Option<&serde_yaml::Value> {
        if key.is_empty() {
            return None;
        }
        key.split('.').try_fold(self.config(), |node, segment| match node {
            serde_yaml::Value::Mapping(map) => map.get(segment),
            _ => None,
        })
    }

    /// Deserialize the subtree at `key` into `T`.
    fn get_config_as<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: serde::de::DeserializeOwned,
    {
        let value = self
            .get_config_value(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))?;
        serde_yaml::from_value(value.clone()).map_err(|e| ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Scalar at `key` rendered as a string; numbers and booleans included.
    fn get_config_string(&self, key: &str) -> Option<String> {
        match self.get_config_value(key)? {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
