use serde::Deserialize;

use hookfeed_client::ClientConfig;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "hookfeed.toml";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("client.base_url must start with http:// or https://, got {0:?}")]
    InvalidBaseUrl(String),

    #[error("client.request_timeout_secs must be > 0")]
    ZeroTimeout,

    #[error("invalid value {value:?} for {name}")]
    InvalidEnv { name: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// How the feed is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Text,
    Html,
}

/// Top-level configuration, loaded from `hookfeed.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub client: ClientConfig,
    pub log_format: LogFormat,
    pub render: RenderMode,
}

/// Where the loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File,
    Missing,
    /// The file exists but failed to parse; defaults are in effect.
    Unparsable(String),
}

impl ConfigOrigin {
    /// Report how the configuration was obtained. Call once tracing is initialized.
    pub fn log(&self) {
        match self {
            Self::File => tracing::info!("Loaded configuration from {CONFIG_FILE}"),
            Self::Missing => tracing::info!("No {CONFIG_FILE} found, using defaults"),
            Self::Unparsable(e) => {
                tracing::warn!("Failed to parse {CONFIG_FILE}: {e}, using defaults");
            },
        }
    }
}

impl CliConfig {
    /// Load `hookfeed.toml` if present, then apply environment overrides.
    ///
    /// Nothing is logged here since this runs before the subscriber exists;
    /// the returned origin carries any parse diagnostic.
    pub fn load() -> Result<(Self, ConfigOrigin), ConfigError> {
        let (mut config, origin) = match std::fs::read_to_string(CONFIG_FILE) {
            Ok(content) => Self::from_contents(&content),
            Err(_) => (Self::default(), ConfigOrigin::Missing),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok((config, origin))
    }

    /// Parse file contents, falling back to defaults on error.
    pub fn from_contents(content: &str) -> (Self, ConfigOrigin) {
        match Self::parse(content) {
            Ok(cfg) => (cfg, ConfigOrigin::File),
            Err(e) => (Self::default(), ConfigOrigin::Unparsable(e.to_string())),
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply `HOOKFEED_*` overrides. `lookup` abstracts the environment for tests.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("HOOKFEED_BASE_URL")
            && !url.is_empty()
        {
            self.client.base_url = url;
        }
        if let Some(val) = lookup("HOOKFEED_REQUEST_TIMEOUT_SECS")
            && !val.is_empty()
        {
            let secs = val.parse::<u64>().map_err(|_| ConfigError::InvalidEnv {
                name: "HOOKFEED_REQUEST_TIMEOUT_SECS",
                value: val.clone(),
            })?;
            self.client.request_timeout_secs = Some(secs);
        }
        if let Some(val) = lookup("HOOKFEED_LOG_FORMAT") {
            self.log_format = match val.as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: "HOOKFEED_LOG_FORMAT",
                        value: val,
                    });
                },
            };
        }
        if let Some(val) = lookup("HOOKFEED_RENDER") {
            self.render = match val.as_str() {
                "text" => RenderMode::Text,
                "html" => RenderMode::Html,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: "HOOKFEED_RENDER",
                        value: val,
                    });
                },
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.client.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(url.clone()));
        }
        if self.client.request_timeout_secs == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn default_config_values() {
        let cfg = CliConfig::default();
        assert_eq!(cfg.client.base_url, "http://127.0.0.1:5001");
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.render, RenderMode::Text);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn parse_full_toml() {
        let cfg = CliConfig::parse(
            r#"
log_format = "json"
render = "html"

[client]
base_url = "https://hooks.example.com"
request_timeout_secs = 10
"#,
        )
        .unwrap();
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(cfg.render, RenderMode::Html);
        assert_eq!(cfg.client.base_url, "https://hooks.example.com");
        assert_eq!(cfg.client.request_timeout_secs, Some(10));
        assert!(cfg.client.user_agent.starts_with("hookfeed/"));
    }

    #[test]
    fn unparsable_toml_uses_defaults_and_reports_error() {
        let (cfg, origin) = CliConfig::from_contents("client = 42");
        assert_eq!(cfg.client, ClientConfig::default());
        let ConfigOrigin::Unparsable(message) = origin else {
            panic!("expected parse failure, got {origin:?}");
        };
        assert!(!message.is_empty());
        assert!(CliConfig::parse("log_format = [").is_err());
    }

    #[test]
    fn valid_toml_reports_file_origin() {
        let (cfg, origin) = CliConfig::from_contents("render = \"html\"");
        assert_eq!(origin, ConfigOrigin::File);
        assert_eq!(cfg.render, RenderMode::Html);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = CliConfig::parse(
            r#"
[client]
base_url = "http://from-file:5001"
"#,
        )
        .unwrap();
        cfg.apply_env(env(&[
            ("HOOKFEED_BASE_URL", "http://from-env:8080"),
            ("HOOKFEED_REQUEST_TIMEOUT_SECS", "3"),
            ("HOOKFEED_LOG_FORMAT", "json"),
        ]))
        .unwrap();
        assert_eq!(cfg.client.base_url, "http://from-env:8080");
        assert_eq!(cfg.client.request_timeout_secs, Some(3));
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut cfg = CliConfig::default();
        cfg.apply_env(env(&[("HOOKFEED_BASE_URL", "")])).unwrap();
        assert_eq!(cfg.client.base_url, "http://127.0.0.1:5001");
    }

    #[test]
    fn bad_env_values_are_rejected() {
        let mut cfg = CliConfig::default();
        let err = cfg
            .apply_env(env(&[("HOOKFEED_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidEnv {
                name: "HOOKFEED_REQUEST_TIMEOUT_SECS",
                value: "soon".to_string()
            }
        );
        assert!(cfg.apply_env(env(&[("HOOKFEED_RENDER", "pdf")])).is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut cfg = CliConfig::default();
        cfg.client.base_url = "localhost:5001".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidBaseUrl(_))));

        let mut cfg = CliConfig::default();
        cfg.client.request_timeout_secs = Some(0);
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroTimeout));
    }
}
