//! Server configuration.
//!
//! Values are resolved in three layers: built-in defaults, then the TOML
//! file named by `LEXSEN_CONFIG` (if set), then individual environment
//! variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use lexsen_answer::CompletionConfig;
use lexsen_retrieval::RetrievalConfig;

pub const CONFIG_FILE_VAR: &str = "LEXSEN_CONFIG";
pub const BIND_VAR: &str = "LEXSEN_BIND";
pub const INDEX_DIR_VAR: &str = "LEXSEN_INDEX_DIR";
pub const ALLOW_UNVERIFIED_VAR: &str = "LEXSEN_ALLOW_UNVERIFIED_INDEX";
pub const EMBEDDING_URL_VAR: &str = "LEXSEN_EMBEDDING_URL";
pub const EMBEDDING_MODEL_VAR: &str = "LEXSEN_EMBEDDING_MODEL";
pub const EMBEDDING_API_KEY_VAR: &str = "LEXSEN_EMBEDDING_API_KEY";
pub const COMPLETION_API_KEY_VAR: &str = "GROQ_API_KEY";
pub const COMPLETION_URL_VAR: &str = "LEXSEN_COMPLETION_URL";
pub const COMPLETION_MODEL_VAR: &str = "LEXSEN_COMPLETION_MODEL";
pub const REQUEST_TIMEOUT_VAR: &str = "LEXSEN_REQUEST_TIMEOUT_SECS";
pub const SESSION_TTL_VAR: &str = "LEXSEN_SESSION_TTL_SECS";
pub const FLAG_IMAGE_VAR: &str = "LEXSEN_FLAG_IMAGE";

const DEFAULT_BIND: ([u8; 4], u16) = ([127, 0, 0, 1], 8501);
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;
const DEFAULT_FLAG_IMAGE: &str = "assets/drapeau-justice-sn.jpg";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },

    #[error("GROQ_API_KEY is not set")]
    MissingApiKey,
}

/// Full server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listen address.
    pub bind: SocketAddr,

    /// Index location and query embedding.
    pub retrieval: RetrievalConfig,

    /// Answer generation.
    pub completion: CompletionConfig,

    /// Seconds a session may stay idle before its transcript is dropped.
    pub session_ttl_secs: u64,

    /// Image shown beside the page title. Skipped when unreadable.
    pub flag_image: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(DEFAULT_BIND),
            retrieval: RetrievalConfig::new("index"),
            completion: CompletionConfig::default(),
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            flag_image: PathBuf::from(DEFAULT_FLAG_IMAGE),
        }
    }
}

impl AppConfig {
    /// Resolve the configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Resolve the configuration using `lookup` for environment variables.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut config = match lookup(CONFIG_FILE_VAR) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Parse a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(BIND_VAR) {
            self.bind = parse_var(BIND_VAR, value)?;
        }
        if let Some(value) = lookup(INDEX_DIR_VAR) {
            self.retrieval.index_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup(ALLOW_UNVERIFIED_VAR) {
            self.retrieval.allow_unverified = parse_flag(ALLOW_UNVERIFIED_VAR, value)?;
        }
        if let Some(value) = lookup(EMBEDDING_URL_VAR) {
            self.retrieval.embedding.base_url = value;
        }
        if let Some(value) = lookup(EMBEDDING_MODEL_VAR) {
            self.retrieval.embedding.model = value;
        }
        if let Some(value) = lookup(EMBEDDING_API_KEY_VAR) {
            self.retrieval.embedding.api_key = Some(value);
        }
        if let Some(value) = lookup(COMPLETION_API_KEY_VAR) {
            self.completion.api_key = Some(value);
        }
        if let Some(value) = lookup(COMPLETION_URL_VAR) {
            self.completion.base_url = value;
        }
        if let Some(value) = lookup(COMPLETION_MODEL_VAR) {
            self.completion.model = value;
        }
        if let Some(value) = lookup(REQUEST_TIMEOUT_VAR) {
            let secs: u64 = parse_var(REQUEST_TIMEOUT_VAR, value)?;
            self.retrieval.embedding.request_timeout_secs = secs;
            self.completion.request_timeout_secs = secs;
        }
        if let Some(value) = lookup(SESSION_TTL_VAR) {
            self.session_ttl_secs = parse_var(SESSION_TTL_VAR, value)?;
        }
        if let Some(value) = lookup(FLAG_IMAGE_VAR) {
            self.flag_image = PathBuf::from(value);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                var: SESSION_TTL_VAR,
                value: self.session_ttl_secs.to_string(),
            });
        }
        match self.completion.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingApiKey),
        }
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}

fn parse_flag(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_with_api_key() {
        let config = AppConfig::load_with(env(&[(COMPLETION_API_KEY_VAR, "gsk_test")])).unwrap();

        assert_eq!(config.bind, "127.0.0.1:8501".parse().unwrap());
        assert_eq!(config.retrieval.index_dir, PathBuf::from("index"));
        assert!(!config.retrieval.allow_unverified);
        assert_eq!(config.retrieval.mmr.k, 2);
        assert_eq!(config.completion.model, "llama-3.3-70b-versatile");
        assert_eq!(config.completion.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.session_ttl(), Duration::from_secs(3600));
        assert_eq!(config.flag_image, PathBuf::from("assets/drapeau-justice-sn.jpg"));
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = AppConfig::load_with(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));

        let err = AppConfig::load_with(env(&[(COMPLETION_API_KEY_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::load_with(env(&[
            (COMPLETION_API_KEY_VAR, "gsk_test"),
            (BIND_VAR, "0.0.0.0:9000"),
            (INDEX_DIR_VAR, "/srv/lexsen/faiss"),
            (ALLOW_UNVERIFIED_VAR, "yes"),
            (EMBEDDING_URL_VAR, "http://embed:8080/v1"),
            (EMBEDDING_MODEL_VAR, "custom-embed"),
            (COMPLETION_URL_VAR, "http://llm/v1"),
            (COMPLETION_MODEL_VAR, "llama-3.1-8b-instant"),
            (REQUEST_TIMEOUT_VAR, "30"),
            (SESSION_TTL_VAR, "900"),
            (FLAG_IMAGE_VAR, "/srv/lexsen/drapeau.png"),
        ]))
        .unwrap();

        assert_eq!(config.bind, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.retrieval.index_dir, PathBuf::from("/srv/lexsen/faiss"));
        assert!(config.retrieval.allow_unverified);
        assert_eq!(config.retrieval.embedding.base_url, "http://embed:8080/v1");
        assert_eq!(config.retrieval.embedding.model, "custom-embed");
        assert_eq!(config.completion.base_url, "http://llm/v1");
        assert_eq!(config.completion.model, "llama-3.1-8b-instant");
        assert_eq!(config.retrieval.embedding.request_timeout_secs, 30);
        assert_eq!(config.completion.request_timeout_secs, 30);
        assert_eq!(config.session_ttl_secs, 900);
        assert_eq!(config.flag_image, PathBuf::from("/srv/lexsen/drapeau.png"));
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::load_with(env(&[
            (COMPLETION_API_KEY_VAR, "gsk_test"),
            (REQUEST_TIMEOUT_VAR, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                var: REQUEST_TIMEOUT_VAR,
                ..
            }
        ));

        let err = AppConfig::load_with(env(&[
            (COMPLETION_API_KEY_VAR, "gsk_test"),
            (ALLOW_UNVERIFIED_VAR, "peut-être"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_session_ttl_must_be_positive() {
        for value in ["0", "une heure"] {
            let err = AppConfig::load_with(env(&[
                (COMPLETION_API_KEY_VAR, "gsk_test"),
                (SESSION_TTL_VAR, value),
            ]))
            .unwrap_err();
            assert!(
                matches!(
                    err,
                    ConfigError::InvalidValue {
                        var: SESSION_TTL_VAR,
                        ..
                    }
                ),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_toml_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
bind = "127.0.0.1:7000"

[retrieval]
index_dir = "faiss_index"

[retrieval.mmr]
k = 3

[completion]
temperature = 0.5
model = "from-file"
"#
        )
        .unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = AppConfig::load_with(env(&[
            (CONFIG_FILE_VAR, path.as_str()),
            (COMPLETION_API_KEY_VAR, "gsk_test"),
            (COMPLETION_MODEL_VAR, "from-env"),
        ]))
        .unwrap();

        assert_eq!(config.bind.port(), 7000);
        assert_eq!(config.retrieval.index_dir, PathBuf::from("faiss_index"));
        assert_eq!(config.retrieval.mmr.k, 3);
        assert_eq!(config.retrieval.mmr.fetch_k, 20);
        assert_eq!(config.completion.temperature, 0.5);
        assert_eq!(config.completion.model, "from-env");
    }

    #[test]
    fn test_unreadable_config_file() {
        let err = AppConfig::load_with(env(&[
            (CONFIG_FILE_VAR, "/nonexistent/lexsen.toml"),
            (COMPLETION_API_KEY_VAR, "gsk_test"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let config = AppConfig::load_with(env(&[(COMPLETION_API_KEY_VAR, "gsk_secret")])).unwrap();
        let text = toml::to_string(&config).unwrap();
        assert!(!text.contains("gsk_secret"));
    }
}
