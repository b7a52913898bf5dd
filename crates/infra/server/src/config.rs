//! Server configuration.

use chrono::FixedOffset;
use ride_admin_adapter_firebase::FirebaseConfig;
use ride_admin_dashboard::{AdminConfig, Collections};
use serde::{Deserialize, Serialize};

/// Backend the server talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// In-process stores; data is lost on exit.
    #[default]
    Memory,
    Firebase,
}

/// Server-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on.
    pub port: u16,
    /// Host to bind to.
    pub host: String,
    /// Log level, used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Offset of the dashboard's calendar days from UTC, in minutes.
    pub utc_offset_minutes: i32,
    pub backend: Backend,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
            log_level: "info".to_string(),
            utc_offset_minutes: 0,
            backend: Backend::Memory,
        }
    }
}

impl ServerConfig {
    /// Socket address to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Calendar offset.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "server.utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }
}

/// Firebase project settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseSettings {
    pub project_id: String,
    pub api_key: String,
    pub storage_bucket: Option<String>,
    pub access_token: Option<String>,
    /// Firestore host override, e.g. `http://localhost:8080/v1` for the emulator.
    pub firestore_url: Option<String>,
}

impl FirebaseSettings {
    /// Adapter configuration.
    pub fn to_firebase_config(&self) -> FirebaseConfig {
        let mut config = FirebaseConfig::new(&self.project_id, &self.api_key);
        if let Some(bucket) = &self.storage_bucket {
            config = config.storage_bucket(bucket);
        }
        if let Some(token) = &self.access_token {
            config = config.access_token(token);
        }
        if let Some(url) = &self.firestore_url {
            config = config.firestore_url(url);
        }
        config
    }
}

/// Collection names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionsConfig {
    pub users: String,
    pub rides: String,
    pub transactions: String,
    pub withdrawals: String,
    pub news: String,
    pub ride_categories: String,
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        let c = Collections::default();
        Self {
            users: c.users,
            rides: c.rides,
            transactions: c.transactions,
            withdrawals: c.withdrawals,
            news: c.news,
            ride_categories: c.ride_categories,
        }
    }
}

impl From<CollectionsConfig> for Collections {
    fn from(c: CollectionsConfig) -> Self {
        Collections {
            users: c.users,
            rides: c.rides,
            transactions: c.transactions,
            withdrawals: c.withdrawals,
            news: c.news,
            ride_categories: c.ride_categories,
        }
    }
}

/// Everything read from the configuration file.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub firebase: Option<FirebaseSettings>,
    pub collections: CollectionsConfig,
}

impl AppConfig {
    /// Checks cross-section requirements.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.offset()?;
        if self.server.backend == Backend::Firebase {
            let firebase = self
                .firebase
                .as_ref()
                .ok_or_else(|| ConfigError::Missing("firebase".to_string()))?;
            if firebase.project_id.is_empty() {
                return Err(ConfigError::Missing("firebase.project_id".to_string()));
            }
            if firebase.api_key.is_empty() {
                return Err(ConfigError::Missing("firebase.api_key".to_string()));
            }
        }
        Ok(())
    }

    /// Dashboard service configuration.
    pub fn admin_config(&self) -> Result<AdminConfig, ConfigError> {
        Ok(AdminConfig::new()
            .collections(self.collections.clone().into())
            .offset(self.server.offset()?))
    }
}

fn section<T>(config: &toml::Value, name: &str) -> Result<Option<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    config
        .get(name)
        .map(|v| toml::Value::try_into(v.clone()))
        .transpose()
        .map_err(|e| ConfigError::ParseError(format!("[{name}] {e}")))
}

/// Parses configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: toml::Value =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    let app = AppConfig {
        server: section(&config, "server")?.unwrap_or_default(),
        firebase: section(&config, "firebase")?,
        collections: section(&config, "collections")?.unwrap_or_default(),
    };
    app.validate()?;
    Ok(app)
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    parse_config(&content)
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Missing configuration: {0}")]
    Missing(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.backend, Backend::Memory);
        assert_eq!(config.collections.withdrawals, "withdrawal_requests");
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
            [server]
            port = 9000
            utc_offset_minutes = 60
            backend = "firebase"

            [firebase]
            project_id = "ride-app"
            api_key = "secret"
            storage_bucket = "ride-app-media"

            [collections]
            news = "press"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.server.offset().unwrap().local_minus_utc(), 3600);
        assert_eq!(config.collections.news, "press");
        assert_eq!(config.collections.users, "users");
        assert_eq!(config.collections.ride_categories, "ride_categories");

        let firebase = config.firebase.unwrap().to_firebase_config();
        assert_eq!(firebase.storage_bucket, "ride-app-media");
    }

    #[test]
    fn test_firebase_backend_needs_api_key() {
        let err = parse_config(
            r#"
            [server]
            backend = "firebase"

            [firebase]
            project_id = "ride-app"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing(key) if key == "firebase.api_key"));

        let err = parse_config("[server]\nbackend = \"firebase\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_bad_offset() {
        let err = parse_config("[server]\nutc_offset_minutes = 100000\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
