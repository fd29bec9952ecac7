//! Environment-driven configuration for the sync engine.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::{ConfigError, SourceError};
use crate::judicial::datajud::DatajudClient;
use crate::judicial::esaj::EsajClient;
use crate::judicial::offline::OfflineClient;
use crate::judicial::source::{DEFAULT_REQUEST_TIMEOUT, SourceClient};

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_u64_env(key: &str, default: u64) -> Result<u64, ConfigError> {
    match optional_env(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected an integer, got '{raw}'"),
        }),
    }
}

/// Whether real source clients or the explicit offline stub are assembled.
/// Missing credentials never silently fall back to fabricated data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    #[default]
    Live,
    Offline,
}

impl SourceMode {
    fn from_env() -> Result<Self, ConfigError> {
        match optional_env("JURISYNC_SOURCE_MODE").as_deref() {
            None | Some("live") => Ok(Self::Live),
            Some("offline") => Ok(Self::Offline),
            Some(other) => Err(ConfigError::InvalidValue {
                key: "JURISYNC_SOURCE_MODE".to_string(),
                message: format!("expected 'live' or 'offline', got '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EsajConfig {
    pub bearer_token: SecretString,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct DatajudConfig {
    pub client_id: String,
    pub client_secret: SecretString,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub mode: SourceMode,
    pub esaj: Option<EsajConfig>,
    pub datajud: Option<DatajudConfig>,
    pub request_timeout: Duration,
    pub audit_log_path: Option<PathBuf>,
    pub actor_id: String,
}

impl SyncConfig {
    /// Read configuration from the environment. `.env` files are honored
    /// when present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let mode = SourceMode::from_env()?;

        let esaj = optional_env("ESAJ_BEARER_TOKEN").map(|token| EsajConfig {
            bearer_token: SecretString::from(token),
            region: optional_env("ESAJ_REGION").unwrap_or_else(|| "SP".to_string()),
        });

        let datajud = match (
            optional_env("CNJ_OAUTH_CLIENT_ID"),
            optional_env("CNJ_OAUTH_CLIENT_SECRET"),
        ) {
            (Some(client_id), Some(secret)) => Some(DatajudConfig {
                client_id,
                client_secret: SecretString::from(secret),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingValue {
                    key: "CNJ_OAUTH_CLIENT_SECRET".to_string(),
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingValue {
                    key: "CNJ_OAUTH_CLIENT_ID".to_string(),
                });
            }
        };

        let timeout_secs = parse_u64_env(
            "JURISYNC_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        )?;

        Ok(Self {
            mode,
            esaj,
            datajud,
            request_timeout: Duration::from_secs(timeout_secs.max(1)),
            audit_log_path: optional_env("JURISYNC_AUDIT_LOG").map(PathBuf::from),
            actor_id: optional_env("JURISYNC_ACTOR_ID").unwrap_or_else(|| "system".to_string()),
        })
    }

    /// Assemble the configured source clients in declaration order
    /// (e-SAJ first, then Datajud), or the offline stub alone.
    pub fn build_sources(&self) -> Result<Vec<Arc<dyn SourceClient>>, SourceError> {
        if self.mode == SourceMode::Offline {
            return Ok(vec![Arc::new(OfflineClient::new())]);
        }

        let mut sources: Vec<Arc<dyn SourceClient>> = Vec::new();
        if let Some(esaj) = &self.esaj {
            sources.push(Arc::new(EsajClient::for_region(
                esaj.bearer_token.clone(),
                &esaj.region,
                self.request_timeout,
            )?));
        }
        if let Some(datajud) = &self.datajud {
            sources.push(Arc::new(DatajudClient::new(
                datajud.client_id.clone(),
                datajud.client_secret.clone(),
                self.request_timeout,
            )?));
        }
        if sources.is_empty() {
            return Err(SourceError::Configuration(
                "no judicial sources configured; set e-SAJ or Datajud credentials, \
                 or select offline mode explicitly"
                    .to_string(),
            ));
        }
        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::{SourceMode, SyncConfig};

    fn offline_config() -> SyncConfig {
        SyncConfig {
            mode: SourceMode::Offline,
            esaj: None,
            datajud: None,
            request_timeout: std::time::Duration::from_secs(5),
            audit_log_path: None,
            actor_id: "test".to_string(),
        }
    }

    #[test]
    fn offline_mode_builds_only_the_stub() {
        let sources = offline_config().build_sources().expect("sources");
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_id().as_str(), "offline");
    }

    #[test]
    fn live_mode_without_credentials_is_an_error() {
        let config = SyncConfig {
            mode: SourceMode::Live,
            ..offline_config()
        };
        assert!(config.build_sources().is_err());
    }
}
