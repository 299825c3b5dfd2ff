//! Everything a screen needs, built once at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use fasal_core::prelude::*;
use fasal_gateway::{HttpPolicyGateway, NetworkConfig};
use fasal_i18n::LanguagePreferences;
use fasal_sqlite::{SqliteIdentityProvider, SqliteStore};

use crate::config_loader::CliConfig;

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: String,
}

pub struct AppContext {
    pub config: CliConfig,
    pub pricing_config: Arc<FasalConfig>,
    pub store: Arc<SqliteStore>,
    pub identity: SqliteIdentityProvider,
    pub gateway: Arc<dyn PolicyGateway>,
    pub prefs: LanguagePreferences,
    session_path: Option<PathBuf>,
}

impl AppContext {
    /// Opens the database, picks the submission route and loads the
    /// language preference.
    pub async fn init(config: CliConfig) -> Result<Self, FasalError> {
        let pricing_config = match &config.pricing_config {
            Some(path) => FasalConfig::try_from_json(&path.to_string_lossy())?,
            None => FasalConfig::from_env()?,
        };

        let database_url = config.database_url();
        let store = Arc::new(SqliteStore::connect(&database_url).await?);
        let identity = store.identity();

        let gateway: Arc<dyn PolicyGateway> = match &config.gateway_url {
            Some(url) => {
                info!(%url, "Submitting policies through the HTTP gateway");
                Arc::new(HttpPolicyGateway::new(url, &NetworkConfig::default()))
            }
            None => Arc::new(StoreGateway::new(store.clone())),
        };

        Ok(Self {
            pricing_config: Arc::new(pricing_config),
            store,
            identity,
            gateway,
            prefs: LanguagePreferences::load_default(),
            session_path: CliConfig::config_dir().map(|dir| dir.join("session.toml")),
            config,
        })
    }

    pub fn pricing(&self) -> PricingCalculator {
        PricingCalculator::new(self.pricing_config.clone())
    }

    pub fn poll_interval(&self) -> Duration {
        match self.config.poll_interval_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => self.pricing_config.poll_interval(),
        }
    }

    pub fn t(&self, key: &str) -> String {
        self.prefs.t(key)
    }

    pub fn t_with(&self, key: &str, args: &[(&str, String)]) -> String {
        self.prefs.t_with(key, args)
    }

    /// Restores the session saved by a previous `login`. A revoked or
    /// unknown token is forgotten.
    pub async fn resume_session(&self) -> Option<Session> {
        let token = read_token(self.session_path.as_deref()?)?;
        match self.identity.restore(&token).await {
            Ok(Some(session)) => {
                debug!(user_id = %session.user_id, "Session resumed");
                Some(session)
            }
            Ok(None) => {
                self.forget_session();
                None
            }
            Err(e) => {
                warn!(error = %e, "Could not restore session");
                None
            }
        }
    }

    pub fn remember_session(&self, session: &Session) {
        let Some(path) = &self.session_path else {
            return;
        };
        if let Err(e) = write_token(path, &session.token) {
            warn!(error = %e, "Session will not survive this run");
        }
    }

    pub fn forget_session(&self) {
        if let Some(path) = &self.session_path {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    warn!(error = %e, "Failed to remove session file");
                }
            }
        }
    }

    /// Signs out and drops the saved token.
    pub async fn end_session(&self) -> Result<(), FasalError> {
        let result = self.identity.sign_out().await;
        self.forget_session();
        result
    }
}

fn read_token(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<SessionFile>(&content) {
        Ok(file) => Some(file.token),
        Err(e) => {
            warn!("Ignoring unreadable session file {:?}: {}", path, e);
            None
        }
    }
}

fn write_token(path: &Path, token: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string(&SessionFile {
        token: token.to_string(),
    })
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.toml");
        assert!(read_token(&path).is_none());

        write_token(&path, "5b1c").unwrap();
        assert_eq!(read_token(&path).as_deref(), Some("5b1c"));

        std::fs::write(&path, "garbage").unwrap();
        assert!(read_token(&path).is_none());
    }
}
