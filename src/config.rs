use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tracing::debug;

use crate::error::{ServiceError, ServiceResult};
use crate::genex::blob::FsSink;
use crate::genex::client::ApiClient;
use crate::genex::translate::RecentTranslations;
use crate::metadata::DEFAULT_API_URL;
use crate::session::SessionStore;
use crate::storage::{FileStore, KeyValueStore};
use crate::theme::{Appearance, ThemeManager};

#[derive(Args, Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the GenEx API
    #[arg(long, global = true, env = "GENEX_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Key-value file holding the session, theme and history
    #[arg(long, global = true, env = "GENEX_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    /// Where downloaded PDFs are written
    #[arg(long, global = true, env = "GENEX_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Light or dark, used when the theme follows the system
    #[arg(long, global = true, env = "GENEX_APPEARANCE", default_value = "light")]
    pub appearance: Appearance,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "GENEX_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_path: None,
            download_dir: None,
            appearance: Appearance::Light,
            timeout_secs: 60,
        }
    }
}

impl ClientConfig {
    /// Validate CLI/environment-derived settings.
    pub fn validate(&self) -> Result<(), String> {
        let url = self.api_url.trim();
        let rest = url
            .strip_prefix("http://")
            .or_else(|| url.strip_prefix("https://"))
            .ok_or_else(|| format!("Invalid GENEX_API_URL '{url}': expected http:// or https://"))?;
        if rest.split('/').next().is_none_or(str::is_empty) {
            return Err(format!("Invalid GENEX_API_URL '{url}': missing host"));
        }
        if self.timeout_secs == 0 {
            return Err("GENEX_TIMEOUT_SECS must be at least 1".to_string());
        }
        if self
            .storage_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            return Err("GENEX_STORAGE_PATH cannot be empty".to_string());
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn storage_file(&self) -> ServiceResult<PathBuf> {
        match &self.storage_path {
            Some(path) => Ok(path.clone()),
            None => Ok(FileStore::default_path()?),
        }
    }
}

/// Everything a command needs, wired from one [`ClientConfig`].
pub struct Services {
    pub storage: Arc<dyn KeyValueStore>,
    pub session: Arc<SessionStore>,
    pub client: ApiClient,
    pub themes: ThemeManager,
    pub history: RecentTranslations,
}

impl Services {
    pub fn from_config(config: &ClientConfig) -> ServiceResult<Self> {
        config.validate().map_err(ServiceError::InvalidState)?;
        let storage_file = config.storage_file()?;
        debug!(path = %storage_file.display(), "Opening storage");
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(storage_file)?);
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: &ClientConfig, storage: Arc<dyn KeyValueStore>) -> ServiceResult<Self> {
        let session = SessionStore::load(storage.clone());
        let sink = Arc::new(FsSink::from_platform_dirs(config.download_dir.clone()));
        let client = ApiClient::new(&config.api_url, config.timeout(), session.clone(), sink)?;
        Ok(Self {
            themes: ThemeManager::load(storage.clone(), config.appearance),
            history: RecentTranslations::new(storage.clone()),
            storage,
            session,
            client,
        })
    }
}
