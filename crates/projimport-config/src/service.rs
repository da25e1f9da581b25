use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_GIT_USERNAME: &str = "gitlab-ci-token";
pub const DEFAULT_COMMIT_MESSAGE: &str = "Imported content";
pub const DEFAULT_AUTHOR_NAME: &str = "Project Importer";
pub const DEFAULT_AUTHOR_EMAIL: &str = "importer@localhost";
pub const DEFAULT_CREATION_TIMEOUT_SECS: u64 = 60;
pub const WORK_DIR_NAME: &str = "work";
const DATA_DIR_NAME: &str = ".projimport";

#[derive(Error, Debug)]
pub enum ConfigServiceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {details}")]
    InvalidConfiguration { details: String },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the HTTP API binds to
    pub address: String,
    /// Root under which every import gets its own working directory
    pub work_root: PathBuf,
    /// Endpoint of the project-creation service
    pub creation_service_url: String,
    /// Username paired with the caller's token for git transport
    pub git_username: String,
    pub commit_message: String,
    pub author_name: String,
    pub author_email: String,
    pub creation_timeout_secs: u64,
}

impl ServerConfig {
    pub fn builder(creation_service_url: impl Into<String>) -> ServerConfigBuilder {
        ServerConfigBuilder::new(creation_service_url)
    }

    pub fn creation_timeout(&self) -> Duration {
        Duration::from_secs(self.creation_timeout_secs)
    }

    /// `~/.projimport/work`, or a directory under the system temp dir when
    /// no home directory is known.
    pub fn default_work_root() -> PathBuf {
        dirs::home_dir()
            .map(|home| home.join(DATA_DIR_NAME))
            .unwrap_or_else(|| std::env::temp_dir().join("projimport"))
            .join(WORK_DIR_NAME)
    }
}

/// Builds a [`ServerConfig`], filling unset values with defaults
#[derive(Debug, Clone, Default)]
pub struct ServerConfigBuilder {
    creation_service_url: String,
    address: Option<String>,
    work_root: Option<PathBuf>,
    git_username: Option<String>,
    commit_message: Option<String>,
    author_name: Option<String>,
    author_email: Option<String>,
    creation_timeout_secs: Option<u64>,
}

impl ServerConfigBuilder {
    pub fn new(creation_service_url: impl Into<String>) -> Self {
        Self {
            creation_service_url: creation_service_url.into(),
            ..Default::default()
        }
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn work_root(mut self, work_root: Option<PathBuf>) -> Self {
        self.work_root = work_root;
        self
    }

    pub fn git_username(mut self, username: Option<String>) -> Self {
        self.git_username = username;
        self
    }

    pub fn commit_message(mut self, message: Option<String>) -> Self {
        self.commit_message = message;
        self
    }

    pub fn author(mut self, name: Option<String>, email: Option<String>) -> Self {
        self.author_name = name;
        self.author_email = email;
        self
    }

    pub fn creation_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.creation_timeout_secs = secs;
        self
    }

    /// Validate the values and create the work root on disk
    pub fn build(self) -> Result<ServerConfig, ConfigServiceError> {
        let creation_service_url = self.creation_service_url.trim().to_string();
        let parsed = url::Url::parse(&creation_service_url).map_err(|e| {
            ConfigServiceError::InvalidConfiguration {
                details: format!(
                    "project creation service URL '{}' is invalid: {}",
                    creation_service_url, e
                ),
            }
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigServiceError::InvalidConfiguration {
                details: format!(
                    "project creation service URL must use http or https, got '{}'",
                    parsed.scheme()
                ),
            });
        }

        let git_username = non_blank(self.git_username).unwrap_or(DEFAULT_GIT_USERNAME.into());
        let creation_timeout_secs = self
            .creation_timeout_secs
            .unwrap_or(DEFAULT_CREATION_TIMEOUT_SECS);
        if creation_timeout_secs == 0 {
            return Err(ConfigServiceError::InvalidConfiguration {
                details: "creation timeout must be at least one second".to_string(),
            });
        }

        let work_root = self.work_root.unwrap_or_else(ServerConfig::default_work_root);
        fs::create_dir_all(&work_root)?;
        debug!("Using work root {}", work_root.display());

        Ok(ServerConfig {
            address: self.address.unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            work_root,
            creation_service_url,
            git_username,
            commit_message: non_blank(self.commit_message)
                .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
            author_name: non_blank(self.author_name)
                .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
            author_email: non_blank(self.author_email)
                .unwrap_or_else(|| DEFAULT_AUTHOR_EMAIL.to_string()),
            creation_timeout_secs,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Centralized read access to the server configuration for plugins
pub struct ConfigService {
    config: Arc<ServerConfig>,
}

impl ConfigService {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self { config }
    }

    pub fn work_root(&self) -> &Path {
        &self.config.work_root
    }

    pub fn creation_service_url(&self) -> &str {
        &self.config.creation_service_url
    }

    pub fn get_server_config(&self) -> Arc<ServerConfig> {
        self.config.clone()
    }
}
