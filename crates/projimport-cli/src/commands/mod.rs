pub mod import;
pub mod serve;

pub use import::ImportCommand;
pub use serve::ServeCommand;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use projimport::ImportPlugin;
use projimport_config::{ConfigPlugin, ServerConfig};
use projimport_core::plugin::PluginManager;
use projimport_git::GitPlugin;
use tracing::debug;

/// Settings shared by every command that runs imports
#[derive(Args, Debug, Clone)]
pub struct ImporterArgs {
    /// Endpoint of the project-creation service
    #[arg(long, env = "PROJIMPORT_CREATION_SERVICE_URL")]
    pub creation_service_url: String,

    /// Root directory for per-import working directories
    #[arg(long, env = "PROJIMPORT_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Username paired with the caller's token for git transport
    #[arg(long, env = "PROJIMPORT_GIT_USERNAME")]
    pub git_username: Option<String>,

    /// Message of the import commit
    #[arg(long, env = "PROJIMPORT_COMMIT_MESSAGE")]
    pub commit_message: Option<String>,

    /// Commit author name when the checkout has none configured
    #[arg(long, env = "PROJIMPORT_AUTHOR_NAME")]
    pub author_name: Option<String>,

    /// Commit author email when the checkout has none configured
    #[arg(long, env = "PROJIMPORT_AUTHOR_EMAIL")]
    pub author_email: Option<String>,

    /// Timeout of the project-creation request, in seconds
    #[arg(long, env = "PROJIMPORT_CREATION_TIMEOUT_SECS")]
    pub creation_timeout_secs: Option<u64>,
}

impl ImporterArgs {
    pub fn server_config(&self, address: Option<&str>) -> anyhow::Result<ServerConfig> {
        let mut builder = ServerConfig::builder(self.creation_service_url.clone())
            .work_root(self.work_dir.clone())
            .git_username(self.git_username.clone())
            .commit_message(self.commit_message.clone())
            .author(self.author_name.clone(), self.author_email.clone())
            .creation_timeout_secs(self.creation_timeout_secs);
        if let Some(address) = address {
            builder = builder.address(address);
        }
        Ok(builder.build()?)
    }
}

/// Register and initialize the plugins every command needs
pub async fn initialize_plugins(config: Arc<ServerConfig>) -> anyhow::Result<PluginManager> {
    let mut plugin_manager = PluginManager::new();
    plugin_manager.register_plugin(Box::new(ConfigPlugin::new(config)));
    plugin_manager.register_plugin(Box::new(GitPlugin::new()));
    plugin_manager.register_plugin(Box::new(ImportPlugin::new()));

    plugin_manager
        .initialize_plugins()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize plugins: {}", e))?;
    debug!("Plugin system initialized");

    Ok(plugin_manager)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        importer: ImporterArgs,
    }

    #[test]
    fn test_server_config_from_args() {
        let temp = TempDir::new().unwrap();
        let work_dir = temp.path().join("work");
        let harness = Harness::try_parse_from([
            "harness",
            "--creation-service-url",
            "http://creator.local/createStructure",
            "--work-dir",
            work_dir.to_str().unwrap(),
            "--commit-message",
            "Initial import",
            "--creation-timeout-secs",
            "5",
        ])
        .unwrap();

        let config = harness.importer.server_config(Some("0.0.0.0:9000")).unwrap();
        assert_eq!(config.address, "0.0.0.0:9000");
        assert_eq!(config.work_root, work_dir);
        assert!(work_dir.is_dir());
        assert_eq!(config.commit_message, "Initial import");
        assert_eq!(config.creation_timeout_secs, 5);
    }

    #[test]
    fn test_invalid_creation_url_is_rejected() {
        let temp = TempDir::new().unwrap();
        let harness = Harness::try_parse_from([
            "harness",
            "--creation-service-url",
            "not-a-url",
            "--work-dir",
            temp.path().to_str().unwrap(),
        ])
        .unwrap();

        assert!(harness.importer.server_config(None).is_err());
    }

    #[tokio::test]
    async fn test_plugins_initialize_from_config() {
        let temp = TempDir::new().unwrap();
        let config = ServerConfig::builder("http://creator.local/createStructure")
            .work_root(Some(temp.path().to_path_buf()))
            .build()
            .unwrap();

        let manager = initialize_plugins(Arc::new(config)).await.unwrap();
        assert!(manager
            .service_context()
            .get_service::<projimport::ImportOrchestrator>()
            .is_some());
    }
}
