use std::sync::Arc;

use clap::Args;
use colored::Colorize;
use projimport::{ImportOrchestrator, ImportRequest};
use projimport_core::SecretToken;
use projimport_git::TransportUrl;
use tracing::debug;

use super::{initialize_plugins, ImporterArgs};

#[derive(Args)]
pub struct ImportCommand {
    /// Git URL of the repository to import
    pub repo_url: String,

    /// Git server the project is created on
    #[arg(long, env = "PROJIMPORT_SERVER_URL")]
    pub server_url: String,

    /// Access token for the git server
    #[arg(long, env = "PROJIMPORT_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Project name, derived from the repository URL when omitted
    #[arg(long)]
    pub name: Option<String>,

    /// Project description
    #[arg(long)]
    pub description: Option<String>,

    /// Visibility level understood by the git server
    #[arg(long)]
    pub visibility: Option<String>,

    #[command(flatten)]
    pub importer: ImporterArgs,
}

impl ImportCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let source_repo_url = TransportUrl::parse(&self.repo_url)
            .map_err(|e| anyhow::anyhow!("Expected a git-based URL: {}", e))?;
        let config = Arc::new(self.importer.server_config(None)?);

        let request = ImportRequest {
            source_repo_url,
            project_name: self.name,
            description: self.description,
            visibility: self.visibility,
            target_server_url: self.server_url,
            auth_token: SecretToken::new(self.token),
        };

        let rt = tokio::runtime::Runtime::new()?;
        let outcome = rt.block_on(async move {
            let plugin_manager = initialize_plugins(config).await?;
            let orchestrator = plugin_manager
                .service_context()
                .require_service::<ImportOrchestrator>()?;
            debug!("Running import into {}", orchestrator.work_root().display());
            orchestrator
                .import_project(request)
                .await
                .map_err(|e| anyhow::anyhow!("Import failed: {}", e))
        })?;

        println!(
            "{} {} {}",
            "✓".bright_green(),
            outcome.project_name.bold(),
            "imported".bright_green()
        );
        println!("  repository: {}", outcome.repository_url.bright_cyan());
        println!("  commit:     {} on {}", outcome.commit_id, outcome.branch);
        println!(
            "  files:      {} copied, {} already present",
            outcome.copy.copied_files, outcome.copy.skipped_existing
        );
        Ok(())
    }
}
