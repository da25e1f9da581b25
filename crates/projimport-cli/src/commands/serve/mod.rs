mod shutdown;

use std::sync::Arc;

use axum::Router;
use clap::Args;
use projimport_config::ServerConfig;
use projimport_core::plugin::PluginManager;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use utoipa_swagger_ui::SwaggerUi;

use super::{initialize_plugins, ImporterArgs};

#[derive(Args)]
pub struct ServeCommand {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1:8080", env = "PROJIMPORT_ADDRESS")]
    pub address: String,

    #[command(flatten)]
    pub importer: ImporterArgs,
}

impl ServeCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = Arc::new(self.importer.server_config(Some(&self.address))?);
        debug!("Work root: {}", config.work_root.display());

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(start_api_server(config))
    }
}

/// Build the application and serve it until a shutdown signal arrives.
///
/// In-flight imports run to completion, including their cleanup, before the
/// server exits.
pub async fn start_api_server(config: Arc<ServerConfig>) -> anyhow::Result<()> {
    let plugin_manager = initialize_plugins(config.clone()).await?;
    let app = build_router(&plugin_manager)?;

    let listener = TcpListener::bind(&config.address).await?;
    info!("Project importer listening on {}", config.address);
    info!(
        "Project creation requests go to {}",
        config.creation_service_url
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await?;
    info!("API server exited");
    Ok(())
}

fn build_router(plugin_manager: &PluginManager) -> anyhow::Result<Router> {
    debug!("Building application with plugin routes");
    let app = plugin_manager
        .build_application()
        .map_err(|e| anyhow::anyhow!("Failed to build application: {}", e))?
        .merge(create_swagger_router(plugin_manager))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());
    Ok(app)
}

fn create_swagger_router(plugin_manager: &PluginManager) -> Router {
    let api_doc = plugin_manager.get_unified_openapi(env!("CARGO_PKG_VERSION"));
    Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc))
}
