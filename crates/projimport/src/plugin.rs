//! Import plugin: wires the orchestrator and the `/importProject` route

use std::sync::Arc;

use projimport_config::ConfigService;
use projimport_core::plugin::{
    BoxedRegistration, ImporterPlugin, PluginContext, PluginError, PluginRoutes,
    ServiceRegistrationContext,
};
use projimport_git::GitSettings;
use utoipa::{openapi::OpenApi, OpenApi as UtoipaOpenApi};

use crate::handlers;
use crate::services::{ImportOrchestrator, ProjectCreationClient, RemoteRepoCreator};

/// Import plugin for project imports.
///
/// Uses a [`RemoteRepoCreator`] already present in the registry, otherwise
/// builds a [`ProjectCreationClient`] from the server configuration.
#[derive(Default)]
pub struct ImportPlugin;

impl ImportPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl ImporterPlugin for ImportPlugin {
    fn name(&self) -> &'static str {
        "import"
    }

    fn register_services<'a>(
        &'a self,
        context: &'a ServiceRegistrationContext,
    ) -> BoxedRegistration<'a> {
        Box::pin(async move {
            let config_service = context.require_service::<ConfigService>()?;
            let git_settings = context.require_service::<GitSettings>()?;
            let server_config = config_service.get_server_config();

            let creator = match context.get_service::<dyn RemoteRepoCreator>() {
                Some(creator) => creator,
                None => {
                    let client = ProjectCreationClient::new(
                        server_config.creation_service_url.clone(),
                        server_config.creation_timeout(),
                    )
                    .map_err(|e| PluginError::Configuration(e.to_string()))?;
                    tracing::info!("Using project creation service at {}", client.endpoint());
                    let creator: Arc<dyn RemoteRepoCreator> = Arc::new(client);
                    context.register_service(creator.clone());
                    creator
                }
            };

            let orchestrator =
                ImportOrchestrator::new(creator, git_settings, config_service.work_root());
            context.register_service(Arc::new(orchestrator));

            tracing::debug!("Import plugin services registered successfully");
            Ok(())
        })
    }

    fn configure_routes(
        &self,
        context: &PluginContext,
    ) -> Result<Option<PluginRoutes>, PluginError> {
        let import_orchestrator = context.require_service::<ImportOrchestrator>()?;

        let app_state = Arc::new(handlers::types::AppState {
            import_orchestrator,
        });
        let routes = handlers::configure_routes().with_state(app_state);

        Ok(Some(PluginRoutes::new(routes)))
    }

    fn openapi_schema(&self) -> Option<OpenApi> {
        Some(<handlers::ImportApiDoc as UtoipaOpenApi>::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::StubCreator;
    use projimport_config::{ConfigPlugin, ServerConfig};
    use projimport_core::plugin::PluginManager;
    use projimport_git::GitPlugin;
    use tempfile::TempDir;

    fn config(temp: &TempDir) -> Arc<ServerConfig> {
        Arc::new(
            ServerConfig::builder("http://creator.local/createStructure")
                .work_root(Some(temp.path().to_path_buf()))
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_builds_http_creator_from_config() {
        let temp = TempDir::new().unwrap();
        let mut manager = PluginManager::new();
        manager.register_plugin(Box::new(ConfigPlugin::new(config(&temp))));
        manager.register_plugin(Box::new(GitPlugin::new()));
        manager.register_plugin(Box::new(ImportPlugin::new()));
        manager.initialize_plugins().await.unwrap();

        let context = manager.service_context();
        let orchestrator = context.require_service::<ImportOrchestrator>().unwrap();
        assert_eq!(orchestrator.work_root(), temp.path());
        assert!(context.get_service::<dyn RemoteRepoCreator>().is_some());

        manager.build_application().unwrap();
        let doc = manager.get_unified_openapi("test");
        assert!(doc.paths.paths.contains_key("/importProject"));
    }

    #[tokio::test]
    async fn test_uses_preregistered_creator() {
        let temp = TempDir::new().unwrap();
        let mut manager = PluginManager::new();
        let stub: Arc<dyn RemoteRepoCreator> = StubCreator::rejecting("unused");
        manager.service_context().register_service(stub.clone());
        manager.register_plugin(Box::new(ConfigPlugin::new(config(&temp))));
        manager.register_plugin(Box::new(GitPlugin::new()));
        manager.register_plugin(Box::new(ImportPlugin::new()));
        manager.initialize_plugins().await.unwrap();

        let registered = manager
            .service_context()
            .require_service::<dyn RemoteRepoCreator>()
            .unwrap();
        assert!(Arc::ptr_eq(&registered, &stub));
    }

    #[tokio::test]
    async fn test_requires_git_settings() {
        let temp = TempDir::new().unwrap();
        let mut manager = PluginManager::new();
        manager.register_plugin(Box::new(ConfigPlugin::new(config(&temp))));
        manager.register_plugin(Box::new(ImportPlugin::new()));

        let err = manager.initialize_plugins().await.unwrap_err();
        assert!(matches!(
            err,
            PluginError::PluginRegistrationFailed { ref plugin_name, .. } if plugin_name == "import"
        ));
    }
}
