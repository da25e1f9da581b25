//! Config plugin: makes the server configuration available to other plugins

use std::sync::Arc;

use projimport_core::plugin::{BoxedRegistration, ImporterPlugin, ServiceRegistrationContext};

use crate::{ConfigService, ServerConfig};

pub struct ConfigPlugin {
    server_config: Arc<ServerConfig>,
}

impl ConfigPlugin {
    pub fn new(server_config: Arc<ServerConfig>) -> Self {
        Self { server_config }
    }
}

impl ImporterPlugin for ConfigPlugin {
    fn name(&self) -> &'static str {
        "config"
    }

    fn register_services<'a>(
        &'a self,
        context: &'a ServiceRegistrationContext,
    ) -> BoxedRegistration<'a> {
        Box::pin(async move {
            context.register_service(self.server_config.clone());
            context.register_service(Arc::new(ConfigService::new(self.server_config.clone())));

            tracing::debug!("Config plugin services registered successfully");
            Ok(())
        })
    }
}
