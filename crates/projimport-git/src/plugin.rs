//! Git plugin: derives the shared [`GitSettings`] from the server configuration

use std::sync::Arc;

use projimport_config::ServerConfig;
use projimport_core::plugin::{BoxedRegistration, ImporterPlugin, ServiceRegistrationContext};

use crate::GitSettings;

#[derive(Default)]
pub struct GitPlugin;

impl GitPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl ImporterPlugin for GitPlugin {
    fn name(&self) -> &'static str {
        "git"
    }

    fn register_services<'a>(
        &'a self,
        context: &'a ServiceRegistrationContext,
    ) -> BoxedRegistration<'a> {
        Box::pin(async move {
            let server_config = context.require_service::<ServerConfig>()?;
            let settings = GitSettings::from(server_config.as_ref());
            tracing::debug!(
                "Git transport user '{}', commit message '{}'",
                settings.username,
                settings.commit_message
            );
            context.register_service(Arc::new(settings));
            Ok(())
        })
    }
}
