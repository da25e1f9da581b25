//! Plugin system for modular service registration and route configuration
//!
//! Each plugin contributes services to a shared, type-keyed registry, and
//! optionally HTTP routes and an OpenAPI document. The [`PluginManager`]
//! initialises plugins in registration order, so a plugin may require any
//! service registered by a plugin before it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{routing::get, Json, Router};
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use utoipa::openapi::OpenApi;

use crate::openapi::{base_document, merge_openapi_schemas};

// Re-export for plugin implementations
pub use axum;
pub use utoipa;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Plugin '{plugin_name}' failed to register services: {error}")]
    PluginRegistrationFailed { plugin_name: String, error: String },

    #[error("Required service '{0}' is not registered")]
    ServiceNotFound(String),

    #[error("Plugin configuration error: {0}")]
    Configuration(String),
}

/// Future returned by [`ImporterPlugin::register_services`]
pub type BoxedRegistration<'a> =
    Pin<Box<dyn Future<Output = Result<(), PluginError>> + Send + 'a>>;

/// Core plugin trait that defines the plugin interface
pub trait ImporterPlugin: Send + Sync {
    /// Unique identifier for this plugin
    fn name(&self) -> &'static str;

    /// Register services that this plugin provides
    ///
    /// Use `context.require_service::<T>()` to get dependencies.
    /// Use `context.register_service(service)` to provide services for other plugins.
    fn register_services<'a>(
        &'a self,
        context: &'a ServiceRegistrationContext,
    ) -> BoxedRegistration<'a>;

    /// Configure HTTP routes for this plugin
    ///
    /// Return `Ok(None)` if this plugin doesn't provide HTTP endpoints.
    fn configure_routes(
        &self,
        _context: &PluginContext,
    ) -> Result<Option<PluginRoutes>, PluginError> {
        Ok(None)
    }

    /// Provide OpenAPI schema for this plugin's endpoints
    fn openapi_schema(&self) -> Option<OpenApi> {
        None
    }
}

/// Route configuration returned by plugins
pub struct PluginRoutes {
    pub router: Router,
}

impl PluginRoutes {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

/// Type-safe service registry for dependency injection
pub struct ServiceRegistry {
    services: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            services: Mutex::new(HashMap::new()),
        }
    }

    fn services(&self) -> MutexGuard<'_, HashMap<TypeId, Box<dyn Any + Send + Sync>>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.services
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a service for other plugins to use
    pub fn register<T: Send + Sync + 'static + ?Sized>(&self, service: Arc<T>) {
        debug!("Registering service: {}", std::any::type_name::<T>());
        self.services().insert(TypeId::of::<T>(), Box::new(service));
    }

    /// Get a service if it's registered
    pub fn get<T: Send + Sync + 'static + ?Sized>(&self) -> Option<Arc<T>> {
        self.services()
            .get(&TypeId::of::<T>())
            .and_then(|any| any.downcast_ref::<Arc<T>>())
            .cloned()
    }

    /// Get a service or fail with [`PluginError::ServiceNotFound`]
    pub fn require<T: Send + Sync + 'static + ?Sized>(&self) -> Result<Arc<T>, PluginError> {
        self.get::<T>()
            .ok_or_else(|| PluginError::ServiceNotFound(std::any::type_name::<T>().to_string()))
    }
}

/// Read-only view of the registry handed to route configuration
#[derive(Clone)]
pub struct PluginContext {
    registry: Arc<ServiceRegistry>,
}

impl PluginContext {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    pub fn get_service<T: Send + Sync + 'static + ?Sized>(&self) -> Option<Arc<T>> {
        self.registry.get::<T>()
    }

    pub fn require_service<T: Send + Sync + 'static + ?Sized>(
        &self,
    ) -> Result<Arc<T>, PluginError> {
        self.registry.require::<T>()
    }
}

/// Context for service registration that allows adding services
pub struct ServiceRegistrationContext {
    service_registry: Arc<ServiceRegistry>,
}

impl Default for ServiceRegistrationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistrationContext {
    pub fn new() -> Self {
        Self {
            service_registry: Arc::new(ServiceRegistry::new()),
        }
    }

    pub fn register_service<T: Send + Sync + 'static + ?Sized>(&self, service: Arc<T>) {
        self.service_registry.register(service);
    }

    pub fn get_service<T: Send + Sync + 'static + ?Sized>(&self) -> Option<Arc<T>> {
        self.service_registry.get::<T>()
    }

    pub fn require_service<T: Send + Sync + 'static + ?Sized>(
        &self,
    ) -> Result<Arc<T>, PluginError> {
        self.service_registry.require::<T>()
    }

    pub fn create_plugin_context(&self) -> PluginContext {
        PluginContext::new(self.service_registry.clone())
    }
}

/// Handles plugin registration, initialization, and application building
pub struct PluginManager {
    plugins: Vec<Box<dyn ImporterPlugin>>,
    context: ServiceRegistrationContext,
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
            context: ServiceRegistrationContext::new(),
        }
    }

    /// Register a plugin (order matters for dependencies)
    pub fn register_plugin(&mut self, plugin: Box<dyn ImporterPlugin>) {
        debug!("Registering plugin: {}", plugin.name());
        self.plugins.push(plugin);
    }

    /// Initialize all plugins in registration order
    pub async fn initialize_plugins(&mut self) -> Result<(), PluginError> {
        debug!("Initializing {} plugins", self.plugins.len());

        for plugin in &self.plugins {
            plugin.register_services(&self.context).await.map_err(|e| {
                PluginError::PluginRegistrationFailed {
                    plugin_name: plugin.name().to_string(),
                    error: e.to_string(),
                }
            })?;
            debug!("Successfully initialized plugin: {}", plugin.name());
        }

        Ok(())
    }

    /// Build the router from every plugin's routes, plus `/health`
    pub fn build_application(&self) -> Result<Router, PluginError> {
        debug!("Building application with {} plugins", self.plugins.len());

        let plugin_context = self.context.create_plugin_context();
        let mut app = Router::new().route("/health", get(health));

        for plugin in &self.plugins {
            if let Some(plugin_routes) = plugin.configure_routes(&plugin_context)? {
                debug!("Adding routes for plugin: {}", plugin.name());
                app = app.merge(plugin_routes.router);
            }
        }

        Ok(app)
    }

    /// OpenAPI document combining every plugin's schema
    pub fn get_unified_openapi(&self, version: &str) -> OpenApi {
        let schemas = self
            .plugins
            .iter()
            .filter_map(|plugin| plugin.openapi_schema())
            .collect();
        merge_openapi_schemas(base_document(version), schemas)
    }

    /// Access to the registration context, used to seed core services
    /// before plugins are initialized
    pub fn service_context(&self) -> &ServiceRegistrationContext {
        &self.context
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
