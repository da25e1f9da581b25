//! Server configuration for the project importer

pub mod plugin;
pub mod service;

pub use plugin::ConfigPlugin;
pub use service::{ConfigService, ConfigServiceError, ServerConfig, ServerConfigBuilder};
