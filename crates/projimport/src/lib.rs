//! Project import orchestration
//!
//! Imports an existing git repository into a newly created managed project:
//! the remote is requested from the project-creation service while the source
//! is cloned, then the source tree is copied into a clone of the new remote,
//! committed and force-pushed.
//!
//! # Architecture
//!
//! - **Handlers**: the `POST /importProject` endpoint
//! - **Services**: creation-service client, working directories, tree copy
//!   and the orchestrator sequencing them
//! - **Plugin**: wiring into the plugin system

pub mod handlers;
pub mod plugin;
pub mod services;

#[cfg(test)]
mod test_support;

pub use plugin::ImportPlugin;
pub use services::{
    CreationRequest, ImportOrchestrator, ImportOutcome, ImportRequest, ImportServiceError,
    ImportServiceResult, ProjectCreationClient, RemoteCreationResult, RemoteRepoCreator,
};
