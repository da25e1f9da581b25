//! Request and response types for import handlers

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::services::ImportOrchestrator;

/// Application state for handlers
pub struct AppState {
    pub import_orchestrator: Arc<ImportOrchestrator>,
}

/// Query parameters of `POST /importProject`
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ImportProjectParams {
    /// Git URL of the repository to import (required)
    #[param(example = "https://github.com/group/proj.git")]
    pub repo_url: Option<String>,
    /// Project name; derived from the repository URL when omitted
    pub name: Option<String>,
    /// Project description; defaults to `Imported project: {name}`
    pub description: Option<String>,
    /// Visibility level understood by the target server; defaults to `0`
    pub visibility: Option<String>,
}

/// Body of a successful import
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportProjectResponse {
    /// Clone URL of the created repository, also sent as `Location`
    #[schema(example = "https://gitlab.example.com/imports/proj.git")]
    pub repository_url: String,
    #[schema(example = "proj")]
    pub project_name: String,
    /// Commit the imported tree was pushed as
    pub commit_id: String,
    pub branch: String,
    pub copied_files: usize,
}
