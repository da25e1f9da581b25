//! Import orchestration services

mod creation_client;
mod orchestrator;
mod tree_copy;
mod workspace;

pub use creation_client::{
    CreationError, CreationRequest, ProjectCreationClient, RemoteCreationResult,
    RemoteRepoCreator, DEFAULT_VISIBILITY,
};
pub use orchestrator::{ImportOrchestrator, ImportOutcome, ImportRequest};
pub use tree_copy::{copy_missing, CopySummary};
pub use workspace::ImportWorkspace;

use axum::http::StatusCode;
use projimport_core::problemdetails::{self, Problem};
use projimport_git::GitError;
use thiserror::Error;

/// Import service errors
#[derive(Error, Debug)]
pub enum ImportServiceError {
    #[error("Expected a git-based URL: {0}")]
    InvalidRepoUrl(String),

    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// The creation service answered with a non-zero status; the message is
    /// reported as-is.
    #[error("{0}")]
    RemoteCreationRejected(String),

    #[error(transparent)]
    CreationRequest(#[from] CreationError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("Failed to copy repository contents: {0}")]
    Copy(std::io::Error),

    #[error("Failed to prepare working directory: {0}")]
    Workspace(std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for import services
pub type ImportServiceResult<T> = Result<T, ImportServiceError>;

impl From<ImportServiceError> for Problem {
    fn from(error: ImportServiceError) -> Self {
        match error {
            ImportServiceError::InvalidRepoUrl(url) => problemdetails::new(StatusCode::BAD_REQUEST)
                .with_title("Invalid Repository URL")
                .with_detail("Expected a git-based URL")
                .with_value("repo_url", url),
            ImportServiceError::MissingParameter(name) => {
                problemdetails::new(StatusCode::BAD_REQUEST)
                    .with_title("Missing Parameter")
                    .with_detail(format!("Required parameter '{}' is missing", name))
            }
            ImportServiceError::RemoteCreationRejected(message) => {
                problemdetails::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_title("Import Failed")
                    .with_detail(message)
            }
            ImportServiceError::CreationRequest(e) => {
                problemdetails::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_title("Project Creation Failed")
                    .with_detail(e.to_string())
            }
            ImportServiceError::Git(e) => problemdetails::new(StatusCode::INTERNAL_SERVER_ERROR)
                .with_title("Git Operation Failed")
                .with_detail(e.to_string()),
            ImportServiceError::Copy(e) => problemdetails::new(StatusCode::INTERNAL_SERVER_ERROR)
                .with_title("Copy Failed")
                .with_detail(e.to_string()),
            ImportServiceError::Workspace(e) => {
                problemdetails::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_title("Working Directory Error")
                    .with_detail(e.to_string())
            }
            ImportServiceError::Internal(msg) => {
                problemdetails::new(StatusCode::INTERNAL_SERVER_ERROR)
                    .with_title("Internal Server Error")
                    .with_detail(msg)
            }
        }
    }
}
