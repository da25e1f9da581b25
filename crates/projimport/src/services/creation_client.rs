//! Client for the project-creation service
//!
//! The service creates an empty project on the target git server and answers
//! with a JSON body `{"status": <int>, "message": <string>}`. A status of `0`
//! means success, in which case `message` is the clone URL of the new
//! repository; any other status carries a human-readable error.

use std::time::Duration;

use async_trait::async_trait;
use projimport_core::SecretToken;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Visibility sent when the caller does not choose one
pub const DEFAULT_VISIBILITY: &str = "0";

const HEADER_PROJECT_NAME: &str = "projectName";
const HEADER_VISIBILITY: &str = "projVisibility";
const HEADER_DESCRIPTION: &str = "projDescription";
const HEADER_SERVER_URL: &str = "gitLabServerURL";
const HEADER_TOKEN: &str = "gitlabToken";

#[derive(Error, Debug)]
pub enum CreationError {
    #[error("Project creation request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Project creation service responded with {status}: {body}")]
    Status { status: u16, body: String },
}

/// Answer of the project-creation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCreationResult {
    pub status: i32,
    pub message: String,
}

impl RemoteCreationResult {
    pub fn is_success(&self) -> bool {
        self.status == 0
    }
}

/// Everything the creation service needs to create a project
#[derive(Debug, Clone)]
pub struct CreationRequest {
    pub project_name: String,
    pub description: Option<String>,
    pub visibility: Option<String>,
    pub server_url: String,
    pub token: SecretToken,
}

impl CreationRequest {
    /// The caller's description, or `Imported project: {name}` when blank
    pub fn effective_description(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => description.to_string(),
            _ => format!("Imported project: {}", self.project_name),
        }
    }

    pub fn effective_visibility(&self) -> String {
        match self.visibility.as_deref().map(str::trim) {
            Some(visibility) if !visibility.is_empty() => visibility.to_string(),
            _ => DEFAULT_VISIBILITY.to_string(),
        }
    }
}

/// Creates the remote repository an import is pushed into
#[async_trait]
pub trait RemoteRepoCreator: Send + Sync {
    /// Ask for a new project. Transport failures are errors; a rejection by
    /// the service is a successful call with a non-zero status.
    async fn request_creation(
        &self,
        request: CreationRequest,
    ) -> Result<RemoteCreationResult, CreationError>;
}

/// [`RemoteRepoCreator`] talking to the creation service over HTTP
pub struct ProjectCreationClient {
    client: Client,
    endpoint: String,
}

impl ProjectCreationClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, CreationError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteRepoCreator for ProjectCreationClient {
    async fn request_creation(
        &self,
        request: CreationRequest,
    ) -> Result<RemoteCreationResult, CreationError> {
        info!(
            "Requesting project structure creation for '{}' on {}...",
            request.project_name, request.server_url
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(HEADER_PROJECT_NAME, &request.project_name)
            .header(HEADER_VISIBILITY, request.effective_visibility())
            .header(HEADER_DESCRIPTION, request.effective_description())
            .header(HEADER_SERVER_URL, &request.server_url)
            .header(HEADER_TOKEN, request.token.expose())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CreationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result = response.json::<RemoteCreationResult>().await?;
        debug!(
            "Creation service answered status {} for '{}'",
            result.status, request.project_name
        );
        Ok(result)
    }
}
