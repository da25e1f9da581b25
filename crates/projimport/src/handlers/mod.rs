//! HTTP handlers for import operations

pub mod types;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use projimport_core::problemdetails::{self, Problem, ProblemDetails};
use projimport_core::SecretToken;
use projimport_git::TransportUrl;
use std::sync::Arc;
use tracing::warn;
use utoipa::OpenApi;

use crate::services::{ImportRequest, ImportServiceError};
use types::{AppState, ImportProjectParams, ImportProjectResponse};

pub const SERVER_URL_HEADER: &str = "gitLabServerURL";
pub const TOKEN_HEADER: &str = "gitlabToken";

/// Configure routes for the import API
pub fn configure_routes() -> Router<Arc<AppState>> {
    Router::new().route("/importProject", post(import_project))
}

/// Import a git repository into a newly created project
///
/// The project is created on the git server named by `gitLabServerURL`, using
/// `gitlabToken` both for the creation service and for pushing.
#[utoipa::path(
    post,
    path = "/importProject",
    tag = "Imports",
    params(
        ImportProjectParams,
        ("gitLabServerURL" = String, Header, description = "Git server the project is created on"),
        ("gitlabToken" = String, Header, description = "Access token for the git server"),
    ),
    responses(
        (status = 201, description = "Repository imported", body = ImportProjectResponse,
            headers(("Location" = String, description = "Clone URL of the created repository"))),
        (status = 400, description = "Missing parameter or non-git URL", body = ProblemDetails),
        (status = 500, description = "Import failed", body = ProblemDetails),
    )
)]
async fn import_project(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ImportProjectParams>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, Problem> {
    let request = build_request(params, &headers)?;

    let outcome = state.import_orchestrator.import_project(request).await?;

    let location = HeaderValue::from_str(&outcome.repository_url).map_err(|_| {
        warn!(
            "Created repository URL {} cannot be sent as a header",
            outcome.repository_url
        );
        problemdetails::internal_error(
            "Invalid Repository URL",
            "The created repository URL is not a valid Location header",
        )
    })?;

    let body = ImportProjectResponse {
        repository_url: outcome.repository_url,
        project_name: outcome.project_name,
        commit_id: outcome.commit_id,
        branch: outcome.branch,
        copied_files: outcome.copy.copied_files,
    };

    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(body)))
}

fn build_request(
    params: ImportProjectParams,
    headers: &HeaderMap,
) -> Result<ImportRequest, ImportServiceError> {
    let repo_url =
        non_blank(params.repo_url).ok_or(ImportServiceError::MissingParameter("repoUrl"))?;
    let target_server_url = required_header(headers, SERVER_URL_HEADER)?;
    let auth_token = SecretToken::new(required_header(headers, TOKEN_HEADER)?);

    let source_repo_url = TransportUrl::parse(&repo_url).map_err(|e| {
        warn!("Rejected import of non-git URL: {}", e);
        ImportServiceError::InvalidRepoUrl(repo_url.clone())
    })?;

    Ok(ImportRequest {
        source_repo_url,
        project_name: non_blank(params.name),
        description: params.description,
        visibility: params.visibility,
        target_server_url,
        auth_token,
    })
}

fn required_header(
    headers: &HeaderMap,
    name: &'static str,
) -> Result<String, ImportServiceError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or(ImportServiceError::MissingParameter(name))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(import_project),
    components(schemas(ImportProjectResponse, ProblemDetails)),
    tags(
        (name = "Imports", description = "Import git repositories into new projects")
    )
)]
pub struct ImportApiDoc;
