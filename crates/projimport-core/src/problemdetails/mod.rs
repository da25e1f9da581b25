use std::collections::BTreeMap;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::{response::IntoResponse, Json};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Problem body returned to clients, following RFC 7807.
///
/// Only used for API documentation; responses are built through [`Problem`].
#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(example = json!({
    "title": "Import Failed",
    "detail": "name taken",
    "status": 500
}))]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_url: Option<String>,
    /// A short, human-readable summary of the problem type
    #[schema(example = "Import Failed")]
    pub title: String,
    /// A human-readable explanation specific to this occurrence of the problem
    #[schema(example = "name taken")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// HTTP status code repeated in the body
    #[schema(example = 500)]
    pub status: u16,
}

/// An error response to send to the client.
#[derive(Debug, Clone)]
pub struct Problem {
    /// The status code of the problem.
    pub status_code: StatusCode,
    /// The actual body of the problem.
    pub body: BTreeMap<String, Value>,
}

/// Create a new `Problem` response to send to the client.
pub fn new<S>(status_code: S) -> Problem
where
    S: Into<StatusCode>,
{
    let status_code = status_code.into();
    let mut body = BTreeMap::new();
    body.insert("status".to_owned(), Value::from(status_code.as_u16()));
    Problem { status_code, body }
}

/// Shorthand for a 400 problem with a title and detail.
pub fn bad_request(title: impl Into<String>, detail: impl Into<String>) -> Problem {
    new(StatusCode::BAD_REQUEST)
        .with_title(title)
        .with_detail(detail)
}

/// Shorthand for a 500 problem with a title and detail.
pub fn internal_error(title: impl Into<String>, detail: impl Into<String>) -> Problem {
    new(StatusCode::INTERNAL_SERVER_ERROR)
        .with_title(title)
        .with_detail(detail)
}

impl Problem {
    /// Specify the "type" to use for the problem.
    pub fn with_type<S>(self, value: S) -> Self
    where
        S: Into<String>,
    {
        self.with_value("type", value.into())
    }

    /// Specify the "title" to use for the problem.
    pub fn with_title<S>(self, value: S) -> Self
    where
        S: Into<String>,
    {
        self.with_value("title", value.into())
    }

    /// Specify the "detail" to use for the problem.
    pub fn with_detail<S>(self, value: S) -> Self
    where
        S: Into<String>,
    {
        self.with_value("detail", value.into())
    }

    /// Specify an arbitrary value to include in the problem.
    pub fn with_value<V>(mut self, key: &str, value: V) -> Self
    where
        V: Into<Value>,
    {
        self.body.insert(key.to_owned(), value.into());
        self
    }

    /// The "detail" member, if one was set.
    pub fn detail(&self) -> Option<&str> {
        self.body.get("detail").and_then(Value::as_str)
    }
}

impl<S> From<S> for Problem
where
    S: Into<StatusCode>,
{
    fn from(status_code: S) -> Self {
        new(status_code.into())
    }
}

/// Result type where the error is always a `Problem`.
pub type Result<T> = std::result::Result<T, Problem>;

impl IntoResponse for Problem {
    fn into_response(self) -> axum::response::Response {
        let mut response = (self.status_code, Json(self.body)).into_response();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(PROBLEM_CONTENT_TYPE));
        response
    }
}
