//! Response builders shared by the REST and GraphQL surfaces.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::github::ErrorEnvelope;
use crate::simulation::canned_message;
use crate::state::AppState;

pub const DOCS_ROOT: &str = "https://docs.github.com/rest";

/// Documentation link for a section of the REST reference.
pub fn docs(section: &str, item: &str) -> String {
    format!("{}/{}#{}", DOCS_ROOT, section, item)
}

pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_value(body) {
        Ok(value) => (status, Json(value)).into_response(),
        Err(e) => {
            warn!("Failed to serialize response body: {}", e);
            github_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", DOCS_ROOT)
        }
    }
}

pub fn github_error(status: StatusCode, message: &str, documentation_url: &str) -> Response {
    let envelope = ErrorEnvelope {
        message: message.to_string(),
        documentation_url: documentation_url.to_string(),
    };
    (status, Json(envelope)).into_response()
}

pub fn not_found(documentation_url: &str) -> Response {
    github_error(StatusCode::NOT_FOUND, "Not Found", documentation_url)
}

pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// `{errors: [{message, extensions: {code}}]}`
pub fn graphql_error(status: StatusCode, message: &str, code: &str) -> Response {
    let body = json!({
        "errors": [{
            "message": message,
            "extensions": { "code": code }
        }]
    });
    (status, Json(body)).into_response()
}

/// Consult the fault table for `endpoint`.
///
/// A status fault yields the canned error; a timeout never returns.
pub async fn injected_fault(state: &AppState, endpoint: &str) -> Option<Response> {
    let mode = state.fault_for(endpoint).await?;
    debug!("Injecting {:?} for {}", mode, endpoint);

    match mode.status() {
        Some(status) => Some(github_error(status, &canned_message(status), DOCS_ROOT)),
        None => {
            std::future::pending::<()>().await;
            None
        }
    }
}
