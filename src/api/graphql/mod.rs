//! GraphQL dispatcher
//!
//! The document is parsed with `async-graphql-parser`, but nothing is resolved against a
//! schema: the field names found in it select from a fixed set of hand-written
//! operations, and their payloads are merged into one `data` object.

pub mod nodes;
pub mod operations;
pub mod selection;

use async_graphql_parser::parse_query;
use axum::{body::Bytes, extract::State, http::StatusCode, response::Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::response::{graphql_error, injected_fault, json};
use super::rest::parse_body;
use crate::state::AppState;
use operations::{deep_merge, BadUserInput, Operation};
use selection::collect_fields;

#[derive(Debug, Default, Deserialize)]
pub struct GraphQLRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub variables: Option<Value>,
    #[serde(default, rename = "operationName")]
    pub operation_name: Option<String>,
}

pub async fn handle_graphql(State(state): State<AppState>, body: Bytes) -> Response {
    if state.is_silent().await {
        debug!("POST /graphql");
    } else {
        info!("POST /graphql");
    }

    if let Some(response) = injected_fault(&state, "graphql").await {
        return response;
    }

    let request: GraphQLRequest = parse_body(&body);
    let Some(query) = request.query.filter(|q| !q.trim().is_empty()) else {
        return graphql_error(StatusCode::BAD_REQUEST, "Query is required", "BAD_USER_INPUT");
    };

    let document = match parse_query(&query) {
        Ok(document) => document,
        Err(e) => {
            debug!("GraphQL parse failure: {}", e);
            return graphql_error(
                StatusCode::BAD_REQUEST,
                &format!("Syntax Error: {}", e),
                "GRAPHQL_PARSE_ERROR",
            );
        }
    };

    let operations = Operation::detect(&collect_fields(&document));
    if operations.is_empty() {
        return graphql_error(
            StatusCode::BAD_REQUEST,
            "Query does not select any supported field",
            "GRAPHQL_VALIDATION_FAILED",
        );
    }
    if let Some(name) = request.operation_name.as_deref() {
        debug!("Operation name {}", name);
    }

    for operation in &operations {
        if let Some(response) = injected_fault(&state, operation.name()).await {
            return response;
        }
    }

    let variables = request.variables.unwrap_or(Value::Null);
    let mut data = json!({});
    let mut errors = Vec::new();
    for operation in operations {
        match operation.execute(&state, &query, &variables).await {
            Ok(outcome) => {
                deep_merge(&mut data, outcome.data);
                errors.extend(outcome.errors);
            }
            Err(BadUserInput(message)) => {
                return graphql_error(StatusCode::BAD_REQUEST, &message, "BAD_USER_INPUT");
            }
        }
    }

    let mut body = json!({ "data": data });
    if !errors.is_empty() {
        body["errors"] = Value::Array(errors);
    }
    json(StatusCode::OK, &body)
}
