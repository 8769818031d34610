//! HTTP surface: control plane, GraphQL and the REST fallback.

pub mod control;
pub mod graphql;
pub mod response;
pub mod rest;

use axum::{
    extract::{Request, State},
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue, Method, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

const ALLOW_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type, Authorization";

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/graphql",
            post(graphql::handle_graphql).fallback(rest::dispatch),
        )
        .fallback(rest::dispatch)
        .layer(middleware::from_fn_with_state(state.clone(), apply_latency));

    Router::new()
        .route("/heartbeat", get(control::heartbeat).fallback(rest::dispatch))
        .route("/reset", post(control::reset).fallback(rest::dispatch))
        .route("/config", post(control::configure).fallback(rest::dispatch))
        .route(
            "/error-messages",
            get(control::error_messages).fallback(rest::dispatch),
        )
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(cors))
                .into_inner(),
        )
        .with_state(state)
}

/// Answer preflights directly and stamp the allow-lists on everything else.
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
    response
}

/// Successful API responses wait out the configured latency; errors go out at once.
async fn apply_latency(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status().is_success() {
        let delay = state.latency().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    response
}
