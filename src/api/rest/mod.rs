//! REST dispatcher
//!
//! Requests that no axum route claims land here and are matched against an ordered
//! `(method, pattern)` table; the first match wins. Anything unmatched gets GitHub's 404.

pub mod comments;
pub mod pulls;
pub mod repos;
pub mod reviews;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, Uri},
    response::Response,
};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{debug, info};

use super::response::{injected_fault, not_found, DOCS_ROOT};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    GetUser,
    ListRepos,
    ListPulls,
    GetPull,
    ListFiles,
    GetContents,
    AddComment,
    EditComment,
    DeleteComment,
    ListReviews,
    CreateReview,
    SubmitReview,
}

impl Endpoint {
    /// Key used in the fault table.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::GetUser => "getUser",
            Endpoint::ListRepos => "listRepos",
            Endpoint::ListPulls => "listPulls",
            Endpoint::GetPull => "getPull",
            Endpoint::ListFiles => "listFiles",
            Endpoint::GetContents => "getContents",
            Endpoint::AddComment => "addComment",
            Endpoint::EditComment => "editComment",
            Endpoint::DeleteComment => "deleteComment",
            Endpoint::ListReviews => "listReviews",
            Endpoint::CreateReview => "createReview",
            Endpoint::SubmitReview => "submitReview",
        }
    }
}

struct Route {
    method: Method,
    pattern: Regex,
    endpoint: Endpoint,
}

const REPO: &str = r"^/repos/([^/]+)/([^/]+)";

fn routes() -> &'static [Route] {
    static ROUTES: OnceLock<Vec<Route>> = OnceLock::new();
    ROUTES.get_or_init(|| {
        let table: [(Method, &str, Endpoint); 12] = [
            (Method::GET, "^/user$", Endpoint::GetUser),
            (Method::GET, "^/user/repos$", Endpoint::ListRepos),
            (Method::GET, "/pulls$", Endpoint::ListPulls),
            (Method::GET, r"/pulls/(\d+)$", Endpoint::GetPull),
            (Method::GET, r"/pulls/(\d+)/files$", Endpoint::ListFiles),
            (Method::GET, "/contents/(.+)$", Endpoint::GetContents),
            (Method::POST, r"/pulls/(\d+)/comments$", Endpoint::AddComment),
            (Method::PATCH, r"/pulls/comments/(\d+)$", Endpoint::EditComment),
            (Method::DELETE, r"/pulls/comments/(\d+)$", Endpoint::DeleteComment),
            (Method::GET, r"/pulls/(\d+)/reviews$", Endpoint::ListReviews),
            (Method::POST, r"/pulls/(\d+)/reviews$", Endpoint::CreateReview),
            (Method::POST, r"/pulls/(\d+)/reviews/(\d+)/events$", Endpoint::SubmitReview),
        ];

        table
            .into_iter()
            .filter_map(|(method, pattern, endpoint)| {
                let full = if pattern.starts_with('^') {
                    pattern.to_string()
                } else {
                    format!("{}{}", REPO, pattern)
                };
                Regex::new(&full).ok().map(|pattern| Route {
                    method,
                    pattern,
                    endpoint,
                })
            })
            .collect()
    })
}

/// Path parameters captured by a route, percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub endpoint: Endpoint,
    pub params: Vec<String>,
}

impl RouteMatch {
    pub fn repo(&self) -> &str {
        self.params.get(1).map(String::as_str).unwrap_or_default()
    }

    /// The `index`-th numeric parameter after owner and repo.
    pub fn number(&self, index: usize) -> Option<u64> {
        self.params.get(2 + index)?.parse().ok()
    }

    pub fn tail(&self) -> &str {
        self.params.last().map(String::as_str).unwrap_or_default()
    }
}

pub fn match_route(method: &Method, path: &str) -> Option<RouteMatch> {
    let path = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };

    routes()
        .iter()
        .filter(|route| route.method == *method)
        .find_map(|route| {
            let captures = route.pattern.captures(path)?;
            let params = captures
                .iter()
                .skip(1)
                .flatten()
                .map(|m| match urlencoding::decode(m.as_str()) {
                    Ok(decoded) => decoded.into_owned(),
                    Err(_) => m.as_str().to_string(),
                })
                .collect();
            Some(RouteMatch {
                endpoint: route.endpoint,
                params,
            })
        })
}

/// Lenient JSON body: anything unparseable becomes the default value.
pub fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> T {
    if body.is_empty() {
        return T::default();
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        debug!("Treating malformed request body as empty: {}", e);
        T::default()
    })
}

pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if state.is_silent().await {
        debug!("{} {}", method, uri.path());
    } else {
        info!("{} {}", method, uri.path());
    }

    let Some(route) = match_route(&method, uri.path()) else {
        return not_found(DOCS_ROOT);
    };

    if let Some(response) = injected_fault(&state, route.endpoint.name()).await {
        return response;
    }

    let query: HashMap<String, String> = Query::try_from_uri(&uri)
        .map(|Query(query)| query)
        .unwrap_or_default();

    match route.endpoint {
        Endpoint::GetUser => repos::get_user(&state, &headers),
        Endpoint::ListRepos => repos::list_repos(&state).await,
        Endpoint::GetContents => {
            repos::get_contents(&state, route.repo(), route.tail(), query.get("ref")).await
        }
        Endpoint::ListPulls => pulls::list_pulls(&state, route.repo()).await,
        Endpoint::GetPull => pulls::get_pull(&state, route.repo(), route.number(0)).await,
        Endpoint::ListFiles => pulls::list_files(&state, route.repo(), route.number(0)).await,
        Endpoint::AddComment => {
            comments::add_comment(&state, route.repo(), route.number(0), parse_body(&body)).await
        }
        Endpoint::EditComment => {
            comments::edit_comment(&state, route.repo(), route.number(0), parse_body(&body)).await
        }
        Endpoint::DeleteComment => {
            comments::delete_comment(&state, route.repo(), route.number(0)).await
        }
        Endpoint::ListReviews => {
            reviews::list_reviews(&state, route.repo(), route.number(0)).await
        }
        Endpoint::CreateReview => {
            reviews::create_review(&state, route.repo(), route.number(0), parse_body(&body)).await
        }
        Endpoint::SubmitReview => {
            reviews::submit_review(
                &state,
                route.repo(),
                route.number(0),
                route.number(1),
                parse_body(&body),
            )
            .await
        }
    }
}
