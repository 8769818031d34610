use axum::{http::StatusCode, response::Response};

use crate::api::response::{docs, json, not_found};
use crate::state::AppState;

pub async fn list_pulls(state: &AppState, repo: &str) -> Response {
    let data = state.load_repo_data(repo).await;
    let data = data.read().await;
    let pulls: Vec<_> = data.pulls.values().collect();
    json(StatusCode::OK, &pulls)
}

pub async fn get_pull(state: &AppState, repo: &str, number: Option<u64>) -> Response {
    let data = state.load_repo_data(repo).await;
    let data = data.read().await;
    match number.and_then(|n| data.pull(n)) {
        Some(pull) => json(StatusCode::OK, pull),
        None => not_found(&docs("pulls/pulls", "get-a-pull-request")),
    }
}

/// Synthesized on every call; an unknown pull lists no files.
pub async fn list_files(state: &AppState, repo: &str, number: Option<u64>) -> Response {
    let head_sha = {
        let data = state.load_repo_data(repo).await;
        let data = data.read().await;
        number.and_then(|n| data.pull(n)).map(|p| p.head.sha.clone())
    };

    let (Some(number), Some(head_sha)) = (number, head_sha) else {
        return json(StatusCode::OK, &Vec::<()>::new());
    };

    let files = state
        .diff()
        .generate_file_diffs(&state.repo_dir(repo), number, &head_sha, &state.links(repo))
        .await;
    json(StatusCode::OK, &files)
}
