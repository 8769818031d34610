use axum::{http::StatusCode, response::Response};
use serde::Deserialize;
use tracing::info;

use crate::api::response::{docs, json, no_content, not_found};
use crate::state::AppState;
use crate::store::CommentDraft;

#[derive(Debug, Default, Deserialize)]
pub struct CommentEdit {
    #[serde(default)]
    pub body: Option<String>,
}

pub async fn add_comment(
    state: &AppState,
    repo: &str,
    number: Option<u64>,
    draft: CommentDraft,
) -> Response {
    let doc = docs("pulls/comments", "create-a-review-comment-for-a-pull-request");
    let Some(number) = number else {
        return not_found(&doc);
    };

    let data = state.load_repo_data(repo).await;
    let mut data = data.write().await;
    match data.add_comment(number, draft, &state.user(), &state.links(repo)) {
        Some(comment) => {
            info!("Created comment {} on {}#{}", comment.id, repo, number);
            json(StatusCode::CREATED, &comment)
        }
        None => not_found(&doc),
    }
}

/// Threads reference comments by id, so the new body shows up there too.
pub async fn edit_comment(
    state: &AppState,
    repo: &str,
    id: Option<u64>,
    edit: CommentEdit,
) -> Response {
    let data = state.load_repo_data(repo).await;
    let mut data = data.write().await;
    match id.and_then(|id| data.edit_comment(id, edit.body)) {
        Some(comment) => json(StatusCode::OK, &comment),
        None => not_found(&docs("pulls/comments", "update-a-review-comment-for-a-pull-request")),
    }
}

pub async fn delete_comment(state: &AppState, repo: &str, id: Option<u64>) -> Response {
    let data = state.load_repo_data(repo).await;
    let mut data = data.write().await;
    match id.and_then(|id| data.delete_comment(id)) {
        Some(comment) => {
            info!("Deleted comment {} from {}", comment.id, repo);
            no_content()
        }
        None => not_found(&docs("pulls/comments", "delete-a-review-comment-for-a-pull-request")),
    }
}
