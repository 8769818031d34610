use axum::{http::StatusCode, response::Response};
use serde::Deserialize;
use tracing::info;

use crate::api::response::{docs, github_error, json, not_found};
use crate::state::AppState;
use crate::store::{ReviewDraft, ReviewEvent, SubmitError};

/// Body of `POST .../reviews/{id}/events`.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewSubmission {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

pub async fn list_reviews(state: &AppState, repo: &str, number: Option<u64>) -> Response {
    let data = state.load_repo_data(repo).await;
    let data = data.read().await;
    let reviews = number.map(|n| data.reviews_for(n)).unwrap_or_default();
    json(StatusCode::OK, &reviews)
}

pub async fn create_review(
    state: &AppState,
    repo: &str,
    number: Option<u64>,
    draft: ReviewDraft,
) -> Response {
    let doc = docs("pulls/reviews", "create-a-review-for-a-pull-request");
    let Some(number) = number else {
        return not_found(&doc);
    };

    let data = state.load_repo_data(repo).await;
    let mut data = data.write().await;
    match data.create_review(number, draft, &state.user(), &state.links(repo)) {
        Some(review) => {
            info!(
                "Created {} review {} on {}#{}",
                review.state.as_str(),
                review.id,
                repo,
                number
            );
            json(StatusCode::OK, &review)
        }
        None => not_found(&doc),
    }
}

pub async fn submit_review(
    state: &AppState,
    repo: &str,
    number: Option<u64>,
    review_id: Option<u64>,
    submission: ReviewSubmission,
) -> Response {
    let doc = docs("pulls/reviews", "submit-a-review-for-a-pull-request");
    let (Some(number), Some(review_id)) = (number, review_id) else {
        return not_found(&doc);
    };

    let data = state.load_repo_data(repo).await;
    let mut data = data.write().await;

    if data.review(review_id).filter(|r| r.pull() == Some(number)).is_none() {
        return not_found(&doc);
    }
    let event = match submission.event.as_deref().and_then(ReviewEvent::parse) {
        Some(event) if event != ReviewEvent::Pending => event,
        _ => return github_error(StatusCode::UNPROCESSABLE_ENTITY, "Validation Failed", &doc),
    };

    match data.submit_review(number, review_id, event, submission.body) {
        Ok(review) => {
            info!("Submitted review {} as {}", review.id, review.state.as_str());
            json(StatusCode::OK, &review)
        }
        Err(SubmitError::NotFound) => not_found(&doc),
        Err(SubmitError::NotPending(current)) => github_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            &format!("Can not submit a review that is {}", current.as_str()),
            &doc,
        ),
    }
}
