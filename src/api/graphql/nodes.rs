//! GraphQL node shapes for threads, comments and reviews.

use serde_json::{json, Value};

use crate::store::{Comment, RepoData, Review, ReviewThread};

/// `{totalCount, nodes, pageInfo}` with everything on one page.
pub fn connection(nodes: Vec<Value>) -> Value {
    json!({
        "totalCount": nodes.len(),
        "nodes": nodes,
        "pageInfo": { "hasNextPage": false, "endCursor": null }
    })
}

pub fn comment_node(data: &RepoData, comment: &Comment) -> Value {
    let review = comment
        .pull_request_review_id
        .and_then(|id| data.review(id))
        .map(|review| {
            json!({
                "id": review.node_id,
                "databaseId": review.id,
                "state": review.state.as_str(),
            })
        });

    json!({
        "id": comment.node_id,
        "databaseId": comment.id,
        "body": comment.body,
        "path": comment.path,
        "line": comment.line,
        "startLine": comment.start_line,
        "diffSide": comment.side,
        "createdAt": comment.created_at,
        "updatedAt": comment.updated_at,
        "author": { "login": comment.user.login },
        "replyTo": comment.in_reply_to_id.map(|id| json!({ "databaseId": id })),
        "pullRequestReview": review,
    })
}

pub fn thread_node(data: &RepoData, thread: &ReviewThread) -> Value {
    let comments = data
        .thread_comments(thread)
        .into_iter()
        .map(|comment| comment_node(data, comment))
        .collect();

    json!({
        "id": thread.id,
        "isResolved": thread.is_resolved,
        "isOutdated": thread.is_outdated,
        "isCollapsed": thread.is_collapsed,
        "path": thread.path,
        "line": thread.line,
        "startLine": thread.start_line,
        "diffSide": thread.diff_side,
        "comments": connection(comments),
    })
}

pub fn review_node(data: &RepoData, review: &Review) -> Value {
    let comments = data
        .comments_for_review(review.id)
        .into_iter()
        .map(|comment| comment_node(data, comment))
        .collect();

    json!({
        "id": review.node_id,
        "databaseId": review.id,
        "state": review.state.as_str(),
        "body": review.body,
        "submittedAt": review.submitted_at,
        "author": { "login": review.user.login },
        "comments": connection(comments),
    })
}
