use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::github::User;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitRef {
    #[serde(default)]
    pub sha: String,
    #[serde(rename = "ref", default)]
    pub ref_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Pull request row, served verbatim from the fixture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_pull_state")]
    pub state: String,
    #[serde(default)]
    pub head: GitRef,
    #[serde(default)]
    pub base: GitRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_pull_state() -> String {
    "open".to_string()
}

/// Review comment row; `pull_request_review_id` is `None` for standalone comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub node_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_number: Option<u64>,
    #[serde(default)]
    pub pull_request_review_id: Option<u64>,
    #[serde(default)]
    pub in_reply_to_id: Option<u64>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub start_line: Option<u64>,
    #[serde(default = "default_side")]
    pub side: String,
    #[serde(default)]
    pub start_side: Option<String>,
    #[serde(default)]
    pub position: Option<u64>,
    #[serde(default)]
    pub original_position: Option<u64>,
    #[serde(default)]
    pub diff_hunk: String,
    #[serde(default)]
    pub commit_id: String,
    #[serde(default)]
    pub original_commit_id: String,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub pull_request_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub(crate) fn default_side() -> String {
    "RIGHT".to_string()
}

impl Comment {
    pub fn pull(&self) -> Option<u64> {
        self.pull_number
            .or_else(|| pull_number_from_url(&self.pull_request_url))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    #[default]
    Pending,
    Approved,
    #[serde(alias = "REQUEST_CHANGES")]
    ChangesRequested,
    Commented,
    Dismissed,
}

impl ReviewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewState::Pending => "PENDING",
            ReviewState::Approved => "APPROVED",
            ReviewState::ChangesRequested => "CHANGES_REQUESTED",
            ReviewState::Commented => "COMMENTED",
            ReviewState::Dismissed => "DISMISSED",
        }
    }
}

/// Event a client sends to create or submit a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEvent {
    Pending,
    Approve,
    RequestChanges,
    Comment,
}

impl ReviewEvent {
    /// Accepts GitHub's event names as well as the matching state names.
    pub fn parse(event: &str) -> Option<Self> {
        match event.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(ReviewEvent::Pending),
            "APPROVE" | "APPROVED" => Some(ReviewEvent::Approve),
            "REQUEST_CHANGES" | "CHANGES_REQUESTED" => Some(ReviewEvent::RequestChanges),
            "COMMENT" | "COMMENTED" => Some(ReviewEvent::Comment),
            _ => None,
        }
    }

    pub fn target_state(&self) -> ReviewState {
        match self {
            ReviewEvent::Pending => ReviewState::Pending,
            ReviewEvent::Approve => ReviewState::Approved,
            ReviewEvent::RequestChanges => ReviewState::ChangesRequested,
            ReviewEvent::Comment => ReviewState::Commented,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: u64,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub user: User,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub state: ReviewState,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pull_number: Option<u64>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub pull_request_url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Review {
    pub fn pull(&self) -> Option<u64> {
        self.pull_number
            .or_else(|| pull_number_from_url(&self.pull_request_url))
    }
}

/// Conversation anchored at `(pull_number, path, line)`; holds comment ids, never copies.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewThread {
    pub id: String,
    pub pull_number: u64,
    pub path: String,
    pub line: Option<u64>,
    pub start_line: Option<u64>,
    pub diff_side: String,
    pub is_resolved: bool,
    pub is_outdated: bool,
    pub is_collapsed: bool,
    pub comment_ids: Vec<u64>,
}

fn pull_number_from_url(url: &str) -> Option<u64> {
    let (prefix, number) = url.trim_end_matches('/').rsplit_once('/')?;
    if !prefix.ends_with("/pulls") {
        return None;
    }
    number.parse().ok()
}

/// Contents of `{repo}/data.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fixture {
    #[serde(default)]
    pub pulls: Vec<PullRequest>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    #[serde(default, alias = "review_threads")]
    pub review_threads: Vec<FixtureThread>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureThread {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "pull_number")]
    pub pull_number: Option<u64>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default, alias = "start_line")]
    pub start_line: Option<u64>,
    #[serde(default, alias = "side")]
    pub diff_side: Option<String>,
    #[serde(default)]
    pub is_resolved: bool,
    #[serde(default)]
    pub is_outdated: bool,
    #[serde(default)]
    pub is_collapsed: bool,
    #[serde(default)]
    pub comments: ThreadComments,
}

/// Fixture threads list comments either directly or as a `{nodes: [...]}` connection.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ThreadComments {
    Connection { nodes: Vec<FixtureThreadComment> },
    List(Vec<FixtureThreadComment>),
}

impl Default for ThreadComments {
    fn default() -> Self {
        ThreadComments::List(Vec::new())
    }
}

impl ThreadComments {
    pub fn into_vec(self) -> Vec<FixtureThreadComment> {
        match self {
            ThreadComments::Connection { nodes } => nodes,
            ThreadComments::List(comments) => comments,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureThreadComment {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub database_id: Option<u64>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub author: Option<FixtureAuthor>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FixtureAuthor {
    #[serde(default)]
    pub login: String,
}

/// Body of `POST .../pulls/{n}/comments`, and of inline review comments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentDraft {
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub start_line: Option<u64>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub start_side: Option<String>,
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub in_reply_to_id: Option<u64>,
    #[serde(default)]
    pub diff_hunk: Option<String>,
    #[serde(default)]
    pub position: Option<u64>,
}

/// Body of `POST .../pulls/{n}/reviews`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewDraft {
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub comments: Vec<CommentDraft>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pull_keeps_unknown_fields() {
        let pull: PullRequest = serde_json::from_value(json!({
            "number": 3,
            "title": "Add parser",
            "head": {"sha": "aaa", "ref": "feature", "label": "me:feature"},
            "base": {"sha": "bbb", "ref": "main"},
            "mergeable": true
        }))
        .unwrap();

        assert_eq!(pull.state, "open");
        assert_eq!(pull.head.ref_name, "feature");

        let value = serde_json::to_value(&pull).unwrap();
        assert_eq!(value["mergeable"], true);
        assert_eq!(value["head"]["label"], "me:feature");
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_comment_pull_from_url() {
        let comment: Comment = serde_json::from_value(json!({
            "id": 9,
            "body": "nit",
            "pull_request_url": "https://api.github.com/repos/o/r/pulls/12"
        }))
        .unwrap();
        assert_eq!(comment.pull(), Some(12));
        assert_eq!(comment.side, "RIGHT");
    }

    #[test]
    fn test_review_state_aliases() {
        let review: Review =
            serde_json::from_value(json!({"id": 1, "state": "REQUEST_CHANGES"})).unwrap();
        assert_eq!(review.state, ReviewState::ChangesRequested);
        assert_eq!(
            serde_json::to_value(review.state).unwrap(),
            json!("CHANGES_REQUESTED")
        );
    }

    #[test]
    fn test_review_event_parse() {
        assert_eq!(ReviewEvent::parse("approve"), Some(ReviewEvent::Approve));
        assert_eq!(
            ReviewEvent::parse("REQUEST_CHANGES").map(|e| e.target_state()),
            Some(ReviewState::ChangesRequested)
        );
        assert_eq!(ReviewEvent::parse("COMMENTED"), Some(ReviewEvent::Comment));
        assert_eq!(ReviewEvent::parse("MERGE"), None);
    }

    #[test]
    fn test_thread_comments_both_shapes() {
        let connection: FixtureThread = serde_json::from_value(json!({
            "id": "T1", "pull_number": 1, "path": "a.rs", "line": 4,
            "comments": {"nodes": [{"databaseId": 5, "body": "x"}]}
        }))
        .unwrap();
        assert_eq!(connection.pull_number, Some(1));
        assert_eq!(connection.comments.into_vec()[0].database_id, Some(5));

        let list: FixtureThread = serde_json::from_value(json!({
            "pullNumber": 2, "path": "b.rs", "isResolved": true,
            "comments": [{"databaseId": 6}]
        }))
        .unwrap();
        assert!(list.is_resolved);
        assert_eq!(list.comments.into_vec().len(), 1);
    }
}
