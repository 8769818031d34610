#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use gh_mock_server::api::build_router;
use gh_mock_server::config::AppConfig;
use gh_mock_server::state::AppState;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

pub const OWNER: &str = "test_user";
pub const REPO: &str = "test_repo_1";

/// Fixture tree: `test_user/test_repo_1` with two pulls, a pending and an approved
/// review, one comment and the thread holding it. PR 1 has both snapshots, PR 2 only
/// `before/`.
pub fn fixture_data() -> Value {
    json!({
        "pulls": [
            {
                "number": 1,
                "title": "Rework example",
                "state": "open",
                "head": {"sha": "head111", "ref": "feature"},
                "base": {"sha": "base111", "ref": "main"},
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-01-05T00:00:00Z"
            },
            {
                "number": 2,
                "title": "Drop helpers",
                "state": "closed",
                "head": {"sha": "head222", "ref": "cleanup"},
                "base": {"sha": "base222", "ref": "main"}
            }
        ],
        "comments": [
            {
                "id": 1,
                "pull_number": 1,
                "pull_request_review_id": 2,
                "path": "example.txt",
                "line": 2,
                "body": "Existing comment",
                "user": {"login": "reviewer"}
            }
        ],
        "reviews": [
            {"id": 1, "pull_number": 1, "state": "PENDING", "user": {"login": "test_user"}},
            {
                "id": 2,
                "pull_number": 1,
                "state": "APPROVED",
                "body": "LGTM",
                "user": {"login": "reviewer"},
                "submitted_at": "2024-01-04T00:00:00Z"
            }
        ],
        "reviewThreads": [
            {
                "id": "PRRT_existing",
                "pullNumber": 1,
                "path": "example.txt",
                "line": 2,
                "comments": {"nodes": [{"databaseId": 1}]}
            }
        ]
    })
}

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn build_fixture_tree(root: &Path) -> PathBuf {
    let user_dir = root.join(OWNER);
    let repo_dir = user_dir.join(REPO);

    write(
        &repo_dir.join("data.json"),
        &serde_json::to_string_pretty(&fixture_data()).unwrap(),
    );

    write(&repo_dir.join("1/before/example.txt"), "one\ntwo\nthree\n");
    write(&repo_dir.join("1/after/example.txt"), "one\n2\nthree\nfour\n");
    write(&repo_dir.join("1/before/removed.js"), "console.log('bye');\n");
    write(&repo_dir.join("1/after/added.rs"), "fn main() {}\n");
    write(&repo_dir.join("1/after/src/lib.rs"), "pub fn answer() -> u32 {\n    42\n}\n");

    write(&repo_dir.join("2/before/utils.py"), "def helper():\n    pass\n");

    // Not a repository: no data.json
    write(&user_dir.join("scratch/notes.md"), "todo\n");

    user_dir
}

pub struct TestServer {
    pub dir: TempDir,
    pub state: AppState,
    pub router: Router,
}

impl TestServer {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let user_dir = build_fixture_tree(dir.path());
        let state = AppState::new(AppConfig::for_data_dir(&user_dir), None).unwrap();
        let router = build_router(state.clone());
        Self { dir, state, router }
    }

    pub fn repo_dir(&self) -> PathBuf {
        self.dir.path().join(OWNER).join(REPO)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        self.send(Request::get(path).body(Body::empty()).unwrap()).await
    }

    pub async fn delete(&self, path: &str) -> (StatusCode, Value) {
        self.send(
            Request::delete(path)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn json(&self, method: Method, path: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(method)
                .uri(path)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::POST, path, body).await
    }

    pub async fn graphql(&self, query: &str, variables: Value) -> (StatusCode, Value) {
        self.post("/graphql", json!({ "query": query, "variables": variables }))
            .await
    }

    pub async fn configure(&self, config: Value) {
        let (status, _) = self.post("/config", config).await;
        assert_eq!(status, StatusCode::OK);
    }
}

pub fn repo_path(suffix: &str) -> String {
    format!("/repos/{}/{}{}", OWNER, REPO, suffix)
}

pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

pub const REVIEW_THREADS_QUERY: &str = r#"
query($owner: String!, $repo: String!, $prNumber: Int!) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $prNumber) {
      reviewThreads(first: 100) {
        nodes {
          id
          path
          line
          isResolved
          comments { nodes { id databaseId body path line } }
        }
      }
    }
  }
}"#;

pub const REVIEWS_QUERY: &str = r#"
query($owner: String!, $repo: String!, $prNumber: Int!) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $prNumber) {
      reviews(first: 100) {
        nodes { id databaseId state body comments { nodes { id body } } }
      }
    }
  }
}"#;

pub const ADD_THREAD_MUTATION: &str = r#"
mutation($input: AddPullRequestReviewThreadInput!) {
  addPullRequestReviewThread(input: $input) {
    thread {
      id
      isResolved
      comments { nodes { id databaseId body path line } }
    }
  }
}"#;

pub fn pr_variables(number: u64) -> Value {
    json!({ "owner": OWNER, "repo": REPO, "prNumber": number })
}
