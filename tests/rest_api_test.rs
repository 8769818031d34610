//! REST surface driven through the full router.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::{repo_path, TestServer, OWNER, REPO};
use serde_json::json;

#[tokio::test]
async fn test_get_user_requires_bearer_token() {
    let server = TestServer::new();

    let (status, body) = server.get("/user").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Requires authentication");
    assert!(body["documentation_url"].as_str().unwrap().starts_with("https://docs.github.com"));

    let (status, body) = server
        .send(
            Request::get("/user")
                .header(header::AUTHORIZATION, "Bearer anything")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["login"], OWNER);
    assert_eq!(body["type"], "User");
}

#[tokio::test]
async fn test_list_repos_only_fixture_directories() {
    let server = TestServer::new();
    let (status, body) = server.get("/user/repos").await;

    assert_eq!(status, StatusCode::OK);
    let repos = body.as_array().unwrap();
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0]["name"], REPO);
    assert_eq!(repos[0]["full_name"], format!("{}/{}", OWNER, REPO));
    assert_eq!(repos[0]["open_issues_count"], 1);
    assert_eq!(repos[0]["language"], "Rust");
}

#[tokio::test]
async fn test_list_and_get_pulls() {
    let server = TestServer::new();

    let (status, body) = server.get(&repo_path("/pulls")).await;
    assert_eq!(status, StatusCode::OK);
    let numbers: Vec<u64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["number"].as_u64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2]);

    let (status, body) = server.get(&repo_path("/pulls/1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Rework example");
    assert_eq!(body["node_id"], "PR_mock_test_repo_1_1");
    assert_eq!(body["head"]["sha"], "head111");

    let (status, body) = server.get(&repo_path("/pulls/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");
}

#[tokio::test]
async fn test_unknown_repo_is_empty_not_error() {
    let server = TestServer::new();
    let (status, body) = server.get(&format!("/repos/{}/nothing_here/pulls", OWNER)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_unmatched_routes_get_github_404() {
    let server = TestServer::new();

    // Comments are only created, edited and deleted over REST.
    let (status, body) = server.get(&repo_path("/pulls/1/comments")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");

    let (status, _) = server.get("/no/such/route").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.get("/graphql").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Control routes with the wrong method also get the envelope, never a 405.
    let (status, body) = server.post("/heartbeat", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");

    let (status, body) = server.get("/reset").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");

    let (status, _) = server.get("/config").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.delete("/error-messages").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contents_by_ref() {
    let server = TestServer::new();

    let (status, body) = server.get(&repo_path("/contents/example.txt?ref=head111")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "file");
    assert_eq!(body["encoding"], "base64");
    assert_eq!(body["name"], "example.txt");
    let encoded: String = body["content"].as_str().unwrap().split('\n').collect();
    assert_eq!(STANDARD.decode(encoded).unwrap(), b"one\n2\nthree\nfour\n");

    let (_, body) = server.get(&repo_path("/contents/example.txt?ref=base111")).await;
    let encoded: String = body["content"].as_str().unwrap().split('\n').collect();
    assert_eq!(STANDARD.decode(encoded).unwrap(), b"one\ntwo\nthree\n");

    // No ref: after/ wins over before/.
    let (_, body) = server.get(&repo_path("/contents/example.txt")).await;
    let encoded: String = body["content"].as_str().unwrap().split('\n').collect();
    assert_eq!(STANDARD.decode(encoded).unwrap(), b"one\n2\nthree\nfour\n");

    // Only present in PR 2's before/.
    let (status, _) = server.get(&repo_path("/contents/utils.py")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_contents_wraps_at_sixty() {
    let server = TestServer::new();
    std::fs::write(server.repo_dir().join("1/after/long.txt"), "x".repeat(200)).unwrap();

    let (status, body) = server.get(&repo_path("/contents/long.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["size"], 200);
    for line in body["content"].as_str().unwrap().lines() {
        assert!(line.len() <= 60);
    }
}

#[tokio::test]
async fn test_contents_rejects_traversal_and_missing() {
    let server = TestServer::new();

    let (status, _) = server.get(&repo_path("/contents/../data.json")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.get(&repo_path("/contents/%2E%2E/data.json")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.get(&repo_path("/contents/missing.txt")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = server.get(&repo_path("/contents/src/../../data.json")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contents_allows_dots_inside_names() {
    let server = TestServer::new();
    std::fs::write(server.repo_dir().join("1/after/notes..v2.md"), "v2\n").unwrap();

    let (status, body) = server.get(&repo_path("/contents/notes..v2.md")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "notes..v2.md");
}

#[tokio::test]
async fn test_comment_create_edit_delete() {
    let server = TestServer::new();

    let (status, created) = server
        .post(
            &repo_path("/pulls/1/comments"),
            json!({"body": "Test REST comment", "path": "empty-lines.txt", "line": 3}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["id"], 2);
    assert_eq!(created["body"], "Test REST comment");
    assert_eq!(created["path"], "empty-lines.txt");
    assert_eq!(created["line"], 3);
    assert_eq!(created["side"], "RIGHT");
    assert_eq!(created["commit_id"], "head111");
    assert_eq!(created["user"]["login"], OWNER);

    let (status, edited) = server
        .json(Method::PATCH, &repo_path("/pulls/comments/2"), json!({"body": "Edited"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["body"], "Edited");
    assert_eq!(edited["path"], "empty-lines.txt");

    let (status, body) = server.delete(&repo_path("/pulls/comments/2")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, serde_json::Value::Null);

    let (status, _) = server.delete(&repo_path("/pulls/comments/2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_on_unknown_pull() {
    let server = TestServer::new();
    let (status, _) = server
        .post(&repo_path("/pulls/42/comments"), json!({"body": "x", "path": "a", "line": 1}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_degrades_to_defaults() {
    let server = TestServer::new();
    let (status, created) = server
        .send(
            Request::post(repo_path("/pulls/1/comments"))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ this is not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["body"], "");
    assert_eq!(created["side"], "RIGHT");
}

#[tokio::test]
async fn test_ids_continue_after_fixture_max() {
    let server = TestServer::new();
    let (_, first) = server
        .post(&repo_path("/pulls/1/comments"), json!({"body": "a", "path": "x", "line": 1}))
        .await;
    let (_, second) = server
        .post(&repo_path("/pulls/1/comments"), json!({"body": "b", "path": "x", "line": 2}))
        .await;
    assert_eq!(first["id"], 2);
    assert_eq!(second["id"], 3);

    let (_, review) = server.post(&repo_path("/pulls/1/reviews"), json!({})).await;
    assert_eq!(review["id"], 3);
}

#[tokio::test]
async fn test_review_lifecycle() {
    let server = TestServer::new();

    let (status, review) = server
        .post(
            &repo_path("/pulls/1/reviews"),
            json!({
                "body": "Draft",
                "comments": [{"path": "example.txt", "line": 3, "body": "inline"}]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["state"], "PENDING");
    assert_eq!(review["submitted_at"], serde_json::Value::Null);
    let id = review["id"].as_u64().unwrap();

    let (status, reviews) = server.get(&repo_path("/pulls/1/reviews")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews.as_array().unwrap().len(), 3);

    let events = repo_path(&format!("/pulls/1/reviews/{}/events", id));
    let (status, _) = server.post(&events, json!({"event": "BOGUS"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, submitted) = server
        .post(&events, json!({"event": "REQUEST_CHANGES", "body": "Please fix"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["state"], "CHANGES_REQUESTED");
    assert_eq!(submitted["body"], "Please fix");
    assert!(submitted["submitted_at"].is_string());

    let (status, _) = server.post(&events, json!({"event": "APPROVE"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = server
        .post(&repo_path("/pulls/2/reviews/1/events"), json!({"event": "APPROVE"}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_with_event_is_submitted() {
    let server = TestServer::new();
    let (status, review) = server
        .post(&repo_path("/pulls/1/reviews"), json!({"event": "APPROVE", "body": "ship it"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["state"], "APPROVED");
    assert!(review["submitted_at"].is_string());
}

#[tokio::test]
async fn test_cors_headers_and_preflight() {
    let server = TestServer::new();

    let response = tower::ServiceExt::oneshot(
        server.router.clone(),
        Request::builder()
            .method(Method::OPTIONS)
            .uri(repo_path("/pulls"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        response.headers()["access-control-allow-methods"],
        "GET, POST, PATCH, DELETE, OPTIONS"
    );

    let response = tower::ServiceExt::oneshot(
        server.router.clone(),
        Request::get("/heartbeat").body(Body::empty()).unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(
        response.headers()["access-control-allow-headers"],
        "Content-Type, Authorization"
    );
}
