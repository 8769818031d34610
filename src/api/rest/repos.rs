//! User, repository listing and file contents.

use anyhow::Context;
use axum::{
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use sha1::{Digest, Sha1};
use std::path::{Component, Path, PathBuf};

use crate::api::response::{docs, github_error, json, not_found};
use crate::github::ContentFile;
use crate::state::AppState;

const BASE64_LINE: usize = 60;

/// `Authorization: Bearer <anything non-empty>` is all it takes.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

pub fn get_user(state: &AppState, headers: &HeaderMap) -> Response {
    if bearer_token(headers).is_none() {
        return github_error(
            StatusCode::UNAUTHORIZED,
            "Requires authentication",
            &docs("users/users", "get-the-authenticated-user"),
        );
    }

    let user = state.user();
    json(
        StatusCode::OK,
        &json!({
            "login": user.login,
            "id": user.id,
            "node_id": format!("U_mock_{}", user.login),
            "type": user.kind,
            "name": user.login,
            "html_url": format!("https://github.com/{}", user.login),
            "avatar_url": format!("https://avatars.githubusercontent.com/u/{}?v=4", user.id),
        }),
    )
}

pub async fn list_repos(state: &AppState) -> Response {
    json(StatusCode::OK, &state.repositories().await)
}

/// Serve a file from a pull's snapshot directories.
///
/// A `ref` equal to some pull's head SHA reads its `after/` tree and one equal to a base
/// SHA reads `before/`. Otherwise every pull is tried in order, `after/` first.
pub async fn get_contents(
    state: &AppState,
    repo: &str,
    path: &str,
    git_ref: Option<&String>,
) -> Response {
    let doc = docs("repos/contents", "get-repository-content");
    let path = path.trim_start_matches('/');
    let escapes = Path::new(path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if path.is_empty() || escapes {
        return not_found(&doc);
    }

    let candidates = {
        let data = state.load_repo_data(repo).await;
        let data = data.read().await;
        let repo_dir = state.repo_dir(repo);
        let snapshot = |number: u64, side: &str| repo_dir.join(number.to_string()).join(side);

        let by_ref = git_ref.and_then(|r| {
            data.pulls.values().find_map(|pull| {
                if pull.head.sha == *r {
                    Some(vec![(snapshot(pull.number, "after"), pull.head.sha.clone())])
                } else if pull.base.sha == *r {
                    Some(vec![(snapshot(pull.number, "before"), pull.base.sha.clone())])
                } else {
                    None
                }
            })
        });

        by_ref.unwrap_or_else(|| {
            data.pulls
                .values()
                .flat_map(|pull| {
                    [
                        (snapshot(pull.number, "after"), pull.head.sha.clone()),
                        (snapshot(pull.number, "before"), pull.base.sha.clone()),
                    ]
                })
                .collect::<Vec<(PathBuf, String)>>()
        })
    };

    let Some((file, sha_ref)) = candidates
        .into_iter()
        .map(|(dir, sha)| (dir.join(path), sha))
        .find(|(file, _)| file.is_file())
    else {
        return not_found(&doc);
    };

    let bytes = match tokio::fs::read(&file)
        .await
        .with_context(|| format!("reading {:?}", file))
    {
        Ok(bytes) => bytes,
        Err(e) => {
            state.error_log().record("getContents", &e);
            return github_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error", &doc);
        }
    };

    let links = state.links(repo);
    let sha = hex::encode(Sha1::digest(&bytes));
    let name = path.rsplit('/').next().unwrap_or(path).to_string();

    let content = ContentFile {
        kind: "file".to_string(),
        encoding: "base64".to_string(),
        name,
        path: path.to_string(),
        size: bytes.len() as u64,
        content: wrap_base64(&STANDARD.encode(&bytes)),
        url: links.contents(path, &sha_ref),
        html_url: links.blob(&sha_ref, path),
        download_url: links.raw(&sha_ref, path),
        sha,
    };
    json(StatusCode::OK, &content)
}

/// Break encoded content into newline-terminated lines of 60 characters.
fn wrap_base64(encoded: &str) -> String {
    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE + 1);
    for chunk in encoded.as_bytes().chunks(BASE64_LINE) {
        // base64 output is ASCII
        wrapped.push_str(&String::from_utf8_lossy(chunk));
        wrapped.push('\n');
    }
    wrapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("token abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn test_wrap_base64() {
        let encoded = "A".repeat(130);
        let wrapped = wrap_base64(&encoded);
        let lines: Vec<&str> = wrapped.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 60);
        assert_eq!(lines[2].len(), 10);
        assert!(wrapped.ends_with('\n'));
        assert_eq!(wrap_base64(""), "");
    }
}
