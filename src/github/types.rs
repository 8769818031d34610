use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

const WEB_BASE: &str = "https://github.com";

/// Current time in GitHub's timestamp format (`2024-01-31T12:00:00Z`).
pub fn github_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub id: u64,
    #[serde(rename = "type", default = "default_user_type")]
    pub kind: String,
}

fn default_user_type() -> String {
    "User".to_string()
}

impl Default for User {
    fn default() -> Self {
        Self {
            login: String::new(),
            id: 0,
            kind: default_user_type(),
        }
    }
}

impl User {
    pub fn new(login: &str) -> Self {
        Self {
            login: login.to_string(),
            id: 1,
            kind: default_user_type(),
        }
    }
}

/// Repository record served by `/user/repos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub node_id: String,
    pub name: String,
    pub full_name: String,
    pub owner: User,
    pub private: bool,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub open_issues_count: u64,
    pub default_branch: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub pushed_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    Renamed,
}

/// One entry of `GET /repos/{owner}/{repo}/pulls/{n}/files`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDiffRecord {
    pub sha: String,
    pub filename: String,
    pub status: FileStatus,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
    pub blob_url: String,
    pub raw_url: String,
    pub contents_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_filename: Option<String>,
}

/// Body of `GET /repos/{owner}/{repo}/contents/{path}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentFile {
    #[serde(rename = "type")]
    pub kind: String,
    pub encoding: String,
    pub name: String,
    pub path: String,
    pub size: u64,
    pub sha: String,
    pub content: String,
    pub url: String,
    pub html_url: String,
    pub download_url: String,
}

/// GitHub's REST error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub documentation_url: String,
}

/// URL builder for one repository.
#[derive(Debug, Clone)]
pub struct RepoLinks {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
}

impl RepoLinks {
    pub fn new(api_base: &str, owner: &str, repo: &str) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

    pub fn repo_html(&self) -> String {
        format!("{}/{}/{}", WEB_BASE, self.owner, self.repo)
    }

    pub fn pull_api(&self, number: u64) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_base, self.owner, self.repo, number
        )
    }

    pub fn pull_html(&self, number: u64) -> String {
        format!("{}/pull/{}", self.repo_html(), number)
    }

    pub fn comment_html(&self, number: u64, comment_id: u64) -> String {
        format!("{}#discussion_r{}", self.pull_html(number), comment_id)
    }

    pub fn review_html(&self, number: u64, review_id: u64) -> String {
        format!("{}#pullrequestreview-{}", self.pull_html(number), review_id)
    }

    pub fn contents(&self, path: &str, git_ref: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_base, self.owner, self.repo, path, git_ref
        )
    }

    pub fn blob(&self, sha: &str, path: &str) -> String {
        format!("{}/blob/{}/{}", self.repo_html(), sha, path)
    }

    pub fn raw(&self, sha: &str, path: &str) -> String {
        format!("{}/raw/{}/{}", self.repo_html(), sha, path)
    }
}
