//! Repository data store
//!
//! One `RepoData` per repository directory, built from `{repo}/data.json` and then
//! mutated in memory for the lifetime of the process.

pub mod models;
pub mod queries;
pub mod scan;

pub use models::{
    Comment, CommentDraft, PullRequest, Review, ReviewDraft, ReviewEvent, ReviewState,
    ReviewThread,
};
pub use queries::SubmitError;
pub use scan::scan_repositories;

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::MockServerError;
use crate::github::User;
use models::{Fixture, FixtureThread};

pub const FIXTURE_FILE: &str = "data.json";

/// In-memory tables for one repository.
#[derive(Debug, Clone)]
pub struct RepoData {
    pub name: String,
    pub pulls: BTreeMap<u64, PullRequest>,
    pub comments: BTreeMap<u64, Comment>,
    pub reviews: BTreeMap<u64, Review>,
    /// Kept in creation order.
    pub threads: Vec<ReviewThread>,
    pub next_comment_id: u64,
    pub next_review_id: u64,
}

impl RepoData {
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pulls: BTreeMap::new(),
            comments: BTreeMap::new(),
            reviews: BTreeMap::new(),
            threads: Vec::new(),
            next_comment_id: 1,
            next_review_id: 1,
        }
    }

    /// Read `{repo_dir}/data.json`; a missing file yields an empty store.
    pub fn load(repo_dir: &Path) -> Result<Self, MockServerError> {
        let name = repo_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let path = repo_dir.join(FIXTURE_FILE);

        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No fixture for {}, serving empty data", name);
                return Ok(Self::empty(&name));
            }
            Err(e) => return Err(MockServerError::fixture(&path, e)),
        };

        let fixture: Fixture =
            serde_json::from_str(&raw).map_err(|e| MockServerError::fixture(&path, e))?;
        let data = Self::from_fixture(&name, fixture);

        info!(
            "Loaded {}: {} pulls, {} comments, {} reviews, {} threads",
            name,
            data.pulls.len(),
            data.comments.len(),
            data.reviews.len(),
            data.threads.len()
        );
        Ok(data)
    }

    pub fn from_fixture(name: &str, fixture: Fixture) -> Self {
        let mut data = Self::empty(name);

        for mut pull in fixture.pulls {
            if pull.node_id.is_empty() {
                pull.node_id = data.pull_node_id(pull.number);
            }
            data.pulls.insert(pull.number, pull);
        }
        for mut comment in fixture.comments {
            if comment.node_id.is_empty() {
                comment.node_id = data.comment_node_id(comment.id);
            }
            data.comments.insert(comment.id, comment);
        }
        for mut review in fixture.reviews {
            if review.node_id.is_empty() {
                review.node_id = data.review_node_id(review.id);
            }
            data.reviews.insert(review.id, review);
        }

        data.next_comment_id = next_id(data.comments.keys());
        data.next_review_id = next_id(data.reviews.keys());

        for thread in fixture.review_threads {
            data.import_thread(thread);
        }
        data
    }

    /// Link a fixture thread to comment rows, materialising rows the table lacks.
    fn import_thread(&mut self, fixture: FixtureThread) {
        let mut comment_ids = Vec::new();
        let mut pull_number = fixture.pull_number;

        for node in fixture.comments.into_vec() {
            if let Some(existing) = node.database_id.and_then(|id| self.comments.get(&id)) {
                pull_number = pull_number.or_else(|| existing.pull());
                comment_ids.push(existing.id);
                continue;
            }

            let id = match node.database_id {
                Some(id) => id,
                None => self.next_comment_id,
            };
            self.next_comment_id = self.next_comment_id.max(id.saturating_add(1));

            let created_at = node.created_at.unwrap_or_default();
            let comment = Comment {
                id,
                node_id: match node.id.as_ref().and_then(|v| v.as_str()) {
                    Some(node_id) => node_id.to_string(),
                    None => self.comment_node_id(id),
                },
                pull_number,
                pull_request_review_id: None,
                in_reply_to_id: comment_ids.first().copied(),
                path: node.path.unwrap_or_else(|| fixture.path.clone()),
                line: node.line.or(fixture.line),
                start_line: fixture.start_line,
                side: fixture
                    .diff_side
                    .clone()
                    .unwrap_or_else(models::default_side),
                start_side: None,
                position: None,
                original_position: None,
                diff_hunk: String::new(),
                commit_id: String::new(),
                original_commit_id: String::new(),
                user: User::new(&node.author.map(|a| a.login).unwrap_or_default()),
                body: node.body,
                updated_at: node.updated_at.unwrap_or_else(|| created_at.clone()),
                created_at,
                html_url: String::new(),
                pull_request_url: String::new(),
                extra: Default::default(),
            };
            self.comments.insert(id, comment);
            comment_ids.push(id);
        }

        let thread = ReviewThread {
            id: fixture.id.unwrap_or_else(new_thread_id),
            pull_number: pull_number.unwrap_or_default(),
            path: fixture.path,
            line: fixture.line,
            start_line: fixture.start_line,
            diff_side: fixture.diff_side.unwrap_or_else(models::default_side),
            is_resolved: fixture.is_resolved,
            is_outdated: fixture.is_outdated,
            is_collapsed: fixture.is_collapsed,
            comment_ids,
        };
        self.threads.push(thread);
    }

    pub(crate) fn pull_node_id(&self, number: u64) -> String {
        format!("PR_mock_{}_{}", self.name, number)
    }

    pub(crate) fn comment_node_id(&self, id: u64) -> String {
        format!("PRRC_mock_{}_{}", self.name, id)
    }

    pub(crate) fn review_node_id(&self, id: u64) -> String {
        format!("PRR_mock_{}_{}", self.name, id)
    }
}

pub(crate) fn new_thread_id() -> String {
    format!("PRRT_{}", Uuid::new_v4().simple())
}

fn next_id<'a>(ids: impl Iterator<Item = &'a u64>) -> u64 {
    ids.max().map(|max| max.saturating_add(1)).unwrap_or(1)
}
