use tracing::debug;

use super::models::{Comment, CommentDraft, PullRequest, Review, ReviewDraft, ReviewEvent, ReviewState, ReviewThread};
use super::{new_thread_id, RepoData};
use crate::github::{github_timestamp, RepoLinks, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    NotFound,
    NotPending(ReviewState),
}

impl RepoData {
    pub fn pull(&self, number: u64) -> Option<&PullRequest> {
        self.pulls.get(&number)
    }

    pub fn pull_by_node_id(&self, node_id: &str) -> Option<&PullRequest> {
        self.pulls.values().find(|p| p.node_id == node_id)
    }

    pub fn comment(&self, id: u64) -> Option<&Comment> {
        self.comments.get(&id)
    }

    pub fn review(&self, id: u64) -> Option<&Review> {
        self.reviews.get(&id)
    }

    pub fn review_by_node_id(&self, node_id: &str) -> Option<&Review> {
        self.reviews.values().find(|r| r.node_id == node_id)
    }

    pub fn reviews_for(&self, pull_number: u64) -> Vec<&Review> {
        self.reviews
            .values()
            .filter(|r| r.pull() == Some(pull_number))
            .collect()
    }

    pub fn comments_for_review(&self, review_id: u64) -> Vec<&Comment> {
        self.comments
            .values()
            .filter(|c| c.pull_request_review_id == Some(review_id))
            .collect()
    }

    pub fn threads_for(&self, pull_number: u64) -> Vec<&ReviewThread> {
        self.threads
            .iter()
            .filter(|t| t.pull_number == pull_number)
            .collect()
    }

    pub fn thread(&self, id: &str) -> Option<&ReviewThread> {
        self.threads.iter().find(|t| t.id == id)
    }

    /// Comments a thread still references, in thread order.
    pub fn thread_comments(&self, thread: &ReviewThread) -> Vec<&Comment> {
        thread
            .comment_ids
            .iter()
            .filter_map(|id| self.comments.get(id))
            .collect()
    }

    /// Create a standalone comment; `None` when the pull does not exist.
    pub fn add_comment(
        &mut self,
        pull_number: u64,
        draft: CommentDraft,
        author: &User,
        links: &RepoLinks,
    ) -> Option<Comment> {
        let id = self.insert_comment(pull_number, None, draft, author, links)?;
        self.attach_to_thread(id);
        self.comments.get(&id).cloned()
    }

    /// Create a comment inside a review and return the id of the thread it joined.
    pub fn add_thread_comment(
        &mut self,
        pull_number: u64,
        review_id: Option<u64>,
        draft: CommentDraft,
        author: &User,
        links: &RepoLinks,
    ) -> Option<String> {
        let id = self.insert_comment(pull_number, review_id, draft, author, links)?;
        self.attach_to_thread(id)
    }

    pub fn edit_comment(&mut self, id: u64, body: Option<String>) -> Option<Comment> {
        let comment = self.comments.get_mut(&id)?;
        if let Some(body) = body {
            comment.body = body;
        }
        comment.updated_at = github_timestamp();
        Some(comment.clone())
    }

    /// Remove a comment and unlink it from its thread; emptied threads go away.
    pub fn delete_comment(&mut self, id: u64) -> Option<Comment> {
        let removed = self.comments.remove(&id)?;
        for thread in &mut self.threads {
            thread.comment_ids.retain(|c| *c != id);
        }
        self.threads.retain(|t| !t.comment_ids.is_empty());
        Some(removed)
    }

    /// Create a review (pending unless the draft carries a submitting event) along
    /// with its inline comments. `None` when the pull does not exist.
    pub fn create_review(
        &mut self,
        pull_number: u64,
        draft: ReviewDraft,
        author: &User,
        links: &RepoLinks,
    ) -> Option<Review> {
        let head_sha = self.pull(pull_number)?.head.sha.clone();

        let state = draft
            .event
            .as_deref()
            .and_then(ReviewEvent::parse)
            .map(|e| e.target_state())
            .unwrap_or(ReviewState::Pending);

        let id = self.next_review_id;
        self.next_review_id = self.next_review_id.saturating_add(1);

        let review = Review {
            id,
            node_id: self.review_node_id(id),
            user: author.clone(),
            body: draft.body.unwrap_or_default(),
            state,
            submitted_at: (state != ReviewState::Pending).then(github_timestamp),
            commit_id: Some(draft.commit_id.unwrap_or(head_sha)),
            pull_number: Some(pull_number),
            html_url: links.review_html(pull_number, id),
            pull_request_url: links.pull_api(pull_number),
            extra: Default::default(),
        };
        self.reviews.insert(id, review);
        debug!("Created review {} ({}) on PR #{}", id, state.as_str(), pull_number);

        for comment in draft.comments {
            self.add_thread_comment(pull_number, Some(id), comment, author, links);
        }

        self.reviews.get(&id).cloned()
    }

    /// Move a pending review of `pull_number` to the state named by `event`.
    pub fn submit_review(
        &mut self,
        pull_number: u64,
        review_id: u64,
        event: ReviewEvent,
        body: Option<String>,
    ) -> Result<Review, SubmitError> {
        let review = self
            .reviews
            .get_mut(&review_id)
            .filter(|r| r.pull() == Some(pull_number))
            .ok_or(SubmitError::NotFound)?;

        if review.state != ReviewState::Pending {
            return Err(SubmitError::NotPending(review.state));
        }

        review.state = event.target_state();
        if let Some(body) = body {
            review.body = body;
        }
        review.submitted_at = Some(github_timestamp());
        Ok(review.clone())
    }

    /// Flip a thread's resolved flag; `false` when no such thread exists.
    pub fn set_thread_resolved(&mut self, thread_id: &str, resolved: bool) -> bool {
        match self.threads.iter_mut().find(|t| t.id == thread_id) {
            Some(thread) => {
                thread.is_resolved = resolved;
                true
            }
            None => false,
        }
    }

    fn insert_comment(
        &mut self,
        pull_number: u64,
        review_id: Option<u64>,
        draft: CommentDraft,
        author: &User,
        links: &RepoLinks,
    ) -> Option<u64> {
        let head_sha = self.pull(pull_number)?.head.sha.clone();

        let id = self.next_comment_id;
        self.next_comment_id = self.next_comment_id.saturating_add(1);

        let now = github_timestamp();
        let commit_id = draft.commit_id.unwrap_or(head_sha);
        let comment = Comment {
            id,
            node_id: self.comment_node_id(id),
            pull_number: Some(pull_number),
            pull_request_review_id: review_id,
            in_reply_to_id: draft.in_reply_to_id,
            path: draft.path,
            line: draft.line,
            start_line: draft.start_line,
            side: draft.side.unwrap_or_else(super::models::default_side),
            start_side: draft.start_side,
            position: draft.position,
            original_position: draft.position,
            diff_hunk: draft.diff_hunk.unwrap_or_default(),
            original_commit_id: commit_id.clone(),
            commit_id,
            user: author.clone(),
            body: draft.body,
            created_at: now.clone(),
            updated_at: now,
            html_url: links.comment_html(pull_number, id),
            pull_request_url: links.pull_api(pull_number),
            extra: Default::default(),
        };
        self.comments.insert(id, comment);
        Some(id)
    }

    /// Replies join their parent's thread; other comments join or open the thread at
    /// `(pull, path, line)`.
    fn attach_to_thread(&mut self, comment_id: u64) -> Option<String> {
        let comment = self.comments.get(&comment_id)?;
        let pull_number = comment.pull()?;

        let parent_thread = comment.in_reply_to_id.and_then(|parent| {
            self.threads
                .iter()
                .position(|t| t.comment_ids.contains(&parent))
        });
        let anchored_thread = || {
            self.threads.iter().position(|t| {
                t.pull_number == pull_number && t.path == comment.path && t.line == comment.line
            })
        };

        if let Some(index) = parent_thread.or_else(anchored_thread) {
            let thread = &mut self.threads[index];
            thread.comment_ids.push(comment_id);
            return Some(thread.id.clone());
        }

        let thread = ReviewThread {
            id: new_thread_id(),
            pull_number,
            path: comment.path.clone(),
            line: comment.line,
            start_line: comment.start_line,
            diff_side: comment.side.clone(),
            is_resolved: false,
            is_outdated: false,
            is_collapsed: false,
            comment_ids: vec![comment_id],
        };
        let id = thread.id.clone();
        debug!("Opened thread {} at {}:{:?}", id, thread.path, thread.line);
        self.threads.push(thread);
        Some(id)
    }
}
