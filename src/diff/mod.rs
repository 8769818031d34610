//! Diff synthesis
//!
//! Builds the `pulls/{n}/files` records for a pull by diffing its `before/` and `after/`
//! snapshot directories with `git diff --no-index`. Nothing is cached; every call reruns
//! the subprocesses.

pub mod numstat;
pub mod patch;

use sha1::{Digest, Sha1};
use std::path::Path;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::MockServerError;
use crate::github::{FileDiffRecord, FileStatus, RepoLinks};
use crate::simulation::ErrorLog;
use numstat::{parse_numstat, NumstatEntry};
use patch::split_patches;

const MISSING_SHA: &str = "0000000000000000000000000000000000000000";

pub struct DiffSynthesizer {
    git_binary: String,
    error_log: ErrorLog,
    /// Held for the whole of one pull's diff so subprocesses never overlap.
    lock: Mutex<()>,
}

impl DiffSynthesizer {
    pub fn new(git_binary: &str, error_log: ErrorLog) -> Self {
        Self {
            git_binary: git_binary.to_string(),
            error_log,
            lock: Mutex::new(()),
        }
    }

    /// File records for pull `number` of the repository stored at `repo_dir`.
    ///
    /// Returns an empty list when either snapshot directory is missing or the diff tool
    /// cannot be run.
    pub async fn generate_file_diffs(
        &self,
        repo_dir: &Path,
        number: u64,
        head_sha: &str,
        links: &RepoLinks,
    ) -> Vec<FileDiffRecord> {
        let pr_dir = repo_dir.join(number.to_string());
        let before = pr_dir.join("before");
        let after = pr_dir.join("after");
        if !before.is_dir() || !after.is_dir() {
            warn!(
                "Missing before/after snapshot for {} pull {} in {:?}",
                links.repo, number, pr_dir
            );
            return Vec::new();
        }

        let _guard = self.lock.lock().await;
        let stats = self.run_diff(&pr_dir, Some("--numstat")).await;
        let full = self.run_diff(&pr_dir, None).await;

        let patches = split_patches(&full);
        let mut records = Vec::new();
        for entry in parse_numstat(&stats) {
            let snapshot = match entry.status {
                FileStatus::Removed => &before,
                _ => &after,
            };
            let sha = content_sha(&snapshot.join(&entry.filename)).await;
            let patch = if entry.binary {
                None
            } else {
                patches.get(&entry.filename).cloned()
            };
            records.push(to_record(entry, sha, patch, head_sha, links));
        }

        debug!("Synthesized {} file diffs for pull {}", records.len(), number);
        records
    }

    async fn run_diff(&self, pr_dir: &Path, mode: Option<&str>) -> String {
        let mut command = Command::new(&self.git_binary);
        command
            .args(["-c", "core.quotepath=off", "diff", "--no-index", "--no-color", "--no-ext-diff"])
            .args(["--src-prefix=a/", "--dst-prefix=b/"])
            .args(mode)
            .args(["--", "before", "after"])
            .current_dir(pr_dir);

        let output = match command.output().await {
            Ok(output) => output,
            Err(e) => {
                let err = anyhow::Error::new(MockServerError::diff_tool(&self.git_binary, e))
                    .context(format!("diffing {:?}", pr_dir));
                self.error_log.record("generateFileDiffs", &err);
                return String::new();
            }
        };

        // Exit status 1 only means the trees differ.
        if output.status.code().map_or(true, |code| code > 1) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} diff exited with {}: {}", self.git_binary, output.status, stderr.trim());
            let err = anyhow::Error::new(MockServerError::diff_tool(
                &self.git_binary,
                format!("exited with {}: {}", output.status, stderr.trim()),
            ))
            .context(format!("diffing {:?}", pr_dir));
            self.error_log.record("generateFileDiffs", &err);
        }
        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}

fn to_record(
    entry: NumstatEntry,
    sha: String,
    patch: Option<String>,
    head_sha: &str,
    links: &RepoLinks,
) -> FileDiffRecord {
    FileDiffRecord {
        blob_url: links.blob(&sha, &entry.filename),
        raw_url: links.raw(&sha, &entry.filename),
        contents_url: links.contents(&entry.filename, head_sha),
        sha,
        status: entry.status,
        additions: entry.additions,
        deletions: entry.deletions,
        changes: entry.additions + entry.deletions,
        patch,
        previous_filename: entry.previous_filename,
        filename: entry.filename,
    }
}

async fn content_sha(path: &Path) -> String {
    match tokio::fs::read(path).await {
        Ok(bytes) => hex::encode(Sha1::digest(&bytes)),
        Err(_) => MISSING_SHA.to_string(),
    }
}
