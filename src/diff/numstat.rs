//! `git diff --numstat` parsing
//!
//! Paths come back relative to the PR directory, so every one starts with `before/` or
//! `after/`. Added and removed files pair a snapshot path with `/dev/null`; files present
//! on both sides come back as a rename, either `{before => after}/x` or
//! `before/x => after/y`.

use crate::github::FileStatus;

const DEV_NULL: &str = "/dev/null";
const ARROW: &str = " => ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumstatEntry {
    pub filename: String,
    pub previous_filename: Option<String>,
    pub status: FileStatus,
    pub additions: u64,
    pub deletions: u64,
    pub binary: bool,
}

pub fn parse_numstat(output: &str) -> Vec<NumstatEntry> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<NumstatEntry> {
    let mut fields = line.splitn(3, '\t');
    let added = fields.next()?;
    let deleted = fields.next()?;
    let path = fields.next()?.trim_end();
    if path.is_empty() {
        return None;
    }

    let binary = added == "-" || deleted == "-";
    let additions = added.parse().unwrap_or(0);
    let deletions = deleted.parse().unwrap_or(0);

    let (old, new) = split_path_field(path);
    let old = old.map(|p| strip_snapshot(&p));
    let new = new.map(|p| strip_snapshot(&p));

    let (filename, previous_filename, status) = match (old, new) {
        (None, Some(new)) => (new, None, FileStatus::Added),
        (Some(old), None) => (old, None, FileStatus::Removed),
        (Some(old), Some(new)) if old == new => (new, None, FileStatus::Modified),
        (Some(old), Some(new)) => (new, Some(old), FileStatus::Renamed),
        (None, None) => return None,
    };

    Some(NumstatEntry {
        filename,
        previous_filename,
        status,
        additions,
        deletions,
        binary,
    })
}

/// Split a numstat path into its old and new sides; `/dev/null` becomes `None`.
fn split_path_field(path: &str) -> (Option<String>, Option<String>) {
    if !path.contains(ARROW) {
        // A lone snapshot path only exists on that side.
        let path = path.to_string();
        return if path.starts_with("after/") {
            (None, Some(path))
        } else if path.starts_with("before/") {
            (Some(path), None)
        } else {
            (Some(path.clone()), Some(path))
        };
    }

    let braced = path.find('{').and_then(|open| {
        let close = open + path[open..].find('}')?;
        let (old, new) = path[open + 1..close].split_once(ARROW)?;
        let prefix = &path[..open];
        let suffix = &path[close + 1..];
        Some((
            join_rename_part(prefix, old, suffix),
            join_rename_part(prefix, new, suffix),
        ))
    });

    let (old, new) = match braced {
        Some(pair) => pair,
        None => match path.split_once(ARROW) {
            Some((old, new)) => (old.to_string(), new.to_string()),
            None => (path.to_string(), path.to_string()),
        },
    };

    (non_null(old), non_null(new))
}

fn join_rename_part(prefix: &str, middle: &str, suffix: &str) -> String {
    format!("{}{}{}", prefix, middle, suffix).replace("//", "/")
}

fn non_null(path: String) -> Option<String> {
    if path == DEV_NULL {
        None
    } else {
        Some(path)
    }
}

/// Drop the leading `before/` or `after/` directory.
pub fn strip_snapshot(path: &str) -> String {
    let path = path.trim_start_matches('/');
    path.strip_prefix("before/")
        .or_else(|| path.strip_prefix("after/"))
        .unwrap_or(path)
        .to_string()
}
