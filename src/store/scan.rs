//! Repository discovery
//!
//! A subdirectory of the user root is a repository when it holds a `data.json`. Its
//! metadata (open PR count, timestamps, language) is derived from that fixture.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::models::{Fixture, PullRequest};
use super::FIXTURE_FILE;
use crate::error::MockServerError;
use crate::github::{RepoLinks, Repository, User};

/// Extensions checked in order; the first one present names the language.
const LANGUAGE_PRIORITY: &[(&str, &str)] = &[
    ("rs", "Rust"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("js", "JavaScript"),
    ("jsx", "JavaScript"),
    ("py", "Python"),
    ("go", "Go"),
    ("java", "Java"),
    ("kt", "Kotlin"),
    ("cs", "C#"),
    ("cpp", "C++"),
    ("c", "C"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("swift", "Swift"),
];

pub fn scan_repositories(user_dir: &Path, owner: &str) -> Result<Vec<Repository>, MockServerError> {
    info!("Scanning repositories under {:?}", user_dir);

    let mut names = Vec::new();
    for entry in fs::read_dir(user_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() && path.join(FIXTURE_FILE).is_file() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();

    let repositories: Vec<Repository> = names
        .iter()
        .enumerate()
        .map(|(index, name)| describe_repository(user_dir, owner, name, index as u64 + 1))
        .collect();

    info!("Found {} repositories", repositories.len());
    Ok(repositories)
}

fn describe_repository(user_dir: &Path, owner: &str, name: &str, id: u64) -> Repository {
    let repo_dir = user_dir.join(name);
    let pulls = read_pulls(&repo_dir);
    let links = RepoLinks::new("", owner, name);

    let open_issues_count = pulls.iter().filter(|p| p.state == "open").count() as u64;
    let created_at = pulls.iter().filter_map(|p| p.created_at.clone()).min();
    let updated_at = pulls.iter().filter_map(|p| p.updated_at.clone()).max();

    Repository {
        id,
        node_id: format!("R_mock_{}", name),
        name: name.to_string(),
        full_name: format!("{}/{}", owner, name),
        owner: User::new(owner),
        private: false,
        html_url: links.repo_html(),
        description: None,
        language: guess_language(&repo_dir, &pulls),
        open_issues_count,
        default_branch: "main".to_string(),
        created_at,
        pushed_at: updated_at.clone(),
        updated_at,
    }
}

fn read_pulls(repo_dir: &Path) -> Vec<PullRequest> {
    let path = repo_dir.join(FIXTURE_FILE);
    let parsed = fs::read_to_string(&path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Fixture>(&raw).map_err(|e| e.to_string()));

    match parsed {
        Ok(fixture) => fixture.pulls,
        Err(e) => {
            warn!("Could not read pulls from {:?}: {}", path, e);
            Vec::new()
        }
    }
}

/// Look at the first pull (by number) that has an `after/` snapshot.
fn guess_language(repo_dir: &Path, pulls: &[PullRequest]) -> Option<String> {
    let mut numbers: Vec<u64> = pulls.iter().map(|p| p.number).collect();
    numbers.sort_unstable();

    let after_dir = numbers
        .iter()
        .map(|n| repo_dir.join(n.to_string()).join("after"))
        .find(|dir| dir.is_dir())?;

    let mut extensions = HashSet::new();
    collect_extensions(&after_dir, &mut extensions);

    LANGUAGE_PRIORITY
        .iter()
        .find(|(ext, _)| extensions.contains(*ext))
        .map(|(_, language)| language.to_string())
}

fn collect_extensions(dir: &Path, extensions: &mut HashSet<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_extensions(&path, extensions);
        } else if let Some(ext) = path.extension() {
            extensions.insert(ext.to_string_lossy().to_ascii_lowercase());
        }
    }
}
