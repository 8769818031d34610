//! Shared server state handed to every handler.

use anyhow::anyhow;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::config::AppConfig;
use crate::diff::DiffSynthesizer;
use crate::error::MockServerError;
use crate::github::{RepoLinks, Repository, User};
use crate::simulation::{ErrorLog, FaultConfig, FaultMode, FaultPatch};
use crate::store::{scan_repositories, RepoData};

pub type SharedRepo = Arc<RwLock<RepoData>>;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: AppConfig,
    owner: String,
    preset: Option<FaultPatch>,
    repositories: RwLock<Vec<Repository>>,
    cache: Mutex<HashMap<String, SharedRepo>>,
    faults: RwLock<FaultConfig>,
    error_log: ErrorLog,
    diff: DiffSynthesizer,
}

impl AppState {
    /// Scan the user root and apply the fault preset, if any.
    pub fn new(config: AppConfig, preset: Option<FaultPatch>) -> Result<Self, MockServerError> {
        let owner = config.owner();
        let repositories = scan_repositories(&config.data_dir, &owner)?;

        let mut faults = FaultConfig::new(config.latency_ms, config.silent);
        if let Some(preset) = preset.clone() {
            faults.apply(preset);
        }

        let error_log = ErrorLog::new();
        let diff = DiffSynthesizer::new(&config.git_binary, error_log.clone());

        Ok(Self {
            inner: Arc::new(Inner {
                owner,
                preset,
                repositories: RwLock::new(repositories),
                cache: Mutex::new(HashMap::new()),
                faults: RwLock::new(faults),
                error_log,
                diff,
                config,
            }),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn owner(&self) -> &str {
        &self.inner.owner
    }

    /// The authenticated user; author of everything created through the API.
    pub fn user(&self) -> User {
        User::new(&self.inner.owner)
    }

    pub fn links(&self, repo: &str) -> RepoLinks {
        RepoLinks::new(&self.inner.config.api_base(), &self.inner.owner, repo)
    }

    pub fn repo_dir(&self, repo: &str) -> PathBuf {
        self.inner.config.data_dir.join(repo)
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.inner.error_log
    }

    pub fn diff(&self) -> &DiffSynthesizer {
        &self.inner.diff
    }

    pub async fn repositories(&self) -> Vec<Repository> {
        self.inner.repositories.read().await.clone()
    }

    /// Cached store for `repo`; loaded from disk on first use.
    ///
    /// Unknown repositories and unreadable fixtures yield an empty store.
    pub async fn load_repo_data(&self, repo: &str) -> SharedRepo {
        let mut cache = self.inner.cache.lock().await;
        if let Some(data) = cache.get(repo) {
            return data.clone();
        }

        let escapes = matches!(repo, "" | "." | "..") || repo.contains(['/', '\\']);
        let data = if escapes {
            RepoData::empty(repo)
        } else {
            RepoData::load(&self.repo_dir(repo)).unwrap_or_else(|e| {
                self.inner
                    .error_log
                    .record("loadRepoData", &anyhow!(e).context(format!("repository {}", repo)));
                RepoData::empty(repo)
            })
        };

        let data = Arc::new(RwLock::new(data));
        cache.insert(repo.to_string(), data.clone());
        data
    }

    /// Every repository name the server knows: scanned ones plus any loaded since.
    async fn known_repos(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self
            .inner
            .repositories
            .read()
            .await
            .iter()
            .map(|r| r.name.clone())
            .collect();
        names.extend(self.inner.cache.lock().await.keys().cloned());
        names.into_iter().collect()
    }

    /// Find the repository and number of the pull with this GraphQL node id.
    pub async fn find_pull_by_node_id(&self, node_id: &str) -> Option<(String, SharedRepo, u64)> {
        for name in self.known_repos().await {
            let data = self.load_repo_data(&name).await;
            let number = data.read().await.pull_by_node_id(node_id).map(|p| p.number);
            if let Some(number) = number {
                return Some((name, data, number));
            }
        }
        None
    }

    /// Set the resolved flag of a thread in whichever repository holds it.
    pub async fn set_thread_resolved(&self, thread_id: &str, resolved: bool) -> bool {
        for name in self.known_repos().await {
            let data = self.load_repo_data(&name).await;
            if data.write().await.set_thread_resolved(thread_id, resolved) {
                return true;
            }
        }
        false
    }

    pub async fn faults(&self) -> FaultConfig {
        self.inner.faults.read().await.clone()
    }

    pub async fn fault_for(&self, endpoint: &str) -> Option<FaultMode> {
        self.inner.faults.read().await.fault_for(endpoint)
    }

    pub async fn latency(&self) -> Duration {
        self.inner.faults.read().await.latency()
    }

    pub async fn is_silent(&self) -> bool {
        self.inner.faults.read().await.silent
    }

    pub async fn merge_faults(&self, patch: FaultPatch) {
        let mut faults = self.inner.faults.write().await;
        faults.apply(patch);
        info!(
            "Fault configuration: {} errors, {}ms latency",
            faults.errors.len(),
            faults.latency_ms
        );
    }

    /// Rescan repositories, drop cached data and faults (keeping `silent` and the
    /// preset), and clear the error buffer.
    pub async fn reset(&self) {
        match scan_repositories(&self.inner.config.data_dir, &self.inner.owner) {
            Ok(repositories) => *self.inner.repositories.write().await = repositories,
            Err(e) => {
                self.inner.error_log.record("scanRepositories", &anyhow!(e));
                self.inner.repositories.write().await.clear();
            }
        }

        self.inner.cache.lock().await.clear();

        {
            let mut faults = self.inner.faults.write().await;
            faults.reset(self.inner.config.latency_ms);
            if let Some(preset) = self.inner.preset.clone() {
                faults.apply(preset);
            }
        }

        self.inner.error_log.clear();
        info!("State reset");
    }
}
