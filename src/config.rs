pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::MockServerError;

/// Settings file looked up in the working directory (any format the `config` crate knows).
const SETTINGS_FILE: &str = "gh-mock-server";
const ENV_PREFIX: &str = "GH_MOCK";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User root: one subdirectory per repository.
    pub data_dir: PathBuf,
    pub server_host: String,
    pub server_port: u16,
    pub public_url: Option<String>,
    pub user_login: Option<String>,
    pub git_binary: String,
    pub latency_ms: u64,
    pub silent: bool,
    pub fault_file: Option<PathBuf>,
}

impl AppConfig {
    /// Defaults, then the optional settings file, then `GH_MOCK_*` environment variables.
    pub fn load() -> Result<Self, MockServerError> {
        let settings = config::Config::builder()
            .set_default("data_dir", "tools/test_user")?
            .set_default("server_host", "127.0.0.1")?
            .set_default("server_port", 3000)?
            .set_default("git_binary", "git")?
            .set_default("latency_ms", 0)?
            .set_default("silent", false)?
            .add_source(config::File::with_name(SETTINGS_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Configuration rooted at `data_dir` with every other field at its default.
    pub fn for_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            server_host: "127.0.0.1".to_string(),
            server_port: 3000,
            public_url: None,
            user_login: None,
            git_binary: "git".to_string(),
            latency_ms: 0,
            silent: false,
            fault_file: None,
        }
    }

    /// Login of the authenticated user, which is also the owner of every repository.
    pub fn owner(&self) -> String {
        if let Some(login) = self.user_login.as_deref().filter(|l| !l.is_empty()) {
            return login.to_string();
        }
        self.data_dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "test_user".to_string())
    }

    /// Base URL clients use to reach this server, without a trailing slash.
    pub fn api_base(&self) -> String {
        match self.public_url.as_deref() {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("http://localhost:{}", self.server_port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_defaults_to_data_dir_name() {
        let config = AppConfig::for_data_dir("/srv/fixtures/test_user");
        assert_eq!(config.owner(), "test_user");
    }

    #[test]
    fn test_owner_prefers_explicit_login() {
        let mut config = AppConfig::for_data_dir("/srv/fixtures/test_user");
        config.user_login = Some("octocat".to_string());
        assert_eq!(config.owner(), "octocat");
    }

    #[test]
    fn test_api_base() {
        let mut config = AppConfig::for_data_dir("fixtures");
        config.server_port = 4010;
        assert_eq!(config.api_base(), "http://localhost:4010");

        config.public_url = Some("http://mock.internal:9000/".to_string());
        assert_eq!(config.api_base(), "http://mock.internal:9000");
    }
}
