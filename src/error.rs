use thiserror::Error;

impl From<serde_json::Error> for MockServerError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for MockServerError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::SerializationError(format!("YAML error: {}", err))
    }
}

impl From<std::io::Error> for MockServerError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<config::ConfigError> for MockServerError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum MockServerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Diff synthesis error: {0}")]
    DiffError(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl MockServerError {
    pub fn fixture(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::StoreError(format!("Failed to load fixture {:?}: {}", path, err))
    }

    pub fn diff_tool(cmd: &str, err: impl std::fmt::Display) -> Self {
        Self::DiffError(format!("Failed to run {}: {}", cmd, err))
    }
}
