//! Fault preset loader
//! Reads a YAML or JSON file shaped like the `/config` request body.

use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::MockServerError;
use crate::simulation::FaultPatch;

/// Load a fault preset; the format is picked from the file extension.
pub fn load_fault_preset(path: &Path) -> Result<FaultPatch, MockServerError> {
    info!("Loading fault preset from: {:?}", path);

    if !path.exists() {
        return Err(MockServerError::ConfigError(format!(
            "Fault preset not found: {:?}",
            path
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        MockServerError::ConfigError(format!("Failed to read {:?}: {}", path, e))
    })?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let patch = if is_json {
        serde_json::from_str(&contents)?
    } else {
        serde_yaml::from_str(&contents)?
    };

    Ok(patch)
}
