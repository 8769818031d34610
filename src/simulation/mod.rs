//! Fault and latency injection
//!
//! Every API handler is looked up here by its endpoint name before it touches the
//! store. A configured numeric code short-circuits with GitHub's canned error for that
//! code; `timeout` leaves the connection open without ever answering.

pub mod error_log;

pub use error_log::{ErrorEntry, ErrorLog};

use axum::http::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Injected behavior for one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFault", into = "RawFault")]
pub enum FaultMode {
    /// Answer with this HTTP status and GitHub's canned message.
    Status(u16),
    /// Never answer.
    Timeout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawFault {
    Code(u16),
    Text(String),
}

impl TryFrom<RawFault> for FaultMode {
    type Error = String;

    fn try_from(raw: RawFault) -> Result<Self, Self::Error> {
        match raw {
            RawFault::Code(code) => Ok(FaultMode::Status(code)),
            RawFault::Text(text) if text.eq_ignore_ascii_case("timeout") => Ok(FaultMode::Timeout),
            RawFault::Text(text) => text
                .trim()
                .parse::<u16>()
                .map(FaultMode::Status)
                .map_err(|_| format!("unsupported fault value: {}", text)),
        }
    }
}

impl From<FaultMode> for RawFault {
    fn from(mode: FaultMode) -> Self {
        match mode {
            FaultMode::Status(code) => RawFault::Code(code),
            FaultMode::Timeout => RawFault::Text("timeout".to_string()),
        }
    }
}

impl FaultMode {
    /// Status line for a numeric fault; out-of-range codes become 500.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FaultMode::Status(code) if (100..600).contains(code) => {
                Some(StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR))
            }
            FaultMode::Status(_) => Some(StatusCode::INTERNAL_SERVER_ERROR),
            FaultMode::Timeout => None,
        }
    }
}

/// Partial update accepted by `/config` and by fault preset files.
/// A `null` error value removes that endpoint's entry; unsupported values are skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaultPatch {
    #[serde(default, deserialize_with = "lenient_errors")]
    pub errors: Option<HashMap<String, Option<FaultMode>>>,
    #[serde(default)]
    pub latency: Option<u64>,
    #[serde(default)]
    pub silent: Option<bool>,
}

fn lenient_errors<'de, D>(
    deserializer: D,
) -> Result<Option<HashMap<String, Option<FaultMode>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<HashMap<String, Value>>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let errors = raw
        .into_iter()
        .filter_map(|(endpoint, value)| {
            match serde_json::from_value::<Option<FaultMode>>(value) {
                Ok(mode) => Some((endpoint, mode)),
                Err(e) => {
                    debug!("Skipping fault for {}: {}", endpoint, e);
                    None
                }
            }
        })
        .collect();
    Ok(Some(errors))
}

/// Live injection settings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FaultConfig {
    pub errors: HashMap<String, FaultMode>,
    #[serde(rename = "latency")]
    pub latency_ms: u64,
    pub silent: bool,
}

impl FaultConfig {
    pub fn new(latency_ms: u64, silent: bool) -> Self {
        Self {
            errors: HashMap::new(),
            latency_ms,
            silent,
        }
    }

    pub fn apply(&mut self, patch: FaultPatch) {
        if let Some(errors) = patch.errors {
            for (endpoint, mode) in errors {
                match mode {
                    Some(mode) => {
                        self.errors.insert(endpoint, mode);
                    }
                    None => {
                        self.errors.remove(&endpoint);
                    }
                }
            }
        }
        if let Some(latency) = patch.latency {
            self.latency_ms = latency;
        }
        if let Some(silent) = patch.silent {
            self.silent = silent;
        }
    }

    /// Clear errors and return latency to its startup value; `silent` survives.
    pub fn reset(&mut self, latency_ms: u64) {
        self.errors.clear();
        self.latency_ms = latency_ms;
    }

    pub fn fault_for(&self, endpoint: &str) -> Option<FaultMode> {
        self.errors.get(endpoint).copied()
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

/// Message GitHub sends with an error of this status.
pub fn canned_message(status: StatusCode) -> String {
    match status.as_u16() {
        400 => "Bad Request".to_string(),
        401 => "Requires authentication".to_string(),
        403 => "Forbidden".to_string(),
        404 => "Not Found".to_string(),
        409 => "Conflict".to_string(),
        422 => "Validation Failed".to_string(),
        429 => "API rate limit exceeded".to_string(),
        500 => "Internal Server Error".to_string(),
        502 => "Bad Gateway".to_string(),
        503 => "Service Unavailable".to_string(),
        _ => status
            .canonical_reason()
            .unwrap_or("Unknown Error")
            .to_string(),
    }
}
