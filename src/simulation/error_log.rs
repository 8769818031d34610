//! Unexpected-error buffer
//!
//! Collects failures nobody asked for (filesystem, subprocess, fixture parsing) so test
//! harnesses can assert on them through `/error-messages`. Configured faults never land
//! here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub timestamp: DateTime<Utc>,
    pub context: String,
    pub message: String,
    pub stack: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ErrorLog {
    entries: Arc<Mutex<Vec<ErrorEntry>>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `err` and keep it for later inspection.
    pub fn record(&self, context: &str, err: &anyhow::Error) {
        error!("{}: {:#}", context, err);

        let entry = ErrorEntry {
            timestamp: Utc::now(),
            context: context.to_string(),
            message: err.to_string(),
            stack: Some(format!("{:?}", err)),
        };

        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.push(entry);
    }

    pub fn entries(&self) -> Vec<ErrorEntry> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_record_and_clear() {
        let log = ErrorLog::new();
        let err = std::fs::read("/nonexistent/file")
            .context("reading fixture")
            .unwrap_err();

        log.record("getContents", &err);

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].context, "getContents");
        assert_eq!(entries[0].message, "reading fixture");
        assert!(entries[0].stack.as_deref().unwrap().contains("Caused by"));

        log.clear();
        assert!(log.entries().is_empty());
    }

    #[test]
    fn test_clones_share_buffer() {
        let log = ErrorLog::new();
        let other = log.clone();
        other.record("listFiles", &anyhow::anyhow!("diff failed"));
        assert_eq!(log.entries().len(), 1);
    }
}
