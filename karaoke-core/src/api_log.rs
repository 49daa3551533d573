//! Append-only, human-readable record of every external lookup attempt.
//!
//! Operators read this file directly, so the block layout written by
//! [`ApiLog::record`] must stay stable. Each record opens the file in append
//! mode and closes it again. Write failures are reported through `tracing`
//! and never interrupt lyric acquisition.

use chrono::Local;
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const RULE_WIDTH: usize = 80;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const REDACTED: &str = "***";

/// Request parameters that are masked before they reach the log
const SECRET_KEYS: [&str; 2] = ["api_token", "token"];

/// Outcome tag written to the `STATUS:` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Success,
    NoResults,
    Error,
    ConnectionError,
    UnexpectedError,
    FileNotFound,
    ProcessingError,
}

impl LogStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NoResults => "no_results",
            Self::Error => "error",
            Self::ConnectionError => "connection_error",
            Self::UnexpectedError => "unexpected_error",
            Self::FileNotFound => "file_not_found",
            Self::ProcessingError => "processing_error",
        }
    }
}

/// Handle to the request log file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiLog {
    path: Option<PathBuf>,
}

impl ApiLog {
    /// Log to the given file, creating it on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A log that discards every record
    #[must_use]
    pub const fn disabled() -> Self {
        Self { path: None }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one attempt to the log.
    pub fn record(&self, endpoint: &str, request: &Value, response: &Value, status: LogStatus) {
        let Some(path) = &self.path else {
            return;
        };

        let entry = format_entry(
            &Local::now().format(TIMESTAMP_FORMAT).to_string(),
            endpoint,
            &redact(request),
            response,
            status,
        );

        let written = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| file.write_all(entry.as_bytes()));

        match written {
            Ok(()) => debug!("Recorded {} ({}) in {}", endpoint, status.as_str(), path.display()),
            Err(e) => warn!("Failed to write API log {}: {}", path.display(), e),
        }
    }
}

fn format_entry(
    timestamp: &str,
    endpoint: &str,
    request: &Value,
    response: &Value,
    status: LogStatus,
) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "\n{rule}\nTIMESTAMP: {timestamp}\nENDPOINT: {endpoint}\nSTATUS: {}\nREQUEST: {}\nRESPONSE: {}\n{rule}\n",
        status.as_str(),
        pretty(request),
        pretty(response),
    )
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn redact(request: &Value) -> Value {
    let mut request = request.clone();
    if let Value::Object(map) = &mut request {
        for key in SECRET_KEYS {
            if let Some(value) = map.get_mut(key) {
                *value = Value::String(REDACTED.to_string());
            }
        }
    }
    request
}
