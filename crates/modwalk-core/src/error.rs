use std::path::PathBuf;
use thiserror::Error;

/// Core error type for modwalk operations.
///
/// Scanning never fails as a whole; per-package problems are collected as
/// diagnostics instead. What remains is loading the walker config.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
