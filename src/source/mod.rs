//! Where configuration files come from
//!
//! A [`ConfigSource`] lists configuration files and hands back their raw
//! text. Parsing and extraction happen elsewhere.

mod bitbucket;
mod local;
mod mock;

pub use bitbucket::{BitbucketSource, DirectoryListing, ListingEntry};
pub use local::LocalSource;
pub use mock::MockSource;

use std::path::PathBuf;
use thiserror::Error;

/// File extensions treated as configuration
pub const CONFIG_EXTENSIONS: &[&str] = &["yml", "yaml", "json"];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("missing access token, set BITBUCKET_ACCESS_TOKEN")]
    MissingToken,
}

/// Abstraction over configuration storage for testability
pub trait ConfigSource: Send + Sync {
    /// Human-readable origin, used in logs and reports
    fn describe(&self) -> String;

    /// Paths of all configuration files, in a stable order
    fn list_files(&self) -> Result<Vec<String>, SourceError>;

    /// Raw text of one file returned by [`ConfigSource::list_files`]
    fn read_file(&self, path: &str) -> Result<String, SourceError>;
}

/// Whether `path` has a configuration file extension
pub fn is_config_file(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_lowercase();
            CONFIG_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}
