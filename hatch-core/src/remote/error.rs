//! Remote distribution error types

use std::path::PathBuf;
use thiserror::Error;

use crate::version::VersionError;

/// Errors from fetching and unpacking plugin releases
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The repository URL could not be parsed
    #[error("Invalid url: {url}")]
    InvalidUrl { url: String },

    /// No `owner/repo` could be derived from the URL
    #[error("Invalid repo name: {url}")]
    InvalidRepoName { url: String },

    /// The release asset request did not answer 200
    #[error("Download error: {url} answered {status}")]
    Download { url: String, status: u16 },

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(String),

    /// The extracted archive holds no shared library
    #[error("No dylib found in {dir}")]
    NoDylibFound { dir: PathBuf },

    /// The host CPU has no published artifact
    #[error("Unsupported architecture: {arch}")]
    InvalidArch { arch: String },

    /// The releases API needs a token and none is stored
    #[error("Missing access token")]
    MissingToken,

    /// The releases API did not answer 200
    #[error("Releases API answered {status}")]
    Api { status: u16 },

    /// Archive could not be read
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Releases API body was not the expected JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A release tag was not a version
    #[error(transparent)]
    Version(#[from] VersionError),

    /// A background fetch or extraction task died
    #[error("Task failed: {0}")]
    Task(String),
}
