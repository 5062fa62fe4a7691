//! Remote distribution of plugin releases
//!
//! Releases are zip archives attached to GitHub releases, one per
//! `{os}_{arch}`. A fetch downloads the archive, extracts it under the
//! install root, finds the shared library, and looks for a readme.

mod arch;
mod archive;
mod client;
mod error;
mod flight;
mod http;
mod repo;

pub use arch::{Arch, OS_FAMILY};
pub use archive::{ArchiveExtractor, Unpack, ZipUnpacker};
pub use client::{
    FetchStage, GitHubReleaseClient, README_CANDIDATES, ReleaseArtifact, ReleaseSource, TOKEN_KEY,
};
pub use error::RemoteError;
pub use flight::{FetchKey, SingleFlight};
pub use http::{HttpClient, HttpRequest, HttpResponse, ReqwestHttp};
pub use repo::{repo_identifier, repository_base};
