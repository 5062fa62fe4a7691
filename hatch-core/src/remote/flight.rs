//! In-flight release fetches keyed by `(repository, version)`
//!
//! Concurrent requests for the same key share one fetch and one result.
//! The fetch runs as a spawned task, so it completes (and its entry is
//! cleared) even if every caller stops waiting.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use super::client::ReleaseArtifact;
use super::error::RemoteError;
use super::repo::repo_identifier;
use crate::version::Version;

type SharedFetch = Shared<BoxFuture<'static, Result<ReleaseArtifact, Arc<RemoteError>>>>;

/// Identity of a release fetch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
    /// `owner/repo`, or the raw URL when none can be derived
    pub repository: String,
    pub version: String,
}

impl FetchKey {
    pub fn new(repository_url: &str, version: &Version) -> Self {
        Self {
            repository: repo_identifier(repository_url)
                .unwrap_or_else(|| repository_url.to_string()),
            version: version.to_string(),
        }
    }
}

/// Map of fetches currently running
#[derive(Default)]
pub struct SingleFlight {
    inflight: Mutex<HashMap<FetchKey, SharedFetch>>,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn inflight(&self) -> MutexGuard<'_, HashMap<FetchKey, SharedFetch>> {
        self.inflight.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// True while any fetch is running
    pub fn is_busy(&self) -> bool {
        !self.inflight().is_empty()
    }

    /// True while a fetch for `key` is running
    pub fn is_running(&self, key: &FetchKey) -> bool {
        self.inflight().contains_key(key)
    }

    /// Number of distinct fetches running
    pub fn len(&self) -> usize {
        self.inflight().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn finish(&self, key: &FetchKey) {
        self.inflight().remove(key);
    }

    /// Run `fetch` under `key`, or join the fetch already running under it.
    ///
    /// `fetch` is dropped unpolled when joining.
    pub async fn run<F>(
        self: &Arc<Self>,
        key: FetchKey,
        fetch: F,
    ) -> Result<ReleaseArtifact, Arc<RemoteError>>
    where
        F: Future<Output = Result<ReleaseArtifact, RemoteError>> + Send + 'static,
    {
        let shared = {
            let mut inflight = self.inflight();
            match inflight.get(&key) {
                Some(existing) => {
                    tracing::debug!(repository = %key.repository, version = %key.version, "Joining in-flight fetch");
                    existing.clone()
                }
                None => {
                    let shared = self.spawn(key.clone(), fetch);
                    inflight.insert(key, shared.clone());
                    shared
                }
            }
        };
        shared.await
    }

    /// Spawn the fetch. The map lock is held by the caller, so the task
    /// cannot clear its entry before it is inserted.
    fn spawn<F>(self: &Arc<Self>, key: FetchKey, fetch: F) -> SharedFetch
    where
        F: Future<Output = Result<ReleaseArtifact, RemoteError>> + Send + 'static,
    {
        let flight = Arc::clone(self);
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            let result = fetch.await.map_err(Arc::new);
            flight.finish(&task_key);
            result
        });

        let flight = Arc::clone(self);
        async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => {
                    // The task never reached its own cleanup
                    flight.finish(&key);
                    Err(Arc::new(RemoteError::Task(e.to_string())))
                }
            }
        }
        .boxed()
        .shared()
    }
}
