//! GitHub release client
//!
//! One `fetch` walks a release through these stages, publishing each on a
//! watch channel of its own, keyed by repository and version:
//!
//! ```text
//! Idle -> Downloading -> Extracting -> FetchingReadme -> Done
//!              |              |
//!              +--------------+--> Failed(reason)
//! ```
//!
//! The readme is only looked for once extraction succeeded, and a missing
//! readme never fails the fetch.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use hatch_plugin_api::{Store, StoreExt, StoreKey};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::arch::Arch;
use super::archive::ArchiveExtractor;
use super::error::RemoteError;
use super::flight::FetchKey;
use super::http::{HttpClient, HttpRequest};
use super::repo::{repo_identifier, repository_base};
use crate::config::RemoteSettings;
use crate::version::Version;

/// Store key holding the releases API token
pub const TOKEN_KEY: &str = "github_token";

/// Readme names tried in order under the raw content host
pub const README_CANDIDATES: [&str; 4] = ["README.md", "README", "readme.md", "readme"];

/// A fetched release, extracted and ready to load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseArtifact {
    /// Path of the shared library inside the extraction directory
    pub local_path: PathBuf,
    /// Readme text, if any candidate answered
    pub readme: Option<String>,
    pub version: Version,
}

/// Progress of a release fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStage {
    Idle,
    Downloading,
    Extracting,
    FetchingReadme,
    Done,
    Failed { reason: String },
}

/// Where plugin releases come from
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Download, extract, and describe one release
    async fn fetch(
        &self,
        repository_url: &str,
        version: &Version,
    ) -> Result<ReleaseArtifact, RemoteError>;

    /// Versions of every published release
    async fn list_versions(&self, repository_url: &str) -> Result<Vec<Version>, RemoteError>;
}

#[derive(Debug, Deserialize)]
struct ReleaseDto {
    tag_name: String,
}

/// [`ReleaseSource`] for repositories hosted on GitHub
pub struct GitHubReleaseClient {
    http: Arc<dyn HttpClient>,
    store: Arc<dyn Store>,
    extractor: ArchiveExtractor,
    settings: RemoteSettings,
    install_root: PathBuf,
    arch: Option<Arch>,
    stages: Mutex<HashMap<FetchKey, watch::Sender<FetchStage>>>,
}

impl GitHubReleaseClient {
    /// Create a client extracting releases under `install_root`
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: Arc<dyn Store>,
        settings: RemoteSettings,
        install_root: PathBuf,
    ) -> Self {
        Self {
            http,
            store,
            extractor: ArchiveExtractor::new(),
            settings,
            install_root,
            arch: None,
            stages: Mutex::default(),
        }
    }

    /// Builder: use another extractor
    pub fn with_extractor(mut self, extractor: ArchiveExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Builder: pin the architecture instead of detecting it
    pub fn with_arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }

    fn stages(&self) -> MutexGuard<'_, HashMap<FetchKey, watch::Sender<FetchStage>>> {
        self.stages.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Watch progress of the fetch for this release.
    ///
    /// Subscribing before the fetch starts is fine; the receiver sees every
    /// stage published afterwards.
    pub fn subscribe(
        &self,
        repository_url: &str,
        version: &Version,
    ) -> watch::Receiver<FetchStage> {
        self.stages()
            .entry(FetchKey::new(repository_url, version))
            .or_insert_with(|| watch::channel(FetchStage::Idle).0)
            .subscribe()
    }

    /// Latest stage of the fetch for this release; `Idle` if never fetched
    pub fn stage(&self, repository_url: &str, version: &Version) -> FetchStage {
        self.stages()
            .get(&FetchKey::new(repository_url, version))
            .map(|stage| stage.borrow().clone())
            .unwrap_or(FetchStage::Idle)
    }

    fn set_stage(&self, key: &FetchKey, stage: FetchStage) {
        tracing::debug!(
            repository = %key.repository,
            version = %key.version,
            ?stage,
            "Release fetch stage"
        );
        self.stages()
            .entry(key.clone())
            .or_insert_with(|| watch::channel(FetchStage::Idle).0)
            .send_replace(stage);
    }

    fn arch(&self) -> Result<Arch, RemoteError> {
        match self.arch {
            Some(arch) => Ok(arch),
            None => Arch::detect(),
        }
    }

    /// Release asset URL for this host
    pub fn asset_url(&self, repository_url: &str, version: &Version) -> Result<String, RemoteError> {
        let arch = self.arch()?;
        Ok(format!(
            "{}/releases/download/{}/{}",
            repository_base(repository_url),
            version,
            arch.artifact_name()
        ))
    }

    /// Directory a release is extracted into: `{root}/{owner}/{repo}/{version}`
    pub fn destination(&self, repo: &str, version: &Version) -> PathBuf {
        self.install_root.join(repo).join(version.to_string())
    }

    async fn run_fetch(
        &self,
        key: &FetchKey,
        repository_url: &str,
        version: &Version,
    ) -> Result<ReleaseArtifact, RemoteError> {
        let download_url = self.asset_url(repository_url, version)?;
        let repo = repo_identifier(repository_url).ok_or_else(|| RemoteError::InvalidRepoName {
            url: repository_url.to_string(),
        })?;

        self.set_stage(key, FetchStage::Downloading);
        let archive = self.download(&download_url).await?;

        self.set_stage(key, FetchStage::Extracting);
        let destination = self.destination(&repo, version);
        let local_path = self
            .extractor
            .extract_blocking(archive.path().to_path_buf(), destination)
            .await?;
        drop(archive);

        self.set_stage(key, FetchStage::FetchingReadme);
        let readme = self.fetch_readme(&repo, version).await;

        Ok(ReleaseArtifact {
            local_path,
            readme,
            version: version.clone(),
        })
    }

    /// GET the asset into a temp file that is deleted when dropped
    async fn download(&self, url: &str) -> Result<tempfile::NamedTempFile, RemoteError> {
        let response = self.http.get(HttpRequest::get(url)).await?;
        if !response.is_ok() {
            return Err(RemoteError::Download {
                url: url.to_string(),
                status: response.status,
            });
        }

        let file = tempfile::Builder::new()
            .prefix("hatch-")
            .suffix(".zip")
            .tempfile()?;
        tokio::fs::write(file.path(), &response.body).await?;
        tracing::debug!(url = %url, bytes = response.body.len(), "Downloaded release asset");
        Ok(file)
    }

    /// Body of the first readme candidate answering 200, trying in order
    pub async fn fetch_readme(&self, repo: &str, version: &Version) -> Option<String> {
        for name in README_CANDIDATES {
            let url = format!(
                "{}/{}/{}/{}",
                self.settings.raw_content_host.trim_end_matches('/'),
                repo,
                version,
                name
            );
            match self.http.get(HttpRequest::get(&url)).await {
                Ok(response) if response.is_ok() => {
                    return Some(String::from_utf8_lossy(&response.body).into_owned());
                }
                Ok(response) => {
                    tracing::debug!(url = %url, status = response.status, "Readme candidate missing");
                }
                Err(e) => {
                    tracing::debug!(url = %url, error = %e, "Readme candidate failed");
                }
            }
        }
        None
    }

    fn token(&self) -> Result<SecretString, RemoteError> {
        self.store
            .get_as::<String>(&StoreKey::global(TOKEN_KEY))
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
            .ok_or(RemoteError::MissingToken)
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleaseClient {
    async fn fetch(
        &self,
        repository_url: &str,
        version: &Version,
    ) -> Result<ReleaseArtifact, RemoteError> {
        let key = FetchKey::new(repository_url, version);
        self.set_stage(&key, FetchStage::Idle);
        let result = self.run_fetch(&key, repository_url, version).await;

        match &result {
            Ok(artifact) => {
                tracing::info!(
                    url = %repository_url,
                    version = %version,
                    path = %artifact.local_path.display(),
                    readme = artifact.readme.is_some(),
                    "Fetched plugin release"
                );
                self.set_stage(&key, FetchStage::Done);
            }
            Err(e) => {
                tracing::warn!(url = %repository_url, version = %version, error = %e, "Release fetch failed");
                self.set_stage(
                    &key,
                    FetchStage::Failed {
                        reason: e.to_string(),
                    },
                );
            }
        }
        result
    }

    async fn list_versions(&self, repository_url: &str) -> Result<Vec<Version>, RemoteError> {
        let repo = repo_identifier(repository_url).ok_or_else(|| RemoteError::InvalidRepoName {
            url: repository_url.to_string(),
        })?;
        let token = self.token()?;

        let url = format!(
            "{}/repos/{}/releases",
            self.settings.api_host.trim_end_matches('/'),
            repo
        );
        let request = HttpRequest::get(&url)
            .header("Accept", "application/vnd.github+json")
            .header("Authorization", format!("Bearer {}", token.expose_secret()));

        let response = self.http.get(request).await?;
        if !response.is_ok() {
            return Err(RemoteError::Api {
                status: response.status,
            });
        }

        let releases: Vec<ReleaseDto> = serde_json::from_slice(&response.body)?;
        let versions = releases
            .into_iter()
            .filter_map(|release| match Version::parse(&release.tag_name) {
                Ok(version) => Some(version),
                Err(e) => {
                    tracing::warn!(tag = %release.tag_name, error = %e, "Skipping release tag");
                    None
                }
            })
            .collect();
        Ok(versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use hatch_plugin_api::PluginError;
    use tempfile::TempDir;
    use tokio::sync::Notify;

    use crate::remote::http::HttpResponse;

    /// Answers from a URL -> response table, 404 otherwise, and records URLs
    #[derive(Default)]
    struct ScriptedHttp {
        responses: HashMap<String, HttpResponse>,
        gates: HashMap<String, Arc<Notify>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttp {
        fn respond(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
            self.responses.insert(
                url.to_string(),
                HttpResponse {
                    status,
                    body: body.into(),
                },
            );
            self
        }

        /// Hold requests for `url` until `gate` is notified
        fn gated(mut self, url: &str, gate: Arc<Notify>) -> Self {
            self.gates.insert(url.to_string(), gate);
            self
        }

        fn urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|r| r.url.clone())
                .collect()
        }
    }

    #[async_trait]
    impl HttpClient for ScriptedHttp {
        async fn get(&self, request: HttpRequest) -> Result<HttpResponse, RemoteError> {
            if let Some(gate) = self.gates.get(&request.url) {
                gate.notified().await;
            }
            let response = self
                .responses
                .get(&request.url)
                .cloned()
                .unwrap_or(HttpResponse {
                    status: 404,
                    body: Vec::new(),
                });
            self.requests.lock().unwrap().push(request);
            Ok(response)
        }
    }

    #[derive(Default)]
    struct MapStore(Mutex<HashMap<StoreKey, toml::Value>>);

    impl Store for MapStore {
        fn get(&self, key: &StoreKey) -> Option<toml::Value> {
            self.0.lock().unwrap().get(key).cloned()
        }

        fn set(&self, key: StoreKey, value: toml::Value) -> Result<(), PluginError> {
            self.0.lock().unwrap().insert(key, value);
            Ok(())
        }

        fn remove(&self, key: &StoreKey) -> Result<(), PluginError> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }
    }

    const REPO: &str = "https://github.com/hatch-rs/hello-plugin.git";
    const RAW: &str = "https://raw.githubusercontent.com/hatch-rs/hello-plugin";

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            for (name, content) in entries {
                zip.start_file(*name, zip::write::SimpleFileOptions::default())
                    .unwrap();
                zip.write_all(content).unwrap();
            }
            zip.finish().unwrap();
        }
        cursor.into_inner()
    }

    fn client(http: Arc<ScriptedHttp>, store: Arc<MapStore>, root: &TempDir) -> GitHubReleaseClient {
        GitHubReleaseClient::new(
            http,
            store,
            RemoteSettings::default(),
            root.path().to_path_buf(),
        )
        .with_arch(Arch::X86)
        .with_extractor(ArchiveExtractor::new().with_suffix(".so"))
    }

    fn asset_url(version: &str) -> String {
        format!(
            "https://github.com/hatch-rs/hello-plugin/releases/download/{}/{}",
            version,
            Arch::X86.artifact_name()
        )
    }

    #[tokio::test]
    async fn test_readme_first_candidate() {
        let root = TempDir::new().unwrap();
        let http = Arc::new(ScriptedHttp::default().respond(
            &format!("{RAW}/1.0.0/README.md"),
            200,
            "Hello world",
        ));
        let client = client(http.clone(), Arc::default(), &root);

        let readme = client
            .fetch_readme("hatch-rs/hello-plugin", &Version::new(1, 0, 0))
            .await;
        assert_eq!(readme.as_deref(), Some("Hello world"));
        assert_eq!(http.urls(), vec![format!("{RAW}/1.0.0/README.md")]);
    }

    #[tokio::test]
    async fn test_readme_falls_back_in_priority_order() {
        let root = TempDir::new().unwrap();
        let http = Arc::new(ScriptedHttp::default().respond(
            &format!("{RAW}/1.0.0/readme.md"),
            200,
            "third",
        ));
        let client = client(http.clone(), Arc::default(), &root);

        let readme = client
            .fetch_readme("hatch-rs/hello-plugin", &Version::new(1, 0, 0))
            .await;
        assert_eq!(readme.as_deref(), Some("third"));
        assert_eq!(
            http.urls(),
            vec![
                format!("{RAW}/1.0.0/README.md"),
                format!("{RAW}/1.0.0/README"),
                format!("{RAW}/1.0.0/readme.md"),
            ]
        );
    }

    #[tokio::test]
    async fn test_readme_exhausted_is_none() {
        let root = TempDir::new().unwrap();
        let http = Arc::new(ScriptedHttp::default());
        let client = client(http.clone(), Arc::default(), &root);

        let readme = client
            .fetch_readme("hatch-rs/hello-plugin", &Version::parse("1.1.2").unwrap())
            .await;
        assert!(readme.is_none());
        assert_eq!(http.urls().len(), 4);
        assert!(http.urls()[3].ends_with("hatch-rs/hello-plugin/1.1.2/readme"));
    }

    #[tokio::test]
    async fn test_fetch_downloads_extracts_and_reads_readme() {
        let root = TempDir::new().unwrap();
        let http = Arc::new(
            ScriptedHttp::default()
                .respond(
                    &asset_url("1.1.1"),
                    200,
                    zip_bytes(&[("a.readme", b""), ("b.so", b"lib")]),
                )
                .respond(&format!("{RAW}/1.1.1/README.md"), 200, "Hello world"),
        );
        let client = client(http.clone(), Arc::default(), &root);
        let mut stages = client.subscribe(REPO, &Version::new(1, 1, 1));

        let artifact = client.fetch(REPO, &Version::new(1, 1, 1)).await.unwrap();

        assert_eq!(artifact.readme.as_deref(), Some("Hello world"));
        assert_eq!(artifact.version, Version::new(1, 1, 1));
        assert!(artifact.local_path.ends_with("hatch-rs/hello-plugin/1.1.1/b.so"));
        assert!(artifact.local_path.starts_with(root.path()));
        assert_eq!(http.urls()[0], asset_url("1.1.1"));
        assert_eq!(client.stage(REPO, &Version::new(1, 1, 1)), FetchStage::Done);
        assert!(stages.has_changed().unwrap());
        assert_eq!(*stages.borrow_and_update(), FetchStage::Done);
    }

    #[tokio::test]
    async fn test_fetch_without_readme_still_succeeds() {
        let root = TempDir::new().unwrap();
        let http = Arc::new(ScriptedHttp::default().respond(
            &asset_url("v2.0.0"),
            200,
            zip_bytes(&[("libplugin.so", b"")]),
        ));
        let client = client(http.clone(), Arc::default(), &root);

        let artifact = client
            .fetch(REPO, &Version::parse("v2.0.0").unwrap())
            .await
            .unwrap();
        assert!(artifact.readme.is_none());
        assert_eq!(http.urls().len(), 1 + README_CANDIDATES.len());
    }

    #[tokio::test]
    async fn test_fetch_download_failure() {
        let root = TempDir::new().unwrap();
        let http = Arc::new(ScriptedHttp::default());
        let client = client(http.clone(), Arc::default(), &root);

        let result = client.fetch(REPO, &Version::new(1, 0, 0)).await;
        assert!(matches!(result, Err(RemoteError::Download { status: 404, .. })));
        // No readme lookups after a failed download
        assert_eq!(http.urls().len(), 1);
        assert!(matches!(
            client.stage(REPO, &Version::new(1, 0, 0)),
            FetchStage::Failed { .. }
        ));
        assert_eq!(client.stage(REPO, &Version::new(2, 0, 0)), FetchStage::Idle);
    }

    #[tokio::test]
    async fn test_overlapping_fetches_keep_their_own_stage() {
        let root = TempDir::new().unwrap();
        let gate = Arc::new(Notify::new());
        let http = Arc::new(
            ScriptedHttp::default()
                .respond(&asset_url("2.0.0"), 200, zip_bytes(&[("libplugin.so", b"")]))
                .gated(&asset_url("2.0.0"), gate.clone()),
        );
        let client = Arc::new(client(http, Arc::default(), &root));
        let first = Version::new(1, 0, 0);
        let second = Version::new(2, 0, 0);

        let mut second_stages = client.subscribe(REPO, &second);
        let pending = tokio::spawn({
            let client = client.clone();
            let second = second.clone();
            async move { client.fetch(REPO, &second).await }
        });
        second_stages
            .wait_for(|stage| *stage == FetchStage::Downloading)
            .await
            .unwrap();

        // 1.0.0 has no asset and fails while 2.0.0 is still downloading
        let result = client.fetch(REPO, &first).await;
        assert!(matches!(result, Err(RemoteError::Download { status: 404, .. })));
        assert!(matches!(client.stage(REPO, &first), FetchStage::Failed { .. }));
        assert_eq!(client.stage(REPO, &second), FetchStage::Downloading);

        gate.notify_one();
        pending.await.unwrap().unwrap();
        assert_eq!(client.stage(REPO, &second), FetchStage::Done);
        assert!(matches!(client.stage(REPO, &first), FetchStage::Failed { .. }));
    }

    #[tokio::test]
    async fn test_fetch_archive_without_library() {
        let root = TempDir::new().unwrap();
        let http = Arc::new(ScriptedHttp::default().respond(
            &asset_url("1.0.0"),
            200,
            zip_bytes(&[("a.readme", b"")]),
        ));
        let client = client(http.clone(), Arc::default(), &root);

        let result = client.fetch(REPO, &Version::new(1, 0, 0)).await;
        assert!(matches!(result, Err(RemoteError::NoDylibFound { .. })));
        assert_eq!(http.urls().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_invalid_repo_name() {
        let root = TempDir::new().unwrap();
        let http = Arc::new(ScriptedHttp::default());
        let client = client(http.clone(), Arc::default(), &root);

        let result = client
            .fetch("https://github.com", &Version::new(1, 0, 0))
            .await;
        assert!(matches!(result, Err(RemoteError::InvalidRepoName { .. })));
        assert!(http.urls().is_empty());
    }

    #[tokio::test]
    async fn test_list_versions() {
        let root = TempDir::new().unwrap();
        let body = r#"[{"tag_name": "v1.0.0", "name": "First"}, {"tag_name": "v1.0.1"}, {"tag_name": "nightly"}]"#;
        let http = Arc::new(ScriptedHttp::default().respond(
            "https://api.github.com/repos/hatch-rs/hello-plugin/releases",
            200,
            body,
        ));
        let store = Arc::new(MapStore::default());
        store
            .set_as(StoreKey::global(TOKEN_KEY), "TOKEN")
            .unwrap();
        let client = client(http.clone(), store, &root);

        let versions = client.list_versions(REPO).await.unwrap();
        assert_eq!(versions, vec![Version::new(1, 0, 0), Version::new(1, 0, 1)]);

        let requests = http.requests.lock().unwrap();
        assert_eq!(
            requests[0].url,
            "https://api.github.com/repos/hatch-rs/hello-plugin/releases"
        );
        assert!(
            requests[0]
                .headers
                .contains(&("Authorization".to_string(), "Bearer TOKEN".to_string()))
        );
    }

    #[tokio::test]
    async fn test_list_versions_without_token() {
        let root = TempDir::new().unwrap();
        let http = Arc::new(ScriptedHttp::default());
        let client = client(http.clone(), Arc::default(), &root);

        let result = client.list_versions(REPO).await;
        assert!(matches!(result, Err(RemoteError::MissingToken)));
        assert!(http.urls().is_empty());
    }

    #[tokio::test]
    async fn test_list_versions_api_error() {
        let root = TempDir::new().unwrap();
        let store = Arc::new(MapStore::default());
        store.set_as(StoreKey::global(TOKEN_KEY), "TOKEN").unwrap();
        let http = Arc::new(ScriptedHttp::default().respond(
            "https://api.github.com/repos/hatch-rs/hello-plugin/releases",
            401,
            "{}",
        ));
        let client = client(http, store, &root);

        let result = client.list_versions(REPO).await;
        assert!(matches!(result, Err(RemoteError::Api { status: 401 })));
    }

    #[test]
    fn test_token_scoped_to_global() {
        let root = TempDir::new().unwrap();
        let store = Arc::new(MapStore::default());
        store
            .set_as(StoreKey::plugin("com.test", TOKEN_KEY), "PLUGIN")
            .unwrap();
        let client = client(Arc::default(), store, &root);

        assert!(matches!(client.token(), Err(RemoteError::MissingToken)));
    }
}
