//! Profile document loader.
//!
//! One attempt per call, no retries, no cache. Every failure collapses to an
//! absent document plus a [`LoadFailure`] the caller may inspect; nothing
//! escapes as an error.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use url::Url;

use crate::logging::{self, obj, v_num, v_str, Domain, Level};
use crate::model::ProfileDocument;

/// Where the profile document lives once resolved against the page base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Http(Url),
    File(PathBuf),
}

impl Location {
    pub fn resolve(base: &str, data_url: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(data_url) {
            return Self::from_url(url);
        }
        if base.starts_with("http://") || base.starts_with("https://") {
            let joined = Url::parse(base)?.join(data_url)?;
            return Self::from_url(joined);
        }
        Ok(Location::File(PathBuf::from(base).join(data_url)))
    }

    fn from_url(url: Url) -> Result<Self> {
        match url.scheme() {
            "http" | "https" => Ok(Location::Http(url)),
            "file" => url
                .to_file_path()
                .map(Location::File)
                .map_err(|_| anyhow!("bad file url: {}", url)),
            other => Err(anyhow!("unsupported scheme: {}", other)),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Http(url) => write!(f, "{}", url),
            Location::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchedResource {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Transport seam: a single uncached read of a resource.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, location: &Location) -> Result<FetchedResource>;
}

/// reqwest for http(s), tokio::fs for local files. A missing file reads as 404.
pub struct Fetcher {
    client: Client,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        Self {
            client: Client::builder()
                .default_headers(headers)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

#[async_trait]
impl ResourceFetcher for Fetcher {
    async fn fetch(&self, location: &Location) -> Result<FetchedResource> {
        match location {
            Location::Http(url) => {
                let resp = self.client.get(url.clone()).send().await?;
                let status = resp.status().as_u16();
                let body = resp.bytes().await?.to_vec();
                Ok(FetchedResource { status, body })
            }
            Location::File(path) => match tokio::fs::read(path).await {
                Ok(body) => Ok(FetchedResource { status: 200, body }),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(FetchedResource {
                    status: 404,
                    body: Vec::new(),
                }),
                Err(e) => Err(e.into()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    InvalidLocation(String),
    Transport(String),
    Status(u16),
    Malformed(String),
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadFailure::InvalidLocation(e) => write!(f, "invalid location: {}", e),
            LoadFailure::Transport(e) => write!(f, "transport failure: {}", e),
            LoadFailure::Status(code) => write!(f, "unexpected status {}", code),
            LoadFailure::Malformed(e) => write!(f, "malformed payload: {}", e),
        }
    }
}

impl std::error::Error for LoadFailure {}

impl LoadFailure {
    /// Missing or unreadable data is an expected outcome for a static page;
    /// failing to reach the source at all is not.
    pub fn level(&self) -> Level {
        match self {
            LoadFailure::Status(_) | LoadFailure::Malformed(_) => Level::Warn,
            LoadFailure::Transport(_) | LoadFailure::InvalidLocation(_) => Level::Error,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            LoadFailure::InvalidLocation(_) => "invalid_location",
            LoadFailure::Transport(_) => "transport",
            LoadFailure::Status(_) => "status",
            LoadFailure::Malformed(_) => "malformed",
        }
    }
}

/// Result of one load: the document, or absence plus what went wrong.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub location: String,
    pub document: Option<ProfileDocument>,
    pub failure: Option<LoadFailure>,
}

impl LoadOutcome {
    pub fn is_absent(&self) -> bool {
        self.document.is_none()
    }

    pub fn into_document(self) -> Option<ProfileDocument> {
        self.document
    }
}

pub struct DataLoader {
    fetcher: Box<dyn ResourceFetcher>,
    base: String,
}

impl DataLoader {
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_fetcher(base, Box::new(Fetcher::new()))
    }

    pub fn with_fetcher(base: impl Into<String>, fetcher: Box<dyn ResourceFetcher>) -> Self {
        Self {
            fetcher,
            base: base.into(),
        }
    }

    pub async fn load(&self, data_url: &str) -> LoadOutcome {
        let location = match Location::resolve(&self.base, data_url) {
            Ok(loc) => loc,
            Err(e) => return absent(data_url, LoadFailure::InvalidLocation(e.to_string())),
        };
        let shown = location.to_string();
        match self.fetch_document(&location).await {
            Ok(document) => LoadOutcome {
                location: shown,
                document: Some(document),
                failure: None,
            },
            Err(failure) => absent(&shown, failure),
        }
    }

    async fn fetch_document(&self, location: &Location) -> Result<ProfileDocument, LoadFailure> {
        let res = self
            .fetcher
            .fetch(location)
            .await
            .map_err(|e| LoadFailure::Transport(e.to_string()))?;
        if !(200..300).contains(&res.status) {
            return Err(LoadFailure::Status(res.status));
        }
        let document: ProfileDocument = serde_json::from_slice(&res.body)
            .map_err(|e| LoadFailure::Malformed(e.to_string()))?;
        logging::info(
            Domain::Loader,
            "loaded",
            obj(&[
                ("location", v_str(&location.to_string())),
                ("bytes", v_num(res.body.len() as f64)),
                ("content_hash", v_str(&logging::content_hash(&res.body))),
                ("stats", v_num(document.stats.len() as f64)),
                ("highlights", v_num(document.highlights.len() as f64)),
            ]),
        );
        Ok(document)
    }
}

fn absent(location: &str, failure: LoadFailure) -> LoadOutcome {
    let fields = obj(&[
        ("msg", v_str(&failure.to_string())),
        ("location", v_str(location)),
        ("kind", v_str(failure.kind())),
    ]);
    match failure.level() {
        Level::Warn => logging::warn(Domain::Loader, "fetch_failed", fields),
        _ => logging::error(Domain::Loader, "fetch_failed", fields),
    }
    LoadOutcome {
        location: location.to_string(),
        document: None,
        failure: Some(failure),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct StubFetcher {
        response: Result<FetchedResource, String>,
        seen: Mutex<Vec<Location>>,
    }

    impl StubFetcher {
        fn ok(status: u16, body: &str) -> Self {
            Self {
                response: Ok(FetchedResource {
                    status,
                    body: body.as_bytes().to_vec(),
                }),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ResourceFetcher for StubFetcher {
        async fn fetch(&self, location: &Location) -> Result<FetchedResource> {
            self.seen.lock().unwrap().push(location.clone());
            self.response.clone().map_err(|e| anyhow!(e))
        }
    }

    struct SharedStub(std::sync::Arc<StubFetcher>);

    #[async_trait]
    impl ResourceFetcher for SharedStub {
        async fn fetch(&self, location: &Location) -> Result<FetchedResource> {
            self.0.fetch(location).await
        }
    }

    #[test]
    fn test_resolve_relative_against_dir() {
        let loc = Location::resolve("site", "data/player.json").unwrap();
        assert_eq!(loc, Location::File(PathBuf::from("site/data/player.json")));
    }

    #[test]
    fn test_resolve_relative_against_http_base() {
        let loc = Location::resolve("https://example.org/player/", "data/player.json").unwrap();
        assert_eq!(
            loc,
            Location::Http(Url::parse("https://example.org/player/data/player.json").unwrap())
        );
    }

    #[test]
    fn test_resolve_absolute_url_ignores_base() {
        let loc = Location::resolve("site", "http://cdn.example.org/p.json").unwrap();
        assert!(matches!(loc, Location::Http(_)));
        assert!(Location::resolve("site", "ftp://example.org/p.json").is_err());
    }

    #[tokio::test]
    async fn test_success_yields_document() {
        let body = r#"{"name":"Ada","stats":[{"value":12,"label":"Caps"}]}"#;
        let fetcher = std::sync::Arc::new(StubFetcher::ok(200, body));
        let loader = DataLoader::with_fetcher("site", Box::new(SharedStub(fetcher.clone())));
        let outcome = loader.load("data/player.json").await;
        assert!(outcome.failure.is_none());
        let doc = outcome.into_document().unwrap();
        assert_eq!(doc.name.as_deref(), Some("Ada"));
        assert_eq!(doc.stats.len(), 1);
        assert_eq!(
            *fetcher.seen.lock().unwrap(),
            vec![Location::File(PathBuf::from("site/data/player.json"))]
        );
    }

    #[test]
    fn test_failure_levels() {
        assert_eq!(LoadFailure::Status(404).level(), Level::Warn);
        assert_eq!(LoadFailure::Malformed("eof".into()).level(), Level::Warn);
        assert_eq!(LoadFailure::Transport("refused".into()).level(), Level::Error);
        assert_eq!(LoadFailure::InvalidLocation("ftp".into()).level(), Level::Error);
    }

    #[tokio::test]
    async fn test_not_found_is_absent() {
        let loader = DataLoader::with_fetcher("site", Box::new(StubFetcher::ok(404, "nope")));
        let outcome = loader.load("data/player.json").await;
        assert!(outcome.is_absent());
        assert_eq!(outcome.failure, Some(LoadFailure::Status(404)));
    }

    #[tokio::test]
    async fn test_malformed_payload_is_absent() {
        let loader = DataLoader::with_fetcher("site", Box::new(StubFetcher::ok(200, "{not json")));
        let outcome = loader.load("data/player.json").await;
        assert!(outcome.is_absent());
        assert!(matches!(outcome.failure, Some(LoadFailure::Malformed(_))));
    }

    #[tokio::test]
    async fn test_transport_error_is_absent() {
        let fetcher = StubFetcher {
            response: Err("connection refused".to_string()),
            seen: Mutex::new(Vec::new()),
        };
        let loader = DataLoader::with_fetcher("site", Box::new(fetcher));
        let outcome = loader.load("data/player.json").await;
        assert!(matches!(outcome.failure, Some(LoadFailure::Transport(ref m)) if m.contains("refused")));
    }

    #[tokio::test]
    async fn test_file_fetcher_reads_fresh_each_time() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        let path = dir.path().join("data/player.json");
        std::fs::write(&path, r#"{"name":"First"}"#).unwrap();

        let loader = DataLoader::new(dir.path().to_string_lossy().to_string());
        let first = loader.load("data/player.json").await.into_document().unwrap();
        assert_eq!(first.name.as_deref(), Some("First"));

        std::fs::write(&path, r#"{"name":"Second"}"#).unwrap();
        let second = loader.load("data/player.json").await.into_document().unwrap();
        assert_eq!(second.name.as_deref(), Some("Second"));
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_404() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DataLoader::new(dir.path().to_string_lossy().to_string());
        let outcome = loader.load("data/player.json").await;
        assert_eq!(outcome.failure, Some(LoadFailure::Status(404)));
    }
}
