use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ORIGIN;
use tracing::debug;

use crate::ViewerError;

/// Scheme the host uses to hand out files it has cached locally.
pub const ASSET_SCHEME_PREFIX: &str = "asset://localhost/";
const FILE_SCHEME_PREFIX: &str = "file://";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// How a URL must be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// http(s): a cross-origin request carrying an `Origin` header.
    Cors,
    /// Local and custom schemes: plain read, no cross-origin marking.
    Local,
}

pub fn request_mode(url: &str) -> RequestMode {
    let lower = url.trim_start().to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        RequestMode::Cors
    } else {
        RequestMode::Local
    }
}

/// Filesystem path behind a local URL, or `None` for a network URL.
pub fn local_path(url: &str) -> Option<PathBuf> {
    if request_mode(url) == RequestMode::Cors {
        return None;
    }
    let raw = url
        .strip_prefix(ASSET_SCHEME_PREFIX)
        .or_else(|| url.strip_prefix(FILE_SCHEME_PREFIX))
        .unwrap_or(url);
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    Some(PathBuf::from(decoded))
}

/// Turns a URL into raw image bytes. Runs on loader worker threads.
pub trait ImageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ViewerError>;
}

/// Default fetcher: reqwest for http(s), a file read for everything else.
#[derive(Debug, Clone)]
pub struct UrlFetcher {
    client: Client,
    origin: String,
}

impl UrlFetcher {
    pub fn new(origin: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(concat!("skinview/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            origin: origin.into(),
        })
    }

    fn fetch_network(&self, url: &str) -> Result<Vec<u8>, ViewerError> {
        let response = self
            .client
            .get(url)
            .header(ORIGIN, &self.origin)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| ViewerError::load(url, e))?;
        let bytes = response.bytes().map_err(|e| ViewerError::load(url, e))?;
        Ok(bytes.to_vec())
    }
}

impl ImageFetcher for UrlFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, ViewerError> {
        match local_path(url) {
            None => self.fetch_network(url),
            Some(path) => {
                debug!(?path, "reading local texture");
                std::fs::read(&path).map_err(|e| ViewerError::load(url, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_urls_are_cross_origin() {
        assert_eq!(request_mode("https://textures.minecraft.net/texture/ab"), RequestMode::Cors);
        assert_eq!(request_mode("HTTP://example.com/skin.png"), RequestMode::Cors);
        assert_eq!(request_mode("asset://localhost//tmp/skin.png"), RequestMode::Local);
        assert_eq!(request_mode("file:///tmp/skin.png"), RequestMode::Local);
        assert_eq!(request_mode("/tmp/skin.png"), RequestMode::Local);
    }

    #[test]
    fn local_schemes_map_to_paths() {
        assert_eq!(
            local_path("asset://localhost//tmp/skins/a.png"),
            Some(PathBuf::from("/tmp/skins/a.png"))
        );
        assert_eq!(
            local_path("asset://localhost/%2Ftmp%2Fmy%20skin.png"),
            Some(PathBuf::from("/tmp/my skin.png"))
        );
        assert_eq!(local_path("file:///tmp/a.png"), Some(PathBuf::from("/tmp/a.png")));
        assert_eq!(local_path("https://example.com/a.png"), None);
    }

    #[test]
    fn missing_local_file_is_a_load_failure() {
        let fetcher = UrlFetcher::new("http://localhost").expect("client");
        let err = fetcher
            .fetch("asset://localhost//definitely/not/here/404.png")
            .unwrap_err();
        assert!(matches!(err, ViewerError::LoadFailure { .. }));
    }
}
