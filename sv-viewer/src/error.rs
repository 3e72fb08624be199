use sv_atlas::AtlasError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    /// Network or filesystem produced no bytes.
    #[error("failed to load {url}: {reason}")]
    LoadFailure { url: String, reason: String },
    /// Bytes arrived but are not a decodable image.
    #[error("failed to decode {url}: {reason}")]
    DecodeFailure { url: String, reason: String },
    #[error("{url}: {source}")]
    UnsupportedLayout {
        url: String,
        #[source]
        source: AtlasError,
    },
    /// A completed load whose target has moved on. Never shown to the user.
    #[error("result for {url} is no longer current")]
    StaleResult { url: String },
}

impl ViewerError {
    pub fn load(url: &str, reason: impl ToString) -> Self {
        Self::LoadFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(url: &str, reason: impl ToString) -> Self {
        Self::DecodeFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn stale(url: &str) -> Self {
        Self::StaleResult {
            url: url.to_string(),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleResult { .. })
    }
}
