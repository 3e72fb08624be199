/// Tracks the single load still wanted for one target (a skin slot, a cape slot, a
/// thumbnail).
///
/// Completions are matched by URL against the latest request. The cache hands out one
/// decoded image per URL, so a completion whose URL matches is the wanted result no matter
/// which request triggered it; anything else, or anything arriving after `clear`, is stale.
#[derive(Debug, Default)]
pub struct LatestRequest {
    pending: Option<String>,
}

impl LatestRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersedes whatever was pending and starts waiting for `url`.
    pub fn begin(&mut self, url: &str) {
        self.pending = Some(url.to_string());
    }

    /// Stops waiting. Any completion still on its way becomes stale.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Claims the completion for `url` if it is the one still wanted.
    pub fn resolve(&mut self, url: &str) -> bool {
        if self.pending.as_deref() == Some(url) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}
