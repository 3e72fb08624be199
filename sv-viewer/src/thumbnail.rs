use sv_atlas::{Thumbnail, ThumbnailPart};
use sv_model::SceneHandles;
use tracing::debug;

use crate::{LatestRequest, LoadCompletion, LoadStatus, TextureCache, ViewerError};

/// A retained thumbnail for one list entry or avatar.
///
/// Draws only the result of its own latest request; anything older is dropped.
#[derive(Debug)]
pub struct ThumbnailSlot {
    part: ThumbnailPart,
    size: u32,
    url: Option<String>,
    request: LatestRequest,
    thumbnail: Thumbnail,
    revision: u64,
}

impl ThumbnailSlot {
    pub fn new(part: ThumbnailPart, size: u32) -> Self {
        Self {
            part,
            size,
            url: None,
            request: LatestRequest::new(),
            thumbnail: Thumbnail::placeholder(part, size),
            revision: 0,
        }
    }

    pub fn part(&self) -> ThumbnailPart {
        self.part
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn thumbnail(&self) -> &Thumbnail {
        &self.thumbnail
    }

    pub fn is_pending(&self) -> bool {
        self.request.is_pending()
    }

    /// Bumped every time the raster changes, so hosts know when to re-upload it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Points the slot at a new source. Unchanged URLs are left alone.
    pub fn set_source<H: SceneHandles>(&mut self, url: Option<&str>, cache: &mut TextureCache<H>) {
        let url = url.map(str::trim).filter(|u| !u.is_empty());
        if url == self.url.as_deref() {
            return;
        }
        self.url = url.map(str::to_string);
        let Some(url) = url else {
            self.request.clear();
            self.show(Thumbnail::placeholder(self.part, self.size));
            return;
        };
        self.request.begin(url);
        match cache.request(url) {
            LoadStatus::Pending => {}
            LoadStatus::Ready(image) => {
                self.request.clear();
                self.show(Thumbnail::from_source(&image, self.part, self.size));
            }
            LoadStatus::Failed(err) => {
                self.request.clear();
                debug!("thumbnail not loaded: {err}");
                self.show(Thumbnail::placeholder(self.part, self.size));
            }
        }
    }

    /// Draws `completion` if this slot is still waiting for it.
    pub fn handle_completion(&mut self, completion: &LoadCompletion) -> Result<(), ViewerError> {
        if !self.request.resolve(&completion.url) {
            return Err(ViewerError::stale(&completion.url));
        }
        let thumbnail = match &completion.result {
            Ok(image) => Thumbnail::from_source(image, self.part, self.size),
            Err(err) => {
                debug!("thumbnail not loaded: {err}");
                Thumbnail::placeholder(self.part, self.size)
            }
        };
        self.show(thumbnail);
        Ok(())
    }

    fn show(&mut self, thumbnail: Thumbnail) {
        self.thumbnail = thumbnail;
        self.revision += 1;
    }
}
