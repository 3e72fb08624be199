use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::Arc;
use std::thread;

use crossbeam::channel::{Receiver, Sender, unbounded};
use image::{ImageReader, RgbaImage};
use sv_atlas::check_atlas_size;
use sv_model::{SceneBackend, SceneHandles};
use tracing::{debug, warn};

use crate::{ImageFetcher, ViewerError};

pub type DecodedImage = Arc<RgbaImage>;

/// A finished load, handed to every consumer that may be waiting on `url`.
#[derive(Debug, Clone)]
pub struct LoadCompletion {
    pub url: String,
    pub result: Result<DecodedImage, ViewerError>,
}

#[derive(Debug, Clone)]
pub enum LoadStatus {
    /// Already decoded; usable right away.
    Ready(DecodedImage),
    /// Queued or attached to a load already in flight. Watch [`TextureCache::tick`].
    Pending,
    /// Could not even be queued.
    Failed(ViewerError),
}

/// Decodes image bytes to RGBA8.
///
/// The header is read first; images whose size matches no skin or cape template are rejected
/// without decoding their pixels.
pub fn decode_image(url: &str, bytes: &[u8]) -> Result<RgbaImage, ViewerError> {
    if bytes.is_empty() {
        return Err(ViewerError::decode(url, "empty response"));
    }
    let (width, height) = reader(url, bytes)?
        .into_dimensions()
        .map_err(|e| ViewerError::decode(url, e))?;
    check_atlas_size(width, height).map_err(|source| ViewerError::UnsupportedLayout {
        url: url.to_string(),
        source,
    })?;
    reader(url, bytes)?
        .decode()
        .map(|img| img.to_rgba8())
        .map_err(|e| ViewerError::decode(url, e))
}

fn reader<'a>(url: &str, bytes: &'a [u8]) -> Result<ImageReader<Cursor<&'a [u8]>>, ViewerError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ViewerError::decode(url, e))
}

/// The receiving end of the job queue.
///
/// The threaded cache runs one of these per worker; tests take one from
/// [`TextureCache::detached`] and resolve jobs by hand.
pub struct LoadWorker {
    job_rx: Receiver<String>,
    result_tx: Sender<LoadCompletion>,
}

impl LoadWorker {
    /// Next queued URL, if any, without blocking.
    pub fn next_job(&self) -> Option<String> {
        self.job_rx.try_recv().ok()
    }

    /// Completes `url` with fetched bytes (or a fetch error).
    pub fn resolve(&self, url: &str, bytes: Result<Vec<u8>, ViewerError>) {
        let result = bytes
            .and_then(|bytes| decode_image(url, &bytes))
            .map(Arc::new);
        let _ = self.result_tx.send(LoadCompletion {
            url: url.to_string(),
            result,
        });
    }

    /// Blocks on the job queue until the cache is dropped.
    pub fn run(self, fetcher: Arc<dyn ImageFetcher>) {
        while let Ok(url) = self.job_rx.recv() {
            let bytes = fetcher.fetch(&url);
            self.resolve(&url, bytes);
        }
    }
}

/// Shared URL -> texture cache.
///
/// Decoded images are memoized by exact URL and uploaded to the scene at most once. A second
/// request for a URL that is already loading attaches to the first one instead of fetching
/// again. Failures are not memoized, so asking again retries.
pub struct TextureCache<H: SceneHandles> {
    job_tx: Sender<String>,
    result_rx: Receiver<LoadCompletion>,
    in_flight: HashSet<String>,
    preload_only: HashSet<String>,
    decoded: HashMap<String, DecodedImage>,
    uploaded: HashMap<String, H::Texture>,
    fetches: usize,
}

impl<H: SceneHandles> TextureCache<H> {
    /// Starts `workers` loader threads fetching through `fetcher`.
    pub fn spawn(fetcher: Arc<dyn ImageFetcher>, workers: usize) -> Self {
        let (cache, worker) = Self::detached();
        for idx in 0..workers.max(1) {
            let worker = LoadWorker {
                job_rx: worker.job_rx.clone(),
                result_tx: worker.result_tx.clone(),
            };
            let fetcher = Arc::clone(&fetcher);
            let spawned = thread::Builder::new()
                .name(format!("texture-loader-{idx}"))
                .spawn(move || worker.run(fetcher));
            if let Err(err) = spawned {
                warn!("failed to start texture loader thread: {err}");
            }
        }
        cache
    }

    /// A cache with no threads behind it. Jobs wait in the returned worker.
    pub fn detached() -> (Self, LoadWorker) {
        let (job_tx, job_rx) = unbounded::<String>();
        let (result_tx, result_rx) = unbounded::<LoadCompletion>();
        let cache = Self {
            job_tx,
            result_rx,
            in_flight: HashSet::new(),
            preload_only: HashSet::new(),
            decoded: HashMap::new(),
            uploaded: HashMap::new(),
            fetches: 0,
        };
        (cache, LoadWorker { job_rx, result_tx })
    }

    pub fn request(&mut self, url: &str) -> LoadStatus {
        self.preload_only.remove(url);
        if let Some(image) = self.decoded.get(url) {
            return LoadStatus::Ready(Arc::clone(image));
        }
        if self.in_flight.contains(url) {
            return LoadStatus::Pending;
        }
        match self.dispatch(url) {
            Ok(()) => LoadStatus::Pending,
            Err(err) => LoadStatus::Failed(err),
        }
    }

    /// Warms the cache without attaching the results anywhere. Failures are only logged.
    pub fn preload<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for url in urls {
            let url = url.as_ref().trim();
            if url.is_empty() || self.decoded.contains_key(url) || self.in_flight.contains(url) {
                continue;
            }
            match self.dispatch(url) {
                Ok(()) => {
                    self.preload_only.insert(url.to_string());
                }
                Err(err) => debug!("cape preload skipped: {err}"),
            }
        }
    }

    fn dispatch(&mut self, url: &str) -> Result<(), ViewerError> {
        self.job_tx
            .send(url.to_string())
            .map_err(|_| ViewerError::load(url, "texture loader is gone"))?;
        self.in_flight.insert(url.to_string());
        self.fetches += 1;
        Ok(())
    }

    /// Collects finished loads. Call once per frame and fan the result out to consumers.
    pub fn tick(&mut self) -> Vec<LoadCompletion> {
        let mut done = Vec::new();
        while let Ok(completion) = self.result_rx.try_recv() {
            self.in_flight.remove(&completion.url);
            let preload = self.preload_only.remove(&completion.url);
            match &completion.result {
                Ok(image) => {
                    debug!(
                        url = %completion.url,
                        width = image.width(),
                        height = image.height(),
                        "texture decoded"
                    );
                    self.decoded.insert(completion.url.clone(), Arc::clone(image));
                }
                Err(err) if preload => debug!("preload failed: {err}"),
                Err(err) => warn!("{err}"),
            }
            done.push(completion);
        }
        done
    }

    pub fn get(&self, url: &str) -> Option<DecodedImage> {
        self.decoded.get(url).cloned()
    }

    /// Scene texture for a decoded URL, uploading it on first use.
    pub fn upload<B: SceneBackend<H>>(
        &mut self,
        url: &str,
        backend: &mut B,
    ) -> Option<H::Texture> {
        if let Some(texture) = self.uploaded.get(url) {
            return Some(texture.clone());
        }
        let image = self.decoded.get(url)?;
        let texture = backend.upload_texture(url, image);
        self.uploaded.insert(url.to_string(), texture.clone());
        Some(texture)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Jobs handed to the loader over the cache's lifetime.
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }

    /// Releases every uploaded texture. Decoded images stay memoized.
    pub fn release_textures<B: SceneBackend<H>>(&mut self, backend: &mut B) {
        for (_, texture) in self.uploaded.drain() {
            backend.release_texture(texture);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba};
    use sv_atlas::AtlasError;
    use sv_model::HeadlessScene;

    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 10, 10, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).expect("encode png");
        out.into_inner()
    }

    #[test]
    fn concurrent_requests_coalesce() {
        let (mut cache, worker) = TextureCache::<HeadlessScene>::detached();
        assert!(matches!(cache.request("a.png"), LoadStatus::Pending));
        assert!(matches!(cache.request("a.png"), LoadStatus::Pending));
        assert_eq!(cache.fetch_count(), 1);
        assert_eq!(worker.next_job().as_deref(), Some("a.png"));
        assert_eq!(worker.next_job(), None);

        worker.resolve("a.png", Ok(png_bytes(64, 64)));
        let done = cache.tick();
        assert_eq!(done.len(), 1);
        assert!(matches!(cache.request("a.png"), LoadStatus::Ready(_)));
        assert_eq!(cache.fetch_count(), 1);
    }

    #[test]
    fn failures_are_reported_and_retried() {
        let (mut cache, worker) = TextureCache::<HeadlessScene>::detached();
        cache.request("404.png");
        let url = worker.next_job().expect("job");
        worker.resolve(&url, Err(ViewerError::load(&url, "404 Not Found")));
        let done = cache.tick();
        assert!(matches!(done[0].result, Err(ViewerError::LoadFailure { .. })));

        assert!(matches!(cache.request("404.png"), LoadStatus::Pending));
        assert_eq!(cache.fetch_count(), 2);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let (mut cache, worker) = TextureCache::<HeadlessScene>::detached();
        cache.request("empty.png");
        cache.request("junk.png");
        worker.resolve("empty.png", Ok(Vec::new()));
        worker.resolve("junk.png", Ok(b"not a png".to_vec()));
        let done = cache.tick();
        assert!(
            done.iter()
                .all(|c| matches!(c.result, Err(ViewerError::DecodeFailure { .. })))
        );
    }

    #[test]
    fn off_template_sizes_are_rejected_from_the_header() {
        let (mut cache, worker) = TextureCache::<HeadlessScene>::detached();
        cache.request("big.png");
        worker.resolve("big.png", Ok(png_bytes(1024, 1024)));
        let done = cache.tick();
        assert!(matches!(
            &done[0].result,
            Err(ViewerError::UnsupportedLayout {
                source: AtlasError::UnsupportedLayout {
                    width: 1024,
                    height: 1024
                },
                ..
            })
        ));
        assert!(cache.get("big.png").is_none());

        let legacy_cape = decode_image("cape.png", &png_bytes(22, 17)).unwrap();
        assert_eq!(legacy_cape.dimensions(), (22, 17));
    }

    #[test]
    fn upload_happens_once_per_url() {
        let (mut cache, worker) = TextureCache::<HeadlessScene>::detached();
        let mut scene = HeadlessScene::new();
        cache.request("a.png");
        worker.resolve("a.png", Ok(png_bytes(64, 32)));
        cache.tick();

        let first = cache.upload("a.png", &mut scene).expect("decoded");
        let second = cache.upload("a.png", &mut scene).expect("memoized");
        assert_eq!(first, second);
        assert_eq!(scene.uploads(), 1);
        assert_eq!(scene.texture_size(first), Some([64, 32]));
        assert!(cache.upload("missing.png", &mut scene).is_none());

        cache.release_textures(&mut scene);
        assert_eq!(scene.live_resources().textures, 0);
    }

    #[test]
    fn preload_skips_known_urls_and_swallows_failures() {
        let (mut cache, worker) = TextureCache::<HeadlessScene>::detached();
        cache.request("equipped.png");
        cache.preload(["equipped.png", "", "a.png", "b.png", "a.png"]);
        assert_eq!(cache.fetch_count(), 3);

        worker.resolve("a.png", Ok(png_bytes(64, 32)));
        worker.resolve("b.png", Err(ViewerError::load("b.png", "timeout")));
        cache.tick();
        assert!(cache.get("a.png").is_some());
        assert!(cache.get("b.png").is_none());
        assert!(matches!(cache.request("a.png"), LoadStatus::Ready(_)));
    }

    #[test]
    fn dropped_worker_fails_new_requests() {
        let (mut cache, worker) = TextureCache::<HeadlessScene>::detached();
        drop(worker);
        assert!(matches!(cache.request("a.png"), LoadStatus::Failed(_)));
        assert_eq!(cache.in_flight_count(), 0);
    }
}
