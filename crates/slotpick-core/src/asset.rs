//! Asset capability surface consumed by the selection core.

use std::fmt;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media kind of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Unknown,
}

impl MediaKind {
    /// Returns true for kinds with a meaningful playback duration.
    pub fn is_time_based(self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio)
    }
}

/// Requested pixel size for a representative image fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTarget {
    pub width: u32,
    pub height: u32,
}

impl ImageTarget {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }
}

/// Shared reference to an asset. The core never owns assets past a reference.
pub type AssetRef = Arc<dyn Asset>;

/// Lightweight identity and metadata for a media item, plus an asynchronous,
/// cancelable fetch of a representative image.
///
/// Identity (`id`) is an opaque string, stable for the asset's lifetime.
/// Pixel dimensions are 0 when unknown; duration is 0 for non-time-based
/// media. Implementations live in concrete sources (photo library, files,
/// network) outside this workspace.
pub trait Asset: fmt::Debug + Send + Sync {
    fn id(&self) -> &str;

    fn media_kind(&self) -> MediaKind;

    fn pixel_width(&self) -> u32;

    fn pixel_height(&self) -> u32;

    /// Duration in seconds; 0 for non-time-based media.
    fn duration_secs(&self) -> f64;

    fn created_at(&self) -> Option<SystemTime> {
        None
    }

    fn modified_at(&self) -> Option<SystemTime> {
        None
    }

    /// Begins fetching a representative image at roughly `target` size.
    ///
    /// The returned handle resolves to `None` when the source cannot produce
    /// an image. Dropping the handle cancels the outstanding request.
    fn fetch_image(&self, target: ImageTarget) -> ImageFetch;

    /// Identity comparison; two assets are the same item iff their ids match.
    fn same_identity(&self, other: &dyn Asset) -> bool {
        self.id() == other.id()
    }
}

/// The bounded wait on an [`ImageFetch`] elapsed before the source delivered.
#[derive(Debug, Error)]
#[error("representative image fetch timed out")]
pub struct FetchTimedOut;

/// In-flight representative image request.
///
/// Sources fulfil the request through the paired [`ImageDelivery`]; consumers
/// block on [`ImageFetch::wait_timeout`] from a context that tolerates
/// blocking (never the coordination context). Dropping the handle before the
/// image arrives cancels the request at the source.
pub struct ImageFetch {
    rx: mpsc::Receiver<Option<DynamicImage>>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl ImageFetch {
    /// A fetch that is already settled, for sources with the image in hand.
    pub fn ready(image: Option<DynamicImage>) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(image);
        Self { rx, cancel: None }
    }

    /// A fetch the source fulfils later through the returned delivery handle.
    pub fn pending() -> (Self, ImageDelivery) {
        let (tx, rx) = mpsc::channel();
        (Self { rx, cancel: None }, ImageDelivery { tx })
    }

    /// Attaches a cancellation hook invoked if the request is abandoned
    /// before delivery.
    pub fn on_cancel(mut self, cancel: impl FnOnce() + Send + 'static) -> Self {
        self.cancel = Some(Box::new(cancel));
        self
    }

    /// Waits for the image, up to `timeout`.
    ///
    /// `Ok(None)` means the source settled without an image. On timeout the
    /// request is cancelled as the handle drops.
    pub fn wait_timeout(mut self, timeout: Duration) -> Result<Option<DynamicImage>, FetchTimedOut> {
        match self.rx.recv_timeout(timeout) {
            Ok(image) => {
                self.cancel = None;
                Ok(image)
            }
            // Delivery handle dropped without sending: settled, no image.
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                self.cancel = None;
                Ok(None)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => Err(FetchTimedOut),
        }
    }

    /// Cancels the outstanding request.
    pub fn cancel(self) {
        // Drop runs the hook.
    }
}

impl Drop for ImageFetch {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for ImageFetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFetch")
            .field("cancelable", &self.cancel.is_some())
            .finish()
    }
}

/// Source-side handle that fulfils a pending [`ImageFetch`].
pub struct ImageDelivery {
    tx: mpsc::Sender<Option<DynamicImage>>,
}

impl ImageDelivery {
    /// Delivers the fetched image (or `None` when none could be produced).
    /// Ignored if the consumer already gave up.
    pub fn deliver(self, image: Option<DynamicImage>) {
        let _ = self.tx.send(image);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_media_kind_time_based() {
        assert!(MediaKind::Video.is_time_based());
        assert!(MediaKind::Audio.is_time_based());
        assert!(!MediaKind::Image.is_time_based());
        assert!(!MediaKind::Unknown.is_time_based());
    }

    #[test]
    fn test_ready_fetch_resolves_immediately() {
        let fetch = ImageFetch::ready(Some(DynamicImage::new_rgba8(4, 4)));
        let image = fetch.wait_timeout(Duration::from_millis(10)).unwrap();
        assert!(image.is_some());
    }

    #[test]
    fn test_pending_fetch_delivers() {
        let (fetch, delivery) = ImageFetch::pending();
        delivery.deliver(None);
        let image = fetch.wait_timeout(Duration::from_millis(10)).unwrap();
        assert!(image.is_none());
    }

    #[test]
    fn test_fetch_times_out() {
        let (fetch, _delivery) = ImageFetch::pending();
        assert!(fetch.wait_timeout(Duration::from_millis(10)).is_err());
    }

    #[test]
    fn test_dropped_delivery_settles_without_image() {
        let (fetch, delivery) = ImageFetch::pending();
        drop(delivery);
        let image = fetch.wait_timeout(Duration::from_millis(10)).unwrap();
        assert!(image.is_none());
    }

    #[test]
    fn test_timeout_cancels_request() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let (fetch, _delivery) = ImageFetch::pending();
        let fetch = fetch.on_cancel(move || flag.store(true, Ordering::SeqCst));
        assert!(fetch.wait_timeout(Duration::from_millis(10)).is_err());
        assert!(cancelled.load(Ordering::SeqCst));
    }

    #[test]
    fn test_settled_fetch_does_not_cancel() {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let fetch =
            ImageFetch::ready(None).on_cancel(move || flag.store(true, Ordering::SeqCst));
        let _ = fetch.wait_timeout(Duration::from_millis(10)).unwrap();
        assert!(!cancelled.load(Ordering::SeqCst));
    }
}
