//! In-memory assets and detectors for exercising the selection pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::DynamicImage;
use slotpick_core::{Asset, AssetRef, ImageFetch, ImageTarget, MediaKind};
use slotpick_rules::rules::content::{ContentDetector, DetectorError};

/// In-memory asset with configurable metadata.
///
/// `photo` and `video` cover the common shapes; the `with_*` methods adjust
/// the rest. `build` yields the shared reference the engine consumes.
#[derive(Debug)]
pub struct MemoryAsset {
    id: String,
    kind: MediaKind,
    width: u32,
    height: u32,
    duration: f64,
    image: Option<DynamicImage>,
}

impl MemoryAsset {
    /// A 1024x1024 still image that serves its own pixels on fetch.
    pub fn photo(id: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: MediaKind::Image,
            width: 1024,
            height: 1024,
            duration: 0.0,
            image: Some(DynamicImage::new_rgba8(8, 8)),
        }
    }

    /// A 1920x1080 video clip of the given duration. Serves no image.
    pub fn video(id: &str, duration_secs: f64) -> Self {
        Self {
            id: id.to_string(),
            kind: MediaKind::Video,
            width: 1920,
            height: 1080,
            duration: duration_secs,
            image: None,
        }
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Removes the image payload; content probes will see an unavailable
    /// fetch.
    pub fn without_image(mut self) -> Self {
        self.image = None;
        self
    }

    pub fn build(self) -> AssetRef {
        Arc::new(self)
    }
}

impl Asset for MemoryAsset {
    fn id(&self) -> &str {
        &self.id
    }

    fn media_kind(&self) -> MediaKind {
        self.kind
    }

    fn pixel_width(&self) -> u32 {
        self.width
    }

    fn pixel_height(&self) -> u32 {
        self.height
    }

    fn duration_secs(&self) -> f64 {
        self.duration
    }

    fn fetch_image(&self, _target: ImageTarget) -> ImageFetch {
        ImageFetch::ready(self.image.clone())
    }
}

/// Content detector with a fixed verdict and an invocation counter.
pub struct FlagDetector {
    found: bool,
    calls: AtomicUsize,
}

impl FlagDetector {
    pub fn new(found: bool) -> Arc<Self> {
        Arc::new(Self {
            found,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ContentDetector for FlagDetector {
    fn detect(&self, _image: &DynamicImage) -> Result<bool, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.found)
    }
}
