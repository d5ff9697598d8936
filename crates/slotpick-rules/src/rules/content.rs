//! Content-presence rules backed by an opaque image probe.
//!
//! These rules fetch a representative image through the asset's fetch
//! capability and hand it to an external detector. They block the calling
//! thread on a bounded wait, so they must only run on the validation
//! pipeline's blocking context, never on the coordination context.

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use slotpick_core::{Asset, FailureCode, ImageTarget, MediaKind, ValidationFailure};
use thiserror::Error;

use crate::rules::SelectionRule;

/// Opaque external detector (face recognizer, barcode scanner, ...).
///
/// Receives the representative image and reports whether the subject is
/// present. Detection internals are out of scope for this workspace.
pub trait ContentDetector: Send + Sync {
    fn detect(&self, image: &DynamicImage) -> Result<bool, DetectorError>;
}

/// Error reported by a [`ContentDetector`].
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct DetectorError(pub String);

const FACE_TARGET: ImageTarget = ImageTarget::square(512);
const CODE_TARGET: ImageTarget = ImageTarget::square(768);
const FACE_TIMEOUT: Duration = Duration::from_secs(2);
const CODE_TIMEOUT: Duration = Duration::from_secs(60);

/// Requires (or merely probes for) a subject in still images.
///
/// Non-image assets always pass. Fetch failures and timeouts map to
/// [`FailureCode::ContentProbeUnavailable`], detector errors to
/// [`FailureCode::ContentDetectionFailed`], and a missing subject to
/// [`FailureCode::ContentNotDetected`].
pub struct ContentPresenceRule {
    id: &'static str,
    subject: &'static str,
    require: bool,
    target: ImageTarget,
    timeout: Duration,
    detector: Arc<dyn ContentDetector>,
}

impl ContentPresenceRule {
    /// Face-presence rule.
    pub fn face(detector: Arc<dyn ContentDetector>) -> Self {
        Self {
            id: "content/face-presence",
            subject: "face",
            require: true,
            target: FACE_TARGET,
            timeout: FACE_TIMEOUT,
            detector,
        }
    }

    /// Machine-readable-code (QR and similar) presence rule.
    pub fn machine_code(detector: Arc<dyn ContentDetector>) -> Self {
        Self {
            id: "content/code-presence",
            subject: "machine-readable code",
            require: true,
            target: CODE_TARGET,
            timeout: CODE_TIMEOUT,
            detector,
        }
    }

    /// Whether a missing subject fails validation (defaults to true).
    pub fn required(mut self, require: bool) -> Self {
        self.require = require;
        self
    }

    /// Overrides the bounded wait on the image fetch.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl SelectionRule for ContentPresenceRule {
    fn id(&self) -> &'static str {
        self.id
    }

    fn description(&self) -> String {
        format!("requires a {} in the photo", self.subject)
    }

    fn validate(&self, asset: &dyn Asset) -> Option<ValidationFailure> {
        if asset.media_kind() != MediaKind::Image {
            return None;
        }

        let image = match asset.fetch_image(self.target).wait_timeout(self.timeout) {
            Ok(Some(image)) => image,
            Ok(None) => {
                return Some(
                    ValidationFailure::new(
                        FailureCode::ContentProbeUnavailable,
                        format!("unable to load image for {} detection", self.subject),
                    )
                    .with_extra("subject", self.subject),
                )
            }
            Err(_) => {
                return Some(
                    ValidationFailure::new(
                        FailureCode::ContentProbeUnavailable,
                        format!(
                            "image fetch for {} detection timed out after {:?}",
                            self.subject, self.timeout
                        ),
                    )
                    .with_extra("subject", self.subject),
                )
            }
        };

        match self.detector.detect(&image) {
            Ok(found) => {
                if self.require && !found {
                    Some(
                        ValidationFailure::new(
                            FailureCode::ContentNotDetected,
                            format!("no {} detected in the image", self.subject),
                        )
                        .with_extra("subject", self.subject),
                    )
                } else {
                    None
                }
            }
            Err(err) => Some(
                ValidationFailure::new(
                    FailureCode::ContentDetectionFailed,
                    format!("{} detection failed", self.subject),
                )
                .with_extra("subject", self.subject)
                .with_extra("error", err.to_string()),
            ),
        }
    }
}
