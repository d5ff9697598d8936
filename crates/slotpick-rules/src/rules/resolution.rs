//! Pixel-dimension thresholds.

use slotpick_core::{Asset, FailureCode, ValidationFailure};

use crate::rules::SelectionRule;

#[derive(Debug, Clone, Copy)]
enum ResolutionConstraint {
    /// width >= w and height >= h
    GreaterThan { width: u32, height: u32 },
    /// width <= w and height <= h
    LessThan { width: u32, height: u32 },
    Within {
        min_width: u32,
        min_height: u32,
        max_width: u32,
        max_height: u32,
    },
    WidthGreaterThan(u32),
    WidthLessThan(u32),
    WidthWithin(u32, u32),
    HeightGreaterThan(u32),
    HeightLessThan(u32),
    HeightWithin(u32, u32),
}

/// Validates pixel dimensions against one of nine comparison kinds.
///
/// A width or height of 0 (unknown) is an immediate
/// [`FailureCode::ResolutionInvalid`], distinct from any threshold failure.
#[derive(Debug, Clone)]
pub struct ResolutionRule {
    constraint: ResolutionConstraint,
}

impl ResolutionRule {
    pub fn greater_than(width: u32, height: u32) -> Self {
        Self::with(ResolutionConstraint::GreaterThan { width, height })
    }

    pub fn less_than(width: u32, height: u32) -> Self {
        Self::with(ResolutionConstraint::LessThan { width, height })
    }

    pub fn within(min_width: u32, min_height: u32, max_width: u32, max_height: u32) -> Self {
        assert!(
            min_width <= max_width && min_height <= max_height,
            "minimum size must not exceed maximum size"
        );
        Self::with(ResolutionConstraint::Within {
            min_width,
            min_height,
            max_width,
            max_height,
        })
    }

    pub fn width_greater_than(min_width: u32) -> Self {
        Self::with(ResolutionConstraint::WidthGreaterThan(min_width))
    }

    pub fn width_less_than(max_width: u32) -> Self {
        Self::with(ResolutionConstraint::WidthLessThan(max_width))
    }

    pub fn width_within(min_width: u32, max_width: u32) -> Self {
        assert!(min_width <= max_width, "minimum width must not exceed maximum");
        Self::with(ResolutionConstraint::WidthWithin(min_width, max_width))
    }

    pub fn height_greater_than(min_height: u32) -> Self {
        Self::with(ResolutionConstraint::HeightGreaterThan(min_height))
    }

    pub fn height_less_than(max_height: u32) -> Self {
        Self::with(ResolutionConstraint::HeightLessThan(max_height))
    }

    pub fn height_within(min_height: u32, max_height: u32) -> Self {
        assert!(min_height <= max_height, "minimum height must not exceed maximum");
        Self::with(ResolutionConstraint::HeightWithin(min_height, max_height))
    }

    fn with(constraint: ResolutionConstraint) -> Self {
        Self { constraint }
    }

    fn check(&self, width: u32, height: u32) -> Option<(FailureCode, String)> {
        use ResolutionConstraint::*;
        match self.constraint {
            GreaterThan {
                width: min_w,
                height: min_h,
            } if width < min_w || height < min_h => Some((
                FailureCode::ResolutionTooSmall,
                format!("resolution too small: requires at least {min_w}x{min_h}, got {width}x{height}"),
            )),
            LessThan {
                width: max_w,
                height: max_h,
            } if width > max_w || height > max_h => Some((
                FailureCode::ResolutionTooLarge,
                format!("resolution too large: allows at most {max_w}x{max_h}, got {width}x{height}"),
            )),
            Within {
                min_width,
                min_height,
                max_width,
                max_height,
            } if width < min_width
                || width > max_width
                || height < min_height
                || height > max_height =>
            {
                Some((
                    FailureCode::ResolutionOutOfRange,
                    format!(
                        "resolution out of range: requires {min_width}x{min_height}..{max_width}x{max_height}, got {width}x{height}"
                    ),
                ))
            }
            WidthGreaterThan(min_w) if width < min_w => Some((
                FailureCode::WidthTooSmall,
                format!("width too small: requires at least {min_w}, got {width}"),
            )),
            WidthLessThan(max_w) if width > max_w => Some((
                FailureCode::WidthTooLarge,
                format!("width too large: allows at most {max_w}, got {width}"),
            )),
            WidthWithin(min_w, max_w) if width < min_w || width > max_w => Some((
                FailureCode::WidthOutOfRange,
                format!("width out of range: requires {min_w}..{max_w}, got {width}"),
            )),
            HeightGreaterThan(min_h) if height < min_h => Some((
                FailureCode::HeightTooSmall,
                format!("height too small: requires at least {min_h}, got {height}"),
            )),
            HeightLessThan(max_h) if height > max_h => Some((
                FailureCode::HeightTooLarge,
                format!("height too large: allows at most {max_h}, got {height}"),
            )),
            HeightWithin(min_h, max_h) if height < min_h || height > max_h => Some((
                FailureCode::HeightOutOfRange,
                format!("height out of range: requires {min_h}..{max_h}, got {height}"),
            )),
            _ => None,
        }
    }
}

impl SelectionRule for ResolutionRule {
    fn id(&self) -> &'static str {
        use ResolutionConstraint::*;
        match self.constraint {
            GreaterThan { .. } => "resolution/greater-than",
            LessThan { .. } => "resolution/less-than",
            Within { .. } => "resolution/within",
            WidthGreaterThan(_) => "resolution/width-greater-than",
            WidthLessThan(_) => "resolution/width-less-than",
            WidthWithin(..) => "resolution/width-within",
            HeightGreaterThan(_) => "resolution/height-greater-than",
            HeightLessThan(_) => "resolution/height-less-than",
            HeightWithin(..) => "resolution/height-within",
        }
    }

    fn description(&self) -> String {
        format!("pixel-dimension constraint ({:?})", self.constraint)
    }

    fn validate(&self, asset: &dyn Asset) -> Option<ValidationFailure> {
        let (width, height) = (asset.pixel_width(), asset.pixel_height());
        if width == 0 || height == 0 {
            return Some(
                ValidationFailure::new(
                    FailureCode::ResolutionInvalid,
                    "pixel size is unknown or invalid",
                )
                .with_extra("width", width)
                .with_extra("height", height),
            );
        }
        self.check(width, height).map(|(code, message)| {
            ValidationFailure::new(code, message)
                .with_extra("width", width)
                .with_extra("height", height)
        })
    }
}
