//! Photo/NDC coordinate mappings under quarter-turn display rotations.
//!
//! Photos are annotated in their stored orientation (origin top-left,
//! +y down) but some rigs mount cameras sideways, so the detail pane shows
//! the photo rotated upright. All mappings here are exact inverses of each
//! other: a pixel mapped into pane NDC and back lands on the same pixel for
//! every rotation state.

use std::fmt;
use std::str::FromStr;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Quarter-turn display orientation of a photo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationState {
    /// Displayed as stored.
    #[default]
    #[serde(rename = "none")]
    None,
    /// Rotated a quarter turn clockwise for display.
    #[serde(rename = "cw")]
    Clockwise,
    /// Rotated a quarter turn counter-clockwise for display.
    #[serde(rename = "ccw")]
    CounterClockwise,
}

/// A rotation string was not one of `none`, `cw`, `ccw`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown rotation state {0:?} (expected none, cw or ccw)")]
pub struct RotationParseError(pub String);

impl RotationState {
    /// The wire/sidecar spelling of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationState::None => "none",
            RotationState::Clockwise => "cw",
            RotationState::CounterClockwise => "ccw",
        }
    }
}

impl fmt::Display for RotationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotationState {
    type Err = RotationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(RotationState::None),
            "cw" => Ok(RotationState::Clockwise),
            "ccw" => Ok(RotationState::CounterClockwise),
            other => Err(RotationParseError(other.to_string())),
        }
    }
}

/// Map a photo pixel to pane NDC under the given display rotation.
///
/// `dims` is the photo `(width, height)` in its stored orientation. NDC
/// covers `[-1, 1]²` with +y up.
pub fn photo_to_ndc(p: Point2<f32>, dims: (u32, u32), rot: RotationState) -> Point2<f32> {
    let w = dims.0 as f32;
    let h = dims.1 as f32;
    match rot {
        RotationState::None => Point2::new(2.0 * p.x / w - 1.0, 2.0 * p.y / h - 1.0),
        RotationState::Clockwise => Point2::new(2.0 * p.y / h - 1.0, 1.0 - 2.0 * p.x / w),
        RotationState::CounterClockwise => Point2::new(2.0 * p.y / h - 1.0, 2.0 * p.x / w - 1.0),
    }
}

/// Exact inverse of [`photo_to_ndc`].
pub fn ndc_to_photo(ndc: Point2<f32>, dims: (u32, u32), rot: RotationState) -> Point2<f32> {
    let w = dims.0 as f32;
    let h = dims.1 as f32;
    match rot {
        RotationState::None => Point2::new((ndc.x + 1.0) * 0.5 * w, (ndc.y + 1.0) * 0.5 * h),
        RotationState::Clockwise => Point2::new((1.0 - ndc.y) * 0.5 * w, (ndc.x + 1.0) * 0.5 * h),
        RotationState::CounterClockwise => {
            Point2::new((ndc.y + 1.0) * 0.5 * w, (ndc.x + 1.0) * 0.5 * h)
        }
    }
}

/// Map a cursor position in viewport pixels (origin top-left, +y down)
/// to NDC.
pub fn cursor_to_ndc(cursor: Point2<f64>, viewport: (u32, u32)) -> Point2<f32> {
    let vw = viewport.0 as f64;
    let vh = viewport.1 as f64;
    Point2::new(
        (2.0 * cursor.x / vw - 1.0) as f32,
        (1.0 - 2.0 * cursor.y / vh) as f32,
    )
}
