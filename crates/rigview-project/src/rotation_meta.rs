//! Per-camera display-rotation metadata.
//!
//! A project may carry an explicit sidecar (`view_rotations.json`, a JSON
//! array with one entry per camera). Without one, states are derived:
//! landscape photos out of this rig are sideways head shots, and the first
//! facial landmark tells the two mounting directions apart. Portrait
//! photos and cameras without annotations display as stored.

use std::fs;
use std::path::Path;

use rigview_core::RotationState;

use crate::landmarks::LandmarkSet;

/// Sidecar file name inside a project root.
pub const ROTATION_FILE: &str = "view_rotations.json";

#[derive(thiserror::Error, Debug)]
pub enum RotationMetaError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("rotation table has {found} entries for {expected} cameras")]
    WrongArity { found: usize, expected: usize },
}

/// Load the sidecar table, checking it covers every camera exactly once.
pub fn load_rotation_table(
    path: &Path,
    cameras: usize,
) -> Result<Vec<RotationState>, RotationMetaError> {
    let raw = fs::read_to_string(path)?;
    let table: Vec<RotationState> = serde_json::from_str(&raw)?;
    if table.len() != cameras {
        return Err(RotationMetaError::WrongArity {
            found: table.len(),
            expected: cameras,
        });
    }
    Ok(table)
}

/// Write a sidecar table as pretty JSON.
pub fn write_rotation_table(
    path: &Path,
    table: &[RotationState],
) -> Result<(), RotationMetaError> {
    let json = serde_json::to_string_pretty(table)?;
    fs::write(path, json)?;
    Ok(())
}

/// Derive a display rotation from photo dimensions and annotations.
pub fn derive_rotation(dims: (u32, u32), landmarks: &LandmarkSet) -> RotationState {
    let (width, height) = dims;
    if width <= height || !landmarks.is_loaded() {
        return RotationState::None;
    }
    let first = landmarks.coords()[0];
    if first.x < width as f32 * 0.5 {
        RotationState::CounterClockwise
    } else {
        RotationState::Clockwise
    }
}
