//! Core geometry for multi-camera face-capture review.
//!
//! This crate is purely computational: calibration types, per-camera
//! projection matrices, the photo/NDC coordinate mappings under quarter-turn
//! rotation states, and the color codec behind the pick readback protocol.
//! Nothing here touches the filesystem or a GPU.

mod calibration;
mod logger;
pub mod pick;
mod projection;
mod transform;

pub use calibration::{CalibrationSet, CameraCalibration, RigAlignment, SensorIntrinsics};
pub use projection::{build_projections, intrinsic_matrix, CameraProjection, ProjectionError};
pub use transform::{
    cursor_to_ndc, ndc_to_photo, photo_to_ndc, RotationParseError, RotationState,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
