//! Capture-project loading for the rig viewer.
//!
//! A capture project is a directory with a fixed shape: `cam.xml` (rig
//! calibration), `image/` (one 8-digit photo per camera), `face_landmarks/`
//! (and `ear_landmarks/` in the two-zone layout), a `photoscan.ply` mesh
//! and an optional `view_rotations.json` sidecar. [`Project::load`] pulls
//! all of it together, failing fast on anything the viewer cannot run
//! without and degrading per camera on anything it can.

pub mod calibration_xml;
pub mod landmarks;
pub mod mesh;
pub mod photos;
pub mod rotation_meta;

mod project;

pub use calibration_xml::{load_calibration, parse_calibration, CalibrationError};
pub use landmarks::{
    LandmarkIoError, LandmarkSet, SaveError, ZoneLayout, EAR_LANDMARKS, FACE_LANDMARKS,
    TOTAL_LANDMARKS,
};
pub use mesh::{locate_mesh, FaceMesh, MeshSource, MeshVertex, MESH_FILE};
pub use photos::{camera_stem, find_photo, photo_dimensions, AssetError, IMAGE_DIR};
pub use project::{PhotoInfo, Project, ProjectError, ProjectOptions, CALIBRATION_FILE};
pub use rotation_meta::{derive_rotation, load_rotation_table, RotationMetaError, ROTATION_FILE};
