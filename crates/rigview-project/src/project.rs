//! Capture project loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use rigview_core::{
    build_projections, CalibrationSet, CameraProjection, ProjectionError, RotationState,
};

use crate::calibration_xml::{self, CalibrationError};
use crate::landmarks::{self, LandmarkSet, SaveError, ZoneLayout};
use crate::mesh;
use crate::photos::{self, AssetError};
use crate::rotation_meta::{self, RotationMetaError};

/// Calibration file name inside a project root.
pub const CALIBRATION_FILE: &str = "cam.xml";

/// Options controlling project loading.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProjectOptions {
    /// Force a zone layout instead of discovering it from the directories.
    #[serde(default)]
    pub zone_layout: Option<ZoneLayout>,
}

/// Fatal project-load failure.
#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("project root {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("calibration: {0}")]
    Calibration(#[from] CalibrationError),
    #[error("projection: {0}")]
    Projection(#[from] ProjectionError),
    #[error("asset: {0}")]
    Asset(#[from] AssetError),
    #[error("rotation metadata: {0}")]
    RotationMeta(#[from] RotationMetaError),
}

/// Photo placement data for one camera.
#[derive(Clone, Debug)]
pub struct PhotoInfo {
    /// Photo path on disk; `None` means the host renders a placeholder.
    pub path: Option<PathBuf>,
    /// Width in pixels; the sensor resolution when the photo is missing.
    pub width: u32,
    /// Height in pixels; the sensor resolution when the photo is missing.
    pub height: u32,
}

/// A loaded capture project.
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub calibration: CalibrationSet,
    pub projections: Vec<CameraProjection>,
    pub photos: Vec<PhotoInfo>,
    pub landmarks: Vec<LandmarkSet>,
    pub rotations: Vec<RotationState>,
    pub zone_layout: ZoneLayout,
    pub mesh_path: PathBuf,
}

impl Project {
    /// Load a capture project from disk with default options.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        Self::load_with(root, &ProjectOptions::default())
    }

    /// Load a capture project from disk.
    ///
    /// Calibration, projections, the mesh file and rotation metadata are
    /// load-fatal; photo and landmark problems degrade per camera with a
    /// warning so one bad file never blocks a review session.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(root, options)))]
    pub fn load_with(
        root: impl AsRef<Path>,
        options: &ProjectOptions,
    ) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(ProjectError::NotADirectory(root));
        }

        // 1. Calibration and projections; nothing works without them.
        let calibration = calibration_xml::load_calibration(root.join(CALIBRATION_FILE))?;
        let projections = build_projections(&calibration)?;
        log::info!(
            "loaded rig calibration: {} cameras from {}",
            calibration.camera_count(),
            root.display()
        );

        // 2. The mesh must exist even though decoding is the host's job.
        let mesh_path = mesh::locate_mesh(&root)?;

        // 3. Zone layout: forced by options or discovered from the tree.
        let zone_layout = options.zone_layout.unwrap_or_else(|| discover_layout(&root));
        log::debug!("zone layout: {zone_layout:?}");

        // 4. Photos and landmarks, degrading per camera.
        let image_dir = root.join(photos::IMAGE_DIR);
        let mut photo_infos = Vec::with_capacity(calibration.camera_count());
        let mut landmark_sets = Vec::with_capacity(calibration.camera_count());
        for (index, cam) in calibration.cameras.iter().enumerate() {
            let stem = photos::camera_stem(index);

            let photo = photos::find_photo(&image_dir, &stem).and_then(|path| {
                photos::photo_dimensions(&path).map(|(width, height)| PhotoInfo {
                    path: Some(path),
                    width,
                    height,
                })
            });
            let photo = photo.unwrap_or_else(|err| {
                log::warn!("camera {index}: {err}; using the sensor resolution placeholder");
                PhotoInfo {
                    path: None,
                    width: cam.intrinsics.width,
                    height: cam.intrinsics.height,
                }
            });

            let set = landmarks::load_set(&root, &stem, zone_layout).unwrap_or_else(|err| {
                log::warn!("camera {index}: {err}; starting from default landmarks");
                LandmarkSet::new()
            });

            photo_infos.push(photo);
            landmark_sets.push(set);
        }

        // 5. Rotation metadata: an explicit sidecar wins, otherwise derive.
        let rotation_path = root.join(rotation_meta::ROTATION_FILE);
        let rotations = if rotation_path.is_file() {
            rotation_meta::load_rotation_table(&rotation_path, calibration.camera_count())?
        } else {
            photo_infos
                .iter()
                .zip(&landmark_sets)
                .map(|(photo, set)| rotation_meta::derive_rotation((photo.width, photo.height), set))
                .collect()
        };

        Ok(Self {
            root,
            calibration,
            projections,
            photos: photo_infos,
            landmarks: landmark_sets,
            rotations,
            zone_layout,
            mesh_path,
        })
    }

    #[inline]
    pub fn camera_count(&self) -> usize {
        self.projections.len()
    }

    /// Photo dimensions for a camera.
    ///
    /// Panics if `camera` is out of range.
    pub fn photo_dims(&self, camera: usize) -> (u32, u32) {
        let photo = &self.photos[camera];
        (photo.width, photo.height)
    }

    /// Save one camera's landmark set, backing up existing files first.
    ///
    /// Panics if `camera` is out of range.
    pub fn save_landmarks(&self, camera: usize) -> Result<(), SaveError> {
        landmarks::save_set(
            &self.root,
            &photos::camera_stem(camera),
            self.zone_layout,
            &self.landmarks[camera],
        )
    }
}

/// Two-zone projects carry an ear landmark directory.
fn discover_layout(root: &Path) -> ZoneLayout {
    if root.join(landmarks::EAR_DIR).is_dir() {
        ZoneLayout::FaceAndEars
    } else {
        ZoneLayout::Single
    }
}
