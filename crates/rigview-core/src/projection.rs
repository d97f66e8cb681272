//! Per-camera projection matrices derived from rig calibration.
//!
//! For a camera with intrinsics `K`, camera-to-rig pose `A` and rig
//! alignment `G`, the world-to-camera transform is `T = A⁻¹ · G⁻¹`, the
//! full projection is `P = K · T`, and `T⁻¹` places the camera (and its
//! image-plane quad) back into world space.

use nalgebra::{Matrix3x4, Matrix4, Point2, Point3, Vector3, Vector4};
use thiserror::Error;

use crate::{CalibrationSet, CameraCalibration, SensorIntrinsics};

/// Failure while assembling projection matrices.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A camera pose could not be inverted.
    #[error("camera {camera}: pose matrix is singular")]
    SingularPose { camera: usize },
    /// The rig alignment transform could not be inverted.
    #[error("rig alignment transform is singular")]
    SingularAlignment,
}

/// Projection bundle for one camera.
#[derive(Clone, Copy, Debug)]
pub struct CameraProjection {
    /// Intrinsics the matrices were assembled from.
    pub intrinsics: SensorIntrinsics,
    /// 3×4 intrinsic matrix `K`.
    pub k: Matrix3x4<f32>,
    /// World-to-camera transform `T`, rig alignment folded in.
    pub view: Matrix4<f32>,
    /// Camera-to-world transform `T⁻¹`.
    pub inv_view: Matrix4<f32>,
    /// Full projection `P = K · T`: world point to homogeneous pixel.
    pub proj: Matrix3x4<f32>,
    /// Camera centre in world coordinates.
    pub position: Point3<f32>,
}

/// Assemble the 3×4 intrinsic matrix.
///
/// The principal point is the photo centre plus the calibrated offset.
pub fn intrinsic_matrix(s: &SensorIntrinsics) -> Matrix3x4<f32> {
    let f = s.f as f32;
    let px = (s.width as f64 * 0.5 + s.cx) as f32;
    let py = (s.height as f64 * 0.5 + s.cy) as f32;
    Matrix3x4::new(f, 0.0, px, 0.0, 0.0, f, py, 0.0, 0.0, 0.0, 1.0, 0.0)
}

/// Build the projection bundle for every camera in the set.
///
/// Fails on the first camera whose pose cannot be inverted; the error
/// names the camera index.
pub fn build_projections(set: &CalibrationSet) -> Result<Vec<CameraProjection>, ProjectionError> {
    let inv_rig = set
        .alignment
        .matrix()
        .try_inverse()
        .ok_or(ProjectionError::SingularAlignment)?;

    set.cameras
        .iter()
        .enumerate()
        .map(|(index, cam)| CameraProjection::build(index, cam, &inv_rig))
        .collect()
}

impl CameraProjection {
    fn build(
        index: usize,
        cam: &CameraCalibration,
        inv_rig: &Matrix4<f32>,
    ) -> Result<Self, ProjectionError> {
        let inv_pose = cam
            .pose
            .try_inverse()
            .ok_or(ProjectionError::SingularPose { camera: index })?;
        let view = inv_pose * inv_rig;
        let inv_view = view
            .try_inverse()
            .ok_or(ProjectionError::SingularPose { camera: index })?;

        let k = intrinsic_matrix(&cam.intrinsics);
        let proj = k * view;
        // The camera centre is the point T maps to the origin, i.e. the
        // translation column of T⁻¹. Holds for scale alignments too, where
        // -Rᵀt would not.
        let position = Point3::from(inv_view.fixed_view::<3, 1>(0, 3).into_owned());

        Ok(Self {
            intrinsics: cam.intrinsics,
            k,
            view,
            inv_view,
            proj,
            position,
        })
    }

    /// Project a world point to photo pixels.
    ///
    /// Returns `None` for points on or behind the camera plane.
    pub fn project(&self, world: &Point3<f32>) -> Option<Point2<f32>> {
        let h = self.proj * Vector4::new(world.x, world.y, world.z, 1.0);
        if h.z <= 0.0 {
            return None;
        }
        Some(Point2::new(h.x / h.z, h.y / h.z))
    }

    /// World-space ray from the camera centre through a photo pixel.
    ///
    /// The returned direction is not normalised.
    pub fn back_project(&self, pixel: Point2<f32>) -> Vector3<f32> {
        let s = &self.intrinsics;
        let dx = ((pixel.x as f64 - s.width as f64 * 0.5 - s.cx) / s.f) as f32;
        let dy = ((pixel.y as f64 - s.height as f64 * 0.5 - s.cy) / s.f) as f32;
        (self.inv_view * Vector4::new(dx, dy, 1.0, 0.0)).xyz()
    }

    /// Extents of the image-plane quad at unit depth, `(width/f, height/f)`.
    ///
    /// Used to place photo quads and marker overlays in world space.
    pub fn plane_scale(&self) -> (f32, f32) {
        let s = &self.intrinsics;
        (
            (s.width as f64 / s.f) as f32,
            (s.height as f64 / s.f) as f32,
        )
    }
}
