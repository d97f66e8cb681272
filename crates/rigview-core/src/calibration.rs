//! Rig calibration data as parsed from a capture project.

use nalgebra::Matrix4;

/// Pinhole intrinsics of one sensor.
///
/// `cx`/`cy` are offsets of the principal point from the photo centre, not
/// absolute coordinates. Values are kept at calibration-file precision;
/// narrowing to `f32` happens only when matrices are assembled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorIntrinsics {
    /// Focal length in pixels.
    pub f: f64,
    /// Principal point offset from the photo centre, x.
    pub cx: f64,
    /// Principal point offset from the photo centre, y.
    pub cy: f64,
    /// Photo width in pixels.
    pub width: u32,
    /// Photo height in pixels.
    pub height: u32,
}

impl SensorIntrinsics {
    /// True when the focal length and resolution are usable.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.f > 0.0 && self.width > 0 && self.height > 0
    }

    /// True when the photo is wider than tall.
    #[inline]
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }
}

/// Calibration of a single camera: intrinsics plus its camera-to-rig pose.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraCalibration {
    pub intrinsics: SensorIntrinsics,
    /// Camera-to-rig pose, row-major as stored in the calibration file.
    pub pose: Matrix4<f32>,
}

/// Rig-level alignment of the whole camera set.
///
/// Capture projects carry either a full rigid transform (rotation plus
/// translation) or a bare scale factor; exactly one form per project.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RigAlignment {
    Transform(Matrix4<f32>),
    Scale(f32),
}

impl RigAlignment {
    /// The alignment as a homogeneous matrix.
    pub fn matrix(&self) -> Matrix4<f32> {
        match self {
            RigAlignment::Transform(m) => *m,
            RigAlignment::Scale(s) => Matrix4::new_scaling(*s),
        }
    }
}

impl Default for RigAlignment {
    /// Projects without an alignment block use the identity transform.
    fn default() -> Self {
        RigAlignment::Transform(Matrix4::identity())
    }
}

/// Full rig calibration: one entry per camera plus the rig alignment.
#[derive(Clone, Debug)]
pub struct CalibrationSet {
    pub cameras: Vec<CameraCalibration>,
    pub alignment: RigAlignment,
}

impl CalibrationSet {
    #[inline]
    pub fn camera_count(&self) -> usize {
        self.cameras.len()
    }
}
