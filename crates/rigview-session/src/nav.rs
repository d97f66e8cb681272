//! Free-fly navigation pose for the overview scene.

use nalgebra::{Matrix4, Point3, Vector3};

/// Camera pose the operator steers in the overview.
///
/// Angles are degrees. The default pose sits on the +z axis looking at the
/// origin, where rig captures centred on the subject come into view without
/// any input. `fov_deg` doubles as the zoom state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavPose {
    pub position: Point3<f32>,
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub fov_deg: f32,
}

impl Default for NavPose {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 3.0),
            yaw_deg: -90.0,
            pitch_deg: 0.0,
            fov_deg: 45.0,
        }
    }
}

impl NavPose {
    /// Unit view direction derived from yaw and pitch.
    pub fn front(&self) -> Vector3<f32> {
        let yaw = self.yaw_deg.to_radians();
        let pitch = self.pitch_deg.to_radians();
        Vector3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }

    /// World-to-eye matrix for this pose.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        let target = self.position + self.front();
        Matrix4::look_at_rh(&self.position, &target, &Vector3::y())
    }
}
