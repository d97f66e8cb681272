//! Identity render passes for hover picking.
//!
//! Each frame the session draws flat id colors into a [`PickCanvas`] and
//! reads back the pixel under the cursor. The model matrices here are the
//! same ones a host application uses for its visible pass, so what the
//! operator sees and what the readback hits cannot drift apart.

use nalgebra::{Matrix4, Perspective3, Point2, Vector3};
use rigview_core::{photo_to_ndc, pick, CameraProjection, RotationState};
use rigview_project::{LandmarkSet, Project};

use crate::canvas::PickCanvas;
use crate::nav::NavPose;

/// Near plane of the overview projection.
const NEAR: f32 = 0.1;
/// Far plane of the overview projection; rig poses sit well inside it.
const FAR: f32 = 5000.0;

/// Marker half-extent in camera units for overview overlays.
pub const OVERVIEW_MARKER_SCALE: f32 = 0.002;
/// Overlay markers sit at this depth, a hair in front of the image plane so
/// depth-tested visible passes keep them on top of the photo quad.
pub const OVERVIEW_MARKER_DEPTH: f32 = 0.999_999;
/// Marker half-extent in pane NDC for the detail pass.
pub const DETAIL_MARKER_SCALE: f32 = 0.01;

/// Perspective matrix of the overview scene.
pub fn overview_projection(viewport: (u32, u32), fov_deg: f32) -> Matrix4<f32> {
    let aspect = viewport.0 as f32 / viewport.1 as f32;
    Perspective3::new(aspect, fov_deg.to_radians(), NEAR, FAR).to_homogeneous()
}

/// World model of a camera's image-plane quad.
///
/// The unit quad is pushed to unit depth on the camera's optical axis,
/// stretched to the plane extents and placed in world space.
pub fn plane_model(cam: &CameraProjection) -> Matrix4<f32> {
    let (sx, sy) = cam.plane_scale();
    cam.inv_view
        * Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, 1.0))
        * Matrix4::new_translation(&Vector3::new(0.0, 0.0, 1.0))
}

/// World model of one landmark marker on a camera's image plane.
///
/// `ndc` is the landmark position in photo NDC (no display rotation; the
/// overview shows photos as stored).
pub fn overview_marker_model(cam: &CameraProjection, ndc: Point2<f32>) -> Matrix4<f32> {
    let (sx, sy) = cam.plane_scale();
    cam.inv_view
        * Matrix4::new_translation(&Vector3::new(ndc.x * sx, ndc.y * sy, OVERVIEW_MARKER_DEPTH))
        * Matrix4::new_nonuniform_scaling(&Vector3::new(
            OVERVIEW_MARKER_SCALE,
            OVERVIEW_MARKER_SCALE,
            1.0,
        ))
}

/// Pane model of one landmark marker in the detail view.
pub fn detail_marker_model(ndc: Point2<f32>) -> Matrix4<f32> {
    Matrix4::new_translation(&Vector3::new(ndc.x, ndc.y, 0.0))
        * Matrix4::new_nonuniform_scaling(&Vector3::new(
            DETAIL_MARKER_SCALE,
            DETAIL_MARKER_SCALE,
            1.0,
        ))
}

fn read_back<C: PickCanvas>(canvas: &C, cursor: (f64, f64)) -> Option<pick::PickColor> {
    let (vw, vh) = canvas.viewport();
    if cursor.0 < 0.0 || cursor.1 < 0.0 || cursor.0 >= vw as f64 || cursor.1 >= vh as f64 {
        return None;
    }
    canvas.read_pixel(cursor.0 as u32, cursor.1 as u32)
}

/// Run the overview camera pass and return the camera under the cursor.
///
/// The pass clears to the camera sentinel, draws every image-plane quad in
/// its encoded color and reads back under the cursor. The hovered camera's
/// landmark markers are then overlaid in landmark colors; they draw after
/// the readback and only feed the host's visible pass.
///
/// Rigs larger than the pick protocol draw only cameras up to
/// [`pick::MAX_CAMERA_ID`]; the rest never hover and stay reachable
/// through direct camera selection.
pub fn overview_pass<C: PickCanvas>(
    canvas: &mut C,
    project: &Project,
    nav: &NavPose,
    cursor: Option<(f64, f64)>,
) -> Option<usize> {
    let vp = overview_projection(canvas.viewport(), nav.fov_deg) * nav.view_matrix();

    canvas.clear(pick::CAMERA_CLEAR);
    let encodable = project.projections.iter().enumerate().take(pick::MAX_CAMERA_ID + 1);
    for (index, cam) in encodable {
        canvas.draw_quad(&(vp * plane_model(cam)), pick::encode_camera(index));
    }

    let picked = cursor
        .and_then(|c| read_back(canvas, c))
        .and_then(pick::decode_camera)
        .filter(|index| *index < project.projections.len());

    if let Some(index) = picked {
        let cam = &project.projections[index];
        let dims = project.photo_dims(index);
        for (slot, p) in project.landmarks[index].coords().iter().enumerate() {
            let ndc = photo_to_ndc(*p, dims, RotationState::None);
            canvas.draw_quad(&(vp * overview_marker_model(cam, ndc)), pick::encode_landmark(slot));
        }
    }

    picked
}

/// Run the detail landmark pass and return the marker under the cursor.
///
/// `canvas` covers the landmark pane and `cursor` is pane-local. Markers
/// draw in slot order, so where markers stack the highest slot wins the
/// pick.
pub fn detail_pass<C: PickCanvas>(
    canvas: &mut C,
    set: &LandmarkSet,
    dims: (u32, u32),
    rotation: RotationState,
    cursor: Option<(f64, f64)>,
) -> Option<usize> {
    canvas.clear(pick::LANDMARK_CLEAR);
    for (slot, p) in set.coords().iter().enumerate() {
        let ndc = photo_to_ndc(*p, dims, rotation);
        canvas.draw_quad(&detail_marker_model(ndc), pick::encode_landmark(slot));
    }
    cursor
        .and_then(|c| read_back(canvas, c))
        .and_then(pick::decode_landmark)
        .filter(|slot| *slot < set.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::SoftwareCanvas;
    use rigview_core::{
        build_projections, CalibrationSet, CameraCalibration, RigAlignment, SensorIntrinsics,
    };
    use rigview_project::{PhotoInfo, ZoneLayout};
    use std::path::PathBuf;

    const DIMS: (u32, u32) = (4000, 6000);

    /// Two portrait cameras looking down +z from the origin, the second
    /// shifted one unit to the right. With the default nav pose their
    /// image planes land in the middle and on the right of the viewport.
    fn test_project() -> Project {
        let intrinsics = SensorIntrinsics {
            f: 8000.0,
            cx: 0.0,
            cy: 0.0,
            width: DIMS.0,
            height: DIMS.1,
        };
        let calibration = CalibrationSet {
            cameras: vec![
                CameraCalibration {
                    intrinsics,
                    pose: Matrix4::identity(),
                },
                CameraCalibration {
                    intrinsics,
                    pose: Matrix4::new_translation(&Vector3::new(1.0, 0.0, 0.0)),
                },
            ],
            alignment: RigAlignment::default(),
        };
        let projections = build_projections(&calibration).expect("projections");
        Project {
            root: PathBuf::new(),
            calibration,
            projections,
            photos: vec![
                PhotoInfo {
                    path: None,
                    width: DIMS.0,
                    height: DIMS.1,
                },
                PhotoInfo {
                    path: None,
                    width: DIMS.0,
                    height: DIMS.1,
                },
            ],
            landmarks: vec![LandmarkSet::new(), LandmarkSet::new()],
            rotations: vec![RotationState::None; 2],
            zone_layout: ZoneLayout::Single,
            mesh_path: PathBuf::new(),
        }
    }

    #[test]
    fn overview_pass_picks_the_camera_under_the_cursor() {
        let project = test_project();
        let mut canvas = SoftwareCanvas::new(200, 200);
        let nav = NavPose::default();

        // Dead centre hits camera 0's plane at unit depth.
        let picked = overview_pass(&mut canvas, &project, &nav, Some((100.0, 100.0)));
        assert_eq!(picked, Some(0));

        // The shifted camera's plane covers the right edge.
        let picked = overview_pass(&mut canvas, &project, &nav, Some((180.0, 100.0)));
        assert_eq!(picked, Some(1));
    }

    #[test]
    fn overview_pass_returns_none_on_background() {
        let project = test_project();
        let mut canvas = SoftwareCanvas::new(200, 200);
        let nav = NavPose::default();

        assert_eq!(
            overview_pass(&mut canvas, &project, &nav, Some((5.0, 100.0))),
            None
        );
        assert_eq!(overview_pass(&mut canvas, &project, &nav, None), None);
    }

    #[test]
    fn overview_pass_ignores_cursors_outside_the_viewport() {
        let project = test_project();
        let mut canvas = SoftwareCanvas::new(200, 200);
        let nav = NavPose::default();

        assert_eq!(
            overview_pass(&mut canvas, &project, &nav, Some((-3.0, 100.0))),
            None
        );
        assert_eq!(
            overview_pass(&mut canvas, &project, &nav, Some((100.0, 240.0))),
            None
        );
    }

    #[test]
    fn overview_pass_overlays_markers_for_the_hovered_camera() {
        let mut project = test_project();
        // Slot 3 at the photo centre lands on the hovered plane's centre.
        project.landmarks[0].set(3, Point2::new(2000.0, 3000.0));

        // Markers are a fraction of a pixel at small targets, so give the
        // canvas enough resolution for the overlay to own a full pixel.
        let mut canvas = SoftwareCanvas::new(2000, 2000);
        let nav = NavPose::default();

        let picked = overview_pass(&mut canvas, &project, &nav, Some((1000.0, 1000.0)));
        assert_eq!(picked, Some(0));
        assert_eq!(canvas.read_pixel(1000, 1000), Some(pick::encode_landmark(3)));

        // Without a hover the plane color stays on top.
        overview_pass(&mut canvas, &project, &nav, None);
        assert_eq!(canvas.read_pixel(1000, 1000), Some(pick::encode_camera(0)));
    }

    #[test]
    fn overview_pass_skips_cameras_past_the_protocol_range() {
        // One camera more than the red channel can encode, all on the same
        // pose so every plane stacks on the same pixels.
        let count = pick::MAX_CAMERA_ID + 2;
        let intrinsics = SensorIntrinsics {
            f: 8000.0,
            cx: 0.0,
            cy: 0.0,
            width: DIMS.0,
            height: DIMS.1,
        };
        let calibration = CalibrationSet {
            cameras: vec![
                CameraCalibration {
                    intrinsics,
                    pose: Matrix4::identity(),
                };
                count
            ],
            alignment: RigAlignment::default(),
        };
        let projections = build_projections(&calibration).expect("projections");
        let project = Project {
            root: PathBuf::new(),
            calibration,
            projections,
            photos: vec![
                PhotoInfo {
                    path: None,
                    width: DIMS.0,
                    height: DIMS.1,
                };
                count
            ],
            landmarks: vec![LandmarkSet::new(); count],
            rotations: vec![RotationState::None; count],
            zone_layout: ZoneLayout::Single,
            mesh_path: PathBuf::new(),
        };
        let mut canvas = SoftwareCanvas::new(200, 200);
        let nav = NavPose::default();

        // The camera past the range is never drawn, so the pass completes
        // and the stack resolves to the last encodable id.
        let picked = overview_pass(&mut canvas, &project, &nav, Some((100.0, 100.0)));
        assert_eq!(picked, Some(pick::MAX_CAMERA_ID));
    }

    #[test]
    fn detail_pass_picks_the_marker_under_the_cursor() {
        let mut set = LandmarkSet::new();
        set.set(5, Point2::new(2000.0, 3000.0));
        let mut canvas = SoftwareCanvas::new(200, 200);

        let picked = detail_pass(
            &mut canvas,
            &set,
            DIMS,
            RotationState::None,
            Some((100.0, 100.0)),
        );
        assert_eq!(picked, Some(5));
    }

    #[test]
    fn detail_pass_honours_the_display_rotation() {
        let mut set = LandmarkSet::new();
        set.set(12, Point2::new(1000.0, 1500.0));
        let mut canvas = SoftwareCanvas::new(200, 200);

        // Clockwise display: (1000, 1500) maps to NDC (-0.5, 0.5), i.e.
        // pane pixel (50, 50).
        let picked = detail_pass(
            &mut canvas,
            &set,
            DIMS,
            RotationState::Clockwise,
            Some((50.0, 50.0)),
        );
        assert_eq!(picked, Some(12));

        // The unrotated position of the same landmark is empty pane.
        let picked = detail_pass(
            &mut canvas,
            &set,
            DIMS,
            RotationState::Clockwise,
            Some((50.0, 150.0)),
        );
        assert_eq!(picked, None);
    }

    #[test]
    fn detail_pass_background_is_none() {
        let set = LandmarkSet::new();
        let mut canvas = SoftwareCanvas::new(200, 200);

        // Default sets cluster at the photo origin; the pane centre is bare.
        let picked = detail_pass(
            &mut canvas,
            &set,
            DIMS,
            RotationState::None,
            Some((100.0, 100.0)),
        );
        assert_eq!(picked, None);
    }

    #[test]
    fn stacked_markers_resolve_to_the_highest_slot() {
        let mut set = LandmarkSet::new();
        set.set(7, Point2::new(2000.0, 3000.0));
        set.set(9, Point2::new(2000.0, 3000.0));
        let mut canvas = SoftwareCanvas::new(200, 200);

        let picked = detail_pass(
            &mut canvas,
            &set,
            DIMS,
            RotationState::None,
            Some((100.0, 100.0)),
        );
        assert_eq!(picked, Some(9));
    }
}
