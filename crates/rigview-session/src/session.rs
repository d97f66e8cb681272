//! Review session state: screens, hover state, drag gestures, saves.
//!
//! The session owns the loaded project and mutates it as the operator
//! works. A host application feeds it one [`FrameInput`] per frame plus the
//! discrete commands (confirm, back, save) bound to its input devices, and
//! renders its visible pass from the session's state afterwards.

use std::fs;
use std::io;
use std::path::PathBuf;

use nalgebra::Point2;

use rigview_core::{cursor_to_ndc, ndc_to_photo, pick};
use rigview_project::Project;

use crate::canvas::PickCanvas;
use crate::nav::NavPose;
use crate::picking;

/// File the accumulated change log is exported to, inside the capture root.
pub const CHANGE_LOG_FILE: &str = "change_log.txt";

/// Which screen the operator is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Every camera's image plane in 3D; hover to highlight, confirm to
    /// inspect one camera.
    Overview,
    /// One camera's photo with editable landmark markers.
    Detail,
}

/// Pointer state for one frame.
///
/// `cursor` is local to the pass target being updated: window pixels for
/// the overview, pane pixels for the detail pane. `None` means the pointer
/// is outside that target.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub cursor: Option<(f64, f64)>,
    /// Primary button held during this frame.
    pub primary_down: bool,
}

/// One completed landmark drag.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeLogEntry {
    pub camera: usize,
    pub landmark: usize,
    /// Photo position when the gesture opened.
    pub from: Point2<f32>,
    /// Photo position when the button was released.
    pub to: Point2<f32>,
    /// Wall-clock time of the release, `hh:mm:ss`.
    pub stamp: String,
}

impl ChangeLogEntry {
    /// The export line: `[hh:mm:ss] (x0,y0)->(x1,y1)`, coordinates
    /// truncated to whole pixels.
    pub fn to_line(&self) -> String {
        format!(
            "[{}] ({},{})->({},{})",
            self.stamp,
            self.from.x as i64,
            self.from.y as i64,
            self.to.x as i64,
            self.to.y as i64,
        )
    }
}

/// A session command addressed a camera the rig does not have.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("camera {index} is out of range (rig has {count} cameras)")]
    CameraOutOfRange { index: usize, count: usize },
    #[error("no camera selected")]
    NoCurrentCamera,
}

/// An open drag, bound to one landmark at button press.
#[derive(Clone, Copy, Debug)]
struct DragGesture {
    landmark: usize,
    from: Point2<f32>,
}

/// Interactive review session over a loaded project.
#[derive(Debug)]
pub struct Session {
    project: Project,
    mode: Mode,
    nav: NavPose,
    stored_nav: Option<NavPose>,
    hovered_camera: Option<usize>,
    current_camera: Option<usize>,
    hovered_landmark: Option<usize>,
    drag: Option<DragGesture>,
    primary_was_down: bool,
    change_log: Vec<ChangeLogEntry>,
    last_status: Option<String>,
}

impl Session {
    /// Start a session on the overview screen with the default nav pose.
    ///
    /// Cameras past [`pick::MAX_CAMERA_ID`] cannot be hovered in the
    /// overview; [`Session::select_camera`] still reaches them.
    pub fn new(project: Project) -> Self {
        if project.camera_count() > pick::MAX_CAMERA_ID + 1 {
            log::warn!(
                "rig has {} cameras; hover picking addresses at most {}",
                project.camera_count(),
                pick::MAX_CAMERA_ID + 1
            );
        }
        Self {
            project,
            mode: Mode::Overview,
            nav: NavPose::default(),
            stored_nav: None,
            hovered_camera: None,
            current_camera: None,
            hovered_landmark: None,
            drag: None,
            primary_was_down: false,
            change_log: Vec::new(),
            last_status: None,
        }
    }

    #[inline]
    pub fn project(&self) -> &Project {
        &self.project
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[inline]
    pub fn nav(&self) -> &NavPose {
        &self.nav
    }

    /// Mutable nav pose for the host's movement bindings.
    #[inline]
    pub fn nav_mut(&mut self) -> &mut NavPose {
        &mut self.nav
    }

    #[inline]
    pub fn hovered_camera(&self) -> Option<usize> {
        self.hovered_camera
    }

    #[inline]
    pub fn current_camera(&self) -> Option<usize> {
        self.current_camera
    }

    #[inline]
    pub fn hovered_landmark(&self) -> Option<usize> {
        self.hovered_landmark
    }

    /// Completed gestures, oldest first.
    #[inline]
    pub fn change_log(&self) -> &[ChangeLogEntry] {
        &self.change_log
    }

    /// Most recent operator-facing status line.
    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    /// Per-frame overview update: runs the camera pick pass.
    ///
    /// No-op outside overview mode.
    pub fn update_overview<C: PickCanvas>(&mut self, canvas: &mut C, input: &FrameInput) {
        if self.mode != Mode::Overview {
            return;
        }
        self.hovered_camera =
            picking::overview_pass(canvas, &self.project, &self.nav, input.cursor);
    }

    /// Per-frame detail update on the landmark pane.
    ///
    /// `canvas` covers the pane and `input.cursor` is pane-local. A gesture
    /// opens only on the press edge, on the landmark hovered at that moment;
    /// while it is open the pick pass is suspended and the gesture stays
    /// bound to that landmark, wherever the cursor moves. Sweeping onto a
    /// marker with the button already held grabs nothing.
    pub fn update_detail<C: PickCanvas>(&mut self, canvas: &mut C, input: &FrameInput) {
        if self.mode != Mode::Detail {
            return;
        }
        let Some(camera) = self.current_camera else {
            return;
        };

        let dims = self.project.photo_dims(camera);
        let rotation = self.project.rotations[camera];
        let pressed = input.primary_down && !self.primary_was_down;
        self.primary_was_down = input.primary_down;

        if input.primary_down {
            if pressed && self.drag.is_none() {
                if let Some(slot) = self.hovered_landmark {
                    if let Some(from) = self.project.landmarks[camera].get(slot) {
                        log::debug!("drag opened on landmark {slot} of camera {camera}");
                        self.drag = Some(DragGesture {
                            landmark: slot,
                            from,
                        });
                    }
                }
            }
            if let (Some(drag), Some(cursor)) = (self.drag, input.cursor) {
                let ndc = cursor_to_ndc(Point2::new(cursor.0, cursor.1), canvas.viewport());
                let p = ndc_to_photo(ndc, dims, rotation);
                self.project.landmarks[camera].set(drag.landmark, p);
            }
        } else if let Some(drag) = self.drag.take() {
            self.close_gesture(camera, drag);
        }

        if self.drag.is_none() {
            let picked = picking::detail_pass(
                canvas,
                &self.project.landmarks[camera],
                dims,
                rotation,
                input.cursor,
            );
            self.hovered_landmark = picked;
        }
    }

    /// Enter detail mode on the camera currently hovered in the overview.
    ///
    /// Returns `false` when nothing is hovered or the session is not on the
    /// overview screen.
    pub fn confirm_hover(&mut self) -> bool {
        match (self.mode, self.hovered_camera) {
            (Mode::Overview, Some(index)) => {
                self.enter_detail(index);
                true
            }
            _ => false,
        }
    }

    /// Switch to a camera by index, entering detail mode if needed.
    pub fn select_camera(&mut self, index: usize) -> Result<(), SessionError> {
        let count = self.project.camera_count();
        if index >= count {
            return Err(SessionError::CameraOutOfRange { index, count });
        }
        match self.mode {
            Mode::Overview => self.enter_detail(index),
            Mode::Detail => {
                if self.current_camera != Some(index) {
                    self.cancel_drag();
                    self.current_camera = Some(index);
                    self.hovered_landmark = None;
                }
            }
        }
        Ok(())
    }

    /// Step to a neighbouring camera in detail mode, clamped at the rig's
    /// ends. Returns the camera shown afterwards.
    pub fn step_camera(&mut self, delta: i32) -> Option<usize> {
        if self.mode != Mode::Detail {
            return None;
        }
        let current = self.current_camera?;
        let last = self.project.camera_count() as i64 - 1;
        let target = (current as i64 + delta as i64).clamp(0, last) as usize;
        if target != current {
            self.cancel_drag();
            self.current_camera = Some(target);
            self.hovered_landmark = None;
        }
        Some(target)
    }

    /// Leave detail mode and restore the stored overview nav pose.
    pub fn back_to_overview(&mut self) {
        if self.mode != Mode::Detail {
            return;
        }
        self.cancel_drag();
        self.mode = Mode::Overview;
        self.current_camera = None;
        self.hovered_landmark = None;
        if let Some(stored) = self.stored_nav.take() {
            self.nav = stored;
        }
    }

    /// Restore the default nav pose, keeping everything else.
    pub fn reset_navigation(&mut self) {
        self.nav = NavPose::default();
    }

    /// Save one camera's landmarks to disk.
    ///
    /// I/O failures are reported through the status line and the log; the
    /// in-memory landmarks keep their edited values either way.
    pub fn save_camera(&mut self, camera: usize) -> Result<(), SessionError> {
        let count = self.project.camera_count();
        if camera >= count {
            return Err(SessionError::CameraOutOfRange {
                index: camera,
                count,
            });
        }
        match self.project.save_landmarks(camera) {
            Ok(()) => {
                self.last_status = Some(format!("saved landmarks for camera {camera}"));
            }
            Err(err) => {
                log::error!("saving camera {camera}: {err}");
                self.last_status = Some(format!("save failed: {err}"));
            }
        }
        Ok(())
    }

    /// Save the camera currently shown in detail mode.
    pub fn save_current(&mut self) -> Result<(), SessionError> {
        let camera = self.current_camera.ok_or(SessionError::NoCurrentCamera)?;
        self.save_camera(camera)
    }

    /// Write every completed gesture to [`CHANGE_LOG_FILE`] in the capture
    /// root, overwriting a previous export.
    pub fn export_change_log(&mut self) -> io::Result<PathBuf> {
        let path = self.project.root.join(CHANGE_LOG_FILE);
        let mut out = String::new();
        for entry in &self.change_log {
            out.push_str(&entry.to_line());
            out.push('\n');
        }
        fs::write(&path, out)?;
        log::info!("change log exported to {}", path.display());
        self.last_status = Some(format!(
            "wrote {} change log entries",
            self.change_log.len()
        ));
        Ok(path)
    }

    fn enter_detail(&mut self, index: usize) {
        if self.mode == Mode::Overview {
            self.stored_nav = Some(self.nav);
            self.nav = NavPose::default();
        }
        self.mode = Mode::Detail;
        self.current_camera = Some(index);
        self.hovered_landmark = None;
    }

    /// Drop an open gesture without logging it.
    fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            log::debug!("drag on landmark {} cancelled", drag.landmark);
        }
    }

    fn close_gesture(&mut self, camera: usize, drag: DragGesture) {
        let Some(to) = self.project.landmarks[camera].get(drag.landmark) else {
            return;
        };
        let entry = ChangeLogEntry {
            camera,
            landmark: drag.landmark,
            from: drag.from,
            to,
            stamp: chrono::Local::now().format("%H:%M:%S").to_string(),
        };
        log::info!("{}", entry.to_line());
        self.change_log.push(entry);
    }
}

/// Pixel rectangle of the landmark pane inside the window, `(x, y, w, h)`.
///
/// The detail screen gives the photo the right half of the window; the left
/// half holds the host's info panel.
pub fn detail_pane_rect(window: (u32, u32)) -> (u32, u32, u32, u32) {
    let half = window.0 / 2;
    (window.0 - half, 0, half, window.1)
}

/// Map a window cursor into pane-local coordinates; `None` outside the
/// pane.
pub fn detail_pane_cursor(cursor: (f64, f64), window: (u32, u32)) -> Option<(f64, f64)> {
    let (px, py, pw, ph) = detail_pane_rect(window);
    let x = cursor.0 - px as f64;
    let y = cursor.1 - py as f64;
    (x >= 0.0 && y >= 0.0 && x < pw as f64 && y < ph as f64).then_some((x, y))
}
