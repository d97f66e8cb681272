//! Interactive review session over a loaded capture project.
//!
//! The session layer turns the passive project data into the two-screen
//! review tool: an overview of every camera's image plane in 3D and a
//! detail screen where landmark markers are dragged and saved. Rendering
//! stays host-owned; the session only needs a [`PickCanvas`] to run its
//! identity passes, and ships [`SoftwareCanvas`] so the whole interaction
//! loop runs headless in tests.

mod canvas;
mod nav;
pub mod picking;
mod session;

pub use canvas::{PickCanvas, SoftwareCanvas};
pub use nav::NavPose;
pub use session::{
    detail_pane_cursor, detail_pane_rect, ChangeLogEntry, FrameInput, Mode, Session,
    SessionError, CHANGE_LOG_FILE,
};
