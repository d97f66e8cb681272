//! High-level facade crate for the `rigview-*` workspace.
//!
//! A capture directory holds one multi-camera face capture: the Agisoft
//! calibration XML, the photos, the reconstructed mesh and a landmark text
//! file per photo. This crate ties the workspace together so a host
//! application (or a test) can open such a directory and drive the whole
//! review loop from one entry point.
//!
//! ## Quickstart
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut session = rigview::open("captures/subject_042")?;
//! session.select_camera(3)?;
//! println!("showing camera {:?}", session.current_camera());
//! session.save_current()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `rigview::core`: calibration types, projection matrices, the photo/NDC
//!   mappings and the pick color codec.
//! - `rigview::project`: capture directory loading (calibration XML, photos,
//!   landmark files, rotation sidecar, mesh lookup).
//! - `rigview::session`: the two-screen review session and the software
//!   canvas its pick passes run on.

use std::path::Path;

pub use rigview_core as core;
pub use rigview_project as project;
pub use rigview_session as session;

pub use rigview_core::RotationState;
pub use rigview_project::{Project, ProjectError, ProjectOptions};
pub use rigview_session::{Session, SoftwareCanvas};

#[cfg(feature = "tracing")]
pub use rigview_core::init_tracing;

pub use rigview_core::init_with_level;

/// Load the capture at `root` and start a review session on it.
pub fn open(root: impl AsRef<Path>) -> Result<Session, ProjectError> {
    Ok(Session::new(Project::load(root)?))
}

/// Like [`open`], with explicit load options.
pub fn open_with(
    root: impl AsRef<Path>,
    options: &ProjectOptions,
) -> Result<Session, ProjectError> {
    Ok(Session::new(Project::load_with(root, options)?))
}
