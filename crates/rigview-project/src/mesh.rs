//! Scene mesh plumbing.
//!
//! Captures ship a reconstructed head mesh (`photoscan.ply`) that anchors
//! the overview scene. Decoding is delegated to the rendering host through
//! [`MeshSource`]; project loading only verifies the file exists, since
//! the viewer is unusable without it.

use std::path::{Path, PathBuf};

use nalgebra::{Point3, Vector3};

use crate::photos::AssetError;

/// Canonical mesh file name inside a project root.
pub const MESH_FILE: &str = "photoscan.ply";

/// One flat-shaded mesh vertex.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeshVertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub color: [f32; 3],
}

/// Indexed triangle mesh ready for upload.
#[derive(Clone, Debug, Default)]
pub struct FaceMesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl FaceMesh {
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Mesh decoding seam for the rendering host.
pub trait MeshSource {
    /// Decode the mesh at `path`.
    fn load_mesh(&self, path: &Path) -> Result<FaceMesh, AssetError>;
}

/// Verify the project's mesh file exists and return its path.
pub fn locate_mesh(root: &Path) -> Result<PathBuf, AssetError> {
    let path = root.join(MESH_FILE);
    if path.is_file() {
        Ok(path)
    } else {
        Err(AssetError::MissingMesh { path })
    }
}
