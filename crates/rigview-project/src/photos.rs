//! Photo discovery and dimension probing.
//!
//! Photos live under `image/` with 8-digit zero-padded stems matching
//! their camera index. Exports usually produce `.jpg`, but operators
//! re-exporting from other tools end up with `.JPG`, `.jpeg` or `.png`
//! variants, so discovery falls back to a case-insensitive extension scan.

use std::fs;
use std::path::{Path, PathBuf};

/// Directory with per-camera photos, relative to the project root.
pub const IMAGE_DIR: &str = "image";

/// Asset problems: photos and the scene mesh.
#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    #[error("no photo with stem {stem} under {dir}")]
    PhotoNotFound { stem: String, dir: PathBuf },
    #[error("{path}: {source}")]
    UnreadableImage {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("mesh file {path} is missing")]
    MissingMesh { path: PathBuf },
    #[error("mesh decode failed: {reason}")]
    MeshDecode { reason: String },
}

/// 8-digit zero-padded file stem for a camera index.
#[inline]
pub fn camera_stem(index: usize) -> String {
    format!("{index:08}")
}

/// Find the photo for a camera stem.
///
/// Prefers `<stem>.jpg`, then any file with the same stem and a jpg, jpeg
/// or png extension in any letter case.
pub fn find_photo(dir: &Path, stem: &str) -> Result<PathBuf, AssetError> {
    let preferred = dir.join(format!("{stem}.jpg"));
    if preferred.is_file() {
        return Ok(preferred);
    }

    let not_found = || AssetError::PhotoNotFound {
        stem: stem.to_string(),
        dir: dir.to_path_buf(),
    };

    let entries = fs::read_dir(dir).map_err(|_| not_found())?;
    for entry in entries.flatten() {
        let path = entry.path();
        let stem_matches = path.file_stem().and_then(|s| s.to_str()) == Some(stem);
        let ext_matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_ascii_lowercase();
                e == "jpg" || e == "jpeg" || e == "png"
            })
            .unwrap_or(false);
        if stem_matches && ext_matches && path.is_file() {
            return Ok(path);
        }
    }
    Err(not_found())
}

/// Photo dimensions from the header, without decoding pixel data.
pub fn photo_dimensions(path: &Path) -> Result<(u32, u32), AssetError> {
    image::image_dimensions(path).map_err(|source| AssetError::UnreadableImage {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode a photo to 8-bit RGB, ready for texture upload by the host.
pub fn load_photo_rgb(path: &Path) -> Result<image::RgbImage, AssetError> {
    let img = image::open(path).map_err(|source| AssetError::UnreadableImage {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.into_rgb8())
}
