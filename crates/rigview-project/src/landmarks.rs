//! Landmark sets and their on-disk text format.
//!
//! Each camera has a fixed number of landmark slots: 68 facial and 20 ear
//! points, 88 in total. On disk a set is one text file per camera (or two
//! in the two-zone layout), one `x y` pair per line in photo pixels, slot
//! order equal to line order. Slots a file does not cover stay at the
//! `(0, 0)` default. Saving never clobbers an existing file: it is renamed
//! to `<stem>_<unix-millis>.backup` first.

use std::fs;
use std::path::{Path, PathBuf};

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Number of facial landmark slots.
pub const FACE_LANDMARKS: usize = 68;

/// Number of ear landmark slots.
pub const EAR_LANDMARKS: usize = 20;

/// Total landmark slots per camera.
pub const TOTAL_LANDMARKS: usize = FACE_LANDMARKS + EAR_LANDMARKS;

/// Directory with facial landmark files, relative to the project root.
pub const FACE_DIR: &str = "face_landmarks";

/// Directory with ear landmark files, relative to the project root.
pub const EAR_DIR: &str = "ear_landmarks";

/// How landmark files are split across directories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneLayout {
    /// One file per camera under `face_landmarks/`, covering every slot.
    Single,
    /// Facial slots under `face_landmarks/`, ear slots under
    /// `ear_landmarks/`.
    FaceAndEars,
}

/// Landmark coordinates for one camera's photo, in photo pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    coords: Vec<Point2<f32>>,
    loaded: bool,
}

impl Default for LandmarkSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkSet {
    /// A set with every slot at the origin.
    pub fn new() -> Self {
        Self {
            coords: vec![Point2::origin(); TOTAL_LANDMARKS],
            loaded: false,
        }
    }

    /// True when at least one file contributed coordinates to this set.
    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// All slots in order.
    #[inline]
    pub fn coords(&self) -> &[Point2<f32>] {
        &self.coords
    }

    /// The facial slot range.
    pub fn face(&self) -> &[Point2<f32>] {
        &self.coords[..FACE_LANDMARKS]
    }

    /// The ear slot range.
    pub fn ears(&self) -> &[Point2<f32>] {
        &self.coords[FACE_LANDMARKS..]
    }

    /// Coordinate of one slot, if it exists.
    pub fn get(&self, slot: usize) -> Option<Point2<f32>> {
        self.coords.get(slot).copied()
    }

    /// Overwrite one slot.
    ///
    /// Panics if `slot` is out of range.
    pub fn set(&mut self, slot: usize, p: Point2<f32>) {
        self.coords[slot] = p;
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LandmarkIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{path}:{line}: expected an `x y` pair, got {content:?}")]
    BadLine {
        path: PathBuf,
        line: usize,
        content: String,
    },
}

/// A landmark save failed; the in-memory set is untouched.
#[derive(thiserror::Error, Debug)]
pub enum SaveError {
    #[error("failed to back up {path}: {source}")]
    Backup {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn zone_file(root: &Path, dir: &str, stem: &str) -> PathBuf {
    root.join(dir).join(format!("{stem}.txt"))
}

/// Read one landmark file into `slots`, returning how many lines landed.
///
/// Lines past the slot range are ignored with a warning; a short file
/// leaves the remaining slots untouched.
fn read_file(path: &Path, slots: &mut [Point2<f32>]) -> Result<usize, LandmarkIoError> {
    let raw = fs::read_to_string(path)?;
    let expected = slots.len();
    let mut filled = 0usize;
    let mut extra = 0usize;

    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if filled == expected {
            extra += 1;
            continue;
        }

        let mut tokens = line.split_whitespace();
        let pair = match (tokens.next(), tokens.next()) {
            (Some(x), Some(y)) => x.parse::<f32>().ok().zip(y.parse::<f32>().ok()),
            _ => None,
        };
        let Some((x, y)) = pair else {
            return Err(LandmarkIoError::BadLine {
                path: path.to_path_buf(),
                line: lineno + 1,
                content: line.to_string(),
            });
        };

        slots[filled] = Point2::new(x, y);
        filled += 1;
    }

    if extra > 0 {
        log::warn!(
            "{}: ignoring {extra} lines past the {expected} expected slots",
            path.display()
        );
    }
    if filled > 0 && filled < expected {
        log::warn!(
            "{}: {filled} of {expected} landmark lines, remaining slots stay at (0, 0)",
            path.display()
        );
    }
    Ok(filled)
}

/// Load a camera's landmark set according to the zone layout.
///
/// Missing files are not an error; the affected slots keep the origin
/// default. Malformed content is.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(root)))]
pub fn load_set(
    root: &Path,
    stem: &str,
    layout: ZoneLayout,
) -> Result<LandmarkSet, LandmarkIoError> {
    let mut set = LandmarkSet::new();
    let mut filled = 0usize;

    let face_path = zone_file(root, FACE_DIR, stem);
    if face_path.is_file() {
        filled += match layout {
            ZoneLayout::Single => read_file(&face_path, &mut set.coords)?,
            ZoneLayout::FaceAndEars => read_file(&face_path, &mut set.coords[..FACE_LANDMARKS])?,
        };
    } else {
        log::debug!("no landmark file for stem {stem}");
    }

    if layout == ZoneLayout::FaceAndEars {
        let ear_path = zone_file(root, EAR_DIR, stem);
        if ear_path.is_file() {
            filled += read_file(&ear_path, &mut set.coords[FACE_LANDMARKS..])?;
        }
    }

    set.loaded = filled > 0;
    Ok(set)
}

/// Save a camera's landmark set, backing up any existing files first.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(root, set)))]
pub fn save_set(
    root: &Path,
    stem: &str,
    layout: ZoneLayout,
    set: &LandmarkSet,
) -> Result<(), SaveError> {
    match layout {
        ZoneLayout::Single => {
            write_with_backup(&zone_file(root, FACE_DIR, stem), &format_lines(set.coords()))
        }
        ZoneLayout::FaceAndEars => {
            write_with_backup(&zone_file(root, FACE_DIR, stem), &format_lines(set.face()))?;
            write_with_backup(&zone_file(root, EAR_DIR, stem), &format_lines(set.ears()))
        }
    }
}

/// Serialize slots to the landmark text format.
///
/// Coordinates are written in scientific notation with 19 fractional
/// digits so repeated load/save cycles never drift.
fn format_lines(coords: &[Point2<f32>]) -> String {
    let mut out = String::with_capacity(coords.len() * 56);
    for p in coords {
        out.push_str(&format!("{:.19e} {:.19e}\n", p.x, p.y));
    }
    out
}

fn write_with_backup(path: &Path, content: &str) -> Result<(), SaveError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| SaveError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    if path.exists() {
        let backup = backup_path(path);
        fs::rename(path, &backup).map_err(|source| SaveError::Backup {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("backed up {} -> {}", path.display(), backup.display());
    }

    fs::write(path, content).map_err(|source| SaveError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Backup name for a landmark file: `<stem>_<unix-millis>.backup`.
fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("landmarks");
    let stamp = chrono::Local::now().timestamp_millis();
    path.with_file_name(format!("{stem}_{stamp}.backup"))
}
