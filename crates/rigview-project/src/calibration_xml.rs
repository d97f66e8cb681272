//! Parser for the Agisoft-style XML calibration dialect.
//!
//! The document holds a `chunk` with three relevant children. `sensors`
//! and `cameras` declare their slot count in a `next_id` attribute and
//! their entries carry an `id` attribute; entries may appear in any order,
//! so both arrays are pre-sized to `next_id` and filled by id. An optional
//! chunk-level `transform` holds either a `rotation` (9 floats, row-major
//! 3×3) plus `translation` (3 floats) pair or a single `scale` factor.
//! All numeric vectors are whitespace-separated tokens in row-major order.

use std::fs;
use std::path::Path;

use nalgebra::Matrix4;
use roxmltree::{Document, Node};

#[cfg(feature = "tracing")]
use tracing::instrument;

use rigview_core::{CalibrationSet, CameraCalibration, RigAlignment, SensorIntrinsics};

#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("xml syntax: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("no chunk element in the calibration document")]
    MissingChunk,
    #[error("missing {section} section")]
    MissingSection { section: &'static str },
    #[error("{parent}: missing {element} element")]
    MissingElement { parent: String, element: &'static str },
    #[error("{element}: missing or non-numeric {attribute} attribute")]
    BadAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("{element} id {id} is outside the declared count {count}")]
    IdOutOfRange {
        element: &'static str,
        id: usize,
        count: usize,
    },
    #[error("camera {camera}: sensor_id {sensor} is outside the declared sensor count {count}")]
    UnknownSensor {
        camera: usize,
        sensor: usize,
        count: usize,
    },
    #[error("{element}: expected {expected} numeric tokens, found {found}")]
    WrongTokenCount {
        element: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{element}: non-numeric token {token:?}")]
    BadNumber {
        element: &'static str,
        token: String,
    },
    #[error("sensor {id}: invalid intrinsics (f {f}, {width}x{height})")]
    InvalidIntrinsics {
        id: usize,
        f: f64,
        width: u32,
        height: u32,
    },
    #[error("{section} slot {id} was declared by next_id but never filled")]
    MissingSlot { section: &'static str, id: usize },
}

/// Parse a calibration file from disk.
pub fn load_calibration(path: impl AsRef<Path>) -> Result<CalibrationSet, CalibrationError> {
    let raw = fs::read_to_string(path)?;
    parse_calibration(&raw)
}

/// Parse calibration XML from a string.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(xml), fields(bytes = xml.len())))]
pub fn parse_calibration(xml: &str) -> Result<CalibrationSet, CalibrationError> {
    let doc = Document::parse(xml)?;
    let chunk = doc
        .descendants()
        .find(|n| n.has_tag_name("chunk"))
        .ok_or(CalibrationError::MissingChunk)?;

    let alignment = parse_alignment(chunk)?;
    let sensors = parse_sensors(chunk)?;
    let cameras = parse_cameras(chunk, &sensors)?;

    Ok(CalibrationSet { cameras, alignment })
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.has_tag_name(name))
}

/// Parse the text content of `node` into exactly `N` floats.
fn read_floats<const N: usize>(
    node: Node,
    element: &'static str,
) -> Result<[f64; N], CalibrationError> {
    let mut out = [0.0; N];
    let mut found = 0usize;
    for token in node.text().unwrap_or_default().split_whitespace() {
        if found < N {
            out[found] = token
                .parse::<f64>()
                .map_err(|_| CalibrationError::BadNumber {
                    element,
                    token: token.to_string(),
                })?;
        }
        found += 1;
    }
    if found != N {
        return Err(CalibrationError::WrongTokenCount {
            element,
            expected: N,
            found,
        });
    }
    Ok(out)
}

fn read_attr_usize(
    node: Node,
    element: &'static str,
    attribute: &'static str,
) -> Result<usize, CalibrationError> {
    node.attribute(attribute)
        .and_then(|v| v.parse::<usize>().ok())
        .ok_or(CalibrationError::BadAttribute { element, attribute })
}

fn read_attr_u32(
    node: Node,
    element: &'static str,
    attribute: &'static str,
) -> Result<u32, CalibrationError> {
    node.attribute(attribute)
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or(CalibrationError::BadAttribute { element, attribute })
}

fn read_child_f64(
    parent: Node,
    parent_name: &str,
    element: &'static str,
) -> Result<f64, CalibrationError> {
    let node = child(parent, element).ok_or_else(|| CalibrationError::MissingElement {
        parent: parent_name.to_string(),
        element,
    })?;
    let [value] = read_floats::<1>(node, element)?;
    Ok(value)
}

fn parse_alignment(chunk: Node) -> Result<RigAlignment, CalibrationError> {
    let Some(node) = child(chunk, "transform") else {
        return Ok(RigAlignment::default());
    };

    if let (Some(r), Some(t)) = (child(node, "rotation"), child(node, "translation")) {
        let rot = read_floats::<9>(r, "rotation")?;
        let tr = read_floats::<3>(t, "translation")?;
        let mut m = Matrix4::<f32>::identity();
        for row in 0..3 {
            for col in 0..3 {
                m[(row, col)] = rot[row * 3 + col] as f32;
            }
            m[(row, 3)] = tr[row] as f32;
        }
        return Ok(RigAlignment::Transform(m));
    }

    if let Some(s) = child(node, "scale") {
        let [scale] = read_floats::<1>(s, "scale")?;
        return Ok(RigAlignment::Scale(scale as f32));
    }

    Ok(RigAlignment::default())
}

fn parse_sensors(chunk: Node) -> Result<Vec<SensorIntrinsics>, CalibrationError> {
    let section = child(chunk, "sensors").ok_or(CalibrationError::MissingSection {
        section: "sensors",
    })?;
    let count = read_attr_usize(section, "sensors", "next_id")?;

    let mut slots: Vec<Option<SensorIntrinsics>> = vec![None; count];
    for sensor in section.children().filter(|n| n.has_tag_name("sensor")) {
        let id = read_attr_usize(sensor, "sensor", "id")?;
        if id >= count {
            return Err(CalibrationError::IdOutOfRange {
                element: "sensor",
                id,
                count,
            });
        }

        let parent = format!("sensor {id}");
        let calib = child(sensor, "calibration").ok_or_else(|| {
            CalibrationError::MissingElement {
                parent: parent.clone(),
                element: "calibration",
            }
        })?;
        let resolution =
            child(calib, "resolution").ok_or_else(|| CalibrationError::MissingElement {
                parent: parent.clone(),
                element: "resolution",
            })?;
        let width = read_attr_u32(resolution, "resolution", "width")?;
        let height = read_attr_u32(resolution, "resolution", "height")?;
        let f = read_child_f64(calib, &parent, "f")?;
        let cx = read_child_f64(calib, &parent, "cx")?;
        let cy = read_child_f64(calib, &parent, "cy")?;

        let intrinsics = SensorIntrinsics {
            f,
            cx,
            cy,
            width,
            height,
        };
        if !intrinsics.is_valid() {
            return Err(CalibrationError::InvalidIntrinsics {
                id,
                f,
                width,
                height,
            });
        }
        if slots[id].is_some() {
            log::warn!("sensor {id} declared more than once, keeping the last entry");
        }
        slots[id] = Some(intrinsics);
    }

    collect_slots(slots, "sensors")
}

fn parse_cameras(
    chunk: Node,
    sensors: &[SensorIntrinsics],
) -> Result<Vec<CameraCalibration>, CalibrationError> {
    let section = child(chunk, "cameras").ok_or(CalibrationError::MissingSection {
        section: "cameras",
    })?;
    let count = read_attr_usize(section, "cameras", "next_id")?;

    let mut slots: Vec<Option<CameraCalibration>> = vec![None; count];
    for camera in section.children().filter(|n| n.has_tag_name("camera")) {
        let id = read_attr_usize(camera, "camera", "id")?;
        if id >= count {
            return Err(CalibrationError::IdOutOfRange {
                element: "camera",
                id,
                count,
            });
        }

        let sensor_id = read_attr_usize(camera, "camera", "sensor_id")?;
        let intrinsics =
            sensors
                .get(sensor_id)
                .copied()
                .ok_or(CalibrationError::UnknownSensor {
                    camera: id,
                    sensor: sensor_id,
                    count: sensors.len(),
                })?;

        let transform =
            child(camera, "transform").ok_or_else(|| CalibrationError::MissingElement {
                parent: format!("camera {id}"),
                element: "transform",
            })?;
        let values = read_floats::<16>(transform, "camera transform")?;
        let pose = Matrix4::from_row_slice(&values.map(|v| v as f32));

        if slots[id].is_some() {
            log::warn!("camera {id} declared more than once, keeping the last entry");
        }
        slots[id] = Some(CameraCalibration { intrinsics, pose });
    }

    collect_slots(slots, "cameras")
}

fn collect_slots<T>(
    slots: Vec<Option<T>>,
    section: &'static str,
) -> Result<Vec<T>, CalibrationError> {
    slots
        .into_iter()
        .enumerate()
        .map(|(id, slot)| slot.ok_or(CalibrationError::MissingSlot { section, id }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn document(chunk_body: &str) -> String {
        format!(r#"<?xml version="1.0" encoding="UTF-8"?><document version="1.4.0"><chunk>{chunk_body}</chunk></document>"#)
    }

    fn sensor(id: usize, f: f64, width: u32, height: u32) -> String {
        format!(
            r#"<sensor id="{id}" label="cam_{id}" type="frame">
                 <calibration type="frame" class="adjusted">
                   <resolution width="{width}" height="{height}"/>
                   <f>{f}</f><cx>12.5</cx><cy>-8.25</cy>
                   <k1>-0.01</k1><k2>0.002</k2>
                 </calibration>
               </sensor>"#
        )
    }

    fn camera(id: usize, sensor_id: usize, tx: f64) -> String {
        format!(
            r#"<camera id="{id}" sensor_id="{sensor_id}" label="{id:08}">
                 <transform>1 0 0 {tx}  0 1 0 0.25  0 0 1 2  0 0 0 1</transform>
               </camera>"#
        )
    }

    #[test]
    fn parses_a_complete_document() {
        let body = format!(
            r#"<transform>
                 <rotation>0 -1 0  1 0 0  0 0 1</rotation>
                 <translation>0.5 -0.25 3</translation>
               </transform>
               <sensors next_id="1">{}</sensors>
               <cameras next_id="2">{}{}</cameras>"#,
            sensor(0, 8000.0, 4000, 6000),
            camera(0, 0, 0.5),
            camera(1, 0, -0.5),
        );
        let set = parse_calibration(&document(&body)).expect("parse");

        assert_eq!(set.camera_count(), 2);
        assert_relative_eq!(set.cameras[0].intrinsics.f, 8000.0);
        assert_eq!(set.cameras[0].intrinsics.width, 4000);
        assert_relative_eq!(set.cameras[0].intrinsics.cy, -8.25);
        // Row-major fill of the pose.
        assert_relative_eq!(set.cameras[0].pose[(0, 3)], 0.5);
        assert_relative_eq!(set.cameras[1].pose[(0, 3)], -0.5);
        assert_relative_eq!(set.cameras[0].pose[(1, 3)], 0.25);
        assert_relative_eq!(set.cameras[0].pose[(2, 3)], 2.0);

        match set.alignment {
            RigAlignment::Transform(m) => {
                assert_relative_eq!(m[(0, 1)], -1.0);
                assert_relative_eq!(m[(1, 0)], 1.0);
                assert_relative_eq!(m[(0, 3)], 0.5);
                assert_relative_eq!(m[(1, 3)], -0.25);
                assert_relative_eq!(m[(3, 3)], 1.0);
            }
            other => panic!("expected transform alignment, got {other:?}"),
        }
    }

    #[test]
    fn out_of_order_ids_land_in_their_slots() {
        let body = format!(
            r#"<sensors next_id="2">{}{}</sensors>
               <cameras next_id="3">{}{}{}</cameras>"#,
            sensor(1, 4400.0, 3000, 2000),
            sensor(0, 8000.0, 4000, 6000),
            camera(2, 1, 2.0),
            camera(0, 0, 0.0),
            camera(1, 1, 1.0),
        );
        let set = parse_calibration(&document(&body)).expect("parse");

        assert_relative_eq!(set.cameras[0].intrinsics.f, 8000.0);
        assert_relative_eq!(set.cameras[1].intrinsics.f, 4400.0);
        assert_relative_eq!(set.cameras[2].intrinsics.f, 4400.0);
        assert_relative_eq!(set.cameras[0].pose[(0, 3)], 0.0);
        assert_relative_eq!(set.cameras[1].pose[(0, 3)], 1.0);
        assert_relative_eq!(set.cameras[2].pose[(0, 3)], 2.0);
    }

    #[test]
    fn scale_alignment_is_recognised() {
        let body = format!(
            r#"<transform><scale>0.66</scale></transform>
               <sensors next_id="1">{}</sensors>
               <cameras next_id="1">{}</cameras>"#,
            sensor(0, 8000.0, 4000, 6000),
            camera(0, 0, 0.0),
        );
        let set = parse_calibration(&document(&body)).expect("parse");
        match set.alignment {
            RigAlignment::Scale(s) => assert_relative_eq!(s, 0.66),
            other => panic!("expected scale alignment, got {other:?}"),
        }
    }

    #[test]
    fn missing_transform_defaults_to_identity() {
        let body = format!(
            r#"<sensors next_id="1">{}</sensors><cameras next_id="1">{}</cameras>"#,
            sensor(0, 8000.0, 4000, 6000),
            camera(0, 0, 0.0),
        );
        let set = parse_calibration(&document(&body)).expect("parse");
        assert_relative_eq!(set.alignment.matrix(), Matrix4::identity());
    }

    #[test]
    fn id_outside_declared_count_is_an_error() {
        let body = format!(
            r#"<sensors next_id="1">{}</sensors><cameras next_id="1">{}</cameras>"#,
            sensor(0, 8000.0, 4000, 6000),
            camera(1, 0, 0.0),
        );
        match parse_calibration(&document(&body)) {
            Err(CalibrationError::IdOutOfRange { element, id, count }) => {
                assert_eq!(element, "camera");
                assert_eq!(id, 1);
                assert_eq!(count, 1);
            }
            other => panic!("expected id error, got {other:?}"),
        }
    }

    #[test]
    fn undeclared_slot_is_an_error() {
        let body = format!(
            r#"<sensors next_id="1">{}</sensors><cameras next_id="2">{}</cameras>"#,
            sensor(0, 8000.0, 4000, 6000),
            camera(0, 0, 0.0),
        );
        match parse_calibration(&document(&body)) {
            Err(CalibrationError::MissingSlot { section, id }) => {
                assert_eq!(section, "cameras");
                assert_eq!(id, 1);
            }
            other => panic!("expected missing slot, got {other:?}"),
        }
    }

    #[test]
    fn unknown_sensor_reference_is_an_error() {
        let body = format!(
            r#"<sensors next_id="1">{}</sensors><cameras next_id="1">{}</cameras>"#,
            sensor(0, 8000.0, 4000, 6000),
            camera(0, 3, 0.0),
        );
        assert!(matches!(
            parse_calibration(&document(&body)),
            Err(CalibrationError::UnknownSensor {
                camera: 0,
                sensor: 3,
                ..
            })
        ));
    }

    #[test]
    fn wrong_token_count_is_an_error() {
        let body = format!(
            r#"<sensors next_id="1">{}</sensors>
               <cameras next_id="1">
                 <camera id="0" sensor_id="0"><transform>1 0 0 0 1 0 0 0 1</transform></camera>
               </cameras>"#,
            sensor(0, 8000.0, 4000, 6000),
        );
        assert!(matches!(
            parse_calibration(&document(&body)),
            Err(CalibrationError::WrongTokenCount {
                expected: 16,
                found: 9,
                ..
            })
        ));
    }

    #[test]
    fn non_numeric_token_is_an_error() {
        let body = format!(
            r#"<transform><rotation>1 0 0 0 oops 0 0 0 1</rotation>
               <translation>0 0 0</translation></transform>
               <sensors next_id="1">{}</sensors><cameras next_id="1">{}</cameras>"#,
            sensor(0, 8000.0, 4000, 6000),
            camera(0, 0, 0.0),
        );
        assert!(matches!(
            parse_calibration(&document(&body)),
            Err(CalibrationError::BadNumber { .. })
        ));
    }

    #[test]
    fn non_positive_focal_length_is_rejected() {
        let body = format!(
            r#"<sensors next_id="1">{}</sensors><cameras next_id="1">{}</cameras>"#,
            sensor(0, 0.0, 4000, 6000),
            camera(0, 0, 0.0),
        );
        assert!(matches!(
            parse_calibration(&document(&body)),
            Err(CalibrationError::InvalidIntrinsics { id: 0, .. })
        ));
    }

    #[test]
    fn missing_chunk_is_an_error() {
        assert!(matches!(
            parse_calibration(r#"<document version="1.4.0"></document>"#),
            Err(CalibrationError::MissingChunk)
        ));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(matches!(
            parse_calibration("<document><chunk>"),
            Err(CalibrationError::Xml(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("cam.xml");
        assert!(matches!(
            load_calibration(missing),
            Err(CalibrationError::Io(_))
        ));
    }
}
