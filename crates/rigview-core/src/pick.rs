//! Identity color codec for the pick readback protocol.
//!
//! Hovered drawables are found by rendering flat id colors into an
//! offscreen target and reading back the pixel under the cursor. Two passes
//! exist: camera quads carry their id in the red channel, landmark markers
//! split theirs across green and blue. Each pass clears to its sentinel
//! color, so a background readback decodes to "no pick" without special
//! casing.

/// Flat RGB color, 8 bits per channel.
pub type PickColor = [u8; 3];

/// Red value read back when no camera quad covers the cursor.
pub const CAMERA_NONE: u8 = u8::MAX;

/// Clear color of the camera identity pass.
pub const CAMERA_CLEAR: PickColor = [255, 255, 255];

/// Decoded landmark value meaning no marker under the cursor.
pub const LANDMARK_NONE: u32 = 255 * 255;

/// Clear color of the landmark identity pass; decodes to [`LANDMARK_NONE`].
pub const LANDMARK_CLEAR: PickColor = [0, 0, 255];

/// Highest camera id the camera pass can encode.
pub const MAX_CAMERA_ID: usize = 254;

/// Highest landmark id the landmark pass can encode.
pub const MAX_LANDMARK_ID: usize = LANDMARK_NONE as usize - 1;

/// Encode a camera index as a camera-pass color.
///
/// Panics if `id` exceeds [`MAX_CAMERA_ID`]; larger rigs are not
/// representable in the red channel.
pub fn encode_camera(id: usize) -> PickColor {
    assert!(
        id <= MAX_CAMERA_ID,
        "camera id {id} exceeds the pick protocol range"
    );
    [id as u8, 0, 0]
}

/// Decode a camera-pass readback. `None` means background.
#[inline]
pub fn decode_camera(color: PickColor) -> Option<usize> {
    match color[0] {
        CAMERA_NONE => None,
        id => Some(id as usize),
    }
}

/// Encode a landmark index as a landmark-pass color.
///
/// Panics if `id` exceeds [`MAX_LANDMARK_ID`].
pub fn encode_landmark(id: usize) -> PickColor {
    assert!(
        id <= MAX_LANDMARK_ID,
        "landmark id {id} exceeds the pick protocol range"
    );
    [0, (id % 255) as u8, (id / 255) as u8]
}

/// Decode a landmark-pass readback. `None` means background.
#[inline]
pub fn decode_landmark(color: PickColor) -> Option<usize> {
    let value = color[1] as u32 + color[2] as u32 * 255;
    if value >= LANDMARK_NONE {
        None
    } else {
        Some(value as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_codec_round_trips_over_the_full_range() {
        for id in 0..=MAX_CAMERA_ID {
            let color = encode_camera(id);
            assert_eq!(color[1], 0);
            assert_eq!(color[2], 0);
            assert_eq!(decode_camera(color), Some(id));
        }
    }

    #[test]
    fn camera_clear_color_decodes_to_no_pick() {
        assert_eq!(decode_camera(CAMERA_CLEAR), None);
        assert_eq!(decode_camera([CAMERA_NONE, 0, 0]), None);
    }

    #[test]
    fn landmark_codec_round_trips_over_the_full_range() {
        for id in 0..=MAX_LANDMARK_ID {
            let color = encode_landmark(id);
            assert_eq!(color[0], 0);
            assert_eq!(decode_landmark(color), Some(id));
        }
    }

    #[test]
    fn landmark_channel_split_matches_the_wire_layout() {
        assert_eq!(encode_landmark(0), [0, 0, 0]);
        assert_eq!(encode_landmark(254), [0, 254, 0]);
        assert_eq!(encode_landmark(255), [0, 0, 1]);
        assert_eq!(encode_landmark(256), [0, 1, 1]);
        assert_eq!(encode_landmark(MAX_LANDMARK_ID), [0, 254, 254]);
    }

    #[test]
    fn landmark_clear_color_decodes_to_no_pick() {
        assert_eq!(decode_landmark(LANDMARK_CLEAR), None);
        // Values past the sentinel cannot be produced by encode_landmark
        // but may appear if a host clears to an arbitrary color.
        assert_eq!(decode_landmark([0, 200, 255]), None);
    }

    #[test]
    #[should_panic(expected = "exceeds the pick protocol range")]
    fn camera_encoding_rejects_the_sentinel_value() {
        encode_camera(MAX_CAMERA_ID + 1);
    }

    #[test]
    #[should_panic(expected = "exceeds the pick protocol range")]
    fn landmark_encoding_rejects_the_sentinel_value() {
        encode_landmark(MAX_LANDMARK_ID + 1);
    }
}
