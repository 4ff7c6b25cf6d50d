//! Draws detection overlays onto a copy of a frame.

use crate::shared::face::FaceCandidate;
use crate::shared::frame::Frame;

pub const AUTHORIZED_COLOR: [u8; 3] = [0, 255, 0];
pub const DENIED_COLOR: [u8; 3] = [255, 0, 0];

const BORDER_WIDTH: i32 = 2;
const DOT_RADIUS: i32 = 2;

/// Returns a copy of the frame with a rectangle per face (green when
/// authorized, red otherwise) and a dot per visible landmark.
///
/// `authorized` is indexed in step with `faces`; missing entries read as
/// unauthorized.
pub fn annotate(frame: &Frame, faces: &[FaceCandidate], authorized: &[bool]) -> Frame {
    let mut out = frame.clone();
    for (i, face) in faces.iter().enumerate() {
        let color = if authorized.get(i).copied().unwrap_or(false) {
            AUTHORIZED_COLOR
        } else {
            DENIED_COLOR
        };
        draw_rect(&mut out, face.x, face.y, face.width, face.height, color);
        for &(kx, ky) in face.keypoints.values() {
            draw_dot(&mut out, kx, ky, color);
        }
    }
    out
}

fn draw_rect(frame: &mut Frame, x: i32, y: i32, w: i32, h: i32, color: [u8; 3]) {
    for b in 0..BORDER_WIDTH {
        for px in x..x + w {
            put_pixel(frame, px, y + b, color);
            put_pixel(frame, px, y + h - 1 - b, color);
        }
        for py in y..y + h {
            put_pixel(frame, x + b, py, color);
            put_pixel(frame, x + w - 1 - b, py, color);
        }
    }
}

fn draw_dot(frame: &mut Frame, x: i32, y: i32, color: [u8; 3]) {
    for dy in -DOT_RADIUS..=DOT_RADIUS {
        for dx in -DOT_RADIUS..=DOT_RADIUS {
            put_pixel(frame, x + dx, y + dy, color);
        }
    }
}

fn put_pixel(frame: &mut Frame, x: i32, y: i32, color: [u8; 3]) {
    if x < 0 || y < 0 || x >= frame.width() as i32 || y >= frame.height() as i32 {
        return;
    }
    let channels = frame.channels() as usize;
    let offset = (y as usize * frame.width() as usize + x as usize) * channels;
    let data = frame.data_mut();
    data[offset..offset + 3].copy_from_slice(&color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face::{CoordSpace, Landmark};
    use std::collections::BTreeMap;

    fn blank_frame(size: u32) -> Frame {
        Frame::new(vec![0u8; (size * size * 3) as usize], size, size, 3, 0)
    }

    fn face_at(x: i32, y: i32, w: i32, h: i32) -> FaceCandidate {
        FaceCandidate {
            x,
            y,
            width: w,
            height: h,
            confidence: 0.9,
            keypoints: BTreeMap::new(),
            space: CoordSpace::Source,
        }
    }

    fn pixel(frame: &Frame, x: usize, y: usize) -> [u8; 3] {
        let offset = (y * frame.width() as usize + x) * 3;
        frame.data()[offset..offset + 3].try_into().unwrap()
    }

    #[test]
    fn test_original_frame_untouched() {
        let frame = blank_frame(50);
        let _ = annotate(&frame, &[face_at(10, 10, 20, 20)], &[true]);
        assert!(frame.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_authorized_face_drawn_green() {
        let frame = blank_frame(50);
        let out = annotate(&frame, &[face_at(10, 10, 20, 20)], &[true]);
        assert_eq!(pixel(&out, 15, 10), AUTHORIZED_COLOR);
        assert_eq!(pixel(&out, 10, 15), AUTHORIZED_COLOR);
        // Interior remains untouched
        assert_eq!(pixel(&out, 20, 20), [0, 0, 0]);
    }

    #[test]
    fn test_unknown_face_drawn_red() {
        let frame = blank_frame(50);
        let out = annotate(&frame, &[face_at(10, 10, 20, 20)], &[false]);
        assert_eq!(pixel(&out, 15, 10), DENIED_COLOR);
    }

    #[test]
    fn test_missing_authorization_entry_reads_denied() {
        let frame = blank_frame(50);
        let out = annotate(&frame, &[face_at(10, 10, 20, 20)], &[]);
        assert_eq!(pixel(&out, 15, 10), DENIED_COLOR);
    }

    #[test]
    fn test_box_clipped_at_frame_edge() {
        let frame = blank_frame(30);
        // Box extends past the frame on all sides; must not panic
        let out = annotate(&frame, &[face_at(-10, -10, 60, 60)], &[false]);
        assert_eq!(out.width(), 30);
    }

    #[test]
    fn test_keypoints_drawn_as_dots() {
        let frame = blank_frame(50);
        let mut face = face_at(5, 5, 30, 30);
        face.keypoints.insert(Landmark::Nose, (20, 20));
        let out = annotate(&frame, &[face], &[true]);
        assert_eq!(pixel(&out, 20, 20), AUTHORIZED_COLOR);
        assert_eq!(pixel(&out, 21, 21), AUTHORIZED_COLOR);
    }
}
