/// Axis-aligned face region in a still image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl RegionBox {
    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }
}

/// Locates face regions in a grayscale still image.
///
/// Used at enrollment time, where the input is a single photo rather than
/// a live frame. Returning no regions is a normal outcome for a photo
/// without a usable face.
pub trait RegionDetector: Send {
    fn detect(&mut self, gray: &[u8], width: u32, height: u32) -> Vec<RegionBox>;
}
