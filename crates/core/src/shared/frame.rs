use ndarray::ArrayView3;

/// A single camera frame: contiguous RGB bytes in row-major order.
///
/// Pixel format conversion happens at the capture boundary only; everything
/// downstream treats the buffer as opaque RGB. The frame index increases
/// monotonically per source so detection results can name the frame they
/// were computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (
                self.height as usize,
                self.width as usize,
                self.channels as usize,
            ),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies a rectangular region into a new frame.
    ///
    /// The rectangle is clamped to the frame bounds; returns `None` when the
    /// clamped region is empty. The copy inherits this frame's index.
    pub fn crop(&self, x: i32, y: i32, width: i32, height: i32) -> Option<Frame> {
        let x1 = x.max(0) as u32;
        let y1 = y.max(0) as u32;
        let x2 = (x.saturating_add(width)).clamp(0, self.width as i32) as u32;
        let y2 = (y.saturating_add(height)).clamp(0, self.height as i32) as u32;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        let (cw, ch) = (x2 - x1, y2 - y1);
        let c = self.channels as usize;
        let stride = self.width as usize * c;
        let row_bytes = cw as usize * c;
        let mut data = Vec::with_capacity(row_bytes * ch as usize);
        for row in y1..y2 {
            let start = row as usize * stride + x1 as usize * c;
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        Some(Frame::new(data, cw, ch, self.channels, self.index))
    }
}
