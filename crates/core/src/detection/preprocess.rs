use thiserror::Error;

use crate::shared::constants::{MIN_FRAME_SIZE, MIN_WORKING_SIZE};
use crate::shared::frame::Frame;
use crate::shared::raster::area_resize;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PrepareError {
    #[error("frame has no pixel data")]
    EmptyFrame,
    #[error("frame {width}x{height} is below the {min}px minimum")]
    FrameTooSmall { width: u32, height: u32, min: u32 },
    #[error("downsampled frame {width}x{height} is below the {min}px working minimum")]
    ResizeTooSmall { width: u32, height: u32, min: u32 },
}

/// A frame reduced to the detector's working size, plus the scale that
/// produced it (`working_width / source_width`, in `(0, 1]`).
#[derive(Clone, Debug)]
pub struct WorkingFrame {
    pub frame: Frame,
    pub scale: f64,
}

/// Validate a source frame and downsample it for detection.
///
/// Frames at or under `max_working_width` pass through at scale 1.0.
/// Wider frames are area-averaged down; both target dimensions are forced
/// to even integers no smaller than the working minimum, since the
/// detector's stride and pooling stages reject odd or undersized inputs.
pub fn prepare(frame: &Frame, max_working_width: u32) -> Result<WorkingFrame, PrepareError> {
    if frame.is_empty() {
        return Err(PrepareError::EmptyFrame);
    }
    if frame.width() < MIN_FRAME_SIZE || frame.height() < MIN_FRAME_SIZE {
        return Err(PrepareError::FrameTooSmall {
            width: frame.width(),
            height: frame.height(),
            min: MIN_FRAME_SIZE,
        });
    }

    if frame.width() <= max_working_width {
        return Ok(WorkingFrame {
            frame: frame.clone(),
            scale: 1.0,
        });
    }

    let scale = max_working_width as f64 / frame.width() as f64;
    let target_w = clamp_even((frame.width() as f64 * scale) as u32);
    let target_h = clamp_even((frame.height() as f64 * scale) as u32);

    let data = area_resize(
        frame.data(),
        frame.width(),
        frame.height(),
        frame.channels(),
        target_w,
        target_h,
    );
    let working = Frame::new(data, target_w, target_h, frame.channels(), frame.index());

    if working.width() < MIN_WORKING_SIZE || working.height() < MIN_WORKING_SIZE {
        return Err(PrepareError::ResizeTooSmall {
            width: working.width(),
            height: working.height(),
            min: MIN_WORKING_SIZE,
        });
    }

    Ok(WorkingFrame {
        frame: working,
        scale,
    })
}

fn clamp_even(dim: u32) -> u32 {
    (dim - dim % 2).max(MIN_WORKING_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::MAX_WORKING_WIDTH;
    use rstest::rstest;

    fn solid_frame(width: u32, height: u32) -> Frame {
        Frame::new(vec![90u8; (width * height * 3) as usize], width, height, 3, 3)
    }

    #[test]
    fn test_small_frame_passes_through_unchanged() {
        let frame = solid_frame(480, 360);
        let working = prepare(&frame, MAX_WORKING_WIDTH).unwrap();
        assert_eq!(working.scale, 1.0);
        assert_eq!(working.frame, frame);
    }

    #[rstest]
    #[case::exact_halving(960, 540, 480, 270)]
    #[case::odd_height_forced_even(970, 543, 480, 268)]
    #[case::hd_frame(1280, 720, 480, 270)]
    #[case::short_wide_clamped_to_minimum(1000, 50, 480, 48)]
    fn test_wide_frame_working_dimensions(
        #[case] src_w: u32,
        #[case] src_h: u32,
        #[case] expected_w: u32,
        #[case] expected_h: u32,
    ) {
        let frame = solid_frame(src_w, src_h);
        let working = prepare(&frame, MAX_WORKING_WIDTH).unwrap();
        assert_eq!(working.frame.width(), expected_w);
        assert_eq!(working.frame.height(), expected_h);
        assert!((working.scale - 480.0 / src_w as f64).abs() < 1e-9);
        assert_eq!(working.frame.index(), frame.index());
    }

    #[test]
    fn test_tiny_frame_rejected() {
        let frame = solid_frame(20, 100);
        let err = prepare(&frame, MAX_WORKING_WIDTH).unwrap_err();
        assert!(matches!(err, PrepareError::FrameTooSmall { width: 20, .. }));
    }

    #[test]
    fn test_empty_frame_rejected() {
        let frame = Frame::new(Vec::new(), 0, 0, 3, 0);
        assert_eq!(
            prepare(&frame, MAX_WORKING_WIDTH).unwrap_err(),
            PrepareError::EmptyFrame
        );
    }
}
