use crate::shared::frame::Frame;

/// A camera or file-backed stream of frames.
///
/// Pull-based: the capture loop asks for one frame per cycle.
/// `Ok(None)` means the source is exhausted (end of a file source);
/// a transient read failure is an `Err` and the source stays usable.
pub trait FrameSource: Send {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error>>;
    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;
    fn release(&mut self);
}
