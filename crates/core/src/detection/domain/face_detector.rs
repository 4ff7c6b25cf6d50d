use crate::shared::face::FaceCandidate;
use crate::shared::frame::Frame;

/// Finds faces in a prepared working frame.
///
/// Implementations receive frames already reduced to the working size and
/// report candidates in working coordinates. A detector may be slow or
/// fail on individual frames; callers absorb per-frame errors.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceCandidate>, Box<dyn std::error::Error>>;
}
