use std::collections::BTreeMap;

/// Named facial landmarks emitted by the live detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Landmark {
    LeftEye,
    RightEye,
    Nose,
    MouthLeft,
    MouthRight,
}

impl Landmark {
    pub const ALL: [Landmark; 5] = [
        Landmark::LeftEye,
        Landmark::RightEye,
        Landmark::Nose,
        Landmark::MouthLeft,
        Landmark::MouthRight,
    ];
}

/// Which pixel grid a candidate's coordinates refer to.
///
/// Detection runs on a possibly downsampled working frame; results are
/// rescaled before publication. Tagging the space makes it a type-visible
/// error to mix the two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoordSpace {
    /// The downsampled frame the detector saw.
    Working,
    /// The full-resolution frame read from the source.
    Source,
}

/// One detected face: axis-aligned box, confidence, and any landmarks
/// that cleared the keypoint confidence threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceCandidate {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f32,
    pub keypoints: BTreeMap<Landmark, (i32, i32)>,
    pub space: CoordSpace,
}

impl FaceCandidate {
    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }
}

/// The outcome of one run of the detection chain, tied to the frame it
/// was computed from.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionResult {
    pub faces: Vec<FaceCandidate>,
    pub frame_index: usize,
}

impl DetectionResult {
    pub fn empty() -> Self {
        Self {
            faces: Vec::new(),
            frame_index: 0,
        }
    }
}
