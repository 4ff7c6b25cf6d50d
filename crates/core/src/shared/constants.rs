pub const DETECTOR_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const DETECTOR_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const ENROLL_MODEL_NAME: &str = "seeta_fd_frontal_v1.0.bin";
pub const ENROLL_MODEL_URL: &str =
    "https://raw.githubusercontent.com/atomashpolskiy/rustface/master/model/seeta_fd_frontal_v1.0.bin";

/// Frames narrower or shorter than this are rejected outright.
pub const MIN_FRAME_SIZE: u32 = 24;

/// Minimum working-frame dimension the detector will accept.
pub const MIN_WORKING_SIZE: u32 = 48;

/// Frames wider than this are downsampled before detection.
pub const MAX_WORKING_WIDTH: u32 = 480;

/// Run the detection chain every Nth capture cycle.
pub const SAMPLE_STRIDE: usize = 5;

/// Inter-cycle delay (~30 cycles per second).
pub const CYCLE_INTERVAL_MS: u64 = 33;

/// Cosine-similarity threshold for an authorized match.
pub const SIMILARITY_THRESHOLD: f32 = 0.8;

/// Canonical square size face crops are resized to before feature extraction.
pub const FEATURE_SIZE: u32 = 100;

/// Crop padding around a detected region at enrollment time.
pub const ENROLL_PADDING: i32 = 10;

/// Crop padding around a live candidate box at authorization time.
pub const AUTHORIZE_PADDING: i32 = 20;

pub const GALLERY_FILE_NAME: &str = "gallery.json";

pub const DEFAULT_CAMERA_WIDTH: u32 = 640;
pub const DEFAULT_CAMERA_HEIGHT: u32 = 480;
pub const DEFAULT_CAMERA_FPS: u32 = 30;
