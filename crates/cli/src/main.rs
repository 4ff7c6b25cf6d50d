use std::path::PathBuf;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use facewatch_core::detection::domain::face_detector::FaceDetector;
use facewatch_core::detection::infrastructure::onnx_face_detector::{
    OnnxFaceDetector, DEFAULT_CONFIDENCE,
};
use facewatch_core::pipeline::annotate::annotate;
use facewatch_core::pipeline::capture::{CaptureConfig, CaptureLoop};
use facewatch_core::pipeline::infrastructure::ffmpeg_frame_source::{
    CameraConfig, FfmpegFrameSource,
};
use facewatch_core::pipeline::status::snapshot;
use facewatch_core::recognition::domain::region_detector::{RegionBox, RegionDetector};
use facewatch_core::recognition::engine::{AuthorizationEngine, EngineConfig};
use facewatch_core::recognition::infrastructure::rustface_region_detector::RustfaceRegionDetector;
use facewatch_core::shared::constants::{
    DEFAULT_CAMERA_FPS, DEFAULT_CAMERA_HEIGHT, DEFAULT_CAMERA_WIDTH, DETECTOR_MODEL_NAME,
    DETECTOR_MODEL_URL, ENROLL_MODEL_NAME, ENROLL_MODEL_URL, GALLERY_FILE_NAME,
};
use facewatch_core::shared::model_resolver;

/// Live face detection and authorization against an enrolled gallery.
#[derive(Parser)]
#[command(name = "facewatch")]
struct Cli {
    /// Gallery file holding enrolled identities.
    #[arg(long, global = true, default_value = GALLERY_FILE_NAME)]
    gallery: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch a camera or video file and report who is in front of it.
    Run {
        /// Camera device or video file to read.
        #[arg(long, default_value = "/dev/video0")]
        input: String,

        /// Requested capture width.
        #[arg(long, default_value_t = DEFAULT_CAMERA_WIDTH)]
        width: u32,

        /// Requested capture height.
        #[arg(long, default_value_t = DEFAULT_CAMERA_HEIGHT)]
        height: u32,

        /// Requested capture frame rate.
        #[arg(long, default_value_t = DEFAULT_CAMERA_FPS)]
        fps: u32,

        /// Face detection confidence threshold (0.0-1.0).
        #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
        confidence: f64,

        /// Stop after this many seconds (0 = run until interrupted).
        #[arg(long, default_value = "0")]
        duration: u64,

        /// Write an annotated PNG of the last frame on exit.
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Enroll a person from a photo.
    Enroll {
        /// Name to store the face under.
        name: String,
        /// Photo containing the face (largest face wins).
        photo: PathBuf,
    },

    /// Remove the first enrolled entry with this name.
    Remove { name: String },

    /// List enrolled names.
    List,

    /// Remove every enrolled entry.
    Clear,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            input,
            width,
            height,
            fps,
            confidence,
            duration,
            snapshot,
        } => run_watch(
            &cli.gallery,
            CameraConfig {
                input,
                width,
                height,
                fps,
            },
            confidence,
            duration,
            snapshot,
        ),
        Command::Enroll { name, photo } => run_enroll(&cli.gallery, &name, &photo),
        Command::Remove { name } => run_remove(&cli.gallery, &name),
        Command::List => run_list(&cli.gallery),
        Command::Clear => run_clear(&cli.gallery),
    }
}

fn run_watch(
    gallery_path: &PathBuf,
    camera: CameraConfig,
    confidence: f64,
    duration: u64,
    snapshot_path: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&confidence) {
        return Err(format!("Confidence must be between 0.0 and 1.0, got {confidence}").into());
    }

    let detector = build_detector(confidence)?;
    let engine = build_engine(gallery_path)?;
    let source = Box::new(FfmpegFrameSource::new(camera));

    let mut capture = CaptureLoop::new(CaptureConfig::default());
    capture.start(source, detector)?;
    let state = capture.state();

    let started = Instant::now();
    loop {
        thread::sleep(Duration::from_secs(1));
        let status = snapshot(&state, &engine);
        println!("{}", serde_json::to_string(&status)?);
        if duration > 0 && started.elapsed() >= Duration::from_secs(duration) {
            break;
        }
    }
    capture.stop();

    if let Some(path) = snapshot_path {
        write_snapshot(&state, &engine, &path)?;
        log::info!("Snapshot written to {}", path.display());
    }

    Ok(())
}

fn run_enroll(
    gallery_path: &PathBuf,
    name: &str,
    photo: &PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = build_engine(gallery_path)?;
    engine.enroll(name, photo)?;
    println!(
        "Enrolled '{name}' ({} entries in gallery)",
        engine.enrolled_count()
    );
    Ok(())
}

fn run_remove(gallery_path: &PathBuf, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_gallery_engine(gallery_path)?;
    if engine.remove(name)? {
        println!("Removed '{name}'");
    } else {
        println!("No entry named '{name}'");
    }
    Ok(())
}

fn run_list(gallery_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_gallery_engine(gallery_path)?;
    for name in engine.users() {
        println!("{name}");
    }
    Ok(())
}

fn run_clear(gallery_path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_gallery_engine(gallery_path)?;
    let count = engine.enrolled_count();
    engine.clear()?;
    println!("Removed {count} entries");
    Ok(())
}

fn build_detector(confidence: f64) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {DETECTOR_MODEL_NAME}");
    let model_path = model_resolver::resolve(DETECTOR_MODEL_NAME, DETECTOR_MODEL_URL)?;
    Ok(Box::new(OnnxFaceDetector::new(&model_path, confidence)?))
}

fn build_engine(gallery_path: &PathBuf) -> Result<AuthorizationEngine, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {ENROLL_MODEL_NAME}");
    let model_path = model_resolver::resolve(ENROLL_MODEL_NAME, ENROLL_MODEL_URL)?;
    let region_detector = Box::new(RustfaceRegionDetector::new(&model_path)?);
    let engine = AuthorizationEngine::new(EngineConfig::new(gallery_path.clone()), region_detector)?;
    Ok(engine)
}

/// Engine for gallery metadata commands. These never enroll, so they skip
/// resolving the enrollment model and get a detector that finds nothing.
fn open_gallery_engine(
    gallery_path: &PathBuf,
) -> Result<AuthorizationEngine, Box<dyn std::error::Error>> {
    struct NoRegions;
    impl RegionDetector for NoRegions {
        fn detect(&mut self, _gray: &[u8], _width: u32, _height: u32) -> Vec<RegionBox> {
            Vec::new()
        }
    }
    let engine = AuthorizationEngine::new(EngineConfig::new(gallery_path.clone()), Box::new(NoRegions))?;
    Ok(engine)
}

fn write_snapshot(
    state: &facewatch_core::pipeline::state::PipelineState,
    engine: &AuthorizationEngine,
    path: &PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(frame) = state.latest_frame() else {
        return Err("no frame captured yet".into());
    };
    let result = state.latest_result();
    let authorized: Vec<bool> = result
        .faces
        .iter()
        .map(|face| engine.authorize(&frame, face))
        .collect();
    let annotated = annotate(&frame, &result.faces, &authorized);

    let image = image::RgbImage::from_raw(
        annotated.width(),
        annotated.height(),
        annotated.data().to_vec(),
    )
    .ok_or("annotated frame has inconsistent dimensions")?;
    image.save(path)?;
    Ok(())
}
