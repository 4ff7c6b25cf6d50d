use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::preprocess::prepare;
use crate::detection::rescale::rescale_to_source;
use crate::pipeline::domain::frame_source::FrameSource;
use crate::pipeline::state::PipelineState;
use crate::shared::constants::{CYCLE_INTERVAL_MS, MAX_WORKING_WIDTH, SAMPLE_STRIDE};
use crate::shared::face::DetectionResult;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("camera unavailable: {reason}")]
    DeviceUnavailable { reason: String },
    #[error("capture loop is already running")]
    AlreadyRunning,
}

#[derive(Clone, Debug)]
pub struct CaptureConfig {
    /// Run the detection chain every Nth frame; other frames only refresh
    /// the published frame.
    pub sample_stride: usize,
    pub cycle_interval: Duration,
    pub max_working_width: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_stride: SAMPLE_STRIDE,
            cycle_interval: Duration::from_millis(CYCLE_INTERVAL_MS),
            max_working_width: MAX_WORKING_WIDTH,
        }
    }
}

/// Background thread that reads frames and periodically runs detection.
///
/// All per-cycle failures (read, prepare, detect) are absorbed here:
/// consumers of [`PipelineState`] always see the last good frame and the
/// last good detection result, never an error and never a transient blank.
pub struct CaptureLoop {
    config: CaptureConfig,
    state: Arc<PipelineState>,
    handle: Option<thread::JoinHandle<()>>,
}

impl CaptureLoop {
    pub fn new(config: CaptureConfig) -> Self {
        Self {
            config,
            state: Arc::new(PipelineState::new()),
            handle: None,
        }
    }

    pub fn state(&self) -> Arc<PipelineState> {
        Arc::clone(&self.state)
    }

    /// Open the source and start the capture thread.
    ///
    /// Failing to open the source is the one fatal error here; everything
    /// after that degrades per cycle instead of stopping.
    pub fn start(
        &mut self,
        mut source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
    ) -> Result<(), CaptureError> {
        if self.handle.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }
        source
            .open()
            .map_err(|e| CaptureError::DeviceUnavailable {
                reason: e.to_string(),
            })?;

        self.state.set_active(true);
        let state = Arc::clone(&self.state);
        let config = self.config.clone();
        self.handle = Some(thread::spawn(move || {
            let mut cycle = CaptureCycle::new(source, detector, state, config);
            while cycle.state.is_active() {
                cycle.tick();
                thread::sleep(cycle.config.cycle_interval);
            }
            cycle.source.release();
        }));
        Ok(())
    }

    /// Signal the thread to stop and wait for it to release the source.
    /// Safe to call more than once.
    pub fn stop(&mut self) {
        self.state.set_active(false);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("capture thread panicked during shutdown");
            }
        }
    }
}

impl Drop for CaptureLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One capture thread's working set, separated from the thread itself so
/// the cycle logic can be driven directly in tests.
struct CaptureCycle {
    source: Box<dyn FrameSource>,
    detector: Box<dyn FaceDetector>,
    state: Arc<PipelineState>,
    config: CaptureConfig,
    cycle_count: usize,
}

impl CaptureCycle {
    fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        state: Arc<PipelineState>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            source,
            detector,
            state,
            config,
            cycle_count: 0,
        }
    }

    /// One capture cycle: read a frame, publish it, and on sampled cycles
    /// run the detection chain. Failures leave prior state untouched.
    fn tick(&mut self) {
        let frame = match self.source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return,
            Err(e) => {
                warn!("frame read failed: {e}");
                return;
            }
        };
        let frame = Arc::new(frame);
        self.state.publish_frame(Arc::clone(&frame));

        self.cycle_count += 1;
        if self.cycle_count % self.config.sample_stride != 0 {
            return;
        }

        match self.detect(&frame) {
            Ok(result) => self.state.publish_result(Arc::new(result)),
            Err(e) => debug!("detection cycle skipped for frame {}: {e}", frame.index()),
        }
    }

    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let working = prepare(frame, self.config.max_working_width)?;
        let faces = self.detector.detect(&working.frame)?;
        Ok(DetectionResult {
            faces: rescale_to_source(faces, working.scale),
            frame_index: frame.index(),
        })
    }
}
