use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::shared::face::DetectionResult;
use crate::shared::frame::Frame;

/// Shared view of the capture thread's output.
///
/// Single writer (the capture thread), many readers. Both slots swap an
/// `Arc` under a short-lived lock, so readers never block on frame
/// decoding or detection, and a reader holding an old `Arc` keeps a
/// consistent frame while a new one is published.
pub struct PipelineState {
    frame: RwLock<Option<Arc<Frame>>>,
    result: RwLock<Arc<DetectionResult>>,
    active: AtomicBool,
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            frame: RwLock::new(None),
            result: RwLock::new(Arc::new(DetectionResult::empty())),
            active: AtomicBool::new(false),
        }
    }

    pub fn publish_frame(&self, frame: Arc<Frame>) {
        *write(&self.frame) = Some(frame);
    }

    pub fn latest_frame(&self) -> Option<Arc<Frame>> {
        read(&self.frame).clone()
    }

    pub fn publish_result(&self, result: Arc<DetectionResult>) {
        *write(&self.result) = result;
    }

    pub fn latest_result(&self) -> Arc<DetectionResult> {
        read(&self.result).clone()
    }

    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

// A poisoned lock only means a reader panicked while holding the guard;
// the Arc slots themselves are always valid.
fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
