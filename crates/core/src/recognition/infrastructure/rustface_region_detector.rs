use std::fs;
use std::io::Cursor;
use std::path::Path;

use crate::recognition::domain::region_detector::{RegionBox, RegionDetector};

/// Enrollment-photo face locator backed by the `rustface` crate
/// (SeetaFace engine).
///
/// The model is loaded once; a detector instance is cheap and is rebuilt
/// per call since the engine is not reentrant.
pub struct RustfaceRegionDetector {
    model: rustface::Model,
    min_face_size: u32,
}

impl RustfaceRegionDetector {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let bytes = fs::read(model_path)?;
        let model = rustface::read_model(Cursor::new(bytes))?;
        Ok(Self {
            model,
            min_face_size: 50,
        })
    }
}

impl RegionDetector for RustfaceRegionDetector {
    fn detect(&mut self, gray: &[u8], width: u32, height: u32) -> Vec<RegionBox> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                RegionBox {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width() as i32,
                    height: bbox.height() as i32,
                }
            })
            .collect()
    }
}
