use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info};
use thiserror::Error;

use crate::recognition::domain::region_detector::RegionDetector;
use crate::recognition::features::{cosine_similarity, extract};
use crate::recognition::gallery::{Gallery, GalleryEntry, GalleryStoreError};
use crate::shared::constants::{AUTHORIZE_PADDING, ENROLL_PADDING, SIMILARITY_THRESHOLD};
use crate::shared::face::FaceCandidate;
use crate::shared::frame::Frame;
use crate::shared::raster::rgb_to_gray;

#[derive(Error, Debug)]
pub enum EnrollError {
    #[error("could not read image {path}: {reason}")]
    ImageUnreadable { path: PathBuf, reason: String },
    #[error("no face found in enrollment photo")]
    NoFaceFound,
    #[error("feature extraction failed for enrollment crop")]
    ExtractionFailed,
    #[error("gallery persistence failed: {0}")]
    Persistence(#[from] GalleryStoreError),
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub threshold: f32,
    pub gallery_path: PathBuf,
    pub enroll_padding: i32,
    pub authorize_padding: i32,
}

impl EngineConfig {
    pub fn new(gallery_path: PathBuf) -> Self {
        Self {
            threshold: SIMILARITY_THRESHOLD,
            gallery_path,
            enroll_padding: ENROLL_PADDING,
            authorize_padding: AUTHORIZE_PADDING,
        }
    }
}

/// A gallery entry that matched a live probe.
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    pub name: String,
    pub similarity: f32,
}

struct EngineInner {
    gallery: Gallery,
    region_detector: Box<dyn RegionDetector>,
}

/// Decides whether a detected face belongs to an enrolled identity.
///
/// Owns the gallery exclusively. Every mutation is persisted immediately;
/// if persistence fails the in-memory state is kept as-is and the error is
/// surfaced, so a later restart may lose the most recent change.
pub struct AuthorizationEngine {
    config: EngineConfig,
    inner: Mutex<EngineInner>,
}

impl AuthorizationEngine {
    /// Build an engine, loading any existing gallery from disk.
    pub fn new(
        config: EngineConfig,
        region_detector: Box<dyn RegionDetector>,
    ) -> Result<Self, GalleryStoreError> {
        let gallery = Gallery::load(&config.gallery_path)?;
        info!(
            "loaded gallery with {} enrolled entries from {}",
            gallery.len(),
            config.gallery_path.display()
        );
        Ok(Self {
            config,
            inner: Mutex::new(EngineInner {
                gallery,
                region_detector,
            }),
        })
    }

    /// Enroll a person from a photo on disk.
    ///
    /// The largest detected face wins when the photo contains several.
    /// Nothing is committed on a detection or extraction failure.
    pub fn enroll(&self, name: &str, image_path: &Path) -> Result<(), EnrollError> {
        let image = load_image(image_path)?;
        let gray = rgb_to_gray(image.data(), image.width(), image.height());

        let mut inner = lock(&self.inner);
        let regions = inner
            .region_detector
            .detect(&gray, image.width(), image.height());
        let region = regions
            .into_iter()
            .max_by_key(|r| r.area())
            .ok_or(EnrollError::NoFaceFound)?;

        let pad = self.config.enroll_padding;
        let crop = image
            .crop(
                region.x - pad,
                region.y - pad,
                region.width + 2 * pad,
                region.height + 2 * pad,
            )
            .ok_or(EnrollError::NoFaceFound)?;
        let features = extract(&crop).ok_or(EnrollError::ExtractionFailed)?;

        inner.gallery.add(GalleryEntry {
            name: name.to_string(),
            features,
        });
        info!("enrolled '{}' from {}", name, image_path.display());
        inner.gallery.save(&self.config.gallery_path)?;
        Ok(())
    }

    /// Whether the candidate matches any enrolled identity. Fails closed:
    /// any extraction problem reads as unauthorized.
    pub fn authorize(&self, frame: &Frame, face: &FaceCandidate) -> bool {
        self.recognize(frame, face).is_some()
    }

    /// Best gallery match strictly above the similarity threshold, if any.
    pub fn recognize(&self, frame: &Frame, face: &FaceCandidate) -> Option<Match> {
        let pad = self.config.authorize_padding;
        let crop = frame.crop(
            face.x - pad,
            face.y - pad,
            face.width + 2 * pad,
            face.height + 2 * pad,
        )?;
        let features = extract(&crop)?;

        let inner = lock(&self.inner);
        let best = best_match(&features, &inner.gallery)?;
        if best.similarity > self.config.threshold {
            debug!(
                "recognized '{}' at similarity {:.3}",
                best.name, best.similarity
            );
            Some(best)
        } else {
            None
        }
    }

    /// Remove the first enrolled entry with the given name. Returns
    /// whether anything was removed.
    pub fn remove(&self, name: &str) -> Result<bool, GalleryStoreError> {
        let mut inner = lock(&self.inner);
        let removed = inner.gallery.remove(name);
        if removed {
            info!("removed '{}' from gallery", name);
            inner.gallery.save(&self.config.gallery_path)?;
        }
        Ok(removed)
    }

    /// Drop every enrolled entry.
    pub fn clear(&self) -> Result<(), GalleryStoreError> {
        let mut inner = lock(&self.inner);
        inner.gallery.clear();
        inner.gallery.save(&self.config.gallery_path)
    }

    pub fn users(&self) -> Vec<String> {
        lock(&self.inner).gallery.names()
    }

    pub fn enrolled_count(&self) -> usize {
        lock(&self.inner).gallery.len()
    }
}

fn lock(inner: &Mutex<EngineInner>) -> std::sync::MutexGuard<'_, EngineInner> {
    // A poisoned lock means a panic mid-mutation; the gallery itself is
    // still structurally valid, so keep serving it.
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Highest-similarity gallery entry for a probe vector, regardless of
/// threshold. Ties keep the earliest-enrolled entry.
pub fn best_match(features: &[f32], gallery: &Gallery) -> Option<Match> {
    let mut best: Option<Match> = None;
    for entry in gallery.entries() {
        let similarity = cosine_similarity(features, &entry.features);
        if best.as_ref().map_or(true, |b| similarity > b.similarity) {
            best = Some(Match {
                name: entry.name.clone(),
                similarity,
            });
        }
    }
    best
}

fn load_image(path: &Path) -> Result<Frame, EnrollError> {
    let decoded = match image::open(path) {
        Ok(img) => img,
        Err(_) => {
            // The extension may lie about the contents; retry by sniffing
            // the format from the bytes themselves.
            let bytes = fs::read(path).map_err(|e| EnrollError::ImageUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            image::load_from_memory(&bytes).map_err(|e| EnrollError::ImageUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        }
    };
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::new(rgb.into_raw(), width, height, 3, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::region_detector::RegionBox;
    use crate::shared::face::CoordSpace;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    struct StubRegionDetector {
        regions: Vec<RegionBox>,
    }

    impl RegionDetector for StubRegionDetector {
        fn detect(&mut self, _gray: &[u8], _width: u32, _height: u32) -> Vec<RegionBox> {
            self.regions.clone()
        }
    }

    fn engine_with(tmp: &TempDir, regions: Vec<RegionBox>) -> AuthorizationEngine {
        let config = EngineConfig::new(tmp.path().join("gallery.json"));
        AuthorizationEngine::new(config, Box::new(StubRegionDetector { regions })).unwrap()
    }

    fn candidate(x: i32, y: i32, w: i32, h: i32) -> FaceCandidate {
        FaceCandidate {
            x,
            y,
            width: w,
            height: h,
            confidence: 0.9,
            keypoints: BTreeMap::new(),
            space: CoordSpace::Source,
        }
    }

    /// Renders a radial gradient and saves it as a PNG.
    fn write_gradient_photo(path: &Path, size: u32) -> Frame {
        let (c, max_d) = (size as f64 / 2.0, size as f64 / 2.0 * std::f64::consts::SQRT_2);
        let mut img = image::RgbImage::new(size, size);
        for (x, y, px) in img.enumerate_pixels_mut() {
            let d = ((x as f64 - c).powi(2) + (y as f64 - c).powi(2)).sqrt();
            let v = (255.0 * (1.0 - d / max_d)).round() as u8;
            *px = image::Rgb([v, v / 2, v / 3]);
        }
        img.save(path).unwrap();
        Frame::new(img.into_raw(), size, size, 3, 0)
    }

    fn unit(v: Vec<f32>) -> Vec<f32> {
        let mut v = v;
        crate::recognition::features::l2_normalize(&mut v);
        v
    }

    /// Unit vector with the given cosine similarity to `probe`.
    fn vector_at_cosine(probe: &[f32], target: f32) -> Vec<f32> {
        let mut ortho = vec![0.0f32; probe.len()];
        ortho[0] = 1.0;
        let dot: f32 = probe.iter().zip(&ortho).map(|(p, o)| p * o).sum();
        for (o, p) in ortho.iter_mut().zip(probe) {
            *o -= dot * p;
        }
        crate::recognition::features::l2_normalize(&mut ortho);
        let mix = (1.0 - target * target).sqrt();
        unit(probe
            .iter()
            .zip(&ortho)
            .map(|(p, o)| target * p + mix * o)
            .collect())
    }

    /// Features the engine extracts for `candidate(50, 50, 100, 100)` once
    /// the authorize padding widens the crop.
    fn probe_features(frame: &Frame) -> Vec<f32> {
        extract(&frame.crop(30, 30, 140, 140).unwrap()).unwrap()
    }

    #[test]
    fn test_best_match_picks_highest_similarity() {
        let mut gallery = Gallery::new();
        gallery.add(GalleryEntry {
            name: "alice".into(),
            features: unit(vec![1.0, 0.0, 0.0]),
        });
        gallery.add(GalleryEntry {
            name: "bob".into(),
            features: unit(vec![0.0, 1.0, 0.0]),
        });
        gallery.add(GalleryEntry {
            name: "carol".into(),
            features: unit(vec![0.7, 0.7, 0.0]),
        });

        let probe = unit(vec![0.9, 0.1, 0.0]);
        let best = best_match(&probe, &gallery).unwrap();
        assert_eq!(best.name, "alice");
        assert!(best.similarity > 0.9);
    }

    #[test]
    fn test_best_match_empty_gallery_is_none() {
        assert!(best_match(&[1.0, 0.0], &Gallery::new()).is_none());
    }

    #[test]
    fn test_best_match_tie_keeps_earliest_entry() {
        let mut gallery = Gallery::new();
        let features = unit(vec![1.0, 0.0, 0.0]);
        gallery.add(GalleryEntry {
            name: "first".into(),
            features: features.clone(),
        });
        gallery.add(GalleryEntry {
            name: "second".into(),
            features,
        });
        let best = best_match(&unit(vec![1.0, 0.0, 0.0]), &gallery).unwrap();
        assert_eq!(best.name, "first");
    }

    #[test]
    fn test_authorize_empty_gallery_denies() {
        let tmp = TempDir::new().unwrap();
        let engine = engine_with(&tmp, vec![]);
        let photo_path = tmp.path().join("probe.png");
        let frame = write_gradient_photo(&photo_path, 200);
        assert!(!engine.authorize(&frame, &candidate(50, 50, 100, 100)));
    }

    #[test]
    fn test_similarity_below_threshold_is_denied() {
        let tmp = TempDir::new().unwrap();
        let photo_path = tmp.path().join("probe.png");
        let frame = write_gradient_photo(&photo_path, 200);

        // Enrolled gallery whose best entry sits well under the threshold
        let mut gallery = Gallery::new();
        gallery.add(GalleryEntry {
            name: "mallory".into(),
            features: vector_at_cosine(&probe_features(&frame), 0.5),
        });
        gallery.save(&tmp.path().join("gallery.json")).unwrap();

        let engine = engine_with(&tmp, vec![]);
        assert_eq!(engine.enrolled_count(), 1);
        let face = candidate(50, 50, 100, 100);
        assert!(engine.recognize(&frame, &face).is_none());
        assert!(!engine.authorize(&frame, &face));
    }

    #[test]
    fn test_similarity_above_threshold_is_matched() {
        let tmp = TempDir::new().unwrap();
        let photo_path = tmp.path().join("probe.png");
        let frame = write_gradient_photo(&photo_path, 200);
        let probe = probe_features(&frame);

        let mut gallery = Gallery::new();
        gallery.add(GalleryEntry {
            name: "mallory".into(),
            features: vector_at_cosine(&probe, 0.5),
        });
        gallery.add(GalleryEntry {
            name: "alice".into(),
            features: vector_at_cosine(&probe, 0.95),
        });
        gallery.save(&tmp.path().join("gallery.json")).unwrap();

        let engine = engine_with(&tmp, vec![]);
        let matched = engine.recognize(&frame, &candidate(50, 50, 100, 100)).unwrap();
        assert_eq!(matched.name, "alice");
        assert!((matched.similarity - 0.95).abs() < 0.01);
    }

    #[test]
    fn test_enroll_then_authorize_same_face() {
        let tmp = TempDir::new().unwrap();
        let engine = engine_with(
            &tmp,
            vec![RegionBox {
                x: 50,
                y: 50,
                width: 100,
                height: 100,
            }],
        );

        let photo_path = tmp.path().join("alice.png");
        let frame = write_gradient_photo(&photo_path, 200);
        engine.enroll("alice", &photo_path).unwrap();
        assert_eq!(engine.users(), vec!["alice"]);

        let matched = engine.recognize(&frame, &candidate(50, 50, 100, 100));
        assert_eq!(matched.unwrap().name, "alice");
        assert!(engine.authorize(&frame, &candidate(50, 50, 100, 100)));
    }

    #[test]
    fn test_enroll_no_face_leaves_gallery_unchanged() {
        let tmp = TempDir::new().unwrap();
        let engine = engine_with(&tmp, vec![]);
        let photo_path = tmp.path().join("empty.png");
        write_gradient_photo(&photo_path, 200);

        let err = engine.enroll("alice", &photo_path).unwrap_err();
        assert!(matches!(err, EnrollError::NoFaceFound));
        assert!(engine.users().is_empty());
        assert!(!tmp.path().join("gallery.json").exists());
    }

    #[test]
    fn test_enroll_unreadable_image() {
        let tmp = TempDir::new().unwrap();
        let engine = engine_with(&tmp, vec![]);
        let bogus = tmp.path().join("not_an_image.png");
        fs::write(&bogus, b"definitely not pixels").unwrap();

        let err = engine.enroll("alice", &bogus).unwrap_err();
        assert!(matches!(err, EnrollError::ImageUnreadable { .. }));
    }

    #[test]
    fn test_enroll_picks_largest_face() {
        let tmp = TempDir::new().unwrap();
        let engine = engine_with(
            &tmp,
            vec![
                RegionBox {
                    x: 10,
                    y: 10,
                    width: 30,
                    height: 30,
                },
                RegionBox {
                    x: 60,
                    y: 60,
                    width: 100,
                    height: 100,
                },
            ],
        );
        let photo_path = tmp.path().join("two_faces.png");
        let frame = write_gradient_photo(&photo_path, 200);
        engine.enroll("alice", &photo_path).unwrap();

        // The probe over the larger face matches; the smaller one does not
        assert!(engine.authorize(&frame, &candidate(60, 60, 100, 100)));
    }

    #[test]
    fn test_remove_persists() {
        let tmp = TempDir::new().unwrap();
        let gallery_path = tmp.path().join("gallery.json");
        let engine = engine_with(
            &tmp,
            vec![RegionBox {
                x: 50,
                y: 50,
                width: 100,
                height: 100,
            }],
        );
        let photo_path = tmp.path().join("alice.png");
        write_gradient_photo(&photo_path, 200);
        engine.enroll("alice", &photo_path).unwrap();

        assert!(engine.remove("alice").unwrap());
        assert!(!engine.remove("alice").unwrap());
        assert_eq!(engine.enrolled_count(), 0);

        let reloaded = Gallery::load(&gallery_path).unwrap();
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_authorize_with_offscreen_candidate_denies() {
        let tmp = TempDir::new().unwrap();
        let engine = engine_with(&tmp, vec![]);
        let frame = Frame::new(vec![120u8; 100 * 100 * 3], 100, 100, 3, 0);
        assert!(!engine.authorize(&frame, &candidate(500, 500, 50, 50)));
    }
}
