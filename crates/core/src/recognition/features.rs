//! Deterministic feature extraction for face crops.
//!
//! Every vector in the gallery and every live probe goes through the same
//! steps: resize to a canonical square, grayscale, histogram equalization,
//! light Gaussian smoothing, then flatten and L2-normalize. Changing any
//! step invalidates all stored vectors.

use crate::shared::constants::FEATURE_SIZE;
use crate::shared::frame::Frame;
use crate::shared::raster::{area_resize, equalize_histogram, gaussian_blur_3x3, rgb_to_gray};

/// Extract a unit-norm feature vector from an RGB face crop.
///
/// Returns `None` for an empty crop or one with no intensity variation
/// (zero vector after normalization).
pub fn extract(crop: &Frame) -> Option<Vec<f32>> {
    if crop.is_empty() {
        return None;
    }

    let resized = area_resize(
        crop.data(),
        crop.width(),
        crop.height(),
        crop.channels(),
        FEATURE_SIZE,
        FEATURE_SIZE,
    );
    let gray = rgb_to_gray(&resized, FEATURE_SIZE, FEATURE_SIZE);
    let equalized = equalize_histogram(&gray);
    let smoothed = gaussian_blur_3x3(&equalized, FEATURE_SIZE, FEATURE_SIZE);

    let mut features: Vec<f32> = smoothed.iter().map(|&v| v as f32).collect();
    if !l2_normalize(&mut features) {
        return None;
    }
    Some(features)
}

/// Normalize in place to unit L2 norm. Returns false for a zero vector.
pub fn l2_normalize(v: &mut [f32]) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return false;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    true
}

/// Cosine similarity of two vectors. Zero when either has no magnitude
/// or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
