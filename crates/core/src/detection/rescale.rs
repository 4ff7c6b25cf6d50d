use crate::shared::face::{CoordSpace, FaceCandidate};

/// Map working-space candidates back onto the source frame grid.
///
/// Coordinates are divided by the working scale and truncated toward
/// zero. At scale 1.0 the geometry is untouched but candidates are still
/// retagged, so downstream consumers only ever see source-space results.
pub fn rescale_to_source(mut faces: Vec<FaceCandidate>, scale: f64) -> Vec<FaceCandidate> {
    for face in &mut faces {
        if scale != 1.0 {
            face.x = (face.x as f64 / scale) as i32;
            face.y = (face.y as f64 / scale) as i32;
            face.width = (face.width as f64 / scale) as i32;
            face.height = (face.height as f64 / scale) as i32;
            for point in face.keypoints.values_mut() {
                point.0 = (point.0 as f64 / scale) as i32;
                point.1 = (point.1 as f64 / scale) as i32;
            }
        }
        face.space = CoordSpace::Source;
    }
    faces
}
