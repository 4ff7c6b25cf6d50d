use serde::Serialize;

use crate::pipeline::state::PipelineState;
use crate::recognition::engine::AuthorizationEngine;
use crate::shared::face::FaceCandidate;

/// One detected face as reported to consumers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FaceStatus {
    /// Matched identity, if any.
    pub id: Option<String>,
    pub confidence: f32,
    #[serde(rename = "box")]
    pub bounds: (i32, i32, i32, i32),
    pub authorized: bool,
}

/// Point-in-time view of the pipeline for status consumers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PipelineStatus {
    pub active: bool,
    pub faces_detected: usize,
    pub faces: Vec<FaceStatus>,
}

/// Snapshot the latest detection result and run each face through the
/// authorization engine.
///
/// The faces are matched against the latest published frame, which may be
/// a few cycles newer than the frame the detection ran on; boxes move
/// slowly enough between cycles for the crop to stay valid.
pub fn snapshot(state: &PipelineState, engine: &AuthorizationEngine) -> PipelineStatus {
    let result = state.latest_result();
    let frame = state.latest_frame();

    let faces = result
        .faces
        .iter()
        .map(|face| {
            let matched = frame
                .as_deref()
                .and_then(|frame| engine.recognize(frame, face));
            face_status(face, matched.map(|m| m.name))
        })
        .collect::<Vec<_>>();

    PipelineStatus {
        active: state.is_active(),
        faces_detected: faces.len(),
        faces,
    }
}

fn face_status(face: &FaceCandidate, id: Option<String>) -> FaceStatus {
    FaceStatus {
        authorized: id.is_some(),
        id,
        confidence: face.confidence,
        bounds: (face.x, face.y, face.width, face.height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::face::CoordSpace;
    use std::collections::BTreeMap;

    fn face(x: i32) -> FaceCandidate {
        FaceCandidate {
            x,
            y: 5,
            width: 20,
            height: 25,
            confidence: 0.75,
            keypoints: BTreeMap::new(),
            space: CoordSpace::Source,
        }
    }

    #[test]
    fn test_face_status_fields() {
        let status = face_status(&face(10), Some("alice".into()));
        assert_eq!(status.id.as_deref(), Some("alice"));
        assert!(status.authorized);
        assert_eq!(status.bounds, (10, 5, 20, 25));
        assert!((status.confidence - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_unmatched_face_is_unauthorized() {
        let status = face_status(&face(0), None);
        assert!(!status.authorized);
        assert!(status.id.is_none());
    }

    #[test]
    fn test_json_shape_uses_box_key() {
        let status = PipelineStatus {
            active: true,
            faces_detected: 1,
            faces: vec![face_status(&face(1), None)],
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["active"], true);
        assert_eq!(json["faces_detected"], 1);
        assert!(json["faces"][0].get("box").is_some());
        assert!(json["faces"][0].get("bounds").is_none());
        assert_eq!(json["faces"][0]["authorized"], false);
    }
}
