use crate::shared::frame::Frame;
use crate::shared::region::{Detection, FaceBox};

/// Output of one detection call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionResult {
    /// Every window the cascade accepted, before merging.
    pub candidates: Vec<Detection>,
    /// Merged faces that met the neighbor threshold.
    pub faces: Vec<FaceBox>,
}

/// Domain interface for face detection.
///
/// Implementations may keep per-call scratch state, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, Box<dyn std::error::Error>>;
}
