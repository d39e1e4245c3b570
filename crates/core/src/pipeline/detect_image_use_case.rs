use std::path::Path;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::face_detector::{DetectionResult, FaceDetector};
use crate::imaging::domain::image_reader::ImageReader;
use crate::imaging::domain::image_writer::ImageWriter;
use crate::shared::constants::{CANDIDATE_OUTLINE_COLOR, FACE_OUTLINE_COLOR};

/// Single-image detection pipeline: read → detect → (annotate → write).
pub struct DetectImageUseCase {
    reader: Box<dyn ImageReader>,
    image_writer: Box<dyn ImageWriter>,
    detector: Box<dyn FaceDetector>,
    annotator: Box<dyn FrameAnnotator>,
    show_candidates: bool,
}

impl DetectImageUseCase {
    pub fn new(
        reader: Box<dyn ImageReader>,
        image_writer: Box<dyn ImageWriter>,
        detector: Box<dyn FaceDetector>,
        annotator: Box<dyn FrameAnnotator>,
        show_candidates: bool,
    ) -> Self {
        Self {
            reader,
            image_writer,
            detector,
            annotator,
            show_candidates,
        }
    }

    /// Detects faces in `input_path`. With an output path, writes a copy with
    /// faces outlined in red and, if enabled, raw candidates in blue.
    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: Option<&Path>,
    ) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let mut frame = self.reader.read(input_path)?;
        let result = self.detector.detect(&frame)?;
        log::info!(
            "{}: {} faces from {} candidates",
            input_path.display(),
            result.faces.len(),
            result.candidates.len()
        );

        if let Some(output_path) = output_path {
            // Candidates first so face outlines stay on top
            if self.show_candidates {
                self.annotator
                    .outline(&mut frame, &result.candidates, CANDIDATE_OUTLINE_COLOR)?;
            }
            self.annotator
                .outline(&mut frame, &result.faces, FACE_OUTLINE_COLOR)?;
            self.image_writer.write(output_path, &frame)?;
        }

        Ok(result)
    }
}
