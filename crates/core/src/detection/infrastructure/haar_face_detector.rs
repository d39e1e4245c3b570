/// Haar cascade face detector.
///
/// Converts each frame to luminance, builds integral tables, scans every
/// scale with the cascade and merges neighboring hits into faces.
use std::path::Path;
use std::sync::Arc;

use crate::detection::domain::classifier::ClassifierModel;
use crate::detection::domain::face_detector::{DetectionResult, FaceDetector};
use crate::detection::domain::grayscale::GrayImage;
use crate::detection::domain::integral_image::IntegralTables;
use crate::detection::domain::region_merger::RegionMerger;
use crate::detection::domain::scan_config::{ScanConfig, ScanConfigError};
use crate::detection::domain::scanner::Scanner;
use crate::detection::infrastructure::xml_cascade_loader::load_model_file;
use crate::shared::frame::Frame;

pub struct HaarCascadeDetector {
    model: Arc<ClassifierModel>,
    scanner: Scanner,
    merger: RegionMerger,
}

impl HaarCascadeDetector {
    /// Build a detector around an already loaded model. The model is shared,
    /// so several detectors can run over one cascade.
    pub fn new(
        model: Arc<ClassifierModel>,
        config: ScanConfig,
        higher_confidence: bool,
    ) -> Result<Self, ScanConfigError> {
        config.validate()?;
        Ok(Self {
            model,
            scanner: Scanner::new(config),
            merger: RegionMerger::for_confidence(higher_confidence),
        })
    }

    /// Load a cascade XML file and build a detector for it.
    pub fn from_cascade_file(
        path: &Path,
        config: ScanConfig,
        higher_confidence: bool,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let model = load_model_file(path)?;
        Ok(Self::new(Arc::new(model), config, higher_confidence)?)
    }

    pub fn model(&self) -> &ClassifierModel {
        &self.model
    }

    pub fn min_neighbors(&self) -> usize {
        self.merger.min_neighbors()
    }
}

impl FaceDetector for HaarCascadeDetector {
    fn detect(&mut self, frame: &Frame) -> Result<DetectionResult, Box<dyn std::error::Error>> {
        let gray = GrayImage::from_pixels(frame);
        let tables = IntegralTables::build(&gray);
        let candidates = self.scanner.scan(&self.model, &tables);
        let faces = self.merger.merge(&candidates);

        log::debug!(
            "{}x{} frame: {} candidates, {} faces (min neighbors {})",
            frame.width(),
            frame.height(),
            candidates.len(),
            faces.len(),
            self.merger.min_neighbors()
        );
        Ok(DetectionResult { candidates, faces })
    }
}
