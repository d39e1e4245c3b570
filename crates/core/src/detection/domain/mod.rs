pub mod classifier;
pub mod face_detector;
pub mod grayscale;
pub mod integral_image;
pub mod region_merger;
pub mod scan_config;
pub mod scanner;

use crate::shared::region::FaceBox;

use self::classifier::ClassifierModel;
use self::grayscale::GrayImage;
use self::integral_image::IntegralTables;
use self::region_merger::min_neighbors_for;

/// Scans `gray` with default parameters and merges the hits.
///
/// Faces need 3 neighboring windows, or 4 with `higher_confidence`.
pub fn detect(model: &ClassifierModel, gray: &GrayImage, higher_confidence: bool) -> Vec<FaceBox> {
    let tables = IntegralTables::build(gray);
    let candidates = scanner::scan(model, &tables);
    region_merger::merge(&candidates, min_neighbors_for(higher_confidence))
}
