/// Cascade file looked up in the working directory when none is given.
pub const DEFAULT_CASCADE_FILE: &str = "haarcascade_frontalface_default.xml";

/// Smallest scale tried, relative to the cascade's base window.
pub const BASE_SCALE: f64 = 2.0;

/// Factor between successive scales.
pub const SCALE_INCREMENT: f64 = 1.25;

/// Window step as a fraction of the scaled base width.
pub const STEP_FRACTION: f64 = 0.1;

/// Neighbors a merged face needs in normal mode.
pub const DEFAULT_MIN_NEIGHBORS: usize = 3;

/// Neighbors a merged face needs in higher-confidence mode.
pub const HIGH_CONFIDENCE_MIN_NEIGHBORS: usize = 4;

/// Outline color for merged faces.
pub const FACE_OUTLINE_COLOR: [u8; 3] = [255, 0, 0];

/// Outline color for raw candidate windows.
pub const CANDIDATE_OUTLINE_COLOR: [u8; 3] = [0, 0, 255];

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "webp"];
