use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::imaging::domain::image_reader::ImageReader;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ImageReadError {
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Decodes image files with the `image` crate.
///
/// Any format the crate was built with is accepted (JPEG, PNG, GIF, BMP,
/// TIFF, WebP); alpha and palette data are flattened to RGB.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, Box<dyn std::error::Error>> {
        Ok(read_frame(path)?)
    }
}

pub fn read_frame(path: &Path) -> Result<Frame, ImageReadError> {
    let img = image::open(path)
        .map_err(|e| ImageReadError::Decode {
            path: path.to_path_buf(),
            source: e,
        })?
        .to_rgb8();

    let (width, height) = img.dimensions();
    log::debug!("Decoded {} ({width}x{height})", path.display());
    Ok(Frame::new(img.into_raw(), width, height))
}
