use ndarray::{Array2, ShapeError};

use crate::shared::frame::PixelSource;

/// Luma of an RGB pixel with 30/59/11 channel weights.
///
/// The result keeps its fractional part; no rounding or clamping.
pub fn luminance(rgb: [u8; 3]) -> f64 {
    let [r, g, b] = rgb.map(u32::from);
    (30 * r + 59 * g + 11 * b) as f64 / 100.0
}

/// Grayscale intensities indexed `[x, y]` (column first).
#[derive(Clone, Debug, PartialEq)]
pub struct GrayImage {
    values: Array2<f64>,
}

impl GrayImage {
    /// Converts every pixel of `source` with [`luminance`].
    pub fn from_pixels<P: PixelSource + ?Sized>(source: &P) -> Self {
        let width = source.width() as usize;
        let height = source.height() as usize;
        let values = Array2::from_shape_fn((width, height), |(x, y)| {
            luminance(source.pixel_at(x as u32, y as u32))
        });
        Self { values }
    }

    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        Self {
            values: Array2::from_shape_fn((width, height), |(x, y)| f(x, y)),
        }
    }

    /// Builds an image from a row-major buffer of `width * height` values.
    pub fn from_row_major(
        width: usize,
        height: usize,
        values: Vec<f64>,
    ) -> Result<Self, ShapeError> {
        let rows = Array2::from_shape_vec((height, width), values)?;
        Ok(Self {
            values: rows.reversed_axes(),
        })
    }

    pub fn width(&self) -> usize {
        self.values.nrows()
    }

    pub fn height(&self) -> usize {
        self.values.ncols()
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.values[[x, y]]
    }
}
