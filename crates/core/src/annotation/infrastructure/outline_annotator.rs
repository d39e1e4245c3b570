use ndarray::{s, ArrayViewMut3};

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Draws 1 px rectangle outlines.
///
/// The outline spans `x..=x + width` and `y..=y + height`; parts outside
/// the frame are clipped.
pub struct OutlineAnnotator;

impl OutlineAnnotator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OutlineAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAnnotator for OutlineAnnotator {
    fn outline(
        &self,
        frame: &mut Frame,
        regions: &[Region],
        color: [u8; 3],
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut pixels = frame.as_ndarray_mut();
        for r in regions {
            draw_outline(&mut pixels, r, color);
        }
        Ok(())
    }
}

/// `pixels` is laid out (row, column, channel).
fn draw_outline(pixels: &mut ArrayViewMut3<'_, u8>, r: &Region, color: [u8; 3]) {
    let (rows, cols, _) = pixels.dim();
    let (rows, cols) = (rows as i64, cols as i64);

    let left = r.x as i64;
    let top = r.y as i64;
    let right = left + r.width as i64;
    let bottom = top + r.height as i64;

    let x_from = left.max(0);
    let x_to = right.min(cols - 1);
    let y_from = top.max(0);
    let y_to = bottom.min(rows - 1);
    if x_from > x_to || y_from > y_to {
        return;
    }

    let mut paint = |row: i64, col_from: i64, col_to: i64| {
        for col in col_from..=col_to {
            pixels
                .slice_mut(s![row as usize, col as usize, ..])
                .iter_mut()
                .zip(color)
                .for_each(|(p, c)| *p = c);
        }
    };

    for row in [top, bottom] {
        if (0..rows).contains(&row) {
            paint(row, x_from, x_to);
        }
    }
    for col in [left, right] {
        if (0..cols).contains(&col) {
            for row in y_from..=y_to {
                paint(row, col, col);
            }
        }
    }
}
