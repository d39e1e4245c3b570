use ndarray::{Array2, ArrayView2};

use super::grayscale::GrayImage;

/// Summed-area tables over intensities and squared intensities.
///
/// `sum[[i, j]]` is the total intensity of columns `0..=i` and rows `0..=j`;
/// `sq_sum` holds the same for squared intensities. Both are indexed
/// `[x, y]` and share the source image's shape.
#[derive(Clone, Debug)]
pub struct IntegralTables {
    sum: Array2<f64>,
    sq_sum: Array2<f64>,
}

impl IntegralTables {
    pub fn build(gray: &GrayImage) -> Self {
        let (width, height) = (gray.width(), gray.height());
        let mut sum = Array2::<f64>::zeros((width, height));
        let mut sq_sum = Array2::<f64>::zeros((width, height));

        for i in 0..width {
            let mut column = 0.0;
            let mut column_sq = 0.0;
            for j in 0..height {
                let value = gray.get(i, j);
                let (left, left_sq) = if i > 0 {
                    (sum[[i - 1, j]], sq_sum[[i - 1, j]])
                } else {
                    (0.0, 0.0)
                };
                sum[[i, j]] = left + column + value;
                sq_sum[[i, j]] = left_sq + column_sq + value * value;
                column += value;
                column_sq += value * value;
            }
        }

        Self { sum, sq_sum }
    }

    pub fn width(&self) -> usize {
        self.sum.nrows()
    }

    pub fn height(&self) -> usize {
        self.sum.ncols()
    }

    /// Intensity total over the corners `(x1, y1)-(x2, y2)`.
    ///
    /// Covers columns `x1+1..=x2` and rows `y1+1..=y2`.
    pub fn rect_sum(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> f64 {
        corner_sum(&self.sum, x1, y1, x2, y2)
    }

    /// Squared-intensity total over the corners `(x1, y1)-(x2, y2)`.
    pub fn rect_sq_sum(&self, x1: usize, y1: usize, x2: usize, y2: usize) -> f64 {
        corner_sum(&self.sq_sum, x1, y1, x2, y2)
    }

    pub fn sum(&self) -> ArrayView2<'_, f64> {
        self.sum.view()
    }

    pub fn sq_sum(&self) -> ArrayView2<'_, f64> {
        self.sq_sum.view()
    }
}

/// Builds both tables for `gray`.
pub fn build_integral_tables(gray: &GrayImage) -> IntegralTables {
    IntegralTables::build(gray)
}

#[inline]
fn corner_sum(table: &Array2<f64>, x1: usize, y1: usize, x2: usize, y2: usize) -> f64 {
    table[[x2, y2]] + table[[x1, y1]] - table[[x1, y2]] - table[[x2, y1]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force(gray: &GrayImage, x1: usize, y1: usize, x2: usize, y2: usize, squared: bool) -> f64 {
        let mut total = 0.0;
        for x in (x1 + 1)..=x2 {
            for y in (y1 + 1)..=y2 {
                let v = gray.get(x, y);
                total += if squared { v * v } else { v };
            }
        }
        total
    }

    #[test]
    fn test_shape_matches_image() {
        let gray = GrayImage::from_fn(7, 4, |_, _| 1.0);
        let tables = IntegralTables::build(&gray);
        assert_eq!(tables.width(), 7);
        assert_eq!(tables.height(), 4);
        assert_eq!(tables.sq_sum().shape(), &[7, 4]);
    }

    #[test]
    fn test_constant_image_prefix_sums() {
        let gray = GrayImage::from_fn(4, 4, |_, _| 2.0);
        let tables = IntegralTables::build(&gray);
        // sum[i][j] covers (i+1)*(j+1) cells
        assert_relative_eq!(tables.sum()[[0, 0]], 2.0);
        assert_relative_eq!(tables.sum()[[3, 3]], 32.0);
        assert_relative_eq!(tables.sum()[[1, 2]], 12.0);
        assert_relative_eq!(tables.sq_sum()[[3, 3]], 64.0);
    }

    #[test]
    fn test_first_row_and_column_have_no_predecessor() {
        let gray = GrayImage::from_row_major(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let tables = IntegralTables::build(&gray);
        assert_relative_eq!(tables.sum()[[0, 0]], 1.0);
        assert_relative_eq!(tables.sum()[[2, 0]], 6.0);
        assert_relative_eq!(tables.sum()[[0, 1]], 5.0);
        assert_relative_eq!(tables.sum()[[2, 1]], 21.0);
    }

    #[test]
    fn test_rect_query_matches_brute_force_on_random_images() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..20 {
            let width = rng.gen_range(2..40);
            let height = rng.gen_range(2..40);
            let gray = GrayImage::from_fn(width, height, |_, _| rng.gen_range(0.0..255.0));
            let tables = IntegralTables::build(&gray);

            for _ in 0..50 {
                let x1 = rng.gen_range(0..width - 1);
                let x2 = rng.gen_range(x1 + 1..width);
                let y1 = rng.gen_range(0..height - 1);
                let y2 = rng.gen_range(y1 + 1..height);

                let expected = brute_force(&gray, x1, y1, x2, y2, false);
                let expected_sq = brute_force(&gray, x1, y1, x2, y2, true);
                assert_relative_eq!(
                    tables.rect_sum(x1, y1, x2, y2),
                    expected,
                    epsilon = 1e-6,
                    max_relative = 1e-9
                );
                assert_relative_eq!(
                    tables.rect_sq_sum(x1, y1, x2, y2),
                    expected_sq,
                    epsilon = 1e-4,
                    max_relative = 1e-9
                );
            }
        }
    }

    #[test]
    fn test_degenerate_rect_is_zero() {
        let gray = GrayImage::from_fn(5, 5, |x, y| (x + y) as f64);
        let tables = build_integral_tables(&gray);
        assert_relative_eq!(tables.rect_sum(2, 3, 2, 3), 0.0);
        assert_relative_eq!(tables.rect_sum(1, 1, 1, 4), 0.0);
    }
}
