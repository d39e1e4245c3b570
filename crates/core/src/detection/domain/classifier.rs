//! Cascade model: weighted rectangles, decision stumps and stages.
//!
//! A window is evaluated stage by stage; the first stage whose summed
//! stump outputs do not exceed its threshold rejects the window and no
//! later stage is touched.

use super::integral_image::IntegralTables;

/// Variance at or below which a window is treated as flat (no
/// normalization).
const VARIANCE_FLOOR: f64 = 1.0;

/// One weighted sub-rectangle of a feature, in base-window coordinates.
///
/// Per axis an offset from the window origin and an extent from that
/// offset; the scaled corners are `offset` and `offset + extent`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedRect {
    pub x_offset: u32,
    pub y_offset: u32,
    pub width_delta: u32,
    pub height_delta: u32,
    pub weight: f64,
}

impl WeightedRect {
    pub fn new(x_offset: u32, y_offset: u32, width_delta: u32, height_delta: u32, weight: f64) -> Self {
        Self {
            x_offset,
            y_offset,
            width_delta,
            height_delta,
            weight,
        }
    }

    /// Scaled, truncated corners relative to a window origin.
    fn scaled_corners(&self, scale: f64) -> (usize, usize, usize, usize) {
        (
            (scale * self.x_offset as f64) as usize,
            (scale * self.y_offset as f64) as usize,
            (scale * (self.x_offset + self.width_delta) as f64) as usize,
            (scale * (self.y_offset + self.height_delta) as f64) as usize,
        )
    }
}

/// A decision stump over a normalized weighted rectangle sum.
#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub threshold: f64,
    pub left_val: f64,
    pub right_val: f64,
    pub rects: Vec<WeightedRect>,
}

impl Feature {
    pub fn new(threshold: f64, left_val: f64, right_val: f64, rects: Vec<WeightedRect>) -> Self {
        Self {
            threshold,
            left_val,
            right_val,
            rects,
        }
    }

    /// Weighted rectangle sum of this feature inside `window`, scaled by the
    /// window's inverse area.
    ///
    /// Each rectangle's contribution is truncated toward zero before it is
    /// accumulated.
    pub fn score(&self, tables: &IntegralTables, window: &ScaledWindow) -> f64 {
        let mut weighted_sum = 0.0;
        for rect in &self.rects {
            let (x1, y1, x2, y2) = rect.scaled_corners(window.scale);
            let rect_sum = tables.rect_sum(
                window.x + x1,
                window.y + y1,
                window.x + x2,
                window.y + y2,
            );
            weighted_sum += (rect_sum * rect.weight).trunc();
        }
        weighted_sum * window.inv_area
    }

    /// Stump output for `window`: `left_val` below the normalized threshold,
    /// `right_val` otherwise.
    pub fn evaluate(&self, tables: &IntegralTables, window: &ScaledWindow) -> f64 {
        if self.score(tables, window) < self.threshold * window.norm {
            self.left_val
        } else {
            self.right_val
        }
    }
}

/// A boosted strong classifier: passes when its features' outputs sum to
/// more than `threshold`.
#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub threshold: f64,
    pub features: Vec<Feature>,
}

impl Stage {
    pub fn new(threshold: f64, features: Vec<Feature>) -> Self {
        Self {
            threshold,
            features,
        }
    }

    pub fn sum(&self, tables: &IntegralTables, window: &ScaledWindow) -> f64 {
        self.sum_counting(tables, window, &mut 0)
    }

    /// Like [`Stage::sum`], adding one to `evaluated` per feature evaluated.
    pub fn sum_counting(
        &self,
        tables: &IntegralTables,
        window: &ScaledWindow,
        evaluated: &mut usize,
    ) -> f64 {
        let mut sum = 0.0;
        for feature in &self.features {
            sum += feature.evaluate(tables, window);
            *evaluated += 1;
        }
        sum
    }

    pub fn passes(&self, tables: &IntegralTables, window: &ScaledWindow) -> bool {
        self.sum(tables, window) > self.threshold
    }
}

/// Immutable cascade: base window size plus stages in evaluation order.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassifierModel {
    base_width: u32,
    base_height: u32,
    stages: Vec<Stage>,
}

impl ClassifierModel {
    pub fn new(base_width: u32, base_height: u32, stages: Vec<Stage>) -> Self {
        Self {
            base_width,
            base_height,
            stages,
        }
    }

    pub fn base_width(&self) -> u32 {
        self.base_width
    }

    pub fn base_height(&self) -> u32 {
        self.base_height
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn feature_count(&self) -> usize {
        self.stages.iter().map(|s| s.features.len()).sum()
    }

    /// Runs the cascade over the window at `(x, y)` for `scale`, stopping at
    /// the first failing stage.
    pub fn evaluate_window(
        &self,
        tables: &IntegralTables,
        x: usize,
        y: usize,
        scale: f64,
    ) -> WindowVerdict {
        let window = ScaledWindow::new(self, tables, x, y, scale);
        let mut features_evaluated = 0;

        for (index, stage) in self.stages.iter().enumerate() {
            if stage.sum_counting(tables, &window, &mut features_evaluated) <= stage.threshold {
                return WindowVerdict {
                    rejected_at: Some(index),
                    stages_evaluated: index + 1,
                    features_evaluated,
                };
            }
        }

        WindowVerdict {
            rejected_at: None,
            stages_evaluated: self.stages.len(),
            features_evaluated,
        }
    }

    pub fn accepts(&self, tables: &IntegralTables, x: usize, y: usize, scale: f64) -> bool {
        self.evaluate_window(tables, x, y, scale).accepted()
    }
}

/// Outcome of running the cascade over one window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowVerdict {
    /// Index of the stage that rejected the window, if any.
    pub rejected_at: Option<usize>,
    pub stages_evaluated: usize,
    pub features_evaluated: usize,
}

impl WindowVerdict {
    pub fn accepted(&self) -> bool {
        self.rejected_at.is_none()
    }
}

/// A candidate window at one scale with its normalization terms.
///
/// The window spans the model's base size scaled by `scale` (truncated),
/// starting at `(x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaledWindow {
    pub x: usize,
    pub y: usize,
    pub scale: f64,
    pub width: usize,
    pub height: usize,
    /// `1 / (width * height)`.
    pub inv_area: f64,
    /// Intensity standard deviation, or 1 for near-flat windows.
    pub norm: f64,
}

impl ScaledWindow {
    pub fn new(model: &ClassifierModel, tables: &IntegralTables, x: usize, y: usize, scale: f64) -> Self {
        let width = (scale * model.base_width as f64) as usize;
        let height = (scale * model.base_height as f64) as usize;
        let inv_area = 1.0 / (width * height) as f64;

        let total = tables.rect_sum(x, y, x + width, y + height);
        let total_sq = tables.rect_sq_sum(x, y, x + width, y + height);
        let mean = total * inv_area;
        let variance = total_sq * inv_area - mean * mean;
        let norm = if variance > VARIANCE_FLOOR {
            variance.sqrt()
        } else {
            1.0
        };

        Self {
            x,
            y,
            scale,
            width,
            height,
            inv_area,
            norm,
        }
    }
}
