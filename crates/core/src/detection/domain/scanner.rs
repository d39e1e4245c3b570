use super::classifier::ClassifierModel;
use super::integral_image::IntegralTables;
use super::scan_config::ScanConfig;
use crate::shared::region::Detection;

/// Multi-scale sliding-window scan of a cascade over integral tables.
///
/// The scan is a pure function of the model and the tables. With more than
/// one thread, scales are spread over workers and their results are put
/// back in scale order, so the raw list is identical to a sequential scan.
#[derive(Clone, Debug, Default)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scales visited for an image of the given size.
    pub fn scales(&self, model: &ClassifierModel, width: usize, height: usize) -> Vec<f64> {
        scale_sequence(
            self.config.base_scale,
            self.config.scale_increment,
            max_scale(model, width, height),
        )
    }

    pub fn scan(&self, model: &ClassifierModel, tables: &IntegralTables) -> Vec<Detection> {
        let scales = self.scales(model, tables.width(), tables.height());
        let threads = self.config.threads.min(scales.len());

        let detections = if threads > 1 {
            scan_parallel(model, tables, &scales, self.config.step_fraction, threads)
        } else {
            scales
                .iter()
                .flat_map(|&scale| scan_scale(model, tables, scale, self.config.step_fraction))
                .collect()
        };

        log::debug!(
            "Scanned {}x{} over {} scales: {} candidate windows",
            tables.width(),
            tables.height(),
            scales.len(),
            detections.len()
        );
        detections
    }
}

/// Scans with the default parameters on the calling thread.
pub fn scan(model: &ClassifierModel, tables: &IntegralTables) -> Vec<Detection> {
    Scanner::default().scan(model, tables)
}

/// Largest scale at which the base window still fits the image.
pub fn max_scale(model: &ClassifierModel, width: usize, height: usize) -> f64 {
    let by_width = width as f64 / model.base_width() as f64;
    let by_height = height as f64 / model.base_height() as f64;
    by_width.min(by_height)
}

/// Geometric scale sequence from `base` while strictly below `max`.
pub fn scale_sequence(base: f64, increment: f64, max: f64) -> Vec<f64> {
    let mut scales = Vec::new();
    let mut scale = base;
    while scale < max {
        scales.push(scale);
        scale *= increment;
    }
    scales
}

/// All accepted windows at one scale, column-major (x outer, y inner).
///
/// Windows are square with the side derived from the base width. When the
/// base window is taller than wide, rows are limited so the cascade's full
/// window height stays inside the image.
fn scan_scale(
    model: &ClassifierModel,
    tables: &IntegralTables,
    scale: f64,
    step_fraction: f64,
) -> Vec<Detection> {
    let base_width = model.base_width() as f64;
    let size = (scale * base_width) as usize;
    let step = ((scale * base_width * step_fraction) as usize).max(1);
    let cascade_height = (scale * model.base_height() as f64) as usize;
    let x_end = tables.width().saturating_sub(size);
    let y_end = tables.height().saturating_sub(size.max(cascade_height));

    let mut found = Vec::new();
    for x in (0..x_end).step_by(step) {
        for y in (0..y_end).step_by(step) {
            if model.accepts(tables, x, y, scale) {
                found.push(Detection::new(x as i32, y as i32, size as i32, size as i32));
            }
        }
    }

    log::trace!(
        "scale {scale:.4}: window {size}px, step {step}px, {} hits",
        found.len()
    );
    found
}

fn scan_parallel(
    model: &ClassifierModel,
    tables: &IntegralTables,
    scales: &[f64],
    step_fraction: f64,
    threads: usize,
) -> Vec<Detection> {
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, Vec<Detection>)>();

    std::thread::scope(|s| {
        for worker in 0..threads {
            let tx = result_tx.clone();
            s.spawn(move || {
                for index in (worker..scales.len()).step_by(threads) {
                    let found = scan_scale(model, tables, scales[index], step_fraction);
                    if tx.send((index, found)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut per_scale: Vec<Vec<Detection>> = vec![Vec::new(); scales.len()];
    for (index, found) in result_rx.iter() {
        per_scale[index] = found;
    }
    per_scale.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::classifier::{Feature, Stage, WeightedRect};
    use crate::detection::domain::grayscale::GrayImage;
    use approx::assert_relative_eq;

    fn accept_all(base_width: u32, base_height: u32) -> ClassifierModel {
        ClassifierModel::new(base_width, base_height, vec![])
    }

    fn tables(width: usize, height: usize) -> IntegralTables {
        IntegralTables::build(&GrayImage::from_fn(width, height, |x, y| ((x * 7 + y * 13) % 256) as f64))
    }

    // ── Scale sequence ───────────────────────────────────────────────

    #[test]
    fn test_scale_sequence_below_five() {
        let scales = scale_sequence(2.0, 1.25, 5.0);
        assert_eq!(scales, vec![2.0, 2.5, 3.125, 3.90625, 4.8828125]);
    }

    #[test]
    fn test_scale_sequence_excludes_max_itself() {
        assert_eq!(scale_sequence(2.0, 1.25, 2.5), vec![2.0]);
    }

    #[test]
    fn test_scale_sequence_empty_when_max_not_above_base() {
        assert!(scale_sequence(2.0, 1.25, 2.0).is_empty());
        assert!(scale_sequence(2.0, 1.25, 1.0).is_empty());
    }

    #[test]
    fn test_max_scale_uses_tighter_axis() {
        let model = accept_all(24, 24);
        assert_relative_eq!(max_scale(&model, 120, 240), 5.0);
        assert_relative_eq!(max_scale(&model, 240, 96), 4.0);
    }

    #[test]
    fn test_scanner_scales_for_image() {
        let model = accept_all(24, 24);
        let scanner = Scanner::default();
        assert_eq!(scanner.scales(&model, 120, 120).len(), 5);
    }

    // ── Window enumeration ───────────────────────────────────────────

    #[test]
    fn test_windows_are_square_and_column_major() {
        // 50x50 image, base 10: scales 2.0, 2.5, 3.125, 3.90625, 4.8828125
        let model = accept_all(10, 10);
        let detections = scan(&model, &tables(50, 50));

        // scale 2: size 20, step 2, x and y over [0, 30) -> 15 * 15 windows
        let first_scale: Vec<_> = detections.iter().filter(|d| d.width == 20).collect();
        assert_eq!(first_scale.len(), 225);
        assert_eq!(*first_scale[0], Detection::new(0, 0, 20, 20));
        assert_eq!(*first_scale[1], Detection::new(0, 2, 20, 20));
        assert_eq!(*first_scale[15], Detection::new(2, 0, 20, 20));
        assert!(detections.iter().all(|d| d.width == d.height));
    }

    #[test]
    fn test_window_counts_per_scale() {
        let model = accept_all(10, 10);
        let detections = scan(&model, &tables(50, 50));
        let count = |size: i32| detections.iter().filter(|d| d.width == size).count();

        assert_eq!(count(20), 15 * 15);
        // scale 2.5: size 25, step 2, [0, 25) -> 13
        assert_eq!(count(25), 13 * 13);
        // scale 3.125: size 31, step 3, [0, 19) -> 7
        assert_eq!(count(31), 7 * 7);
        // scale 3.90625: size 39, step 3, [0, 11) -> 4
        assert_eq!(count(39), 4 * 4);
        // scale 4.8828125: size 48, step 4, [0, 2) -> 1
        assert_eq!(count(48), 1);
        assert_eq!(detections.len(), 225 + 169 + 49 + 16 + 1);
    }

    #[test]
    fn test_image_smaller_than_window_yields_nothing() {
        let model = accept_all(24, 24);
        assert!(scan(&model, &tables(40, 40)).is_empty());
        assert!(scan(&model, &tables(10, 300)).is_empty());
    }

    #[test]
    fn test_tall_base_window_stays_inside_image() {
        let model = accept_all(10, 20);
        let detections = scan(&model, &tables(60, 60));
        assert!(!detections.is_empty());
        for d in &detections {
            let cascade_height = (d.width as f64 / 10.0 * 20.0) as i32;
            assert!(d.y + cascade_height < 60, "{d:?}");
        }
    }

    #[test]
    fn test_rejecting_cascade_finds_nothing() {
        let reject = Stage::new(
            0.0,
            vec![Feature::new(0.0, -1.0, -1.0, vec![WeightedRect::new(0, 0, 10, 10, 1.0)])],
        );
        let model = ClassifierModel::new(10, 10, vec![reject]);
        assert!(scan(&model, &tables(50, 50)).is_empty());
    }

    // ── Parallel scan ────────────────────────────────────────────────

    #[test]
    fn test_parallel_scan_matches_sequential_order() {
        // Accept only windows whose left third is darker than the rest
        let rect_dark = WeightedRect::new(0, 0, 4, 12, -3.0);
        let rect_all = WeightedRect::new(0, 0, 12, 12, 1.0);
        let stage = Stage::new(
            0.0,
            vec![Feature::new(0.0, -1.0, 1.0, vec![rect_all, rect_dark])],
        );
        let model = ClassifierModel::new(12, 12, vec![stage]);
        let gray = GrayImage::from_fn(160, 120, |x, y| ((x * 31 + y * 17) % 97) as f64);
        let tables = IntegralTables::build(&gray);

        let sequential = Scanner::new(ScanConfig::default()).scan(&model, &tables);
        for threads in [2, 3, 8] {
            let parallel = Scanner::new(ScanConfig::default().with_threads(threads)).scan(&model, &tables);
            assert_eq!(parallel, sequential, "threads = {threads}");
        }
    }
}
