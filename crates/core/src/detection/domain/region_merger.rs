use crate::shared::constants::{DEFAULT_MIN_NEIGHBORS, HIGH_CONFIDENCE_MIN_NEIGHBORS};
use crate::shared::region::{Detection, FaceBox};

/// Collapses overlapping raw detections into averaged face boxes.
///
/// Detections are grouped with [`Region::is_same_face`], each group is
/// averaged, and groups with fewer than `min_neighbors` members are dropped.
///
/// [`Region::is_same_face`]: crate::shared::region::Region::is_same_face
pub struct RegionMerger {
    min_neighbors: usize,
}

impl RegionMerger {
    pub fn new(min_neighbors: usize) -> Self {
        Self { min_neighbors }
    }

    /// Merger with the neighbor threshold for normal or higher-confidence
    /// detection.
    pub fn for_confidence(higher_confidence: bool) -> Self {
        Self::new(min_neighbors_for(higher_confidence))
    }

    pub fn min_neighbors(&self) -> usize {
        self.min_neighbors
    }

    pub fn merge(&self, detections: &[Detection]) -> Vec<FaceBox> {
        merge(detections, self.min_neighbors)
    }
}

impl Default for RegionMerger {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_NEIGHBORS)
    }
}

pub fn min_neighbors_for(higher_confidence: bool) -> usize {
    if higher_confidence {
        HIGH_CONFIDENCE_MIN_NEIGHBORS
    } else {
        DEFAULT_MIN_NEIGHBORS
    }
}

/// Merges raw detections; output follows class-creation order.
pub fn merge(detections: &[Detection], min_neighbors: usize) -> Vec<FaceBox> {
    let (classes, class_count) = partition(detections);

    let mut totals = vec![ClassTotals::default(); class_count];
    for (detection, &class) in detections.iter().zip(&classes) {
        totals[class].add(detection);
    }

    totals
        .iter()
        .filter(|t| t.count >= min_neighbors as i64)
        .map(ClassTotals::average)
        .collect()
}

/// Assigns each detection a class index.
///
/// Every detection is compared with all earlier ones as
/// `earlier.is_same_face(current)`; each match overwrites the class, so the
/// last matching earlier detection decides. Detections with no match open
/// a new class. This is not an equivalence relation and is not closed
/// transitively.
pub fn partition(detections: &[Detection]) -> (Vec<usize>, usize) {
    let mut classes: Vec<usize> = Vec::with_capacity(detections.len());
    let mut class_count = 0;

    for (i, current) in detections.iter().enumerate() {
        let mut class = None;
        for (earlier, &earlier_class) in detections[..i].iter().zip(&classes) {
            if earlier.is_same_face(current) {
                class = Some(earlier_class);
            }
        }

        let class = class.unwrap_or_else(|| {
            class_count += 1;
            class_count - 1
        });
        classes.push(class);
    }

    (classes, class_count)
}

#[derive(Clone, Copy, Debug, Default)]
struct ClassTotals {
    count: i64,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
}

impl ClassTotals {
    fn add(&mut self, detection: &Detection) {
        self.count += 1;
        self.x += detection.x as i64;
        self.y += detection.y as i64;
        self.width += detection.width as i64;
        self.height += detection.height as i64;
    }

    fn average(&self) -> FaceBox {
        let n = self.count;
        let mean = |sum: i64| ((sum * 2 + n) / (2 * n)) as i32;
        FaceBox::new(mean(self.x), mean(self.y), mean(self.width), mean(self.height))
    }
}
