use serde::Serialize;

/// Share of the reference width two windows may be offset by and still
/// count as the same face.
const NEIGHBOR_OFFSET_FRACTION: f64 = 0.2;

/// Maximum size ratio between two windows covering the same face.
const NEIGHBOR_SIZE_RATIO: f64 = 1.2;

/// An axis-aligned box in image pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// One window that passed every stage of the cascade.
pub type Detection = Region;

/// An averaged, neighbor-filtered face returned to callers.
pub type FaceBox = Region;

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Whether `other` lies entirely inside this region (edges inclusive).
    pub fn contains(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.right() <= self.right()
            && other.y >= self.y
            && other.bottom() <= self.bottom()
    }

    /// Decides whether `other` covers the same face as `self`.
    ///
    /// Holds when the two boxes are close in position and size relative to
    /// `self`, or when `self` is fully contained in `other`. The relation is
    /// not symmetric: containment is only checked in one direction, and the
    /// proximity tolerance is derived from `self.width` alone.
    pub fn is_same_face(&self, other: &Region) -> bool {
        let distance = (self.width as f64 * NEIGHBOR_OFFSET_FRACTION) as i32;

        let close = other.x <= self.x + distance
            && other.x >= self.x - distance
            && other.y <= self.y + distance
            && other.y >= self.y - distance
            && other.width <= (self.width as f64 * NEIGHBOR_SIZE_RATIO) as i32
            && (other.width as f64 * NEIGHBOR_SIZE_RATIO) as i32 >= self.width;

        close || other.contains(self)
    }
}
