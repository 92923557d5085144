//! Geometric primitives for page analysis.
//!
//! All coordinates are floating-point PDF user units with the origin at
//! the top-left corner of the page (y grows downward). A bounding box is
//! `[x0, y0, x1, y1]` with `x0 <= x1` and `y0 <= y1`.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in page user units.
///
/// Serialises to and from the 4-element JSON array `[x0, y0, x1, y1]`
/// used throughout the wire schema.
///
/// # Examples
///
/// ```
/// use page_oxide::geometry::BBox;
///
/// let b = BBox::new(10.0, 10.0, 40.0, 20.0);
/// assert_eq!(b.width(), 30.0);
/// assert_eq!(b.height(), 10.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BBox {
    /// Create a new bounding box from its corners.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// A zero-area box at the origin.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Width of the box.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Height of the box.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Area of the box.
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// True when all four coordinates are finite.
    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// Check whether a point lies inside the box (edges inclusive).
    ///
    /// # Examples
    ///
    /// ```
    /// use page_oxide::geometry::BBox;
    ///
    /// let b = BBox::new(0.0, 0.0, 100.0, 50.0);
    /// assert!(b.contains_point(0.0, 0.0));
    /// assert!(b.contains_point(100.0, 50.0));
    /// assert!(!b.contains_point(101.0, 10.0));
    /// ```
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Check whether this box fully contains another, with a tolerance
    /// applied to every edge.
    pub fn contains(&self, other: &BBox, tolerance: f32) -> bool {
        other.x0 >= self.x0 - tolerance
            && other.y0 >= self.y0 - tolerance
            && other.x1 <= self.x1 + tolerance
            && other.y1 <= self.y1 + tolerance
    }

    /// Check whether this box intersects another.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.x0 < other.x1 && self.x1 > other.x0 && self.y0 < other.y1 && self.y1 > other.y0
    }

    /// Smallest box covering both boxes.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_oxide::geometry::BBox;
    ///
    /// let a = BBox::new(10.0, 10.0, 40.0, 20.0);
    /// let b = BBox::new(45.0, 10.0, 80.0, 20.0);
    /// assert_eq!(a.union(&b), BBox::new(10.0, 10.0, 80.0, 20.0));
    /// ```
    pub fn union(&self, other: &BBox) -> BBox {
        BBox::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Intersection-over-union with another box, in `[0, 1]`.
    ///
    /// Used for robust hyperlink attachment where exact bbox equality is
    /// too brittle across extractors.
    pub fn iou(&self, other: &BBox) -> f32 {
        let ix0 = self.x0.max(other.x0);
        let iy0 = self.y0.max(other.y0);
        let ix1 = self.x1.min(other.x1);
        let iy1 = self.y1.min(other.y1);
        if ix1 <= ix0 || iy1 <= iy0 {
            return 0.0;
        }
        let inter = (ix1 - ix0) * (iy1 - iy0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            0.0
        } else {
            inter / union
        }
    }

    /// Tight cover of a non-empty sequence of boxes, or `None` when the
    /// iterator is empty.
    pub fn cover<I: IntoIterator<Item = BBox>>(boxes: I) -> Option<BBox> {
        boxes.into_iter().reduce(|a, b| a.union(&b))
    }

    /// Scale both axes, e.g. when mapping bitmap pixels to user units.
    pub fn scaled(&self, sx: f32, sy: f32) -> BBox {
        BBox::new(self.x0 * sx, self.y0 * sy, self.x1 * sx, self.y1 * sy)
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f32; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}
