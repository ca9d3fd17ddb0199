//! Bounding-box algebra.
//!
//! All coordinates are page-space points in a top-down system: `top` grows
//! downward, so `top <= bottom` for every valid box. Boxes are validated at
//! construction and are never silently normalized.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};

/// Default tolerance for approximate float comparisons.
pub const EPSILON: f64 = 1e-9;

/// Compares two floats for approximate equality.
#[inline]
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// An axis-aligned bounding box `{x0, top, x1, bottom}`.
///
/// Zero-width and zero-height boxes are legal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBBox", into = "RawBBox")]
pub struct BBox {
    x0: f64,
    top: f64,
    x1: f64,
    bottom: f64,
}

/// Unvalidated wire form of a [`BBox`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct RawBBox {
    x0: f64,
    top: f64,
    x1: f64,
    bottom: f64,
}

impl TryFrom<RawBBox> for BBox {
    type Error = StrataError;

    fn try_from(raw: RawBBox) -> Result<Self> {
        BBox::new(raw.x0, raw.top, raw.x1, raw.bottom)
    }
}

impl From<BBox> for RawBBox {
    fn from(b: BBox) -> Self {
        RawBBox {
            x0: b.x0,
            top: b.top,
            x1: b.x1,
            bottom: b.bottom,
        }
    }
}

impl BBox {
    /// Creates a bounding box, rejecting inverted or NaN coordinates.
    pub fn new(x0: f64, top: f64, x1: f64, bottom: f64) -> Result<Self> {
        let invalid = |reason| StrataError::InvalidBoundingBox {
            x0,
            top,
            x1,
            bottom,
            reason,
        };
        if x0.is_nan() || top.is_nan() || x1.is_nan() || bottom.is_nan() {
            return Err(invalid("coordinate is NaN"));
        }
        if x1 < x0 {
            return Err(invalid("x1 < x0"));
        }
        if bottom < top {
            return Err(invalid("bottom < top"));
        }
        Ok(Self {
            x0,
            top,
            x1,
            bottom,
        })
    }

    /// Builds a box from coordinates already known to be ordered.
    ///
    /// Used for boxes derived from valid boxes (unions, overlaps, edge spans).
    #[inline]
    pub(crate) const fn from_ordered(x0: f64, top: f64, x1: f64, bottom: f64) -> Self {
        Self {
            x0,
            top,
            x1,
            bottom,
        }
    }

    /// A zero-size box at a point.
    pub fn point(x: f64, y: f64) -> Result<Self> {
        Self::new(x, y, x, y)
    }

    #[inline]
    pub fn x0(&self) -> f64 {
        self.x0
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.top
    }

    #[inline]
    pub fn x1(&self) -> f64 {
        self.x1
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x0 + self.x1) / 2.0, (self.top + self.bottom) / 2.0)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// True iff all four edges of `other` lie within `self` (inclusive).
    pub fn contains(&self, other: &BBox) -> bool {
        other.x0 >= self.x0
            && other.x1 <= self.x1
            && other.top >= self.top
            && other.bottom <= self.bottom
    }

    /// True iff the point lies within `self` (inclusive).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.top && y <= self.bottom
    }

    /// True iff the boxes overlap or touch on both axes.
    pub fn intersects(&self, other: &BBox) -> bool {
        !(other.x0 > self.x1
            || other.x1 < self.x0
            || other.top > self.bottom
            || other.bottom < self.top)
    }

    /// The overlap rectangle, or `None` when the boxes do not intersect.
    pub fn intersection(&self, other: &BBox) -> Option<BBox> {
        if !self.intersects(other) {
            return None;
        }
        Some(BBox::from_ordered(
            self.x0.max(other.x0),
            self.top.max(other.top),
            self.x1.min(other.x1),
            self.bottom.min(other.bottom),
        ))
    }

    /// Area of the overlap with `other` (zero when disjoint or touching).
    pub fn overlap_area(&self, other: &BBox) -> f64 {
        self.intersection(other).map_or(0.0, |o| o.area())
    }

    /// The smallest box covering both.
    pub fn union(&self, other: &BBox) -> BBox {
        BBox::from_ordered(
            self.x0.min(other.x0),
            self.top.min(other.top),
            self.x1.max(other.x1),
            self.bottom.max(other.bottom),
        )
    }

    /// The union of every box in the iterator, or `None` when it is empty.
    pub fn union_all<I>(boxes: I) -> Option<BBox>
    where
        I: IntoIterator<Item = BBox>,
    {
        boxes.into_iter().reduce(|acc, b| acc.union(&b))
    }

    /// Shifts the box by `(dx, dy)`.
    pub fn translate(&self, dx: f64, dy: f64) -> BBox {
        BBox::from_ordered(self.x0 + dx, self.top + dy, self.x1 + dx, self.bottom + dy)
    }

    /// Grows the box by `dx` horizontally and `dy` vertically on each side.
    ///
    /// Negative amounts shrink it, but never past its center.
    pub fn expand(&self, dx: f64, dy: f64) -> BBox {
        let (cx, cy) = self.center();
        BBox::from_ordered(
            (self.x0 - dx).min(cx),
            (self.top - dy).min(cy),
            (self.x1 + dx).max(cx),
            (self.bottom + dy).max(cy),
        )
    }

    /// Maps the box into the unit coordinate space of `parent`.
    pub fn to_relative(&self, parent: &BBox) -> Result<BBox> {
        parent.require_area()?;
        let (w, h) = (parent.width(), parent.height());
        Ok(BBox::from_ordered(
            (self.x0 - parent.x0) / w,
            (self.top - parent.top) / h,
            (self.x1 - parent.x0) / w,
            (self.bottom - parent.top) / h,
        ))
    }

    /// Maps a box expressed relative to `parent` back to page space.
    pub fn to_absolute(&self, parent: &BBox) -> Result<BBox> {
        parent.require_area()?;
        let (w, h) = (parent.width(), parent.height());
        Ok(BBox::from_ordered(
            parent.x0 + self.x0 * w,
            parent.top + self.top * h,
            parent.x0 + self.x1 * w,
            parent.top + self.bottom * h,
        ))
    }

    /// Approximate equality on all four coordinates.
    pub fn approx_eq(&self, other: &BBox, epsilon: f64) -> bool {
        approx_eq(self.x0, other.x0, epsilon)
            && approx_eq(self.top, other.top, epsilon)
            && approx_eq(self.x1, other.x1, epsilon)
            && approx_eq(self.bottom, other.bottom, epsilon)
    }

    fn require_area(&self) -> Result<()> {
        if self.width() > 0.0 && self.height() > 0.0 {
            Ok(())
        } else {
            Err(StrataError::InvalidBoundingBox {
                x0: self.x0,
                top: self.top,
                x1: self.x1,
                bottom: self.bottom,
                reason: "parent box has no area",
            })
        }
    }
}

/// Anything with a page-space bounding box.
pub trait HasBBox {
    fn bbox(&self) -> BBox;

    fn x0(&self) -> f64 {
        self.bbox().x0()
    }

    fn top(&self) -> f64 {
        self.bbox().top()
    }

    fn x1(&self) -> f64 {
        self.bbox().x1()
    }

    fn bottom(&self) -> f64 {
        self.bbox().bottom()
    }

    fn width(&self) -> f64 {
        self.bbox().width()
    }

    fn height(&self) -> f64 {
        self.bbox().height()
    }
}

impl HasBBox for BBox {
    fn bbox(&self) -> BBox {
        *self
    }
}

/// Union of the bounding boxes of a slice of objects.
pub fn bbox_of<T: HasBBox>(items: &[T]) -> Option<BBox> {
    BBox::union_all(items.iter().map(HasBBox::bbox))
}
