//! Table extraction types and settings.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StrataError};
use crate::geometry::{BBox, HasBBox};
use crate::layout::TextSettings;

// Default constants
pub(crate) const DEFAULT_SNAP_TOLERANCE: f64 = 3.0;
pub(crate) const DEFAULT_JOIN_TOLERANCE: f64 = 3.0;
pub(crate) const DEFAULT_INTERSECTION_TOLERANCE: f64 = 3.0;
pub(crate) const DEFAULT_MIN_WORDS_VERTICAL: usize = 3;
pub(crate) const DEFAULT_MIN_WORDS_HORIZONTAL: usize = 1;

/// Words whose alignment coordinates differ by at most this much are
/// treated as sharing a column or row boundary.
pub(crate) const WORD_ALIGNMENT_TOLERANCE: f64 = 1.0;

// Key types for ordered float maps
pub(crate) type KeyF64 = OrderedFloat<f64>;
pub(crate) type KeyPoint = (KeyF64, KeyF64);

pub(crate) fn key_f64(v: f64) -> KeyF64 {
    OrderedFloat(v)
}

pub(crate) fn key_point(x: f64, y: f64) -> KeyPoint {
    (OrderedFloat(x), OrderedFloat(y))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// How the edges of one axis are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Ruling lines, rects and curves drawn on the page.
    #[default]
    Lines,
    /// Alignment of word boundaries.
    Text,
    /// Only the caller-supplied coordinates.
    Explicit,
}

/// Where an edge came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeSource {
    Line,
    RectEdge,
    CurveEdge,
    WordEdge,
    ExplicitEdge,
}

/// A horizontal or vertical candidate table boundary.
///
/// Vertical edges have `x0 == x1`; horizontal edges have `top == bottom`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
    pub orientation: Orientation,
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
    pub source: EdgeSource,
}

impl Edge {
    pub fn vertical(x: f64, top: f64, bottom: f64, source: EdgeSource) -> Self {
        Self {
            orientation: Orientation::Vertical,
            x0: x,
            top: top.min(bottom),
            x1: x,
            bottom: top.max(bottom),
            source,
        }
    }

    pub fn horizontal(y: f64, x0: f64, x1: f64, source: EdgeSource) -> Self {
        Self {
            orientation: Orientation::Horizontal,
            x0: x0.min(x1),
            top: y,
            x1: x0.max(x1),
            bottom: y,
            source,
        }
    }

    /// The coordinate shared by every point of the edge.
    pub fn fixed(&self) -> f64 {
        match self.orientation {
            Orientation::Vertical => self.x0,
            Orientation::Horizontal => self.top,
        }
    }

    /// Start of the edge along its own axis.
    pub fn start(&self) -> f64 {
        match self.orientation {
            Orientation::Vertical => self.top,
            Orientation::Horizontal => self.x0,
        }
    }

    /// End of the edge along its own axis.
    pub fn end(&self) -> f64 {
        match self.orientation {
            Orientation::Vertical => self.bottom,
            Orientation::Horizontal => self.x1,
        }
    }

    pub fn length(&self) -> f64 {
        self.end() - self.start()
    }
}

impl HasBBox for Edge {
    fn bbox(&self) -> BBox {
        BBox::from_ordered(
            self.x0.min(self.x1),
            self.top.min(self.bottom),
            self.x0.max(self.x1),
            self.top.max(self.bottom),
        )
    }
}

/// A point where a vertical and a horizontal edge cross.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Intersection {
    pub x: f64,
    pub y: f64,
    /// Indices of the vertical edges meeting here.
    pub vertical: Vec<usize>,
    /// Indices of the horizontal edges meeting here.
    pub horizontal: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub vertical_strategy: Strategy,
    pub horizontal_strategy: Strategy,
    /// x coordinates of caller-supplied vertical boundaries.
    pub explicit_vertical_lines: Vec<f64>,
    /// y coordinates of caller-supplied horizontal boundaries.
    pub explicit_horizontal_lines: Vec<f64>,
    pub snap_x_tolerance: f64,
    pub snap_y_tolerance: f64,
    pub join_x_tolerance: f64,
    pub join_y_tolerance: f64,
    pub edge_min_length: f64,
    pub edge_min_length_prefilter: f64,
    pub min_words_vertical: usize,
    pub min_words_horizontal: usize,
    pub intersection_x_tolerance: f64,
    pub intersection_y_tolerance: f64,
    pub text_settings: TextSettings,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            vertical_strategy: Strategy::Lines,
            horizontal_strategy: Strategy::Lines,
            explicit_vertical_lines: Vec::new(),
            explicit_horizontal_lines: Vec::new(),
            snap_x_tolerance: DEFAULT_SNAP_TOLERANCE,
            snap_y_tolerance: DEFAULT_SNAP_TOLERANCE,
            join_x_tolerance: DEFAULT_JOIN_TOLERANCE,
            join_y_tolerance: DEFAULT_JOIN_TOLERANCE,
            edge_min_length: 3.0,
            edge_min_length_prefilter: 1.0,
            min_words_vertical: DEFAULT_MIN_WORDS_VERTICAL,
            min_words_horizontal: DEFAULT_MIN_WORDS_HORIZONTAL,
            intersection_x_tolerance: DEFAULT_INTERSECTION_TOLERANCE,
            intersection_y_tolerance: DEFAULT_INTERSECTION_TOLERANCE,
            text_settings: TextSettings::default(),
        }
    }
}

impl TableSettings {
    /// Both axes inferred from word alignment.
    pub fn text() -> Self {
        Self {
            vertical_strategy: Strategy::Text,
            horizontal_strategy: Strategy::Text,
            ..Self::default()
        }
    }

    /// Reject negative or non-finite tolerances and lengths.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("snap_x_tolerance", self.snap_x_tolerance),
            ("snap_y_tolerance", self.snap_y_tolerance),
            ("join_x_tolerance", self.join_x_tolerance),
            ("join_y_tolerance", self.join_y_tolerance),
            ("edge_min_length", self.edge_min_length),
            ("edge_min_length_prefilter", self.edge_min_length_prefilter),
            ("intersection_x_tolerance", self.intersection_x_tolerance),
            ("intersection_y_tolerance", self.intersection_y_tolerance),
        ];
        match checks
            .into_iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            Some((name, value)) => Err(StrataError::InvalidSetting { name, value }),
            None => Ok(()),
        }
    }

    /// Both axes taken from caller-supplied coordinates only.
    pub fn explicit(vertical: Vec<f64>, horizontal: Vec<f64>) -> Self {
        Self {
            vertical_strategy: Strategy::Explicit,
            horizontal_strategy: Strategy::Explicit,
            explicit_vertical_lines: vertical,
            explicit_horizontal_lines: horizontal,
            ..Self::default()
        }
    }
}

// Internal ID types for efficient indexing
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub(crate) struct VEdgeId(pub usize);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub(crate) struct HEdgeId(pub usize);
