//! Layout settings and the Word aggregate.

use serde::{Deserialize, Serialize};

use crate::geometry::{BBox, HasBBox};
use crate::objects::Glyph;

pub(crate) const DEFAULT_X_TOLERANCE: f64 = 3.0;
pub(crate) const DEFAULT_Y_TOLERANCE: f64 = 3.0;

/// Tolerances controlling line and word grouping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSettings {
    /// Maximum horizontal gap between glyphs of one word.
    pub x_tolerance: f64,
    /// Maximum difference between `top` values of glyphs on one line.
    pub y_tolerance: f64,
    /// When set, the word gap threshold is this ratio times the previous
    /// glyph's size instead of `x_tolerance`.
    pub x_tolerance_ratio: Option<f64>,
    /// Keep whitespace glyphs inside extracted words.
    pub keep_blank_chars: bool,
    /// Expand ligature glyphs (e.g. U+FB01) to their component letters.
    pub expand_ligatures: bool,
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            x_tolerance: DEFAULT_X_TOLERANCE,
            y_tolerance: DEFAULT_Y_TOLERANCE,
            x_tolerance_ratio: None,
            keep_blank_chars: false,
            expand_ligatures: true,
        }
    }
}

impl TextSettings {
    /// Gap above which the glyph after `prev` starts a new word.
    pub(crate) fn word_gap_threshold(&self, prev: &Glyph) -> f64 {
        self.x_tolerance_ratio
            .map(|ratio| ratio * prev.size)
            .unwrap_or(self.x_tolerance)
    }
}

/// Contiguous glyphs on one line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Word {
    pub text: String,
    #[serde(flatten)]
    pub bbox: BBox,
    pub doctop: f64,
    pub upright: bool,
    /// Constituent glyphs, in reading order.
    pub chars: Vec<Glyph>,
}

impl HasBBox for Word {
    fn bbox(&self) -> BBox {
        self.bbox
    }
}
