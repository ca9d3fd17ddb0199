//! Removal of overprinted duplicate glyphs.
//!
//! Renderers often emit the same glyph twice (bold-by-overprint, shadows).
//! Glyphs are quantized to a positional key; the first glyph with a given
//! key wins and later ones are dropped.

use ordered_float::OrderedFloat;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::objects::Glyph;

/// Extra glyph attributes that distinguish otherwise co-located glyphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupeAttr {
    Fontname,
    Size,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupeOptions {
    /// Quantization step for positions and sizes. Non-positive values
    /// compare coordinates exactly.
    pub tolerance: f64,
    pub extra_attrs: Vec<DedupeAttr>,
}

impl Default for DedupeOptions {
    fn default() -> Self {
        Self {
            tolerance: 1.0,
            extra_attrs: vec![DedupeAttr::Fontname, DedupeAttr::Size],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct DedupeKey {
    x0: OrderedFloat<f64>,
    top: OrderedFloat<f64>,
    text: SmolStr,
    fontname: Option<SmolStr>,
    size: Option<OrderedFloat<f64>>,
}

fn quantize(value: f64, tolerance: f64) -> OrderedFloat<f64> {
    if tolerance > 0.0 {
        OrderedFloat((value / tolerance).round())
    } else {
        OrderedFloat(value)
    }
}

fn dedupe_key(glyph: &Glyph, options: &DedupeOptions) -> DedupeKey {
    let tol = options.tolerance;
    DedupeKey {
        x0: quantize(glyph.bbox.x0(), tol),
        top: quantize(glyph.bbox.top(), tol),
        text: glyph.text.clone(),
        fontname: options
            .extra_attrs
            .contains(&DedupeAttr::Fontname)
            .then(|| glyph.fontname.clone()),
        size: options
            .extra_attrs
            .contains(&DedupeAttr::Size)
            .then(|| quantize(glyph.size, tol)),
    }
}

/// Collapse glyphs sharing a quantized key to their first occurrence.
///
/// The output preserves the relative order of retained glyphs, never grows,
/// and is a fixed point: deduplicating it again changes nothing.
pub fn dedupe_chars(glyphs: &[Glyph], options: &DedupeOptions) -> Vec<Glyph> {
    let refs: Vec<&Glyph> = glyphs.iter().collect();
    dedupe_indices(&refs, options)
        .into_iter()
        .map(|idx| glyphs[idx].clone())
        .collect()
}

/// Indices of the glyphs [`dedupe_chars`] keeps, ascending.
pub(crate) fn dedupe_indices(glyphs: &[&Glyph], options: &DedupeOptions) -> Vec<usize> {
    let mut seen: FxHashSet<DedupeKey> = FxHashSet::default();
    glyphs
        .iter()
        .enumerate()
        .filter(|(_, g)| seen.insert(dedupe_key(g, options)))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;

    fn glyph(text: &str, x0: f64, top: f64, font: &str, size: f64) -> Glyph {
        Glyph::new(
            1,
            BBox::new(x0, top, x0 + 5.0, top + 10.0).unwrap(),
            text,
            font,
            size,
        )
    }

    #[test]
    fn overprinted_glyph_is_dropped() {
        let glyphs = vec![
            glyph("A", 10.0, 10.0, "F", 10.0),
            glyph("A", 10.2, 10.1, "F", 10.0),
            glyph("B", 15.0, 10.0, "F", 10.0),
        ];
        let out = dedupe_chars(&glyphs, &DedupeOptions::default());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], glyphs[0]);
        assert_eq!(out[1].text, "B");
    }

    #[test]
    fn extra_attrs_distinguish_fonts() {
        let glyphs = vec![
            glyph("A", 10.0, 10.0, "Regular", 10.0),
            glyph("A", 10.0, 10.0, "Bold", 10.0),
        ];
        assert_eq!(dedupe_chars(&glyphs, &DedupeOptions::default()).len(), 2);

        let position_only = DedupeOptions {
            extra_attrs: Vec::new(),
            ..DedupeOptions::default()
        };
        assert_eq!(dedupe_chars(&glyphs, &position_only).len(), 1);
    }

    #[test]
    fn zero_tolerance_compares_exactly() {
        let glyphs = vec![
            glyph("A", 10.0, 10.0, "F", 10.0),
            glyph("A", 10.0, 10.0, "F", 10.0),
            glyph("A", 10.01, 10.0, "F", 10.0),
        ];
        let exact = DedupeOptions {
            tolerance: 0.0,
            ..DedupeOptions::default()
        };
        assert_eq!(dedupe_chars(&glyphs, &exact).len(), 2);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let glyphs: Vec<Glyph> = (0..20)
            .map(|i| glyph("x", (i % 7) as f64 * 0.6, (i % 3) as f64, "F", 10.0))
            .collect();
        let options = DedupeOptions::default();
        let once = dedupe_chars(&glyphs, &options);
        let twice = dedupe_chars(&once, &options);
        assert!(once.len() <= glyphs.len());
        assert_eq!(once, twice);
    }
}
