//! Labelled region extraction.
//!
//! A selection names a rectangle on a page; extracting it crops the page to
//! the rectangle and renders the text found there.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::BBox;
use crate::layout::TextSettings;
use crate::page::{Page, PageSource};

/// Word gap used when reading small labelled regions.
pub const REGION_X_TOLERANCE: f64 = 1.0;

/// Default settings for region reads: a tighter word gap than page text,
/// so closely set fields keep their separating spaces.
pub fn region_text_settings() -> TextSettings {
    TextSettings {
        x_tolerance: REGION_X_TOLERANCE,
        ..TextSettings::default()
    }
}

/// Region corners in top-down page coordinates: `y0` is the top edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Coordinates {
    pub fn to_bbox(&self) -> Result<BBox> {
        BBox::new(self.x0, self.y0, self.x1, self.y1)
    }
}

impl From<BBox> for Coordinates {
    fn from(bbox: BBox) -> Self {
        Self {
            x0: bbox.x0(),
            y0: bbox.top(),
            x1: bbox.x1(),
            y1: bbox.bottom(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub label: String,
    /// 1-based page number; absent means every page.
    #[serde(default)]
    pub page: Option<usize>,
    pub coordinates: Coordinates,
}

/// Text inside `bbox` on `page` (1-based), or on every page when `page` is
/// `None` or out of range.
///
/// Pages the box does not fit on are skipped. Page texts are joined with
/// `\n` and the result is trimmed.
pub fn extract_region_text<S>(
    source: &S,
    bbox: BBox,
    page: Option<usize>,
    settings: &TextSettings,
) -> String
where
    S: PageSource + ?Sized,
{
    let pages: &[Page] = match page.map(|n| source.page(n)) {
        Some(Ok(p)) => std::slice::from_ref(p),
        Some(Err(err)) => {
            warn!(%err, "page out of range, processing all pages");
            source.pages()
        }
        None => source.pages(),
    };

    let mut out = String::new();
    for p in pages {
        match p.crop(bbox) {
            Ok(cropped) => {
                let text = cropped.extract_text(settings);
                if !text.is_empty() {
                    out.push_str(&text);
                    out.push('\n');
                }
            }
            Err(err) => {
                warn!(page = p.page_number, %err, "could not crop page");
            }
        }
    }
    out.trim().to_string()
}

/// Text of every selection keyed by label, in selection order.
///
/// A later selection with a repeated label replaces the earlier text but
/// keeps its position. Invalid coordinates are an error.
pub fn extract_selections<S>(
    source: &S,
    selections: &[Selection],
    settings: &TextSettings,
) -> Result<IndexMap<String, String>>
where
    S: PageSource + ?Sized,
{
    let mut out = IndexMap::with_capacity(selections.len());
    for selection in selections {
        let bbox = selection.coordinates.to_bbox()?;
        let text = extract_region_text(source, bbox, selection.page, settings);
        debug!(
            label = %selection.label,
            page = ?selection.page,
            chars = text.len(),
            "extracted selection"
        );
        out.insert(selection.label.clone(), text);
    }
    Ok(out)
}
