//! Page and document views over decoded page objects.
//!
//! A [`Page`] owns the objects of one page. Cropping and filtering return
//! new pages whose objects keep their original coordinates, so everything
//! derived from a filtered page stays comparable with the source page.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StrataError};
use crate::geometry::{BBox, HasBBox};
use crate::layout::{
    DedupeOptions, TextSettings, Word, dedupe_indices, extract_text_from_refs,
    extract_words_from_refs,
};
use crate::objects::{Glyph, ObjectRecord, PageObject, PathObject};
use crate::search::{SearchMatch, SearchOptions, search_text};
use crate::table::{Edge, Table, TableFinder, TableSettings, edges_from_objects};

/// True when `obj` shares area with `region`. Zero-area objects (ruling
/// lines, empty glyphs) only need to touch it.
fn overlaps(region: &BBox, obj: &BBox) -> bool {
    if obj.is_degenerate() {
        region.intersects(obj)
    } else {
        region.overlap_area(obj) > 0.0
    }
}

/// One page of positioned objects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-based.
    pub page_number: usize,
    pub bbox: BBox,
    #[serde(default)]
    pub objects: Vec<PageObject>,
}

impl Page {
    pub fn new(page_number: usize, bbox: BBox, objects: Vec<PageObject>) -> Self {
        Self {
            page_number,
            bbox,
            objects,
        }
    }

    pub fn width(&self) -> f64 {
        self.bbox.width()
    }

    pub fn height(&self) -> f64 {
        self.bbox.height()
    }

    pub fn glyphs(&self) -> Vec<&Glyph> {
        self.objects.iter().filter_map(PageObject::as_glyph).collect()
    }

    pub fn lines(&self) -> impl Iterator<Item = &PathObject> {
        self.objects.iter().filter_map(|o| match o {
            PageObject::Line(p) => Some(p),
            _ => None,
        })
    }

    pub fn rects(&self) -> impl Iterator<Item = &PathObject> {
        self.objects.iter().filter_map(|o| match o {
            PageObject::Rect(p) => Some(p),
            _ => None,
        })
    }

    pub fn curves(&self) -> impl Iterator<Item = &PathObject> {
        self.objects.iter().filter_map(|o| match o {
            PageObject::Curve(p) => Some(p),
            _ => None,
        })
    }

    /// Table edges drawn by this page's graphics.
    pub fn edges(&self) -> Vec<Edge> {
        edges_from_objects(&self.objects)
    }

    fn filtered<F>(&self, bbox: BBox, keep: F) -> Page
    where
        F: Fn(&BBox) -> bool,
    {
        Page {
            page_number: self.page_number,
            bbox,
            objects: self
                .objects
                .iter()
                .filter(|o| keep(&o.bbox()))
                .cloned()
                .collect(),
        }
    }

    /// Restrict the page to `bbox`, keeping objects that overlap it.
    ///
    /// Fails with [`StrataError::BBoxOutsidePage`] unless `bbox` lies within
    /// the page.
    pub fn crop(&self, bbox: BBox) -> Result<Page> {
        if !self.bbox.contains(&bbox) {
            return Err(StrataError::BBoxOutsidePage {
                page_number: self.page_number,
                x0: bbox.x0(),
                top: bbox.top(),
                x1: bbox.x1(),
                bottom: bbox.bottom(),
            });
        }
        Ok(self.filtered(bbox, |obj| overlaps(&bbox, obj)))
    }

    /// Keep objects contained in `bbox` (`strict`) or overlapping it.
    pub fn within_bbox(&self, bbox: BBox, strict: bool) -> Page {
        if strict {
            self.filtered(bbox, |obj| bbox.contains(obj))
        } else {
            self.filtered(bbox, |obj| overlaps(&bbox, obj))
        }
    }

    /// Keep objects that do not overlap `bbox`.
    pub fn outside_bbox(&self, bbox: BBox) -> Page {
        self.filtered(self.bbox, |obj| !overlaps(&bbox, obj))
    }

    pub fn extract_text(&self, settings: &TextSettings) -> String {
        extract_text_from_refs(&self.glyphs(), settings)
    }

    pub fn extract_words(&self, settings: &TextSettings) -> Vec<Word> {
        extract_words_from_refs(&self.glyphs(), settings)
    }

    /// Render the page and search the rendered text.
    pub fn search(
        &self,
        pattern: &str,
        options: &SearchOptions,
        settings: &TextSettings,
    ) -> Result<Vec<SearchMatch>> {
        search_text(&self.extract_text(settings), pattern, options)
    }

    /// The page with duplicate glyphs removed; other objects are untouched.
    pub fn dedupe_chars(&self, options: &DedupeOptions) -> Page {
        let (positions, glyphs): (Vec<usize>, Vec<&Glyph>) = self
            .objects
            .iter()
            .enumerate()
            .filter_map(|(pos, obj)| obj.as_glyph().map(|g| (pos, g)))
            .unzip();
        let mut keep = vec![true; self.objects.len()];
        for &pos in &positions {
            keep[pos] = false;
        }
        for idx in dedupe_indices(&glyphs, options) {
            keep[positions[idx]] = true;
        }
        Page {
            page_number: self.page_number,
            bbox: self.bbox,
            objects: self
                .objects
                .iter()
                .zip(keep)
                .filter_map(|(obj, kept)| kept.then(|| obj.clone()))
                .collect(),
        }
    }

    pub fn table_finder<'a>(&self, settings: &'a TableSettings) -> TableFinder<'a> {
        TableFinder::new(self.bbox, &self.objects, settings)
    }

    pub fn find_tables(&self, settings: &TableSettings) -> Result<Vec<Table>> {
        let tables = self.table_finder(settings).find_tables()?;
        debug!(page = self.page_number, tables = tables.len(), "found tables");
        Ok(tables)
    }

    /// Cell text of every table, aligned to columns.
    pub fn extract_tables(
        &self,
        settings: &TableSettings,
    ) -> Result<Vec<Vec<Vec<Option<String>>>>> {
        Ok(self.find_tables(settings)?.iter().map(Table::extract).collect())
    }

    /// Cell text of the table with the most cells.
    pub fn extract_table(
        &self,
        settings: &TableSettings,
    ) -> Result<Option<Vec<Vec<Option<String>>>>> {
        Ok(self
            .table_finder(settings)
            .find_largest_table()?
            .map(|t| t.extract()))
    }

    /// Serialization records for every object, with `y0`/`y1` measured up
    /// from the page's bottom edge.
    pub fn object_records(&self) -> Vec<ObjectRecord<'_>> {
        let bottom = self.bbox.bottom();
        self.objects.iter().map(|o| o.record(bottom)).collect()
    }
}

impl HasBBox for Page {
    fn bbox(&self) -> BBox {
        self.bbox
    }
}

/// Anything that can hand out decoded pages by 1-based number.
pub trait PageSource {
    fn pages(&self) -> &[Page];

    fn page_count(&self) -> usize {
        self.pages().len()
    }

    fn page(&self, page_number: usize) -> Result<&Page> {
        let count = self.page_count();
        page_number
            .checked_sub(1)
            .and_then(|idx| self.pages().get(idx))
            .ok_or(StrataError::IndexOutOfRange {
                kind: "page",
                index: page_number,
                min: 1,
                max: count,
            })
    }
}

impl PageSource for [Page] {
    fn pages(&self) -> &[Page] {
        self
    }
}

impl PageSource for Vec<Page> {
    fn pages(&self) -> &[Page] {
        self
    }
}

/// An ordered collection of pages.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Text of every page, extracted on the rayon pool, in page order.
    pub fn par_extract_text(&self, settings: &TextSettings) -> Vec<String> {
        self.pages
            .par_iter()
            .map(|page| page.extract_text(settings))
            .collect()
    }

    /// Tables of every page, found on the rayon pool, in page order.
    pub fn par_find_tables(&self, settings: &TableSettings) -> Result<Vec<Vec<Table>>> {
        self.pages
            .par_iter()
            .map(|page| page.find_tables(settings))
            .collect()
    }
}

impl PageSource for Document {
    fn pages(&self) -> &[Page] {
        &self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(x0: f64, top: f64, x1: f64, bottom: f64) -> BBox {
        BBox::new(x0, top, x1, bottom).unwrap()
    }

    fn char_at(text: &str, x0: f64, top: f64) -> PageObject {
        Glyph::new(1, b(x0, top, x0 + 5.0, top + 10.0), text, "F", 10.0).into()
    }

    fn sample() -> Page {
        Page::new(
            1,
            b(0.0, 0.0, 100.0, 100.0),
            vec![
                char_at("a", 10.0, 10.0),
                char_at("b", 15.0, 10.0),
                char_at("c", 60.0, 60.0),
                PageObject::Line(PathObject::new(1, b(0.0, 50.0, 100.0, 50.0))),
            ],
        )
    }

    #[test]
    fn crop_rejects_boxes_outside_page() {
        let err = sample().crop(b(50.0, 50.0, 150.0, 90.0)).unwrap_err();
        assert!(matches!(err, StrataError::BBoxOutsidePage { page_number: 1, .. }));
    }

    #[test]
    fn crop_keeps_overlapping_objects() {
        let page = sample();
        let cropped = page.crop(b(0.0, 0.0, 50.0, 50.0)).unwrap();
        assert_eq!(cropped.bbox, b(0.0, 0.0, 50.0, 50.0));
        assert_eq!(cropped.extract_text(&TextSettings::default()), "ab");
        // the ruling line on the crop boundary is kept
        assert_eq!(cropped.lines().count(), 1);
    }

    #[test]
    fn glyph_touching_region_is_not_inside() {
        let page = sample();
        let region = b(20.0, 0.0, 50.0, 50.0);
        assert!(page.within_bbox(region, false).glyphs().is_empty());
        assert_eq!(page.outside_bbox(region).glyphs().len(), 3);
    }

    #[test]
    fn within_and_outside_partition_objects() {
        let page = sample();
        let region = b(12.0, 0.0, 70.0, 40.0);
        let inside = page.within_bbox(region, false);
        let outside = page.outside_bbox(region);
        assert_eq!(inside.objects.len() + outside.objects.len(), page.objects.len());
        let strict = page.within_bbox(region, true);
        assert_eq!(strict.glyphs().len(), 1);
        assert_eq!(inside.glyphs().len(), 2);
    }

    #[test]
    fn dedupe_keeps_graphics() {
        let mut page = sample();
        page.objects.push(char_at("a", 10.2, 10.1));
        let deduped = page.dedupe_chars(&DedupeOptions::default());
        assert_eq!(deduped.glyphs().len(), 3);
        assert_eq!(deduped.lines().count(), 1);
    }

    #[test]
    fn dedupe_survives_unordered_glyph_fields() {
        let mut page = sample();
        let mut odd = Glyph::new(1, b(40.0, 10.0, 45.0, 20.0), "x", "F", f64::NAN);
        odd.doctop = f64::NAN;
        page.objects.insert(0, odd.into());
        let deduped = page.dedupe_chars(&DedupeOptions::default());
        assert_eq!(deduped.glyphs().len(), 4);
        assert_eq!(deduped.objects.len(), page.objects.len());
    }

    #[test]
    fn page_lookup_is_one_based() {
        let doc = Document::new(vec![sample()]);
        assert_eq!(doc.page(1).unwrap().page_number, 1);
        let err = doc.page(0).unwrap_err();
        assert!(matches!(err, StrataError::IndexOutOfRange { index: 0, max: 1, .. }));
        assert!(doc.page(2).is_err());
    }

    #[test]
    fn parallel_text_keeps_page_order() {
        let mut second = sample();
        second.page_number = 2;
        second.objects = vec![char_at("z", 0.0, 0.0)];
        let doc = Document::new(vec![sample(), second]);
        let texts = doc.par_extract_text(&TextSettings::default());
        assert_eq!(texts, vec!["ab\nc".to_string(), "z".to_string()]);
    }

    #[test]
    fn records_flip_y_from_page_bottom() {
        let page = sample();
        let records = page.object_records();
        let json = serde_json::to_value(&records[0]).unwrap();
        assert_eq!(json["object_type"], "char");
        assert_eq!(json["y0"], 80.0);
        assert_eq!(json["y1"], 90.0);
        assert_eq!(json["text"], "a");
    }

    #[test]
    fn cropped_records_use_crop_bottom() {
        let cropped = sample().crop(b(0.0, 5.0, 50.0, 30.0)).unwrap();
        let json = serde_json::to_value(&cropped.object_records()[0]).unwrap();
        assert_eq!(json["y0"], 10.0);
        assert_eq!(json["y1"], 20.0);
    }
}
