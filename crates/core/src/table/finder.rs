//! TableFinder orchestrator.
//!
//! Runs the pipeline `Idle → EdgesCollected → EdgesMerged →
//! IntersectionsFound → CellsAssembled → TablesGrouped → Done` over one
//! page's words and graphics.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::geometry::BBox;
use crate::layout::{Word, extract_words};
use crate::objects::{Glyph, PageObject};

use super::edges::{
    edges_from_objects, explicit_edges, filter_edges, merge_edges, words_to_edges_h,
    words_to_edges_v,
};
use super::grid::{Table, cells_to_tables, intersections_to_cells};
use super::intersections::{edges_to_intersections, intersection_list};
use super::types::{Edge, Intersection, Orientation, Strategy, TableSettings};

/// Pipeline stage reached by a [`TableFinder`] run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    EdgesCollected,
    EdgesMerged,
    IntersectionsFound,
    CellsAssembled,
    TablesGrouped,
    Done,
}

/// Every intermediate product of one table search.
#[derive(Clone, Debug, Serialize)]
pub struct TableDebug {
    pub stage: Stage,
    /// Edges after merging and length filtering, vertical first.
    pub edges: Vec<Edge>,
    /// Intersections whose edge indices address `edges`.
    pub intersections: Vec<Intersection>,
    pub cells: Vec<BBox>,
    pub tables: Vec<Table>,
}

/// Finds tables on one page.
pub struct TableFinder<'a> {
    page_bbox: BBox,
    words: Vec<Word>,
    graphics: Vec<Edge>,
    settings: &'a TableSettings,
}

impl<'a> TableFinder<'a> {
    /// Build a finder from a page's bbox and objects.
    pub fn new(page_bbox: BBox, objects: &[PageObject], settings: &'a TableSettings) -> Self {
        let glyphs: Vec<Glyph> = objects.iter().filter_map(PageObject::as_glyph).cloned().collect();
        let words = extract_words(&glyphs, &settings.text_settings);
        Self::from_words(page_bbox, words, edges_from_objects(objects), settings)
    }

    /// Build a finder from precomputed words and graphic edges.
    pub fn from_words(
        page_bbox: BBox,
        words: Vec<Word>,
        graphics: Vec<Edge>,
        settings: &'a TableSettings,
    ) -> Self {
        Self {
            page_bbox,
            words,
            graphics,
            settings,
        }
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    fn axis_edges(&self, orientation: Orientation) -> Vec<Edge> {
        let settings = self.settings;
        let (strategy, explicit, min_words) = match orientation {
            Orientation::Vertical => (
                settings.vertical_strategy,
                &settings.explicit_vertical_lines,
                settings.min_words_vertical,
            ),
            Orientation::Horizontal => (
                settings.horizontal_strategy,
                &settings.explicit_horizontal_lines,
                settings.min_words_horizontal,
            ),
        };
        let mut edges = match strategy {
            Strategy::Lines => filter_edges(
                self.graphics.clone(),
                Some(orientation),
                settings.edge_min_length_prefilter,
            ),
            Strategy::Text => match orientation {
                Orientation::Vertical => words_to_edges_v(&self.words, min_words),
                Orientation::Horizontal => words_to_edges_h(&self.words, min_words),
            },
            Strategy::Explicit => Vec::new(),
        };
        edges.extend(explicit_edges(explicit, orientation, self.page_bbox));
        edges
    }

    fn advance(stage: &mut Stage, next: Stage, count: usize) {
        debug_assert!(next > *stage);
        debug!(from = ?*stage, to = ?next, count, "table finder stage");
        *stage = next;
    }

    /// Run the whole pipeline, keeping every intermediate product.
    ///
    /// Fails with [`crate::StrataError::InvalidSetting`] before any work when
    /// a tolerance is negative or not finite.
    pub fn debug(&self) -> Result<TableDebug> {
        let settings = self.settings;
        settings.validate()?;
        let mut stage = Stage::Idle;

        let mut edges = self.axis_edges(Orientation::Vertical);
        edges.extend(self.axis_edges(Orientation::Horizontal));
        Self::advance(&mut stage, Stage::EdgesCollected, edges.len());

        let merged = merge_edges(
            edges,
            settings.snap_x_tolerance,
            settings.snap_y_tolerance,
            settings.join_x_tolerance,
            settings.join_y_tolerance,
        );
        let edges = filter_edges(merged, None, settings.edge_min_length);
        Self::advance(&mut stage, Stage::EdgesMerged, edges.len());

        let (store, intersections) = edges_to_intersections(
            &edges,
            settings.intersection_x_tolerance,
            settings.intersection_y_tolerance,
        );
        Self::advance(&mut stage, Stage::IntersectionsFound, intersections.len());

        let cells = intersections_to_cells(&intersections);
        Self::advance(&mut stage, Stage::CellsAssembled, cells.len());

        let groups = cells_to_tables(
            cells.clone(),
            settings.intersection_x_tolerance,
            settings.intersection_y_tolerance,
        );
        let tables: Vec<Table> = groups
            .into_iter()
            .filter_map(|boxes| {
                Table::from_cells(
                    boxes,
                    &self.words,
                    &settings.text_settings,
                    settings.intersection_x_tolerance,
                    settings.intersection_y_tolerance,
                )
            })
            .collect();
        Self::advance(&mut stage, Stage::TablesGrouped, tables.len());
        Self::advance(&mut stage, Stage::Done, tables.len());

        let intersections = intersection_list(&store, &intersections);
        Ok(TableDebug {
            stage,
            edges: store.v.into_iter().chain(store.h).collect(),
            intersections,
            cells,
            tables,
        })
    }

    /// Tables on the page, ordered by `(top, x0)`.
    pub fn find_tables(&self) -> Result<Vec<Table>> {
        Ok(self.debug()?.tables)
    }

    /// The table with the most cells; ties go to the topmost, then leftmost.
    pub fn find_largest_table(&self) -> Result<Option<Table>> {
        Ok(largest_table(self.find_tables()?))
    }
}

fn largest_table(tables: Vec<Table>) -> Option<Table> {
    tables.into_iter().reduce(|best, table| {
        let order = table
            .cells
            .len()
            .cmp(&best.cells.len())
            .then_with(|| best.bbox.top().total_cmp(&table.bbox.top()))
            .then_with(|| best.bbox.x0().total_cmp(&table.bbox.x0()));
        if order == Ordering::Greater { table } else { best }
    })
}
