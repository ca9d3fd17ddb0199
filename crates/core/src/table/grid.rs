//! Table cell and grid construction from intersections.
//!
//! Cells are built from intersection corners, connected cells are grouped
//! into tables, and each cell picks up the text of the words it holds.

use std::collections::{BTreeMap, VecDeque};

use itertools::Itertools;
use serde::Serialize;

use crate::clustering::cluster_objects;
use crate::geometry::{BBox, HasBBox};
use crate::layout::{TextSettings, Word, extract_text_from_refs};
use crate::objects::Glyph;

use super::intersections::IntersectionMap;
use super::types::{HEdgeId, KeyPoint, VEdgeId};

/// Convert intersections to cell rectangles.
///
/// For each corner, the nearest corner below it on a shared vertical edge
/// and the nearest corner right of it on a shared horizontal edge close a
/// cell when their bottom-right counterpart exists and is connected to both.
pub(crate) fn intersections_to_cells(intersections: &IntersectionMap) -> Vec<BBox> {
    fn lists_intersect<T: Ord>(a: &[T], b: &[T]) -> bool {
        let (mut i, mut j) = (0usize, 0usize);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Equal => return true,
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
            }
        }
        false
    }

    // BTreeMap keys come out sorted by (x, y).
    let points: Vec<KeyPoint> = intersections.keys().copied().collect();
    let point_index: BTreeMap<KeyPoint, usize> =
        points.iter().enumerate().map(|(idx, p)| (*p, idx)).collect();

    let (point_v_edges, point_h_edges): (Vec<Vec<VEdgeId>>, Vec<Vec<HEdgeId>>) = intersections
        .values()
        .map(|inter| {
            let v: Vec<VEdgeId> = inter.v.iter().copied().sorted_unstable().dedup().collect();
            let h: Vec<HEdgeId> = inter.h.iter().copied().sorted_unstable().dedup().collect();
            (v, h)
        })
        .unzip();

    let mut edge_points_v: BTreeMap<VEdgeId, Vec<usize>> = BTreeMap::new();
    let mut edge_points_h: BTreeMap<HEdgeId, Vec<usize>> = BTreeMap::new();
    for (pid, edges) in point_v_edges.iter().enumerate() {
        for id in edges {
            edge_points_v.entry(*id).or_default().push(pid);
        }
    }
    for (pid, edges) in point_h_edges.iter().enumerate() {
        for id in edges {
            edge_points_h.entry(*id).or_default().push(pid);
        }
    }

    let connects = |p1: usize, p2: usize| -> bool {
        if points[p1].0 == points[p2].0 {
            return lists_intersect(&point_v_edges[p1], &point_v_edges[p2]);
        }
        if points[p1].1 == points[p2].1 {
            return lists_intersect(&point_h_edges[p1], &point_h_edges[p2]);
        }
        false
    };

    let mut cells = Vec::new();
    for (idx, point) in points.iter().enumerate() {
        let mut below: Vec<usize> = point_v_edges[idx]
            .iter()
            .filter_map(|id| edge_points_v.get(id))
            .flatten()
            .copied()
            .filter(|&pid| points[pid].0 == point.0 && points[pid].1 > point.1)
            .collect();
        below.sort_by(|a, b| points[*a].1.cmp(&points[*b].1));
        below.dedup();

        let mut right: Vec<usize> = point_h_edges[idx]
            .iter()
            .filter_map(|id| edge_points_h.get(id))
            .flatten()
            .copied()
            .filter(|&pid| points[pid].1 == point.1 && points[pid].0 > point.0)
            .collect();
        right.sort_by(|a, b| points[*a].0.cmp(&points[*b].0));
        right.dedup();

        'below: for &below_id in &below {
            for &right_id in &right {
                let corner = (points[right_id].0, points[below_id].1);
                if let Some(&br_id) = point_index.get(&corner)
                    && connects(br_id, right_id)
                    && connects(br_id, below_id)
                {
                    cells.push(BBox::from_ordered(
                        point.0.into_inner(),
                        point.1.into_inner(),
                        corner.0.into_inner(),
                        corner.1.into_inner(),
                    ));
                    break 'below;
                }
            }
        }
    }
    cells
}

/// Group cells into tables.
///
/// Two cells are connected when their boxes, expanded by the tolerances,
/// touch or overlap; each connected component is one table. Tables come out
/// ordered by `(top, x0)`, their cells likewise.
pub(crate) fn cells_to_tables(cells: Vec<BBox>, x_tol: f64, y_tol: f64) -> Vec<Vec<BBox>> {
    let expanded: Vec<BBox> = cells.iter().map(|c| c.expand(x_tol, y_tol)).collect();
    let mut visited = vec![false; cells.len()];
    let mut tables: Vec<Vec<BBox>> = Vec::new();
    let mut queue: VecDeque<usize> = VecDeque::new();

    for start in 0..cells.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        queue.push_back(start);
        let mut group = Vec::new();
        while let Some(idx) = queue.pop_front() {
            group.push(cells[idx]);
            for (other, seen) in visited.iter_mut().enumerate() {
                if !*seen && expanded[idx].intersects(&cells[other]) {
                    *seen = true;
                    queue.push_back(other);
                }
            }
        }
        group.sort_by(|a, b| a.top().total_cmp(&b.top()).then(a.x0().total_cmp(&b.x0())));
        tables.push(group);
    }

    tables.sort_by(|a, b| {
        let (ta, tb) = (&a[0], &b[0]);
        ta.top().total_cmp(&tb.top()).then(ta.x0().total_cmp(&tb.x0()))
    });
    tables
}

/// True when the word belongs to the cell: fully contained, or more than
/// half of its area inside.
fn word_in_cell(word: &Word, cell: &BBox) -> bool {
    if cell.contains(&word.bbox) {
        return true;
    }
    let area = word.bbox.area();
    area > 0.0 && cell.overlap_area(&word.bbox) > area / 2.0
}

fn cell_text(bbox: &BBox, words: &[Word], settings: &TextSettings) -> String {
    let glyphs: Vec<&Glyph> = words
        .iter()
        .filter(|w| word_in_cell(w, bbox))
        .flat_map(|w| w.chars.iter())
        .collect();
    extract_text_from_refs(&glyphs, settings)
}

/// A table cell and the text it holds.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Cell {
    #[serde(flatten)]
    pub bbox: BBox,
    pub text: String,
}

impl HasBBox for Cell {
    fn bbox(&self) -> BBox {
        self.bbox
    }
}

/// A row or column of cells.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellGroup {
    pub bbox: BBox,
    pub cells: Vec<Cell>,
}

impl CellGroup {
    fn from_cells(cells: Vec<Cell>) -> Option<Self> {
        let bbox = BBox::union_all(cells.iter().map(|c| c.bbox))?;
        Some(Self { bbox, cells })
    }
}

/// A detected table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Table {
    pub bbox: BBox,
    /// Cells ordered by `(top, x0)`.
    pub cells: Vec<Cell>,
    pub rows: Vec<CellGroup>,
    pub columns: Vec<CellGroup>,
}

impl Table {
    /// Build a table from cell rectangles, filling cell text from `words`.
    ///
    /// Rows group cells whose tops lie within `y_tol`, columns those whose
    /// x0 lie within `x_tol`. Returns `None` for an empty cell list.
    pub(crate) fn from_cells(
        boxes: Vec<BBox>,
        words: &[Word],
        text_settings: &TextSettings,
        x_tol: f64,
        y_tol: f64,
    ) -> Option<Self> {
        let bbox = BBox::union_all(boxes.iter().copied())?;
        let cells: Vec<Cell> = boxes
            .into_iter()
            .map(|bbox| Cell {
                text: cell_text(&bbox, words, text_settings),
                bbox,
            })
            .collect();

        let rows = cluster_objects(&cells, |c| c.bbox.top(), y_tol)
            .into_iter()
            .filter_map(|group| {
                let mut members: Vec<Cell> = group.into_iter().cloned().collect();
                members.sort_by(|a, b| a.bbox.x0().total_cmp(&b.bbox.x0()));
                CellGroup::from_cells(members)
            })
            .collect();
        let columns = cluster_objects(&cells, |c| c.bbox.x0(), x_tol)
            .into_iter()
            .filter_map(|group| {
                let mut members: Vec<Cell> = group.into_iter().cloned().collect();
                members.sort_by(|a, b| a.bbox.top().total_cmp(&b.bbox.top()));
                CellGroup::from_cells(members)
            })
            .collect();

        Some(Self {
            bbox,
            cells,
            rows,
            columns,
        })
    }

    /// Cell text row by row.
    pub fn to_grid(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.cells.iter().map(|c| c.text.clone()).collect())
            .collect()
    }

    /// Cell text aligned to columns; positions covered by a spanning cell
    /// from another row are `None`.
    pub fn extract(&self) -> Vec<Vec<Option<String>>> {
        let column_of = |cell: &Cell| {
            self.columns
                .iter()
                .position(|col| col.cells.iter().any(|c| c.bbox == cell.bbox))
        };
        self.rows
            .iter()
            .map(|row| {
                let mut out: Vec<Option<String>> = vec![None; self.columns.len()];
                for cell in &row.cells {
                    if let Some(slot) = column_of(cell).and_then(|j| out.get_mut(j)) {
                        *slot = Some(cell.text.clone());
                    }
                }
                out
            })
            .collect()
    }
}

impl HasBBox for Table {
    fn bbox(&self) -> BBox {
        self.bbox
    }
}
