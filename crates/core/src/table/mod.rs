//! Table structure inference.
//!
//! Edges are collected from graphics, word alignment, or explicit
//! coordinates, merged, intersected, and assembled into cells and tables.

mod edges;
mod finder;
mod grid;
mod intersections;
mod types;

pub use edges::{
    curve_to_edges, edges_from_objects, explicit_edges, filter_edges, join_edge_group,
    line_to_edge, merge_edges, rect_to_edges, snap_edges, words_to_edges_h, words_to_edges_v,
};
pub use finder::{Stage, TableDebug, TableFinder};
pub use grid::{Cell, CellGroup, Table};
pub use types::{Edge, EdgeSource, Intersection, Orientation, Strategy, TableSettings};
