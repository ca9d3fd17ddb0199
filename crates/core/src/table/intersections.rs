//! Sweep-line search for edge intersections.
//!
//! Vertical edges enter the active set at `top - y_tol` and leave it at
//! `bottom + y_tol`; each horizontal edge queries the active set for
//! vertical edges within its x range.

use std::collections::BTreeMap;

use super::types::{
    Edge, HEdgeId, Intersection, KeyF64, KeyPoint, Orientation, VEdgeId, key_f64, key_point,
};

/// Merged edges split by orientation and sorted.
pub(crate) struct EdgeStore {
    pub v: Vec<Edge>,
    pub h: Vec<Edge>,
}

/// Edges meeting at an intersection point.
#[derive(Clone, Debug)]
pub(crate) struct IntersectionIdx {
    pub v: Vec<VEdgeId>,
    pub h: Vec<HEdgeId>,
}

pub(crate) type IntersectionMap = BTreeMap<KeyPoint, IntersectionIdx>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    AddV,
    QueryH,
    RemoveV,
}

struct Event {
    y: f64,
    kind: EventKind,
    idx: usize,
}

/// Find all intersections between vertical and horizontal edges.
///
/// A pair meets when `v.x` lies within `[h.x0 - x_tol, h.x1 + x_tol]` and
/// `h.y` lies within `[v.top - y_tol, v.bottom + y_tol]`; the point is
/// `(v.x, h.y)`.
pub(crate) fn edges_to_intersections(
    edges: &[Edge],
    x_tol: f64,
    y_tol: f64,
) -> (EdgeStore, IntersectionMap) {
    let (mut v_sorted, mut h_sorted): (Vec<Edge>, Vec<Edge>) = edges
        .iter()
        .cloned()
        .partition(|e| e.orientation == Orientation::Vertical);
    v_sorted.sort_by(|a, b| a.x0.total_cmp(&b.x0).then(a.top.total_cmp(&b.top)));
    h_sorted.sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));

    let mut events = Vec::with_capacity(v_sorted.len() * 2 + h_sorted.len());
    for (idx, v) in v_sorted.iter().enumerate() {
        events.push(Event {
            y: v.top - y_tol,
            kind: EventKind::AddV,
            idx,
        });
        events.push(Event {
            y: v.bottom + y_tol,
            kind: EventKind::RemoveV,
            idx,
        });
    }
    for (idx, h) in h_sorted.iter().enumerate() {
        events.push(Event {
            y: h.top,
            kind: EventKind::QueryH,
            idx,
        });
    }
    // Adds before queries before removals at equal y keeps touching
    // endpoints inside the active range.
    events.sort_by(|a, b| {
        a.y.total_cmp(&b.y)
            .then(a.kind.cmp(&b.kind))
            .then(a.idx.cmp(&b.idx))
    });

    let mut active: BTreeMap<KeyF64, Vec<usize>> = BTreeMap::new();
    let mut pairs: BTreeMap<KeyPoint, Vec<(VEdgeId, HEdgeId)>> = BTreeMap::new();

    for event in events {
        match event.kind {
            EventKind::AddV => {
                let v = &v_sorted[event.idx];
                active.entry(key_f64(v.x0)).or_default().push(event.idx);
            }
            EventKind::RemoveV => {
                let key = key_f64(v_sorted[event.idx].x0);
                if let Some(bucket) = active.get_mut(&key) {
                    bucket.retain(|&idx| idx != event.idx);
                    if bucket.is_empty() {
                        active.remove(&key);
                    }
                }
            }
            EventKind::QueryH => {
                let h = &h_sorted[event.idx];
                let x_min = key_f64(h.x0 - x_tol);
                let x_max = key_f64(h.x1 + x_tol);
                for v_indices in active.range(x_min..=x_max).map(|(_, ids)| ids) {
                    for &v_idx in v_indices {
                        let v = &v_sorted[v_idx];
                        if v.top <= h.top + y_tol && v.bottom >= h.top - y_tol {
                            pairs
                                .entry(key_point(v.x0, h.top))
                                .or_default()
                                .push((VEdgeId(v_idx), HEdgeId(event.idx)));
                        }
                    }
                }
            }
        }
    }

    let intersections = pairs
        .into_iter()
        .map(|(vertex, mut pair_list)| {
            pair_list.sort();
            let (v, h) = pair_list.into_iter().unzip();
            (vertex, IntersectionIdx { v, h })
        })
        .collect();
    (
        EdgeStore {
            v: v_sorted,
            h: h_sorted,
        },
        intersections,
    )
}

/// Public view of the intersection map, in point order.
///
/// Edge indices address the vertical edges followed by the horizontal ones.
pub(crate) fn intersection_list(
    store: &EdgeStore,
    intersections: &IntersectionMap,
) -> Vec<Intersection> {
    let offset = store.v.len();
    intersections
        .iter()
        .map(|((x, y), idx)| {
            let mut vertical: Vec<usize> = idx.v.iter().map(|id| id.0).collect();
            let mut horizontal: Vec<usize> = idx.h.iter().map(|id| id.0 + offset).collect();
            vertical.dedup();
            horizontal.sort_unstable();
            horizontal.dedup();
            Intersection {
                x: x.into_inner(),
                y: y.into_inner(),
                vertical,
                horizontal,
            }
        })
        .collect()
}
