//! Edge collection, snapping, joining, and filtering for table extraction.
//!
//! Raw edges come from drawn graphics, word alignment, or caller-supplied
//! coordinates; this module turns them into clean, aligned edges.

use std::collections::BTreeMap;

use crate::clustering::cluster_objects;
use crate::geometry::BBox;
use crate::layout::Word;
use crate::objects::{PageObject, PathObject, Point};

use super::types::{Edge, EdgeSource, KeyF64, Orientation, WORD_ALIGNMENT_TOLERANCE, key_f64};

/// Edges drawn by the page's line, rect and curve objects.
pub fn edges_from_objects(objects: &[PageObject]) -> Vec<Edge> {
    let mut edges = Vec::new();
    for obj in objects {
        match obj {
            PageObject::Line(line) => edges.extend(line_to_edge(line)),
            PageObject::Rect(rect) => edges.extend(rect_to_edges(rect.bbox)),
            PageObject::Curve(curve) => {
                edges.extend(curve_to_edges(&curve.pts, EdgeSource::CurveEdge))
            }
            _ => {}
        }
    }
    edges
}

/// Convert a straight line to an edge. Diagonal lines bound nothing.
pub fn line_to_edge(line: &PathObject) -> Option<Edge> {
    let bbox = line.bbox;
    if bbox.height() == 0.0 {
        Some(Edge::horizontal(bbox.top(), bbox.x0(), bbox.x1(), EdgeSource::Line))
    } else if bbox.width() == 0.0 {
        Some(Edge::vertical(bbox.x0(), bbox.top(), bbox.bottom(), EdgeSource::Line))
    } else {
        None
    }
}

/// Convert a rectangle to its four edges.
pub fn rect_to_edges(rect: BBox) -> Vec<Edge> {
    vec![
        Edge::horizontal(rect.top(), rect.x0(), rect.x1(), EdgeSource::RectEdge),
        Edge::horizontal(rect.bottom(), rect.x0(), rect.x1(), EdgeSource::RectEdge),
        Edge::vertical(rect.x0(), rect.top(), rect.bottom(), EdgeSource::RectEdge),
        Edge::vertical(rect.x1(), rect.top(), rect.bottom(), EdgeSource::RectEdge),
    ]
}

/// Convert a polyline to edges, keeping only axis-aligned segments.
pub fn curve_to_edges(points: &[Point], source: EdgeSource) -> Vec<Edge> {
    points
        .windows(2)
        .filter_map(|pair| {
            let (p0, p1) = (pair[0], pair[1]);
            if p0.0 == p1.0 {
                Some(Edge::vertical(p0.0, p0.1, p1.1, source))
            } else if p0.1 == p1.1 {
                Some(Edge::horizontal(p0.1, p0.0, p1.0, source))
            } else {
                None
            }
        })
        .collect()
}

/// Vertical edges at coordinates shared by the `x0` of enough words.
///
/// Each accepted column edge spans its own words; a closing edge at the
/// right-most `x1` spans all accepted words.
pub fn words_to_edges_v(words: &[Word], word_threshold: usize) -> Vec<Edge> {
    let clusters: Vec<Vec<&Word>> =
        cluster_objects(words, |w| w.bbox.x0(), WORD_ALIGNMENT_TOLERANCE)
            .into_iter()
            .filter(|c| !c.is_empty() && c.len() >= word_threshold)
            .collect();
    let Some(all) = BBox::union_all(clusters.iter().flatten().map(|w| w.bbox)) else {
        return Vec::new();
    };

    let mut edges: Vec<Edge> = clusters
        .iter()
        .filter_map(|cluster| BBox::union_all(cluster.iter().map(|w| w.bbox)))
        .map(|span| Edge::vertical(span.x0(), span.top(), span.bottom(), EdgeSource::WordEdge))
        .collect();
    edges.push(Edge::vertical(all.x1(), all.top(), all.bottom(), EdgeSource::WordEdge));
    edges
}

/// Horizontal edges at coordinates shared by the `top` of enough words.
///
/// Each accepted row edge spans its own words; a closing edge at the
/// bottom-most `bottom` spans all accepted words.
pub fn words_to_edges_h(words: &[Word], word_threshold: usize) -> Vec<Edge> {
    let clusters: Vec<Vec<&Word>> =
        cluster_objects(words, |w| w.bbox.top(), WORD_ALIGNMENT_TOLERANCE)
            .into_iter()
            .filter(|c| !c.is_empty() && c.len() >= word_threshold)
            .collect();
    let Some(all) = BBox::union_all(clusters.iter().flatten().map(|w| w.bbox)) else {
        return Vec::new();
    };

    let mut edges: Vec<Edge> = clusters
        .iter()
        .filter_map(|cluster| BBox::union_all(cluster.iter().map(|w| w.bbox)))
        .map(|span| Edge::horizontal(span.top(), span.x0(), span.x1(), EdgeSource::WordEdge))
        .collect();
    edges.push(Edge::horizontal(all.bottom(), all.x0(), all.x1(), EdgeSource::WordEdge));
    edges
}

/// Caller-supplied coordinates as edges spanning the page.
pub fn explicit_edges(coords: &[f64], orientation: Orientation, page_bbox: BBox) -> Vec<Edge> {
    coords
        .iter()
        .filter(|c| c.is_finite())
        .map(|&c| match orientation {
            Orientation::Vertical => Edge::vertical(
                c,
                page_bbox.top(),
                page_bbox.bottom(),
                EdgeSource::ExplicitEdge,
            ),
            Orientation::Horizontal => Edge::horizontal(
                c,
                page_bbox.x0(),
                page_bbox.x1(),
                EdgeSource::ExplicitEdge,
            ),
        })
        .collect()
}

fn with_fixed(edge: &Edge, fixed: f64) -> Edge {
    match edge.orientation {
        Orientation::Vertical => Edge {
            x0: fixed,
            x1: fixed,
            ..edge.clone()
        },
        Orientation::Horizontal => Edge {
            top: fixed,
            bottom: fixed,
            ..edge.clone()
        },
    }
}

/// Snap edges of one orientation whose fixed coordinates chain within
/// `tolerance` to the cluster mean.
pub fn snap_edges(edges: &[Edge], tolerance: f64) -> Vec<Edge> {
    if tolerance <= 0.0 {
        return edges.to_vec();
    }
    let mut snapped = Vec::with_capacity(edges.len());
    for cluster in cluster_objects(edges, Edge::fixed, tolerance) {
        if cluster.is_empty() {
            continue;
        }
        let avg = cluster.iter().map(|e| e.fixed()).sum::<f64>() / cluster.len() as f64;
        snapped.extend(cluster.into_iter().map(|e| with_fixed(e, avg)));
    }
    snapped
}

/// Join collinear edges whose gap is within `tolerance`.
///
/// All edges are expected to share one orientation and fixed coordinate.
pub fn join_edge_group(edges: &[Edge], tolerance: f64) -> Vec<Edge> {
    let mut sorted = edges.to_vec();
    sorted.sort_by(|a, b| a.start().total_cmp(&b.start()));
    let mut joined: Vec<Edge> = Vec::with_capacity(sorted.len());
    for e in sorted {
        match joined.last_mut() {
            Some(last) if e.start() <= last.end() + tolerance => {
                if e.end() > last.end() {
                    match last.orientation {
                        Orientation::Horizontal => last.x1 = e.x1,
                        Orientation::Vertical => last.bottom = e.bottom,
                    }
                }
            }
            _ => joined.push(e),
        }
    }
    joined
}

/// Merge edges by snapping then joining, per orientation.
pub fn merge_edges(
    edges: Vec<Edge>,
    snap_x_tolerance: f64,
    snap_y_tolerance: f64,
    join_x_tolerance: f64,
    join_y_tolerance: f64,
) -> Vec<Edge> {
    let (v, h): (Vec<Edge>, Vec<Edge>) = edges
        .into_iter()
        .partition(|e| e.orientation == Orientation::Vertical);
    let v = snap_edges(&v, snap_x_tolerance);
    let h = snap_edges(&h, snap_y_tolerance);

    let mut grouped: BTreeMap<(Orientation, KeyF64), Vec<Edge>> = BTreeMap::new();
    for e in v.into_iter().chain(h) {
        grouped
            .entry((e.orientation, key_f64(e.fixed())))
            .or_default()
            .push(e);
    }

    let mut merged = Vec::new();
    for ((orientation, _), group) in grouped {
        // Vertical edges extend along y, horizontal ones along x.
        let tol = match orientation {
            Orientation::Horizontal => join_x_tolerance,
            Orientation::Vertical => join_y_tolerance,
        };
        merged.extend(join_edge_group(&group, tol));
    }
    merged
}

/// Keep edges of the given orientation (or any) at least `min_length` long.
pub fn filter_edges(
    edges: Vec<Edge>,
    orientation: Option<Orientation>,
    min_length: f64,
) -> Vec<Edge> {
    edges
        .into_iter()
        .filter(|e| orientation.is_none_or(|o| e.orientation == o) && e.length() >= min_length)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{TextSettings, extract_words};
    use crate::objects::Glyph;

    fn word(text: &str, x0: f64, top: f64) -> Word {
        let width = 5.0 * text.len() as f64;
        let glyphs: Vec<Glyph> = text
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let x = x0 + 5.0 * i as f64;
                Glyph::new(
                    1,
                    BBox::new(x, top, x + 5.0, top + 10.0).unwrap(),
                    c.to_string(),
                    "F",
                    10.0,
                )
            })
            .collect();
        let mut words = extract_words(&glyphs, &TextSettings::default());
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].bbox.width(), width);
        words.remove(0)
    }

    #[test]
    fn snap_moves_close_edges_to_mean() {
        let edges = vec![
            Edge::vertical(10.0, 0.0, 5.0, EdgeSource::Line),
            Edge::vertical(12.0, 5.0, 10.0, EdgeSource::Line),
            Edge::vertical(50.0, 0.0, 10.0, EdgeSource::Line),
        ];
        let snapped = snap_edges(&edges, 3.0);
        let xs: Vec<f64> = snapped.iter().map(Edge::fixed).collect();
        assert_eq!(xs, vec![11.0, 11.0, 50.0]);
    }

    #[test]
    fn merge_joins_collinear_segments() {
        let edges = vec![
            Edge::horizontal(10.0, 0.0, 10.0, EdgeSource::Line),
            Edge::horizontal(10.0, 12.0, 20.0, EdgeSource::Line),
            Edge::horizontal(10.0, 30.0, 40.0, EdgeSource::Line),
        ];
        let merged = merge_edges(edges, 3.0, 3.0, 3.0, 3.0);
        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].x0, merged[0].x1), (0.0, 20.0));
        assert_eq!((merged[1].x0, merged[1].x1), (30.0, 40.0));
    }

    #[test]
    fn rect_yields_four_edges() {
        let edges = rect_to_edges(BBox::new(0.0, 0.0, 10.0, 20.0).unwrap());
        let v = edges
            .iter()
            .filter(|e| e.orientation == Orientation::Vertical)
            .count();
        assert_eq!(v, 2);
        assert!(edges.iter().all(|e| e.source == EdgeSource::RectEdge));
    }

    #[test]
    fn curve_keeps_axis_aligned_segments() {
        let pts = vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 20.0)];
        let edges = curve_to_edges(&pts, EdgeSource::CurveEdge);
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].orientation, Orientation::Horizontal);
        assert_eq!(edges[1].orientation, Orientation::Vertical);
    }

    #[test]
    fn vertical_word_edges_need_enough_words() {
        let words = vec![
            word("ab", 0.0, 0.0),
            word("cd", 0.5, 20.0),
            word("ef", 40.0, 0.0),
        ];
        let edges = words_to_edges_v(&words, 2);
        // x0 = 0.0 cluster plus the closing edge; the lone word at 40 is ignored
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].x0, 0.0);
        assert_eq!((edges[0].top, edges[0].bottom), (0.0, 30.0));
        assert_eq!(edges[1].x0, 10.5);

        assert!(words_to_edges_v(&words, 3).is_empty());
    }

    #[test]
    fn horizontal_word_edges_close_below_last_row() {
        let words = vec![word("ab", 0.0, 0.0), word("cd", 20.0, 0.0), word("ef", 0.0, 20.0)];
        let edges = words_to_edges_h(&words, 1);
        let ys: Vec<f64> = edges.iter().map(Edge::fixed).collect();
        assert_eq!(ys, vec![0.0, 20.0, 30.0]);
        assert_eq!((edges[0].x0, edges[0].x1), (0.0, 30.0));
        assert_eq!((edges[1].x0, edges[1].x1), (0.0, 10.0));
    }

    #[test]
    fn explicit_edges_span_the_page() {
        let page = BBox::new(0.0, 0.0, 100.0, 200.0).unwrap();
        let edges = explicit_edges(&[5.0, f64::NAN], Orientation::Vertical, page);
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].top, edges[0].bottom), (0.0, 200.0));
    }

    #[test]
    fn filter_drops_short_edges() {
        let edges = vec![
            Edge::vertical(0.0, 0.0, 2.0, EdgeSource::Line),
            Edge::horizontal(0.0, 0.0, 5.0, EdgeSource::Line),
        ];
        assert_eq!(filter_edges(edges.clone(), None, 3.0).len(), 1);
        assert!(filter_edges(edges, Some(Orientation::Vertical), 3.0).is_empty());
    }
}
