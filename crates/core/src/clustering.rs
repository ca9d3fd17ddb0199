//! Tolerance-based 1D clustering.
//!
//! Values are sorted and chained: a value joins the current cluster when it
//! is within `tolerance` of the previous value. Both layout (line buckets)
//! and table inference (word alignment, edge snapping) group this way.

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

type KeyF64 = OrderedFloat<f64>;

/// Cluster a list of values based on tolerance.
pub fn cluster_list(mut xs: Vec<f64>, tolerance: f64) -> Vec<Vec<f64>> {
    xs.sort_by(f64::total_cmp);
    if tolerance <= 0.0 || xs.len() < 2 {
        return xs.into_iter().map(|x| vec![x]).collect();
    }
    let mut groups: Vec<Vec<f64>> = Vec::new();
    let mut current: Vec<f64> = vec![xs[0]];
    let mut last = xs[0];
    for x in xs.into_iter().skip(1) {
        if x <= last + tolerance {
            current.push(x);
        } else {
            groups.push(std::mem::replace(&mut current, vec![x]));
        }
        last = x;
    }
    groups.push(current);
    groups
}

/// Map each distinct value to the index of its cluster.
///
/// Cluster indices increase with the values they contain.
fn make_cluster_dict(values: &[f64], tolerance: f64) -> FxHashMap<KeyF64, usize> {
    let mut unique: Vec<f64> = values.to_vec();
    unique.sort_by(f64::total_cmp);
    unique.dedup();
    let mut dict = FxHashMap::default();
    for (i, cluster) in cluster_list(unique, tolerance).into_iter().enumerate() {
        for val in cluster {
            dict.insert(OrderedFloat(val), i);
        }
    }
    dict
}

/// Cluster index of every value, in input order.
pub fn cluster_ids(values: &[f64], tolerance: f64) -> Vec<usize> {
    let dict = make_cluster_dict(values, tolerance);
    values
        .iter()
        .map(|v| dict.get(&OrderedFloat(*v)).copied().unwrap_or(0))
        .collect()
}

/// Cluster objects by a key function.
///
/// Groups come out in ascending key order; members keep their input order.
pub fn cluster_objects<'a, T, F>(xs: &'a [T], key_fn: F, tolerance: f64) -> Vec<Vec<&'a T>>
where
    F: Fn(&T) -> f64,
{
    let values: Vec<f64> = xs.iter().map(&key_fn).collect();
    let ids = cluster_ids(&values, tolerance);
    let count = ids.iter().max().map_or(0, |m| m + 1);
    let mut groups: Vec<Vec<&T>> = vec![Vec::new(); count];
    for (item, id) in xs.iter().zip(ids) {
        groups[id].push(item);
    }
    groups
}
