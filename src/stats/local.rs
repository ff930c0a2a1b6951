//! Bounded-radius, decay-weighted branch-length statistics per edge.
//!
//! For an edge e, the neighborhood is everything within `radius` hops on
//! both sides of e; e itself counts at hop distance 0.

use tracing::instrument;

use crate::tree::arena::{EdgeIndex, PlacementTree};
use crate::tree::traversal::{LevelorderEdges, Subtree};

/// Sentinel for an unbounded traversal radius.
pub const UNBOUNDED_RADIUS: usize = usize::MAX;

/// Maps a negative CLI radius to the unbounded sentinel.
pub fn radius_from_signed(radius: i64) -> usize {
    if radius < 0 {
        UNBOUNDED_RADIUS
    } else {
        radius as usize
    }
}

/// Decay shape applied to hop distances when averaging branch lengths.
///
/// Any monotonically non-increasing function of distance is a valid shape;
/// these are the ones the tools expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightDecay {
    /// Constant 1
    Identity,
    /// 1/(1+d)
    InverseDistance,
    /// 1/(1+d)^2
    InverseSquare,
    /// exp(-d/5)
    Exponential,
    /// 1/(1+exp(d-4))
    Logistic,
}

impl WeightDecay {
    pub fn weight(self, distance: usize) -> f64 {
        let d = distance as f64;
        match self {
            WeightDecay::Identity => 1.0,
            WeightDecay::InverseDistance => 1.0 / (d + 1.0),
            WeightDecay::InverseSquare => 1.0 / (d + 1.0).powi(2),
            WeightDecay::Exponential => (-d / 5.0).exp(),
            WeightDecay::Logistic => 1.0 / (1.0 + (d - 4.0).exp()),
        }
    }
}

/// Decay-weighted average branch length around every edge, indexed by
/// edge number. Must be recomputed after any structural edit.
#[instrument(level = "debug", skip(tree))]
pub fn local_branch_average(tree: &PlacementTree, radius: usize, decay: WeightDecay) -> Vec<f64> {
    let mut map = vec![0.0; tree.edge_count()];
    for (edge_idx, edge) in tree.edges() {
        map[edge.edge_num] = weighted_average(tree, edge_idx, radius, decay);
    }
    map
}

/// Maximum branch length within the radius around every edge, indexed by
/// edge number. The edge's own length is always included.
#[instrument(level = "debug", skip(tree))]
pub fn local_branch_max(tree: &PlacementTree, radius: usize) -> Vec<f64> {
    let mut map = vec![0.0; tree.edge_count()];
    for (edge_idx, edge) in tree.edges() {
        map[edge.edge_num] = local_max(tree, edge_idx, radius);
    }
    map
}

fn weighted_average(
    tree: &PlacementTree,
    edge_idx: EdgeIndex,
    radius: usize,
    decay: WeightDecay,
) -> f64 {
    let Some(edge) = tree.edge(edge_idx) else {
        return 0.0;
    };

    let weight = decay.weight(0);
    let mut sum = weight * edge.branch_length;
    let mut total_weight = weight;

    if radius > 0 {
        for sub in both_sides(edge_idx, edge.primary, edge.secondary) {
            let (side_sum, side_weight) = weighted_sum(tree, sub, radius - 1, decay);
            sum += side_sum;
            total_weight += side_weight;
        }
    }

    sum / total_weight
}

fn weighted_sum(
    tree: &PlacementTree,
    sub: Subtree,
    max_depth: usize,
    decay: WeightDecay,
) -> (f64, f64) {
    let mut sum = 0.0;
    let mut total_weight = 0.0;
    for (edge_idx, depth) in LevelorderEdges::new(tree, sub, max_depth) {
        if let Some(edge) = tree.edge(edge_idx) {
            // depth 0 is one hop away from the edge under consideration
            let weight = decay.weight(depth + 1);
            sum += weight * edge.branch_length;
            total_weight += weight;
        }
    }
    (sum, total_weight)
}

fn local_max(tree: &PlacementTree, edge_idx: EdgeIndex, radius: usize) -> f64 {
    let Some(edge) = tree.edge(edge_idx) else {
        return 0.0;
    };

    let mut max = edge.branch_length;
    if radius > 0 {
        for sub in both_sides(edge_idx, edge.primary, edge.secondary) {
            for (other_idx, _) in LevelorderEdges::new(tree, sub, radius - 1) {
                if let Some(other) = tree.edge(other_idx) {
                    max = max.max(other.branch_length);
                }
            }
        }
    }
    max
}

fn both_sides(
    via: EdgeIndex,
    primary: crate::tree::NodeIndex,
    secondary: crate::tree::NodeIndex,
) -> [Subtree; 2] {
    [
        Subtree { node: primary, via },
        Subtree {
            node: secondary,
            via,
        },
    ]
}
