//! Topology reconciliation: prune the leaf-superset tree down to the
//! smaller tree's leaf set, migrating placements through every edit.
//!
//! Edge numbers are only recomputed once, after all prunes; during the edit
//! sequence placements are migrated by the surviving edge's current number,
//! which keeps the tracking correct across adjacent prunes.

use std::collections::BTreeSet;

use tracing::{debug, info, instrument};

use crate::errors::{PlaceError, PlaceResult};
use crate::sample::Sample;
use crate::tree::traversal::reset_edge_nums;
use crate::tree::PlacementTree;

/// Which of the two input samples carries the extra leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneSide {
    Lhs,
    Rhs,
}

/// Resolves the pruning direction from the two trees' leaf-name sets.
///
/// Fails if both trees have leaves the other lacks (ambiguous) or if the
/// leaf sets are identical (nothing to reconcile).
pub fn leaves_to_prune(lhs: &Sample, rhs: &Sample) -> PlaceResult<(PruneSide, Vec<String>)> {
    let lhs_taxa: BTreeSet<String> = lhs.tree.leaf_names().into_iter().collect();
    let rhs_taxa: BTreeSet<String> = rhs.tree.leaf_names().into_iter().collect();

    let missing_in_rhs: Vec<String> = lhs_taxa.difference(&rhs_taxa).cloned().collect();
    let missing_in_lhs: Vec<String> = rhs_taxa.difference(&lhs_taxa).cloned().collect();

    match (missing_in_lhs.is_empty(), missing_in_rhs.is_empty()) {
        (true, true) => Err(PlaceError::NothingToPrune),
        (false, false) => Err(PlaceError::AmbiguousPrune),
        (true, false) => Ok((PruneSide::Lhs, missing_in_rhs)),
        (false, true) => Ok((PruneSide::Rhs, missing_in_lhs)),
    }
}

/// Prunes `to_prune` leaves from the big sample's tree, migrates all
/// placements, renumbers edges and verifies the result matches the small
/// sample's tree.
///
/// On error the big sample may hold a partially edited tree; callers must
/// discard it, partial reconciliation is not a recoverable state.
#[instrument(level = "debug", skip(big, small))]
pub fn reconcile(big: &mut Sample, small: &Sample, to_prune: &[String]) -> PlaceResult<()> {
    let leaf_count = big.tree.leaf_count();
    if to_prune.len() > leaf_count.saturating_sub(4) {
        return Err(PlaceError::TooFewLeavesAfterPrune {
            requested: to_prune.len(),
            available: leaf_count,
        });
    }

    for label in to_prune {
        prune_and_move_placements(big, label)?;
    }

    // single renumbering pass over the final topology
    let remap = reset_edge_nums(&mut big.tree);
    for pquery in &mut big.pqueries {
        for placement in &mut pquery.placements {
            placement.edge_num = *remap
                .get(&placement.edge_num)
                .ok_or(PlaceError::UnknownEdgeNum(placement.edge_num))?;
        }
    }

    verify_compatible(&big.tree, &small.tree)?;
    info!(pruned = to_prune.len(), "reconciled sample trees");
    Ok(())
}

/// Removes one leaf: deletes its pendant edge, contracts the degree-2 base
/// node, and reassigns placements from both vanished edges to the merged
/// edge. Edge numbers are not recomputed here.
fn prune_and_move_placements(sample: &mut Sample, label: &str) -> PlaceResult<()> {
    let leaf = sample
        .tree
        .find_leaf(label)
        .ok_or_else(|| PlaceError::LeafNotFound(label.to_string()))?;

    let node = sample
        .tree
        .node(leaf)
        .ok_or_else(|| PlaceError::InternalError("stale leaf index".into()))?;
    let pendant_num = sample
        .tree
        .edge(node.edges[0])
        .ok_or_else(|| PlaceError::InternalError("pendant edge missing".into()))?
        .edge_num;

    let base = sample.tree.delete_leaf(leaf)?;

    // current numbers of the two edges about to merge
    let base_edge_nums: Vec<usize> = sample
        .tree
        .node(base)
        .ok_or_else(|| PlaceError::InternalError("base node missing".into()))?
        .edges
        .iter()
        .filter_map(|&e| sample.tree.edge(e).map(|edge| edge.edge_num))
        .collect();

    let survivor = sample
        .tree
        .contract_linear_node(base, |remaining, deleted| {
            remaining.branch_length += deleted.branch_length;
        })?;
    let survivor_num = sample
        .tree
        .edge(survivor)
        .ok_or_else(|| PlaceError::InternalError("merged edge missing".into()))?
        .edge_num;

    let mut moved = 0usize;
    for pquery in &mut sample.pqueries {
        for placement in &mut pquery.placements {
            let gone = placement.edge_num == pendant_num
                || (base_edge_nums.contains(&placement.edge_num)
                    && placement.edge_num != survivor_num);
            if gone {
                placement.edge_num = survivor_num;
                moved += 1;
            }
        }
    }
    debug!(label, moved, survivor_num, "pruned leaf");
    Ok(())
}

/// Structural compatibility: equal node/edge/link counts and identical
/// sorted leaf-name sets.
fn verify_compatible(a: &PlacementTree, b: &PlacementTree) -> PlaceResult<()> {
    if a.node_count() != b.node_count()
        || a.edge_count() != b.edge_count()
        || a.link_count() != b.link_count()
    {
        return Err(PlaceError::IncompatibleAfterPrune(format!(
            "counts differ: {} vs {} nodes, {} vs {} edges",
            a.node_count(),
            b.node_count(),
            a.edge_count(),
            b.edge_count()
        )));
    }
    if a.leaf_names() != b.leaf_names() {
        return Err(PlaceError::IncompatibleAfterPrune(
            "leaf-name sets differ".into(),
        ));
    }
    Ok(())
}
