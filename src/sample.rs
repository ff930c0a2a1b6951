//! Placement data model: placements, pqueries, samples.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::errors::{PlaceError, PlaceResult};
use crate::tree::PlacementTree;

/// One probabilistic assignment of a query to a tree edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PqueryPlacement {
    /// Edge number in the owning sample's tree
    pub edge_num: usize,
    pub likelihood: f64,
    /// Relative support, used to rank placements within a pquery
    pub like_weight_ratio: f64,
    /// Attachment offset along the edge, from its proximal node
    pub proximal_length: f64,
    /// Length of the pendant branch to the inferred attachment point
    pub pendant_length: f64,
}

impl PqueryPlacement {
    /// True when every numeric field is a number (possibly infinite).
    pub fn is_valid(&self) -> bool {
        !(self.likelihood.is_nan()
            || self.like_weight_ratio.is_nan()
            || self.proximal_length.is_nan()
            || self.pendant_length.is_nan())
    }
}

/// Query sequence name with its abundance multiplicity.
#[derive(Debug, Clone, PartialEq)]
pub struct PqueryName {
    pub name: String,
    pub multiplicity: f64,
}

impl PqueryName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            multiplicity: 1.0,
        }
    }
}

/// A placed query: one or more placements plus one or more names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pquery {
    pub names: Vec<PqueryName>,
    pub placements: Vec<PqueryPlacement>,
}

impl Pquery {
    /// Stable sort by decreasing like-weight-ratio; ties keep input order.
    pub fn sort_placements_by_weight(&mut self) {
        self.placements.sort_by(|a, b| {
            b.like_weight_ratio
                .partial_cmp(&a.like_weight_ratio)
                .unwrap_or(Ordering::Equal)
        });
    }

    /// The rank-0 placement. Only meaningful after sorting by weight.
    pub fn best_hit(&self) -> Option<&PqueryPlacement> {
        self.placements.first()
    }

    pub fn primary_name(&self) -> Option<&str> {
        self.names.first().map(|n| n.name.as_str())
    }
}

/// A tree plus the pqueries placed on it.
///
/// Invariant: every placement's edge number is valid in `tree`. Structural
/// edits may violate this transiently; `reconcile` restores it before
/// returning.
#[derive(Debug, Clone)]
pub struct Sample {
    pub tree: PlacementTree,
    pub pqueries: Vec<Pquery>,
}

impl Sample {
    pub fn new(tree: PlacementTree) -> Self {
        Self {
            tree,
            pqueries: Vec::new(),
        }
    }

    pub fn add(&mut self, pquery: Pquery) {
        self.pqueries.push(pquery);
    }

    pub fn len(&self) -> usize {
        self.pqueries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pqueries.is_empty()
    }

    /// Sorts every pquery's placements by decreasing like-weight-ratio.
    pub fn sort_all_placements(&mut self) {
        for pquery in &mut self.pqueries {
            pquery.sort_placements_by_weight();
        }
    }

    /// Index of the first pquery carrying the given name.
    pub fn find_pquery(&self, name: &str) -> Option<usize> {
        self.pqueries
            .iter()
            .position(|pq| pq.names.iter().any(|n| n.name == name))
    }

    /// Number of placements currently referencing an edge number.
    pub fn placements_on_edge(&self, edge_num: usize) -> usize {
        self.pqueries
            .iter()
            .flat_map(|pq| &pq.placements)
            .filter(|p| p.edge_num == edge_num)
            .count()
    }

    /// Checks the edge-number invariant against the owning tree.
    pub fn validate_edge_nums(&self) -> PlaceResult<()> {
        let edge_count = self.tree.edge_count();
        for pquery in &self.pqueries {
            for placement in &pquery.placements {
                if placement.edge_num >= edge_count {
                    return Err(PlaceError::UnknownEdgeNum(placement.edge_num));
                }
            }
        }
        Ok(())
    }
}

/// Appends clones of all pqueries from one sample to another.
///
/// The caller is responsible for the two samples sharing a tree topology.
pub fn copy_pqueries(from: &Sample, into: &mut Sample) {
    into.pqueries.extend(from.pqueries.iter().cloned());
}

/// Keeps only the `n` highest-weight placements of every pquery.
pub fn filter_n_max_weight_placements(sample: &mut Sample, n: usize) {
    for pquery in &mut sample.pqueries {
        pquery.sort_placements_by_weight();
        pquery.placements.truncate(n);
    }
}

/// Drops pqueries from both samples whose names do not appear in the other.
pub fn filter_pqueries_intersecting_names(lhs: &mut Sample, rhs: &mut Sample) {
    let lhs_names = name_set(lhs);
    let rhs_names = name_set(rhs);
    lhs.pqueries
        .retain(|pq| pq.names.iter().any(|n| rhs_names.contains(&n.name)));
    rhs.pqueries
        .retain(|pq| pq.names.iter().any(|n| lhs_names.contains(&n.name)));
}

fn name_set(sample: &Sample) -> HashSet<String> {
    sample
        .pqueries
        .iter()
        .flat_map(|pq| &pq.names)
        .map(|n| n.name.clone())
        .collect()
}
