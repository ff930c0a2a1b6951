//! Node-path distance between matched placement pairs on a shared tree.

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::errors::{PlaceError, PlaceResult};
use crate::sample::Sample;
use crate::tree::NodePathMatrix;

/// Suffix appended to the pruned sample's pquery names before merging, so
/// the two sides can be told apart inside one sample.
pub const COPY_SUFFIX: &str = "_cpy";

#[derive(Debug, Clone, PartialEq)]
pub struct PairDistance {
    pub name: String,
    pub path_length: usize,
}

/// Appends `suffix` to the primary name of every pquery.
pub fn suffix_names(sample: &mut Sample, suffix: &str) {
    for pquery in &mut sample.pqueries {
        if let Some(name) = pquery.names.first_mut() {
            name.name.push_str(suffix);
        }
    }
}

/// Matches pquery pairs by `name` / `name + suffix` and reports the
/// node-path length between their best hits.
///
/// Each pair is reported exactly once; a pquery without an equally-named
/// counterpart is skipped (best-effort matching, not an error).
#[instrument(level = "debug", skip(sample, matrix))]
pub fn paired_distance(
    sample: &Sample,
    matrix: &NodePathMatrix,
    suffix: &str,
) -> PlaceResult<Vec<PairDistance>> {
    let edge_map = sample.tree.edge_num_map();
    let mut done: HashSet<usize> = HashSet::new();
    let mut pairs = Vec::new();

    for (i, pquery) in sample.pqueries.iter().enumerate() {
        // already covered from the other direction
        if done.contains(&i) {
            continue;
        }
        let Some(name) = pquery.primary_name() else {
            continue;
        };
        let counterpart_name = format!("{name}{suffix}");
        let Some(j) = sample.find_pquery(&counterpart_name) else {
            debug!(name, "no counterpart pquery, skipping");
            continue;
        };

        let (Some(first), Some(second)) =
            (pquery.best_hit(), sample.pqueries[j].best_hit())
        else {
            continue;
        };

        let node_a = edge_map
            .get(&first.edge_num)
            .and_then(|&e| sample.tree.edge(e))
            .map(|e| e.primary)
            .ok_or(PlaceError::UnknownEdgeNum(first.edge_num))?;
        let node_b = edge_map
            .get(&second.edge_num)
            .and_then(|&e| sample.tree.edge(e))
            .map(|e| e.primary)
            .ok_or(PlaceError::UnknownEdgeNum(second.edge_num))?;

        let path_length = matrix
            .path_length(node_a, node_b)
            .ok_or_else(|| PlaceError::InternalError("node missing from path matrix".into()))?;

        pairs.push(PairDistance {
            name: name.to_string(),
            path_length,
        });
        done.insert(j);
    }
    Ok(pairs)
}
