//! Pendant-length outlier classification over best-hit placements.
//!
//! Two divergent modes, both intended: filtering removes pqueries under a
//! single caller-selected criterion, while the scrutiny report computes all
//! local criteria plus the global sigma tiers without removing anything.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::sample::Sample;
use crate::stats::local::{local_branch_average, local_branch_max, WeightDecay, UNBOUNDED_RADIUS};
use crate::tree::PlacementTree;

pub const DEFAULT_RADIUS: usize = 10;
pub const DEFAULT_MULTIPLIER: f64 = 4.0;

/// Local thresholding criterion for the filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlierCriterion {
    OverAverage,
    OverWeightedAverage,
    OverLocalMax,
}

/// The three precomputed local statistics for one tree.
///
/// Default policy: identity weight for the plain average, 1/(1+d) for the
/// weighted average. Indexed by edge number.
#[derive(Debug, Clone)]
pub struct LocalStats {
    pub average: Vec<f64>,
    pub weighted_average: Vec<f64>,
    pub max: Vec<f64>,
}

impl LocalStats {
    #[instrument(level = "debug", skip(tree))]
    pub fn compute(tree: &PlacementTree, radius: usize) -> Self {
        Self {
            average: local_branch_average(tree, radius, WeightDecay::Identity),
            weighted_average: local_branch_average(tree, radius, WeightDecay::InverseDistance),
            max: local_branch_max(tree, radius),
        }
    }

    pub fn stat(&self, criterion: OutlierCriterion, edge_num: usize) -> f64 {
        let map = match criterion {
            OutlierCriterion::OverAverage => &self.average,
            OutlierCriterion::OverWeightedAverage => &self.weighted_average,
            OutlierCriterion::OverLocalMax => &self.max,
        };
        map.get(edge_num).copied().unwrap_or(f64::NAN)
    }
}

/// Removes pqueries whose best hit exceeds `multiplier` times the local
/// statistic under the selected criterion. Returns the kept sample and the
/// number of removed pqueries.
///
/// Idempotent for a fixed criterion and threshold: re-filtering a filtered
/// sample removes nothing.
#[instrument(level = "debug", skip(sample, stats))]
pub fn classify_and_filter(
    mut sample: Sample,
    stats: &LocalStats,
    multiplier: f64,
    criterion: OutlierCriterion,
) -> (Sample, usize) {
    sample.sort_all_placements();
    let mut removed = 0;
    sample.pqueries.retain(|pq| {
        let Some(best) = pq.best_hit() else {
            removed += 1;
            return false;
        };
        if best.pendant_length > multiplier * stats.stat(criterion, best.edge_num) {
            removed += 1;
            false
        } else {
            true
        }
    });
    debug!(removed, kept = sample.len(), "filtered sample");
    (sample, removed)
}

/// Drops placements with any NaN numeric field; pqueries left without
/// placements are dropped as well. Returns the removed placement count.
pub fn remove_invalid(sample: &mut Sample) -> usize {
    let mut removed = 0;
    for pquery in &mut sample.pqueries {
        let before = pquery.placements.len();
        pquery.placements.retain(|p| p.is_valid());
        removed += before - pquery.placements.len();
    }
    sample.pqueries.retain(|pq| !pq.placements.is_empty());
    removed
}

/// Per-edge tally of flagged best hits.
#[derive(Debug, Clone, Default)]
pub struct EdgeBlame {
    pub edge_num: usize,
    /// Endpoint label: primary-node label, falling back to secondary
    pub name: String,
    pub for_over_average: usize,
    pub for_over_weighted_average: usize,
    pub for_over_max: usize,
    pub for_sigma5: usize,
}

/// Which blame tally to rank edges by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlameKind {
    OverAverage,
    OverWeightedAverage,
    OverLocalMax,
    Sigma5,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PendantStats {
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub mean: f64,
    pub stddev: f64,
}

/// Diagnostic report over one or more samples; nothing is removed.
#[derive(Debug, Clone)]
pub struct ScrutinyReport {
    pub radius: usize,
    pub multiplier: f64,
    pub sample_count: usize,
    pub query_count: usize,
    pub pendant: PendantStats,
    pub flagged_over_average: usize,
    pub flagged_over_weighted_average: usize,
    pub flagged_over_max: usize,
    /// Best hits with z-score above 2, 3, 4 and 5
    pub flagged_sigma: [usize; 4],
    pub blame: Vec<EdgeBlame>,
}

impl ScrutinyReport {
    /// Top `n` blamed edges for a criterion, with each edge's share of that
    /// criterion's total flagged count in percent.
    pub fn top_blamed(&self, kind: BlameKind, n: usize) -> Vec<(&EdgeBlame, f64)> {
        let count = |b: &EdgeBlame| match kind {
            BlameKind::OverAverage => b.for_over_average,
            BlameKind::OverWeightedAverage => b.for_over_weighted_average,
            BlameKind::OverLocalMax => b.for_over_max,
            BlameKind::Sigma5 => b.for_sigma5,
        };
        let total: usize = self.blame.iter().map(|b| count(b)).sum();
        self.blame
            .iter()
            .sorted_by_key(|b| std::cmp::Reverse(count(b)))
            .take(n)
            .map(|b| {
                let pct = if total > 0 {
                    count(b) as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                (b, pct)
            })
            .collect()
    }
}

/// Computes the full diagnostic report: global pendant-length distribution,
/// local and sigma flag counts, and per-edge blame.
///
/// Sorts placements by weight in place, like the filtering mode does.
#[instrument(level = "debug", skip(samples))]
pub fn scrutinize(samples: &mut [Sample], radius: usize, multiplier: f64) -> ScrutinyReport {
    let max_edges = samples
        .iter()
        .map(|s| s.tree.edge_count())
        .max()
        .unwrap_or(0);
    let mut blame: Vec<EdgeBlame> = (0..max_edges)
        .map(|edge_num| EdgeBlame {
            edge_num,
            ..EdgeBlame::default()
        })
        .collect();

    let mut flagged_over_average = 0;
    let mut flagged_over_weighted_average = 0;
    let mut flagged_over_max = 0;

    // (edge_num, pendant_length) per best hit, reused for the global pass
    let mut best_hits: Vec<(usize, f64)> = Vec::new();

    for sample in samples.iter_mut() {
        let stats = LocalStats::compute(&sample.tree, radius);
        let labels = edge_labels(&sample.tree);
        sample.sort_all_placements();

        for pquery in &sample.pqueries {
            let Some(best) = pquery.best_hit() else {
                continue;
            };
            let edge_num = best.edge_num;
            best_hits.push((edge_num, best.pendant_length));

            if let Some(entry) = blame.get_mut(edge_num) {
                if let Some(label) = labels.get(&edge_num) {
                    entry.name = label.clone();
                }
                if best.pendant_length
                    > multiplier * stats.stat(OutlierCriterion::OverAverage, edge_num)
                {
                    flagged_over_average += 1;
                    entry.for_over_average += 1;
                }
                if best.pendant_length
                    > multiplier * stats.stat(OutlierCriterion::OverWeightedAverage, edge_num)
                {
                    flagged_over_weighted_average += 1;
                    entry.for_over_weighted_average += 1;
                }
                if best.pendant_length
                    > multiplier * stats.stat(OutlierCriterion::OverLocalMax, edge_num)
                {
                    flagged_over_max += 1;
                    entry.for_over_max += 1;
                }
            }
        }
    }

    let pendant_lengths: Vec<f64> = best_hits.iter().map(|&(_, p)| p).collect();
    let pendant = pendant_stats(&pendant_lengths);

    // one-sided global criterion: only excess length is penalized
    let mut flagged_sigma = [0usize; 4];
    for &(edge_num, pendant_length) in &best_hits {
        let z = (pendant_length - pendant.mean) / pendant.stddev;
        for (slot, threshold) in flagged_sigma.iter_mut().zip([2.0, 3.0, 4.0, 5.0]) {
            if z > threshold {
                *slot += 1;
            }
        }
        if z > 5.0 {
            if let Some(entry) = blame.get_mut(edge_num) {
                entry.for_sigma5 += 1;
            }
        }
    }

    ScrutinyReport {
        radius,
        multiplier,
        sample_count: samples.len(),
        query_count: best_hits.len(),
        pendant,
        flagged_over_average,
        flagged_over_weighted_average,
        flagged_over_max,
        flagged_sigma,
        blame,
    }
}

/// Preferred label per edge number: primary-node label, else secondary.
fn edge_labels(tree: &PlacementTree) -> HashMap<usize, String> {
    let mut labels = HashMap::new();
    for (_, edge) in tree.edges() {
        let primary = tree.node(edge.primary).map(|n| n.name.as_str()).unwrap_or("");
        let secondary = tree
            .node(edge.secondary)
            .map(|n| n.name.as_str())
            .unwrap_or("");
        let label = if !primary.is_empty() { primary } else { secondary };
        if !label.is_empty() {
            labels.insert(edge.edge_num, label.to_string());
        }
    }
    labels
}

fn pendant_stats(values: &[f64]) -> PendantStats {
    if values.is_empty() {
        return PendantStats::default();
    }
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let mut sorted = finite.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = finite.len() as f64;
    let mean = finite.iter().sum::<f64>() / n;
    // population form, matching the reference mean/stddev implementation
    let variance = finite.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let median = if sorted.is_empty() {
        0.0
    } else if sorted.len() % 2 == 1 {
        sorted[sorted.len() / 2]
    } else {
        (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
    };

    PendantStats {
        min: sorted.first().copied().unwrap_or(0.0),
        max: sorted.last().copied().unwrap_or(0.0),
        median,
        mean,
        stddev: variance.sqrt(),
    }
}

impl fmt::Display for ScrutinyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "~~~ Program Settings ~~~")?;
        if self.radius == UNBOUNDED_RADIUS {
            writeln!(f, "Locality radius:\tunbounded")?;
        } else {
            writeln!(f, "Locality radius:\t{}", self.radius)?;
        }
        writeln!(f, "Threshold multiplier:\t{}", self.multiplier)?;

        writeln!(f, "\n~~~ Basic Info ~~~")?;
        writeln!(f, "Number of input files:\t{}", self.sample_count)?;
        writeln!(f, "Number of queries:\t{}", self.query_count)?;

        writeln!(f, "\n~~~ Placement (best hit) Stats ~~~")?;
        writeln!(f, "Pendant lengths:")?;
        writeln!(f, "\tmin:\t{}", self.pendant.min)?;
        writeln!(f, "\tmax:\t{}", self.pendant.max)?;
        writeln!(f, "\tmedian:\t{}", self.pendant.median)?;
        writeln!(f, "\tmean:\t{}", self.pendant.mean)?;
        writeln!(f, "\tstddev:\t{}", self.pendant.stddev)?;

        let pct = |count: usize| {
            if self.query_count > 0 {
                count as f64 / self.query_count as f64 * 100.0
            } else {
                0.0
            }
        };

        writeln!(f, "\n~~~ Outlier Detection ~~~")?;
        writeln!(
            f,
            "Best hits with pendant length more than {}x greater than:",
            self.multiplier
        )?;
        writeln!(f, "\tLocal max:\t\t{:.3}%", pct(self.flagged_over_max))?;
        writeln!(f, "\tLocal average:\t\t{:.3}%", pct(self.flagged_over_average))?;
        writeln!(
            f,
            "\tLocal weighted average:\t{:.3}%",
            pct(self.flagged_over_weighted_average)
        )?;

        writeln!(f, "Best hits with pendant length more than")?;
        for (i, sigma) in [2, 3, 4, 5].iter().enumerate() {
            writeln!(
                f,
                "\t{} sigma from the mean:\t{:.3}%",
                sigma,
                pct(self.flagged_sigma[i])
            )?;
        }

        writeln!(
            f,
            "\nEdges to blame for having placements with pendant length"
        )?;
        let sections = [
            (BlameKind::OverLocalMax, "over the local maximum:"),
            (BlameKind::OverAverage, "over the local average:"),
            (
                BlameKind::OverWeightedAverage,
                "over the local weighted average:",
            ),
            (BlameKind::Sigma5, "over 5 sigma from the mean:"),
        ];
        for (kind, title) in sections {
            writeln!(f, "\t{title}")?;
            for (entry, share) in self.top_blamed(kind, 5) {
                write!(f, "\t\t{:.2}%\t{}", share, entry.edge_num)?;
                if !entry.name.is_empty() {
                    write!(f, "\t{}", entry.name)?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
