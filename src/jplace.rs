//! Reading and writing jplace (v3) documents.
//!
//! Only the parts the QC engine needs: the reference tree with `{edge_num}`
//! annotations, the placement field table, and both the `n` and `nm` name
//! forms. NaN-valued fields are accepted on read (their removal is a
//! filtering mode, not a parse error).

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::errors::{PlaceError, PlaceResult};
use crate::sample::{Pquery, PqueryName, PqueryPlacement, Sample};
use crate::tree::newick;

#[derive(Debug, Serialize, Deserialize)]
struct JplaceDoc {
    tree: String,
    fields: Vec<String>,
    placements: Vec<JplacePquery>,
    #[serde(default = "default_version")]
    version: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
}

fn default_version() -> Value {
    Value::from(3)
}

#[derive(Debug, Serialize, Deserialize)]
struct JplacePquery {
    p: Vec<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    n: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nm: Option<Vec<(String, f64)>>,
}

/// Parses a jplace document into a sample.
#[instrument(level = "debug", skip(content))]
pub fn read_str(path: &Path, content: &str) -> PlaceResult<Sample> {
    let doc: JplaceDoc =
        serde_json::from_str(content).map_err(|e| PlaceError::InvalidJplace {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let tree = newick::parse(&doc.tree)?;
    let layout = FieldLayout::resolve(&doc.fields).map_err(|reason| {
        PlaceError::InvalidJplace {
            path: path.to_path_buf(),
            reason,
        }
    })?;
    let edge_map = tree.edge_num_map();

    let mut sample = Sample::new(tree);
    for entry in &doc.placements {
        let mut pquery = Pquery::default();
        for row in &entry.p {
            let placement = layout.placement_from_row(row).map_err(|reason| {
                PlaceError::InvalidJplace {
                    path: path.to_path_buf(),
                    reason,
                }
            })?;
            let edge_idx = *edge_map
                .get(&placement.edge_num)
                .ok_or(PlaceError::UnknownEdgeNum(placement.edge_num))?;
            let placement = if layout.length_is_distal {
                // jplace may store the offset from the distal node instead
                let branch_length = sample
                    .tree
                    .edge(edge_idx)
                    .map(|e| e.branch_length)
                    .unwrap_or(0.0);
                PqueryPlacement {
                    proximal_length: (branch_length - placement.proximal_length).max(0.0),
                    ..placement
                }
            } else {
                placement
            };
            pquery.placements.push(placement);
        }
        if let Some(names) = &entry.n {
            for name in names {
                pquery.names.push(PqueryName::new(name.clone()));
            }
        }
        if let Some(named) = &entry.nm {
            for (name, multiplicity) in named {
                pquery.names.push(PqueryName {
                    name: name.clone(),
                    multiplicity: *multiplicity,
                });
            }
        }
        sample.add(pquery);
    }
    debug!(pqueries = sample.len(), "parsed jplace document");
    Ok(sample)
}

pub fn read_file(path: &Path) -> PlaceResult<Sample> {
    let content = fs::read_to_string(path)?;
    read_str(path, &content)
}

/// Reads many jplace files in parallel, one independent result per file.
pub fn read_files(paths: &[PathBuf]) -> Vec<PlaceResult<Sample>> {
    paths.par_iter().map(|path| read_file(path)).collect()
}

/// Serializes a sample as a jplace v3 document.
pub fn write_string(sample: &Sample) -> PlaceResult<String> {
    let doc = JplaceDoc {
        tree: newick::write(&sample.tree),
        fields: vec![
            "edge_num".into(),
            "likelihood".into(),
            "like_weight_ratio".into(),
            "proximal_length".into(),
            "pendant_length".into(),
        ],
        placements: sample
            .pqueries
            .iter()
            .map(|pq| JplacePquery {
                p: pq
                    .placements
                    .iter()
                    .map(|p| {
                        vec![
                            Value::from(p.edge_num),
                            number_or_null(p.likelihood),
                            number_or_null(p.like_weight_ratio),
                            number_or_null(p.proximal_length),
                            number_or_null(p.pendant_length),
                        ]
                    })
                    .collect(),
                n: None,
                nm: Some(
                    pq.names
                        .iter()
                        .map(|n| (n.name.clone(), n.multiplicity))
                        .collect(),
                ),
            })
            .collect(),
        version: default_version(),
        metadata: None,
    };
    serde_json::to_string_pretty(&doc).map_err(|e| PlaceError::InvalidJplace {
        path: PathBuf::new(),
        reason: e.to_string(),
    })
}

pub fn write_file(sample: &Sample, path: &Path) -> PlaceResult<()> {
    let content = write_string(sample)?;
    fs::write(path, content)?;
    Ok(())
}

// JSON has no NaN literal; non-finite values degrade to null on write
fn number_or_null(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

struct FieldLayout {
    edge_num: usize,
    likelihood: usize,
    like_weight_ratio: usize,
    length: usize,
    pendant_length: usize,
    length_is_distal: bool,
}

impl FieldLayout {
    fn resolve(fields: &[String]) -> Result<Self, String> {
        let find = |name: &str| fields.iter().position(|f| f == name);
        let (length, length_is_distal) = match find("proximal_length") {
            Some(idx) => (idx, false),
            None => (
                find("distal_length")
                    .ok_or("missing field 'proximal_length' or 'distal_length'")?,
                true,
            ),
        };
        Ok(Self {
            edge_num: find("edge_num").ok_or("missing field 'edge_num'")?,
            likelihood: find("likelihood").ok_or("missing field 'likelihood'")?,
            like_weight_ratio: find("like_weight_ratio")
                .ok_or("missing field 'like_weight_ratio'")?,
            length,
            pendant_length: find("pendant_length").ok_or("missing field 'pendant_length'")?,
            length_is_distal,
        })
    }

    fn placement_from_row(&self, row: &[Value]) -> Result<PqueryPlacement, String> {
        let edge_num_raw = numeric(row, self.edge_num)?;
        if edge_num_raw < 0.0 || edge_num_raw.fract() != 0.0 {
            return Err(format!("edge_num {edge_num_raw} is not a non-negative integer"));
        }
        Ok(PqueryPlacement {
            edge_num: edge_num_raw as usize,
            likelihood: numeric(row, self.likelihood)?,
            like_weight_ratio: numeric(row, self.like_weight_ratio)?,
            proximal_length: numeric(row, self.length)?,
            pendant_length: numeric(row, self.pendant_length)?,
        })
    }
}

fn numeric(row: &[Value], idx: usize) -> Result<f64, String> {
    let value = row
        .get(idx)
        .ok_or_else(|| format!("placement row too short, missing column {idx}"))?;
    match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("column {idx} is not representable as f64")),
        // tools in the wild emit "nan" strings or null for missing values
        Value::String(s) if s.eq_ignore_ascii_case("nan") => Ok(f64::NAN),
        Value::Null => Ok(f64::NAN),
        other => Err(format!("column {idx} is not a number: {other}")),
    }
}
