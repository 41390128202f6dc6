//! Fitted encoder state and the cascading transform.

use crate::frame::{row_key, Frame};
use crate::preprocessing::encoding::hierarchical::levels::{LevelRow, LevelTable};
use crate::preprocessing::error::{EncodingError, Result};
use crate::preprocessing::traits::FittedTransformer;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Serializable parameters for a fitted hierarchical encoder.
///
/// Each level is stored as its ordered rows; lookup indices are rebuilt by
/// [`FittedTransformer::from_params`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HierarchicalEncoderParams {
    /// Grouping columns, coarsest first.
    pub columns: Vec<String>,
    /// Name of the column appended by `transform`.
    pub encoding_column: String,
    /// Rows of every level table, level 0 first.
    pub levels: Vec<Vec<LevelRow>>,
}

/// Immutable fitted state: one level table per hierarchy level.
///
/// `transform` only reads this state, so a fitted encoder can be shared
/// across threads (e.g. behind an `Arc`) without synchronization.
#[derive(Clone, Debug, PartialEq)]
pub struct FittedHierarchicalEncoder {
    columns: Vec<String>,
    encoding_column: String,
    levels: Vec<LevelTable>,
}

impl FittedHierarchicalEncoder {
    pub(crate) fn new(columns: Vec<String>, encoding_column: String, levels: Vec<LevelTable>) -> Self {
        Self {
            columns,
            encoding_column,
            levels,
        }
    }

    /// All level tables, level 0 (global) first.
    pub fn levels(&self) -> &[LevelTable] {
        &self.levels
    }

    /// The finest level table, grouped by every configured column.
    pub fn encoding(&self) -> &LevelTable {
        // Construction guarantees at least level 0 and one grouped level.
        &self.levels[self.levels.len() - 1]
    }

    /// Global aggregate stored at level 0.
    pub fn global_value(&self) -> f64 {
        self.levels[0].rows()[0].value
    }

    /// Grouping columns, coarsest first.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Name of the column appended by `transform`.
    pub fn encoding_column(&self) -> &str {
        &self.encoding_column
    }

    /// Encoding of every row of `data`, in row order.
    pub fn transform_values(&self, data: &Frame) -> Result<Array1<f64>> {
        let (values, _) = self.cascade(data)?;
        Ok(Array1::from_vec(values))
    }

    /// Level that produced each row's encoding (0 means the global fallback).
    pub fn resolved_levels(&self, data: &Frame) -> Result<Vec<usize>> {
        let (_, sources) = self.cascade(data)?;
        Ok(sources)
    }

    /// Resolve every row against the deepest level that knows its key.
    ///
    /// Rows start unresolved; each level, deepest first, claims the rows whose
    /// key it contains. Level 0 has the empty key and claims everything left.
    fn cascade(&self, data: &Frame) -> Result<(Vec<f64>, Vec<usize>)> {
        let columns = data.group_columns(&self.columns)?;
        let n_rows = data.n_rows();

        let mut values = vec![f64::NAN; n_rows];
        let mut sources = vec![0usize; n_rows];
        let mut unresolved: Vec<usize> = (0..n_rows).collect();

        for level in self.levels.iter().rev() {
            if unresolved.is_empty() {
                break;
            }
            let depth = level.depth();
            let before = unresolved.len();
            let mut remaining = Vec::with_capacity(before);
            for row in unresolved {
                match level.value(&row_key(&columns[..depth], row)?) {
                    Some(value) => {
                        values[row] = value;
                        sources[row] = depth;
                    }
                    None => remaining.push(row),
                }
            }
            unresolved = remaining;
            trace!(
                level = depth,
                resolved = before - unresolved.len(),
                remaining = unresolved.len(),
                "resolved rows at level"
            );
        }

        if !unresolved.is_empty() {
            return Err(EncodingError::TransformIntegrityError(format!(
                "{} rows left unresolved after level 0 (first at row {})",
                unresolved.len(),
                unresolved[0]
            )));
        }

        let global = sources.iter().filter(|&&depth| depth == 0).count();
        debug!(
            rows = n_rows,
            global_fallback = global,
            "transformed rows"
        );
        Ok((values, sources))
    }
}

impl FittedTransformer for FittedHierarchicalEncoder {
    type Input = Frame;
    type Output = Frame;
    type Params = HierarchicalEncoderParams;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output> {
        if data.contains(&self.encoding_column) {
            return Err(EncodingError::InvalidConfiguration(format!(
                "input already has a column named '{}'",
                self.encoding_column
            )));
        }

        let (values, _) = self.cascade(data)?;

        let mut output = data.clone();
        output.push_column(self.encoding_column.clone(), values)?;
        if output.n_columns() != data.n_columns() + 1 || output.n_rows() != data.n_rows() {
            return Err(EncodingError::TransformIntegrityError(format!(
                "expected output shape ({}, {}), got {:?}",
                data.n_rows(),
                data.n_columns() + 1,
                output.shape()
            )));
        }
        Ok(output)
    }

    fn extract_params(&self) -> Self::Params {
        HierarchicalEncoderParams {
            columns: self.columns.clone(),
            encoding_column: self.encoding_column.clone(),
            levels: self
                .levels
                .iter()
                .map(|level| level.rows().to_vec())
                .collect(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self> {
        if params.columns.is_empty() {
            return Err(EncodingError::InvalidConfiguration(
                "at least one grouping column is required".to_string(),
            ));
        }
        if params.levels.len() != params.columns.len() + 1 {
            return Err(EncodingError::TransformIntegrityError(format!(
                "expected {} levels for {} columns, got {}",
                params.columns.len() + 1,
                params.columns.len(),
                params.levels.len()
            )));
        }
        if params.levels[0].len() != 1 {
            return Err(EncodingError::TransformIntegrityError(format!(
                "level 0 must have exactly one row, got {}",
                params.levels[0].len()
            )));
        }

        let mut levels: Vec<LevelTable> = Vec::with_capacity(params.levels.len());
        for (depth, rows) in params.levels.into_iter().enumerate() {
            let table = LevelTable::from_rows(params.columns[..depth].to_vec(), rows)?;
            if let Some(parent) = levels.last() {
                let orphan = table
                    .rows()
                    .iter()
                    .find(|row| parent.get(&row.keys[..depth - 1]).is_none());
                if let Some(row) = orphan {
                    return Err(EncodingError::TransformIntegrityError(format!(
                        "level {} group {:?} has no parent",
                        depth, row.keys
                    )));
                }
            }
            levels.push(table);
        }

        Ok(Self::new(params.columns, params.encoding_column, levels))
    }

    fn feature_names_in(&self) -> &[String] {
        &self.columns
    }
}
