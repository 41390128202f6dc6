//! Level tables and the builder that produces them.
//!
//! Level 0 holds a single row aggregating the whole target. Level `i` groups
//! rows by the first `i` grouping columns; each group's raw aggregate is
//! blended with its parent's (already smoothed) level `i - 1` value:
//!
//! ```text
//! level 0   ()                 -> agg(all)
//! level 1   (country)          -> smooth(agg(country), n, level0[()])
//! level 2   (country, state)   -> smooth(agg(country, state), n, level1[(country)])
//! ```

use crate::frame::{row_key, Category, Column, Frame};
use crate::preprocessing::encoding::hierarchical::aggregation::Aggregation;
use crate::preprocessing::encoding::hierarchical::smoothing::Smoothing;
use crate::preprocessing::error::{EncodingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// One group of a level table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelRow {
    /// Category of each grouping column, in grouping order.
    pub keys: Vec<Category>,
    /// Number of training rows in the group.
    pub count: usize,
    /// Smoothed aggregate of the group.
    pub value: f64,
}

/// Aggregates for every observed category combination at one depth.
///
/// Rows are kept in key order. Tables are immutable once built.
#[derive(Clone, Debug)]
pub struct LevelTable {
    columns: Vec<String>,
    rows: Vec<LevelRow>,
    index: HashMap<Vec<Category>, usize>,
}

impl PartialEq for LevelTable {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.rows == other.rows
    }
}

impl LevelTable {
    /// Build a table from ordered rows, indexing them by key.
    ///
    /// # Errors
    /// [`EncodingError::TransformIntegrityError`] if a key has the wrong width,
    /// a key appears twice, or a value is not finite.
    pub(crate) fn from_rows(columns: Vec<String>, rows: Vec<LevelRow>) -> Result<Self> {
        let mut index = HashMap::with_capacity(rows.len());
        for (pos, row) in rows.iter().enumerate() {
            if row.keys.len() != columns.len() {
                return Err(EncodingError::TransformIntegrityError(format!(
                    "level {} row has {} keys, expected {}",
                    columns.len(),
                    row.keys.len(),
                    columns.len()
                )));
            }
            if !row.value.is_finite() {
                return Err(EncodingError::TransformIntegrityError(format!(
                    "level {} row {:?} has non-finite value {}",
                    columns.len(),
                    row.keys,
                    row.value
                )));
            }
            if index.insert(row.keys.clone(), pos).is_some() {
                return Err(EncodingError::TransformIntegrityError(format!(
                    "level {} has duplicate key {:?}",
                    columns.len(),
                    row.keys
                )));
            }
        }
        Ok(Self {
            columns,
            rows,
            index,
        })
    }

    /// Level index: 0 for the global table, `i` for the first `i` columns.
    pub fn depth(&self) -> usize {
        self.columns.len()
    }

    /// Grouping columns of this level, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in key order.
    pub fn rows(&self) -> &[LevelRow] {
        &self.rows
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no groups.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a group by its full key.
    pub fn get(&self, keys: &[Category]) -> Option<&LevelRow> {
        self.index.get(keys).map(|&pos| &self.rows[pos])
    }

    /// Smoothed aggregate of a group, if the combination was seen.
    pub fn value(&self, keys: &[Category]) -> Option<f64> {
        self.get(keys).map(|row| row.value)
    }

    /// Render the table as a frame: grouping columns followed by `value_column`.
    ///
    /// Columns whose keys are all codes become integer columns; anything else
    /// is rendered as labels.
    pub fn to_frame(&self, value_column: &str) -> Result<Frame> {
        let mut frame = Frame::new();
        for (idx, name) in self.columns.iter().enumerate() {
            let codes: Option<Vec<i64>> = self
                .rows
                .iter()
                .map(|row| match &row.keys[idx] {
                    Category::Code(code) => Some(*code),
                    Category::Label(_) => None,
                })
                .collect();
            let column = match codes {
                Some(codes) => Column::Integer(codes),
                None => Column::Categorical(
                    self.rows
                        .iter()
                        .map(|row| row.keys[idx].to_string())
                        .collect(),
                ),
            };
            frame.push_column(name.clone(), column)?;
        }
        let values: Vec<f64> = self.rows.iter().map(|row| row.value).collect();
        frame.push_column(value_column, values)?;
        Ok(frame)
    }
}

/// Build one level table per hierarchy level, root first.
///
/// Returns `group_columns.len() + 1` tables; table `i` is grouped by
/// `group_columns[..i]`.
///
/// # Errors
/// - [`EncodingError::ShapeMismatch`] if `data` and `target` differ in length
/// - [`EncodingError::EmptyData`] if there are no rows
/// - [`EncodingError::MissingColumn`] / [`EncodingError::InvalidColumnType`]
///   for unusable grouping columns
/// - [`EncodingError::AggregationError`] if the reducer or the smoothing
///   breaks its contract
pub fn build_levels(
    data: &Frame,
    target: &[f64],
    group_columns: &[String],
    aggregation: &Aggregation,
    smoothing: &dyn Smoothing,
) -> Result<Vec<LevelTable>> {
    let n_rows = data.n_rows();
    if n_rows != target.len() {
        return Err(EncodingError::ShapeMismatch {
            expected: n_rows,
            got: target.len(),
        });
    }
    if n_rows == 0 {
        return Err(EncodingError::EmptyData(
            "Cannot build level tables from zero rows".to_string(),
        ));
    }
    if group_columns.is_empty() {
        return Err(EncodingError::InvalidConfiguration(
            "at least one grouping column is required".to_string(),
        ));
    }

    let columns = data.group_columns(group_columns)?;

    let root_value = aggregation
        .reduce(target)
        .map_err(|msg| aggregation_error(aggregation, 0, &[], &msg))?;
    let root = LevelTable::from_rows(
        Vec::new(),
        vec![LevelRow {
            keys: Vec::new(),
            count: n_rows,
            value: root_value,
        }],
    )?;
    debug!(level = 0, value = root_value, rows = n_rows, "built root level");

    let mut levels = Vec::with_capacity(group_columns.len() + 1);
    levels.push(root);

    for depth in 1..=group_columns.len() {
        let mut groups: BTreeMap<Vec<Category>, Vec<f64>> = BTreeMap::new();
        for (row, &y) in target.iter().enumerate() {
            groups
                .entry(row_key(&columns[..depth], row)?)
                .or_default()
                .push(y);
        }

        let parent = &levels[depth - 1];
        let mut keys = Vec::with_capacity(groups.len());
        let mut raw = Vec::with_capacity(groups.len());
        let mut counts = Vec::with_capacity(groups.len());
        let mut priors = Vec::with_capacity(groups.len());

        for (key, values) in groups {
            let value = aggregation
                .reduce(&values)
                .map_err(|msg| aggregation_error(aggregation, depth, &key, &msg))?;
            let prior = parent.value(&key[..depth - 1]).ok_or_else(|| {
                EncodingError::TransformIntegrityError(format!(
                    "level {} group {:?} has no parent at level {}",
                    depth,
                    key,
                    depth - 1
                ))
            })?;
            keys.push(key);
            raw.push(value);
            counts.push(values.len());
            priors.push(prior);
        }

        let smoothed = smoothing.smooth(&raw, &counts, &priors);
        if smoothed.len() != keys.len() {
            return Err(EncodingError::AggregationError(format!(
                "smoothing {:?} returned {} values for {} groups at level {}",
                smoothing,
                smoothed.len(),
                keys.len(),
                depth
            )));
        }
        if let Some(pos) = smoothed.iter().position(|v| !v.is_finite()) {
            return Err(EncodingError::AggregationError(format!(
                "smoothing {:?} produced non-finite value for group {:?} at level {}",
                smoothing, keys[pos], depth
            )));
        }

        let rows = keys
            .into_iter()
            .zip(counts)
            .zip(smoothed)
            .map(|((keys, count), value)| LevelRow { keys, count, value })
            .collect();
        let table = LevelTable::from_rows(group_columns[..depth].to_vec(), rows)?;
        debug!(
            level = depth,
            column = %group_columns[depth - 1],
            groups = table.len(),
            "built level table"
        );
        levels.push(table);
    }

    Ok(levels)
}

fn aggregation_error(
    aggregation: &Aggregation,
    depth: usize,
    key: &[Category],
    msg: &str,
) -> EncodingError {
    EncodingError::AggregationError(format!(
        "{} failed at level {} for group {:?}: {}",
        aggregation.name(),
        depth,
        key,
        msg
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::encoding::hierarchical::smoothing::{FnSmoothing, StepFunction};
    use approx::assert_abs_diff_eq;

    fn simple_data() -> (Frame, Vec<f64>) {
        let frame = Frame::new()
            .with_column("column1", vec!["0", "0", "0", "0", "1", "1", "1", "1"])
            .unwrap()
            .with_column("column2", vec!["0", "0", "1", "1", "0", "0", "1", "1"])
            .unwrap();
        (frame, vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0])
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn key(labels: &[&str]) -> Vec<Category> {
        labels.iter().map(|&l| Category::from(l)).collect()
    }

    #[test]
    fn test_builds_one_table_per_level() {
        let (frame, y) = simple_data();
        let levels = build_levels(
            &frame,
            &y,
            &cols(&["column1", "column2"]),
            &Aggregation::Mean,
            &StepFunction::new(1),
        )
        .unwrap();

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0].len(), 1);
        assert_eq!(levels[1].len(), 2);
        assert_eq!(levels[2].len(), 4);
        assert_eq!(levels[2].columns(), &cols(&["column1", "column2"])[..]);
        assert_abs_diff_eq!(levels[0].value(&[]).unwrap(), 1.5);
        assert_eq!(levels[0].rows()[0].count, 8);
    }

    #[test]
    fn test_rows_are_sorted_by_key() {
        let frame = Frame::new()
            .with_column("c", vec!["b", "a", "c", "a"])
            .unwrap();
        let levels = build_levels(
            &frame,
            &[1.0, 2.0, 3.0, 4.0],
            &cols(&["c"]),
            &Aggregation::Sum,
            &StepFunction::new(0),
        )
        .unwrap();
        let labels: Vec<String> = levels[1]
            .rows()
            .iter()
            .map(|r| r.keys[0].to_string())
            .collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        assert_abs_diff_eq!(levels[1].value(&key(&["a"])).unwrap(), 6.0);
    }

    #[test]
    fn test_step_falls_back_to_parent() {
        let (frame, y) = simple_data();
        let levels = build_levels(
            &frame,
            &y,
            &cols(&["column1", "column2"]),
            &Aggregation::Mean,
            &StepFunction::new(4),
        )
        .unwrap();
        // Level 1 groups have 4 rows each and keep their own mean.
        assert_abs_diff_eq!(levels[1].value(&key(&["0"])).unwrap(), 0.5);
        assert_abs_diff_eq!(levels[1].value(&key(&["1"])).unwrap(), 2.5);
        // Level 2 groups have 2 rows and inherit level 1.
        assert_abs_diff_eq!(levels[2].value(&key(&["0", "1"])).unwrap(), 0.5);
        assert_abs_diff_eq!(levels[2].value(&key(&["1", "0"])).unwrap(), 2.5);
        assert_eq!(levels[2].get(&key(&["1", "0"])).unwrap().count, 2);
    }

    #[test]
    fn test_shape_mismatch() {
        let (frame, _) = simple_data();
        let result = build_levels(
            &frame,
            &[1.0, 2.0],
            &cols(&["column1"]),
            &Aggregation::Mean,
            &StepFunction::new(1),
        );
        assert!(matches!(
            result,
            Err(EncodingError::ShapeMismatch {
                expected: 8,
                got: 2
            })
        ));
    }

    #[test]
    fn test_empty_data() {
        let frame = Frame::new().with_column("c", Vec::<String>::new()).unwrap();
        let result = build_levels(
            &frame,
            &[],
            &cols(&["c"]),
            &Aggregation::Mean,
            &StepFunction::new(1),
        );
        assert!(matches!(result, Err(EncodingError::EmptyData(_))));
    }

    #[test]
    fn test_missing_group_column() {
        let (frame, y) = simple_data();
        let result = build_levels(
            &frame,
            &y,
            &cols(&["nope"]),
            &Aggregation::Mean,
            &StepFunction::new(1),
        );
        assert!(matches!(result, Err(EncodingError::MissingColumn(_))));
    }

    #[test]
    fn test_wrong_length_smoothing_is_aggregation_error() {
        let (frame, y) = simple_data();
        let broken = FnSmoothing::new("truncate", |_: &[f64], _: &[usize], _: &[f64]| vec![0.0]);
        let result = build_levels(
            &frame,
            &y,
            &cols(&["column1"]),
            &Aggregation::Mean,
            &broken,
        );
        assert!(matches!(result, Err(EncodingError::AggregationError(_))));
    }

    #[test]
    fn test_failing_aggregation_reports_level() {
        let (frame, y) = simple_data();
        let picky = Aggregation::custom("picky", |v: &[f64]| {
            if v.len() < 8 {
                Err("too few values".to_string())
            } else {
                Ok(v[0])
            }
        });
        match build_levels(&frame, &y, &cols(&["column1"]), &picky, &StepFunction::new(1)) {
            Err(EncodingError::AggregationError(msg)) => {
                assert!(msg.contains("level 1"));
                assert!(msg.contains("picky"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_integer_columns_group() {
        let frame = Frame::new()
            .with_column("code", vec![10i64, 10, 20])
            .unwrap();
        let levels = build_levels(
            &frame,
            &[1.0, 3.0, 5.0],
            &cols(&["code"]),
            &Aggregation::Mean,
            &StepFunction::new(1),
        )
        .unwrap();
        assert_abs_diff_eq!(levels[1].value(&[Category::Code(10)]).unwrap(), 2.0);
        assert!(levels[1].value(&[Category::from("10")]).is_none());
    }

    #[test]
    fn test_from_rows_rejects_duplicates() {
        let row = LevelRow {
            keys: key(&["a"]),
            count: 1,
            value: 1.0,
        };
        let result = LevelTable::from_rows(cols(&["c"]), vec![row.clone(), row]);
        assert!(matches!(
            result,
            Err(EncodingError::TransformIntegrityError(_))
        ));
    }

    #[test]
    fn test_to_frame() {
        let (frame, y) = simple_data();
        let levels = build_levels(
            &frame,
            &y,
            &cols(&["column1", "column2"]),
            &Aggregation::Mean,
            &StepFunction::new(1),
        )
        .unwrap();
        let table = levels[2].to_frame("__encoding__").unwrap();
        assert_eq!(table.shape(), (4, 3));
        assert_eq!(
            table.column("__encoding__").and_then(|c| c.as_numeric()),
            Some(&[0.0, 1.0, 2.0, 3.0][..])
        );
    }
}
