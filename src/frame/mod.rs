//! In-memory tables of named, typed columns.
//!
//! A [`Frame`] is the feature table consumed by the encoder: rows x named
//! columns, where grouping columns hold categorical labels or integer codes.
//! Every column has the same number of rows and names are unique.
//!
//! # Example
//!
//! ```rust
//! use hierarchical_encoder::frame::Frame;
//!
//! let frame = Frame::new()
//!     .with_column("country", vec!["fr", "fr", "de"])
//!     .unwrap()
//!     .with_column("city", vec!["paris", "lyon", "berlin"])
//!     .unwrap();
//!
//! assert_eq!(frame.shape(), (3, 2));
//! ```

mod column;

pub use column::{Category, Column};

use crate::preprocessing::error::{EncodingError, Result};
use serde::{Deserialize, Serialize};

/// A table of equally long, uniquely named columns.
///
/// Deserialized frames are rebuilt column by column, so they obey the same
/// checks as [`Frame::push_column`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFrame")]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl Frame {
    /// Create an empty frame with no columns and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, consuming and returning the frame.
    pub fn with_column(mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<Self> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Append a column in place.
    ///
    /// The first column fixes the row count; later columns must match it.
    pub fn push_column(&mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<()> {
        let name = name.into();
        let column = column.into();

        if self.contains(&name) {
            return Err(EncodingError::InvalidConfiguration(format!(
                "duplicate column name '{}'",
                name
            )));
        }
        if !self.columns.is_empty() && column.len() != self.n_rows {
            return Err(EncodingError::ShapeMismatch {
                expected: self.n_rows,
                got: column.len(),
            });
        }

        if self.columns.is_empty() {
            self.n_rows = column.len();
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.columns.len())
    }

    /// Column names in order.
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Whether a column with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Look a column up by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| &self.columns[idx])
    }

    /// Iterate over `(name, column)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }

    /// Look up a column that will be used as a group key.
    ///
    /// # Errors
    /// - [`EncodingError::MissingColumn`] if the column is absent
    /// - [`EncodingError::InvalidColumnType`] if it holds floating point values
    pub fn group_column(&self, name: &str) -> Result<&Column> {
        let column = self
            .column(name)
            .ok_or_else(|| EncodingError::MissingColumn(name.to_string()))?;
        if !column.is_groupable() {
            return Err(EncodingError::InvalidColumnType {
                column: name.to_string(),
                expected: "categorical or integer".to_string(),
            });
        }
        Ok(column)
    }

    /// Resolve several grouping columns at once, in the given order.
    pub fn group_columns(&self, names: &[String]) -> Result<Vec<&Column>> {
        names.iter().map(|name| self.group_column(name)).collect()
    }
}

/// Unvalidated wire form of a [`Frame`].
#[derive(Deserialize)]
struct RawFrame {
    names: Vec<String>,
    columns: Vec<Column>,
    n_rows: usize,
}

impl TryFrom<RawFrame> for Frame {
    type Error = EncodingError;

    fn try_from(raw: RawFrame) -> Result<Self> {
        if raw.names.len() != raw.columns.len() {
            return Err(EncodingError::ShapeMismatch {
                expected: raw.names.len(),
                got: raw.columns.len(),
            });
        }

        let mut frame = Frame::new();
        for (name, column) in raw.names.into_iter().zip(raw.columns) {
            frame.push_column(name, column)?;
        }
        if frame.n_rows != raw.n_rows {
            return Err(EncodingError::ShapeMismatch {
                expected: raw.n_rows,
                got: frame.n_rows,
            });
        }
        Ok(frame)
    }
}

/// Build the group key of `row` from already resolved columns.
///
/// Every column must yield a category for `row`; a short key would silently
/// match a coarser level.
pub(crate) fn row_key(columns: &[&Column], row: usize) -> Result<Vec<Category>> {
    columns
        .iter()
        .map(|column| {
            column.category(row).ok_or_else(|| {
                EncodingError::TransformIntegrityError(format!(
                    "no group key at row {} in a column of {} rows",
                    row,
                    column.len()
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame::new()
            .with_column("a", vec!["x", "y", "x"])
            .unwrap()
            .with_column("b", vec![1i64, 2, 3])
            .unwrap()
    }

    #[test]
    fn test_frame_shape() {
        let frame = sample();
        assert_eq!(frame.shape(), (3, 2));
        assert_eq!(frame.n_rows(), 3);
        assert_eq!(frame.n_columns(), 2);
        assert_eq!(frame.column_names(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_frame_empty() {
        let frame = Frame::new();
        assert_eq!(frame.shape(), (0, 0));
        assert!(frame.column("a").is_none());
    }

    #[test]
    fn test_frame_duplicate_column() {
        let result = sample().with_column("a", vec!["p", "q", "r"]);
        assert!(matches!(
            result,
            Err(EncodingError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_frame_length_mismatch() {
        let result = sample().with_column("c", vec!["p"]);
        assert!(matches!(
            result,
            Err(EncodingError::ShapeMismatch {
                expected: 3,
                got: 1
            })
        ));
    }

    #[test]
    fn test_group_column_missing() {
        let frame = sample();
        assert!(matches!(
            frame.group_column("zzz"),
            Err(EncodingError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_group_column_numeric_rejected() {
        let frame = sample().with_column("price", vec![1.5f64, 2.5, 3.5]).unwrap();
        assert!(matches!(
            frame.group_column("price"),
            Err(EncodingError::InvalidColumnType { .. })
        ));
    }

    #[test]
    fn test_row_key() {
        let frame = sample();
        let cols = frame
            .group_columns(&["a".to_string(), "b".to_string()])
            .unwrap();
        assert_eq!(
            row_key(&cols, 2).unwrap(),
            vec![Category::from("x"), Category::Code(3)]
        );
    }

    #[test]
    fn test_row_key_out_of_range() {
        let frame = sample();
        let cols = frame.group_columns(&["a".to_string()]).unwrap();
        assert!(matches!(
            row_key(&cols, 3),
            Err(EncodingError::TransformIntegrityError(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let frame = sample();
        let json = serde_json::to_string(&frame).unwrap();
        let parsed: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn test_deserialize_rejects_ragged_columns() {
        let raw = RawFrame {
            names: vec!["a".to_string(), "b".to_string()],
            columns: vec![vec!["x", "y", "z"].into(), vec!["p"].into()],
            n_rows: 3,
        };
        assert!(matches!(
            Frame::try_from(raw),
            Err(EncodingError::ShapeMismatch {
                expected: 3,
                got: 1
            })
        ));
    }

    #[test]
    fn test_deserialize_rejects_duplicate_names() {
        let raw = RawFrame {
            names: vec!["a".to_string(), "b".to_string(), "a".to_string()],
            columns: vec![
                vec!["x", "y", "z"].into(),
                vec!["p", "q", "r"].into(),
                vec!["s", "t", "u"].into(),
            ],
            n_rows: 3,
        };
        assert!(matches!(
            Frame::try_from(raw),
            Err(EncodingError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_deserialize_rejects_wrong_row_count() {
        let raw = RawFrame {
            names: vec!["a".to_string()],
            columns: vec![vec!["x", "y"].into()],
            n_rows: 5,
        };
        assert!(matches!(
            Frame::try_from(raw),
            Err(EncodingError::ShapeMismatch {
                expected: 5,
                got: 2
            })
        ));
    }

    #[test]
    fn test_deserialize_ragged_json_fails() {
        let json = r#"{
            "names": ["a", "b", "a"],
            "columns": [
                {"Categorical": ["x", "y", "z"]},
                {"Categorical": ["p"]},
                {"Categorical": []}
            ],
            "n_rows": 3
        }"#;
        let err = serde_json::from_str::<Frame>(json).unwrap_err();
        assert!(err
            .to_string()
            .contains("Shape mismatch: expected 3 rows, got 1"));
    }

    #[test]
    fn test_iter_preserves_order() {
        let frame = sample();
        let names: Vec<&str> = frame.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
