//! Typed columns and the category keys derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A group key read from a categorical or integer column.
///
/// Keys are totally ordered so level tables come out sorted. A `Code` never
/// equals a `Label`, even when the label spells the same number.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Integer category code.
    Code(i64),
    /// String category label.
    Label(String),
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Code(code) => write!(f, "{}", code),
            Category::Label(label) => write!(f, "{}", label),
        }
    }
}

impl From<&str> for Category {
    fn from(label: &str) -> Self {
        Category::Label(label.to_string())
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::Label(label)
    }
}

impl From<i64> for Category {
    fn from(code: i64) -> Self {
        Category::Code(code)
    }
}

/// A single named column of a [`Frame`](super::Frame).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Column {
    /// String labels.
    Categorical(Vec<String>),
    /// Integer codes.
    Integer(Vec<i64>),
    /// Floating point values. Cannot be used as a grouping column.
    Numeric(Vec<f64>),
}

impl Column {
    /// Number of rows in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::Categorical(values) => values.len(),
            Column::Integer(values) => values.len(),
            Column::Numeric(values) => values.len(),
        }
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short name of the column's value type.
    pub fn kind(&self) -> &'static str {
        match self {
            Column::Categorical(_) => "categorical",
            Column::Integer(_) => "integer",
            Column::Numeric(_) => "numeric",
        }
    }

    /// Whether values of this column can serve as group keys.
    pub fn is_groupable(&self) -> bool {
        !matches!(self, Column::Numeric(_))
    }

    /// Group key at `row`, or `None` for numeric columns and out-of-range rows.
    pub fn category(&self, row: usize) -> Option<Category> {
        match self {
            Column::Categorical(values) => values.get(row).map(|v| Category::Label(v.clone())),
            Column::Integer(values) => values.get(row).map(|&v| Category::Code(v)),
            Column::Numeric(_) => None,
        }
    }

    /// Borrow the values of a numeric column.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            Column::Numeric(values) => Some(values),
            _ => None,
        }
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Column::Categorical(values)
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::Categorical(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<i64>> for Column {
    fn from(values: Vec<i64>) -> Self {
        Column::Integer(values)
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::Numeric(values)
    }
}
