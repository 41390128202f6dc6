//! Declarative encoder configuration.
//!
//! ```json
//! {
//!   "columns": ["country", "state", "city"],
//!   "aggregation": "mean",
//!   "smoothing": { "kind": "step", "min_samples": 20 }
//! }
//! ```

use super::{
    Aggregation, ConvexCombination, Credibility, HierarchicalEncoder, HierarchicalEncoderSettings,
    Smoothing, StepFunction, DEFAULT_ENCODING_COLUMN, DEFAULT_TARGET_COLUMN,
};
use crate::preprocessing::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Grouping columns: a single name or an ordered list, coarsest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Columns {
    /// One grouping column.
    Single(String),
    /// Several grouping columns, coarsest first.
    List(Vec<String>),
}

impl Columns {
    /// The column names in order.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Columns::Single(name) => vec![name],
            Columns::List(names) => names,
        }
    }
}

impl From<&str> for Columns {
    fn from(name: &str) -> Self {
        Columns::Single(name.to_string())
    }
}

impl From<String> for Columns {
    fn from(name: String) -> Self {
        Columns::Single(name)
    }
}

impl From<Vec<String>> for Columns {
    fn from(names: Vec<String>) -> Self {
        Columns::List(names)
    }
}

impl From<Vec<&str>> for Columns {
    fn from(names: Vec<&str>) -> Self {
        Columns::List(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for Columns {
    fn from(names: &[&str]) -> Self {
        Columns::List(names.iter().map(|s| s.to_string()).collect())
    }
}

/// Built-in smoothing rules with their parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SmoothingConfig {
    /// [`StepFunction`]; negative thresholds are rejected by [`build`](Self::build).
    Step { min_samples: i64 },
    /// [`ConvexCombination`] over `[x_min, x_max]`.
    ConvexCombination { x_min: f64, x_max: f64 },
    /// [`Credibility`] with the given parent pseudo-count.
    Credibility { prior_weight: f64 },
}

impl SmoothingConfig {
    /// Validate the parameters and construct the smoothing rule.
    pub fn build(&self) -> Result<Arc<dyn Smoothing>> {
        Ok(match *self {
            SmoothingConfig::Step { min_samples } => {
                Arc::new(StepFunction::try_from_signed(min_samples)?)
            }
            SmoothingConfig::ConvexCombination { x_min, x_max } => {
                Arc::new(ConvexCombination::new(x_min, x_max)?)
            }
            SmoothingConfig::Credibility { prior_weight } => {
                Arc::new(Credibility::new(prior_weight)?)
            }
        })
    }
}

/// Serializable description of a [`HierarchicalEncoder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HierarchicalEncoderConfig {
    /// Grouping columns, coarsest first.
    pub columns: Columns,
    /// Name of a built-in aggregation (`mean`, `sum`, `median`, `count`, `min`, `max`).
    #[serde(default = "default_aggregation")]
    pub aggregation: String,
    /// Smoothing rule applied between levels.
    pub smoothing: SmoothingConfig,
    /// Name of the synthetic target column.
    #[serde(default = "default_target_column")]
    pub target_column: String,
    /// Name of the column appended by `transform`.
    #[serde(default = "default_encoding_column")]
    pub encoding_column: String,
}

fn default_aggregation() -> String {
    "mean".to_string()
}

fn default_target_column() -> String {
    DEFAULT_TARGET_COLUMN.to_string()
}

fn default_encoding_column() -> String {
    DEFAULT_ENCODING_COLUMN.to_string()
}

impl HierarchicalEncoderConfig {
    /// Parse a configuration from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration and build the encoder settings.
    pub fn settings(&self) -> Result<HierarchicalEncoderSettings> {
        let aggregation: Aggregation = self.aggregation.parse()?;
        let smoothing = self.smoothing.build()?;
        HierarchicalEncoderSettings::new(self.columns.clone(), aggregation, smoothing)?
            .with_target_column(self.target_column.clone())?
            .with_encoding_column(self.encoding_column.clone())
    }

    /// Validate the configuration and build an unfitted encoder.
    pub fn build(&self) -> Result<HierarchicalEncoder> {
        self.settings().map(HierarchicalEncoder::from_settings)
    }
}
