//! Reducers that turn a group's target values into one number.

use crate::preprocessing::error::{EncodingError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Signature of a user-supplied reducer.
pub type AggregateFn = dyn Fn(&[f64]) -> std::result::Result<f64, String> + Send + Sync;

/// A named, user-supplied reducer.
#[derive(Clone)]
pub struct CustomAggregation {
    name: String,
    func: Arc<AggregateFn>,
}

impl CustomAggregation {
    /// Wrap a reducer. Returning `Err` or a non-finite value fails the fit.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[f64]) -> std::result::Result<f64, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Name used in logs and error messages.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomAggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomAggregation")
            .field("name", &self.name)
            .finish()
    }
}

/// How target values are reduced within a group.
#[derive(Clone, Debug, Default)]
pub enum Aggregation {
    /// Arithmetic mean.
    #[default]
    Mean,
    /// Sum of values.
    Sum,
    /// Median (average of the two middle values for even counts).
    Median,
    /// Number of values.
    Count,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
    /// User-supplied reducer.
    Custom(CustomAggregation),
}

impl Aggregation {
    /// Shorthand for [`Aggregation::Custom`].
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[f64]) -> std::result::Result<f64, String> + Send + Sync + 'static,
    {
        Aggregation::Custom(CustomAggregation::new(name, func))
    }

    /// Name of the reducer.
    pub fn name(&self) -> &str {
        match self {
            Aggregation::Mean => "mean",
            Aggregation::Sum => "sum",
            Aggregation::Median => "median",
            Aggregation::Count => "count",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Custom(custom) => custom.name(),
        }
    }

    /// Reduce `values` to a single finite number.
    ///
    /// # Errors
    /// [`EncodingError::AggregationError`] if the reducer fails or its result
    /// is NaN or infinite.
    pub fn apply(&self, values: &[f64]) -> Result<f64> {
        self.reduce(values)
            .map_err(|msg| EncodingError::AggregationError(format!("{}: {}", self.name(), msg)))
    }

    pub(crate) fn reduce(&self, values: &[f64]) -> std::result::Result<f64, String> {
        let value = match self {
            Aggregation::Count => values.len() as f64,
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Mean => {
                if values.is_empty() {
                    return Err("mean of an empty group".to_string());
                }
                values.iter().sum::<f64>() / values.len() as f64
            }
            Aggregation::Median => median(values).ok_or("median of an empty group")?,
            Aggregation::Min => values
                .iter()
                .copied()
                .reduce(f64::min)
                .ok_or("min of an empty group")?,
            Aggregation::Max => values
                .iter()
                .copied()
                .reduce(f64::max)
                .ok_or("max of an empty group")?,
            Aggregation::Custom(custom) => (custom.func)(values)?,
        };

        if !value.is_finite() {
            return Err(format!("produced non-finite value {}", value));
        }
        Ok(value)
    }
}

impl FromStr for Aggregation {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Aggregation::Mean),
            "sum" => Ok(Aggregation::Sum),
            "median" => Ok(Aggregation::Median),
            "count" => Ok(Aggregation::Count),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            other => Err(EncodingError::InvalidConfiguration(format!(
                "unknown aggregation '{}' (expected mean, sum, median, count, min or max)",
                other
            ))),
        }
    }
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    if n % 2 == 0 {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    } else {
        Some(sorted[n / 2])
    }
}
