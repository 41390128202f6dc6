//! Hierarchical target encoding with smoothed backoff.
//!
//! Given ordered grouping columns (e.g. `country`, `state`, `city`), the
//! encoder aggregates the target at every prefix of the hierarchy and blends
//! each level with its parent through a [`Smoothing`] rule. At transform time
//! each row takes the value of the deepest level that saw its category
//! combination, falling back level by level to the global aggregate.
//!
//! Two surfaces are provided:
//! - [`HierarchicalEncoderSettings`] + [`FittedHierarchicalEncoder`]: the
//!   [`Transformer`] / [`FittedTransformer`] pair, where fitting returns a new
//!   immutable value.
//! - [`HierarchicalEncoder`]: a stateful wrapper that is fitted in place and
//!   reports [`EncodingError::NotFitted`] when used too early.
//!
//! # Example
//! ```rust
//! use hierarchical_encoder::frame::Frame;
//! use hierarchical_encoder::preprocessing::encoding::hierarchical::{
//!     Aggregation, HierarchicalEncoder, StepFunction,
//! };
//!
//! let train = Frame::new()
//!     .with_column("country", vec!["fr", "fr", "de", "de"]).unwrap()
//!     .with_column("city", vec!["paris", "lyon", "berlin", "berlin"]).unwrap();
//! let target = [1.0, 3.0, 5.0, 7.0];
//!
//! let mut encoder = HierarchicalEncoder::new(
//!     vec!["country", "city"],
//!     Aggregation::Mean,
//!     StepFunction::new(1),
//! ).unwrap();
//! encoder.fit(&train, &target).unwrap();
//!
//! let test = Frame::new()
//!     .with_column("country", vec!["de", "fr", "it"]).unwrap()
//!     .with_column("city", vec!["berlin", "nice", "rome"]).unwrap();
//! let encoded = encoder.transform(&test).unwrap();
//! let values = encoded.column("__encoding__").unwrap().as_numeric().unwrap();
//! assert_eq!(values, &[6.0, 2.0, 4.0]);
//! ```
//!
//! # Concurrency
//! `fit` takes `&mut self` and `transform` takes `&self`, so one writer and
//! many readers is enforced at compile time. The fitted state is an
//! `Arc<FittedHierarchicalEncoder>` and can be handed to other threads with
//! [`HierarchicalEncoder::fitted`].

mod aggregation;
mod config;
mod fitted;
mod levels;
mod smoothing;

pub use aggregation::{AggregateFn, Aggregation, CustomAggregation};
pub use config::{Columns, HierarchicalEncoderConfig, SmoothingConfig};
pub use fitted::{FittedHierarchicalEncoder, HierarchicalEncoderParams};
pub use levels::{build_levels, LevelRow, LevelTable};
pub use smoothing::{ConvexCombination, Credibility, FnSmoothing, Smoothing, StepFunction};

use crate::frame::Frame;
use crate::preprocessing::error::{EncodingError, Result};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Default name of the synthetic target column.
pub const DEFAULT_TARGET_COLUMN: &str = "__target__";
/// Default name of the column appended by `transform`.
pub const DEFAULT_ENCODING_COLUMN: &str = "__encoding__";

/// Hyperparameters of a hierarchical encoder (unfitted).
#[derive(Clone, Debug)]
pub struct HierarchicalEncoderSettings {
    columns: Vec<String>,
    aggregation: Aggregation,
    smoothing: Arc<dyn Smoothing>,
    target_column: String,
    encoding_column: String,
}

impl HierarchicalEncoderSettings {
    /// Create settings for the given grouping columns, coarsest first.
    ///
    /// # Errors
    /// [`EncodingError::InvalidConfiguration`] if no column is given, a name is
    /// empty or repeated, or a name collides with the reserved target or
    /// encoding column.
    pub fn new(
        columns: impl Into<Columns>,
        aggregation: Aggregation,
        smoothing: impl Smoothing + 'static,
    ) -> Result<Self> {
        let settings = Self {
            columns: columns.into().into_vec(),
            aggregation,
            smoothing: Arc::new(smoothing),
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            encoding_column: DEFAULT_ENCODING_COLUMN.to_string(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Rename the synthetic target column.
    pub fn with_target_column(mut self, name: impl Into<String>) -> Result<Self> {
        self.target_column = name.into();
        self.validate()?;
        Ok(self)
    }

    /// Rename the column appended by `transform`.
    pub fn with_encoding_column(mut self, name: impl Into<String>) -> Result<Self> {
        self.encoding_column = name.into();
        self.validate()?;
        Ok(self)
    }

    /// Grouping columns, coarsest first.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The reducer applied within each group.
    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    /// The smoothing rule applied between levels.
    pub fn smoothing(&self) -> &dyn Smoothing {
        self.smoothing.as_ref()
    }

    /// Name of the synthetic target column.
    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// Name of the column appended by `transform`.
    pub fn encoding_column(&self) -> &str {
        &self.encoding_column
    }

    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(EncodingError::InvalidConfiguration(
                "at least one grouping column is required".to_string(),
            ));
        }
        let mut seen = HashSet::with_capacity(self.columns.len());
        for name in &self.columns {
            if name.is_empty() {
                return Err(EncodingError::InvalidConfiguration(
                    "grouping column names must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(EncodingError::InvalidConfiguration(format!(
                    "grouping column '{}' is listed twice",
                    name
                )));
            }
        }
        for (role, name) in [
            ("target", &self.target_column),
            ("encoding", &self.encoding_column),
        ] {
            if name.is_empty() {
                return Err(EncodingError::InvalidConfiguration(format!(
                    "{} column name must not be empty",
                    role
                )));
            }
            if seen.contains(name.as_str()) {
                return Err(EncodingError::InvalidConfiguration(format!(
                    "{} column '{}' collides with a grouping column",
                    role, name
                )));
            }
        }
        if self.target_column == self.encoding_column {
            return Err(EncodingError::InvalidConfiguration(format!(
                "target and encoding columns are both named '{}'",
                self.target_column
            )));
        }
        Ok(())
    }
}

impl Transformer for HierarchicalEncoderSettings {
    type Input = Frame;
    type Output = Frame;
    type Params = HierarchicalEncoderParams;
    type Fitted = FittedHierarchicalEncoder;

    fn fit(&self, data: &Self::Input, target: &[f64]) -> Result<Self::Fitted> {
        if data.n_rows() != target.len() {
            return Err(EncodingError::ShapeMismatch {
                expected: data.n_rows(),
                got: target.len(),
            });
        }
        if data.contains(&self.target_column) {
            return Err(EncodingError::InvalidConfiguration(format!(
                "target column '{}' collides with an input column",
                self.target_column
            )));
        }

        let levels = build_levels(
            data,
            target,
            &self.columns,
            &self.aggregation,
            self.smoothing.as_ref(),
        )?;
        info!(
            rows = data.n_rows(),
            levels = levels.len(),
            groups = levels[levels.len() - 1].len(),
            aggregation = self.aggregation.name(),
            "fitted hierarchical encoder"
        );

        Ok(FittedHierarchicalEncoder::new(
            self.columns.clone(),
            self.encoding_column.clone(),
            levels,
        ))
    }
}

/// Stateful hierarchical encoder: unfitted until [`fit`](Self::fit) succeeds.
///
/// A failed `fit` leaves the previous state untouched; a successful one
/// replaces it entirely.
#[derive(Clone, Debug)]
pub struct HierarchicalEncoder {
    settings: HierarchicalEncoderSettings,
    state: Option<Arc<FittedHierarchicalEncoder>>,
}

impl HierarchicalEncoder {
    /// Create an unfitted encoder. See [`HierarchicalEncoderSettings::new`].
    pub fn new(
        columns: impl Into<Columns>,
        aggregation: Aggregation,
        smoothing: impl Smoothing + 'static,
    ) -> Result<Self> {
        HierarchicalEncoderSettings::new(columns, aggregation, smoothing).map(Self::from_settings)
    }

    /// Create an unfitted encoder from prepared settings.
    pub fn from_settings(settings: HierarchicalEncoderSettings) -> Self {
        Self {
            settings,
            state: None,
        }
    }

    /// Rename the synthetic target column. Discards any fitted state.
    pub fn with_target_column(self, name: impl Into<String>) -> Result<Self> {
        self.settings
            .with_target_column(name)
            .map(Self::from_settings)
    }

    /// Rename the column appended by `transform`. Discards any fitted state.
    pub fn with_encoding_column(self, name: impl Into<String>) -> Result<Self> {
        self.settings
            .with_encoding_column(name)
            .map(Self::from_settings)
    }

    /// The encoder's hyperparameters.
    pub fn settings(&self) -> &HierarchicalEncoderSettings {
        &self.settings
    }

    /// Whether a fit has succeeded.
    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    /// Build the level tables from `data` and `target`, replacing any
    /// previous fit.
    pub fn fit(&mut self, data: &Frame, target: &[f64]) -> Result<&mut Self> {
        let fitted = self.settings.fit(data, target)?;
        self.state = Some(Arc::new(fitted));
        Ok(self)
    }

    /// Fit, then transform the training data.
    pub fn fit_transform(&mut self, data: &Frame, target: &[f64]) -> Result<Frame> {
        self.fit(data, target)?;
        self.transform(data)
    }

    /// The finest level table.
    pub fn encoding(&self) -> Result<&LevelTable> {
        Ok(self.state()?.encoding())
    }

    /// All level tables, level 0 first.
    pub fn levels(&self) -> Result<&[LevelTable]> {
        Ok(self.state()?.levels())
    }

    /// Append the encoding column to `data`.
    pub fn transform(&self, data: &Frame) -> Result<Frame> {
        self.state()?.transform(data)
    }

    /// Shared handle to the fitted state.
    pub fn fitted(&self) -> Result<Arc<FittedHierarchicalEncoder>> {
        self.state.clone().ok_or(EncodingError::NotFitted)
    }

    fn state(&self) -> Result<&FittedHierarchicalEncoder> {
        self.state.as_deref().ok_or(EncodingError::NotFitted)
    }
}
