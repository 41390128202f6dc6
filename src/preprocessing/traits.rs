//! Core traits for supervised preprocessing transformers.
//!
//! This module defines the two central traits:
//! - [`Transformer`]: Used during fitting; holds hyperparameters and learns from
//!   features plus a target.
//! - [`FittedTransformer`]: After fitting; immutable, ready for inference and
//!   serialization.

use crate::preprocessing::error::{EncodingError, Result};
use crate::serialization::SerializableParams;

/// Trait for unfitted, supervised transformers.
///
/// A transformer learns parameters from training features and a numeric target
/// and can then transform new data using those learned parameters. This trait
/// represents the configurable, unfitted state.
///
/// # Example
/// ```ignore
/// use hierarchical_encoder::preprocessing::{Transformer, FittedTransformer};
///
/// let fitted = settings.fit(&frame, &target)?;
/// let encoded = fitted.transform(&new_frame)?;
/// ```
pub trait Transformer: Clone {
    /// Input data type for fitting and transformation.
    type Input;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<Params = Self::Params, Input = Self::Input, Output = Self::Output>;

    /// Fit the transformer to the training data and target.
    ///
    /// # Errors
    /// Returns [`EncodingError`] if:
    /// - Data is empty
    /// - Data and target lengths differ
    /// - Required columns are missing or have the wrong type
    fn fit(&self, data: &Self::Input, target: &[f64]) -> Result<Self::Fitted>;

    /// Fit the transformer and transform the training data in one step.
    fn fit_transform(&self, data: &Self::Input, target: &[f64]) -> Result<Self::Output> {
        let fitted = self.fit(data, target)?;
        fitted.transform(data)
    }
}

/// Trait for fitted transformers ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a round-trip.
/// - `save_to_file` / `load_from_file` are cross-platform compatible.
pub trait FittedTransformer: Clone {
    /// Input data type for transformation.
    type Input;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Transform data using learned parameters.
    fn transform(&self, data: &Self::Input) -> Result<Self::Output>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters.
    fn from_params(params: Self::Params) -> Result<Self>
    where
        Self: Sized;

    /// Save the fitted transformer to a file.
    fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let params = self.extract_params();
        let bytes = params
            .to_bytes()
            .map_err(|e| EncodingError::SerializationError(e.to_string()))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load a fitted transformer from a file.
    fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self>
    where
        Self: Sized,
    {
        let bytes = std::fs::read(path)?;
        let params = Self::Params::from_bytes(&bytes)
            .map_err(|e| EncodingError::SerializationError(e.to_string()))?;
        Self::from_params(params)
    }

    /// Names of the input columns the transformer reads.
    fn feature_names_in(&self) -> &[String];
}
