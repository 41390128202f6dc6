//! Data preprocessing transformers for machine learning pipelines.
//!
//! # Design Philosophy
//!
//! - **Fit/transform split**: hyperparameters live in unfitted
//!   [`Transformer`]s; fitting produces an immutable [`FittedTransformer`]
//! - **Serializable**: fitted transformers can be saved and loaded
//! - **sklearn-compatible**: API familiar to users of scikit-learn
//!
//! # Core Traits
//!
//! - [`Transformer`]: Unfitted transformer with hyperparameters
//! - [`FittedTransformer`]: Fitted transformer ready for inference
//!
//! # Available Transformers
//!
//! ## Encoding
//! - [`HierarchicalEncoder`]: hierarchical target encoding with smoothed backoff
//!
//! # Example
//!
//! ```ignore
//! use hierarchical_encoder::preprocessing::{HierarchicalEncoder, StepFunction, Aggregation};
//!
//! let mut encoder = HierarchicalEncoder::new(
//!     vec!["country", "state", "city"],
//!     Aggregation::Mean,
//!     StepFunction::new(20),
//! )?;
//! encoder.fit(&train, &target)?;
//!
//! let encoded = encoder.transform(&test)?;
//!
//! // Save the fitted level tables for later use
//! encoder.fitted()?.save_to_file("encoder.bin")?;
//! ```

pub mod encoding;
pub mod error;
pub mod traits;

// Re-export main types
pub use encoding::{
    Aggregation, Columns, ConvexCombination, Credibility, FittedHierarchicalEncoder, FnSmoothing,
    HierarchicalEncoder, HierarchicalEncoderConfig, HierarchicalEncoderParams,
    HierarchicalEncoderSettings, LevelRow, LevelTable, Smoothing, SmoothingConfig, StepFunction,
};
pub use error::{EncodingError, Result};
pub use traits::{FittedTransformer, Transformer};
