//! # hierarchical-encoder
//!
//! Hierarchical target encoding for categorical features.
//!
//! Categorical attributes often form a hierarchy (country -> state -> city).
//! This crate encodes such a hierarchy as a single numeric feature: the target
//! is aggregated at every level, each level is smoothed toward its parent, and
//! rows are encoded with the deepest level that knows their category
//! combination.
//!
//! ## Core Design Principles
//!
//! - **Fit/Transform Separation**: fitting produces immutable level tables;
//!   transforming only reads them.
//! - **Pluggable Smoothing**: the blend between a level and its parent is a
//!   [`Smoothing`](preprocessing::Smoothing) trait object, with step,
//!   convex-combination and credibility rules provided.
//! - **Total Coverage**: the global level matches every row, so unseen
//!   categories always receive an encoding.
//!
//! ## Quick Start
//!
//! ```rust
//! use hierarchical_encoder::frame::Frame;
//! use hierarchical_encoder::preprocessing::{Aggregation, HierarchicalEncoder, StepFunction};
//!
//! let train = Frame::new()
//!     .with_column("column1", vec!["0", "0", "0", "0", "1", "1", "1", "1"]).unwrap()
//!     .with_column("column2", vec!["0", "0", "1", "1", "0", "0", "1", "1"]).unwrap();
//! let target = [0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0];
//!
//! let mut encoder = HierarchicalEncoder::new(
//!     vec!["column1", "column2"],
//!     Aggregation::Mean,
//!     StepFunction::new(1),
//! ).unwrap();
//! encoder.fit(&train, &target).unwrap();
//!
//! let test = Frame::new()
//!     .with_column("column1", vec!["1", "2"]).unwrap()
//!     .with_column("column2", vec!["2", "1"]).unwrap();
//! let encoded = encoder.transform(&test).unwrap();
//! let values = encoded.column("__encoding__").unwrap().as_numeric().unwrap();
//! assert_eq!(values, &[2.5, 1.5]);
//! ```
//!
//! ## Module Structure
//!
//! - `frame`: Named, typed columns used as encoder input and output
//! - `preprocessing`: Transformer traits, errors and the hierarchical encoder
//! - `serialization`: Byte-level persistence of fitted parameters

/// In-memory tables of named columns.
pub mod frame;

/// Data preprocessing transformers.
pub mod preprocessing;

/// Persistence of fitted transformer parameters.
pub mod serialization;

pub use frame::{Category, Column, Frame};
pub use preprocessing::{EncodingError, FittedTransformer, HierarchicalEncoder, Transformer};
