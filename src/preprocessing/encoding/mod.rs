//! Categorical feature encoding transformers.
//!
//! This module provides supervised encoders that turn categorical columns of a
//! [`Frame`](crate::frame::Frame) into numeric features using a target.
//!
//! # Available Encoders
//!
//! ## HierarchicalEncoder
//! Encodes an ordered hierarchy of categorical columns (e.g. country, state,
//! city) with a smoothed target aggregate, backing off to coarser levels for
//! sparse or unseen combinations.
//!
//! ```ignore
//! // Input: country/city columns plus a numeric target
//! // Output: the same frame plus one `__encoding__` column
//! ```

pub mod hierarchical;

pub use hierarchical::{
    Aggregation, Columns, ConvexCombination, Credibility, FittedHierarchicalEncoder, FnSmoothing,
    HierarchicalEncoder, HierarchicalEncoderConfig, HierarchicalEncoderParams,
    HierarchicalEncoderSettings, LevelRow, LevelTable, Smoothing, SmoothingConfig, StepFunction,
};
