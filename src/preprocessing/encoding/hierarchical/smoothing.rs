//! Smoothing functions that blend a level's aggregate with its parent's.
//!
//! Every smoothing rule works element-wise over one level of the hierarchy:
//! for each group it receives the group's raw aggregate, its sample count, and
//! the already smoothed aggregate of its parent group, and returns the value
//! stored in the level table.
//!
//! | Rule | Result |
//! |------|--------|
//! | [`StepFunction`] | `current` if `count >= min_samples`, else `parent` |
//! | [`ConvexCombination`] | linear interpolation from `parent` to `current` as `count` goes `x_min -> x_max` |
//! | [`Credibility`] | `(n * current + w * parent) / (n + w)` |
//! | [`FnSmoothing`] | any user closure with the same signature |

use crate::preprocessing::error::{EncodingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Blend current-level aggregates with parent aggregates by sample count.
///
/// All three input slices have the same length and the returned vector must
/// have that length too. Implementations must be pure: the same inputs always
/// give the same output.
pub trait Smoothing: fmt::Debug + Send + Sync {
    /// Compute the smoothed aggregate for every group of a level.
    fn smooth(&self, current: &[f64], sample_count: &[usize], parent: &[f64]) -> Vec<f64>;
}

impl<S: Smoothing + ?Sized> Smoothing for Arc<S> {
    fn smooth(&self, current: &[f64], sample_count: &[usize], parent: &[f64]) -> Vec<f64> {
        (**self).smooth(current, sample_count, parent)
    }
}

/// Use the group's own value once it has at least `min_samples` rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFunction {
    min_samples: usize,
}

impl StepFunction {
    /// Create a step function with the given sample threshold.
    pub fn new(min_samples: usize) -> Self {
        Self { min_samples }
    }

    /// Build from an untyped threshold, rejecting negative values.
    pub fn try_from_signed(min_samples: i64) -> Result<Self> {
        usize::try_from(min_samples).map(Self::new).map_err(|_| {
            EncodingError::InvalidConfiguration(format!(
                "min_samples must be >= 0, got {}",
                min_samples
            ))
        })
    }

    /// The sample threshold.
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }
}

impl Smoothing for StepFunction {
    fn smooth(&self, current: &[f64], sample_count: &[usize], parent: &[f64]) -> Vec<f64> {
        current
            .iter()
            .zip(sample_count)
            .zip(parent)
            .map(|((&cur, &n), &prior)| if n >= self.min_samples { cur } else { prior })
            .collect()
    }
}

/// Interpolate linearly between parent and current as the count grows.
///
/// Counts are clamped to `[x_min, x_max]`; at `x_min` the parent value is
/// used, at `x_max` the group's own value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvexCombination {
    x_min: f64,
    x_max: f64,
}

impl ConvexCombination {
    /// Create a convex combination over `[x_min, x_max]`.
    ///
    /// # Errors
    /// [`EncodingError::InvalidConfiguration`] if a bound is not finite or if
    /// `x_min > x_max`. A negative `x_min` is allowed; counts never reach it.
    pub fn new(x_min: f64, x_max: f64) -> Result<Self> {
        if !x_min.is_finite() || !x_max.is_finite() {
            return Err(EncodingError::InvalidConfiguration(format!(
                "convex combination bounds must be finite, got [{}, {}]",
                x_min, x_max
            )));
        }
        if x_min > x_max {
            return Err(EncodingError::InvalidConfiguration(format!(
                "x_min ({}) must not exceed x_max ({})",
                x_min, x_max
            )));
        }
        Ok(Self { x_min, x_max })
    }

    /// Lower bound of the interpolation range.
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Upper bound of the interpolation range.
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    fn blend(&self, current: f64, count: usize, parent: f64) -> f64 {
        let clamped = (count as f64).clamp(self.x_min, self.x_max);
        // Degenerate range: clamped can only equal x_max.
        if self.x_max == self.x_min {
            return current;
        }
        parent + (current - parent) * (clamped - self.x_min) / (self.x_max - self.x_min)
    }
}

impl Smoothing for ConvexCombination {
    fn smooth(&self, current: &[f64], sample_count: &[usize], parent: &[f64]) -> Vec<f64> {
        current
            .iter()
            .zip(sample_count)
            .zip(parent)
            .map(|((&cur, &n), &prior)| self.blend(cur, n, prior))
            .collect()
    }
}

/// Shrink toward the parent with credibility weight `n / (n + prior_weight)`.
///
/// `prior_weight` acts as a pseudo-count of parent observations, so a group
/// with `n == prior_weight` rows lands halfway between its own value and the
/// parent's.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Credibility {
    prior_weight: f64,
}

impl Credibility {
    /// Create a credibility smoother.
    ///
    /// # Errors
    /// [`EncodingError::InvalidConfiguration`] unless `prior_weight` is finite
    /// and strictly positive.
    pub fn new(prior_weight: f64) -> Result<Self> {
        if !prior_weight.is_finite() || prior_weight <= 0.0 {
            return Err(EncodingError::InvalidConfiguration(format!(
                "prior_weight must be finite and > 0, got {}",
                prior_weight
            )));
        }
        Ok(Self { prior_weight })
    }

    /// The pseudo-count given to the parent value.
    pub fn prior_weight(&self) -> f64 {
        self.prior_weight
    }
}

impl Smoothing for Credibility {
    fn smooth(&self, current: &[f64], sample_count: &[usize], parent: &[f64]) -> Vec<f64> {
        current
            .iter()
            .zip(sample_count)
            .zip(parent)
            .map(|((&cur, &n), &prior)| {
                let n = n as f64;
                (n * cur + self.prior_weight * prior) / (n + self.prior_weight)
            })
            .collect()
    }
}

/// Adapter turning a closure into a [`Smoothing`].
///
/// # Example
/// ```rust
/// use hierarchical_encoder::preprocessing::encoding::hierarchical::{FnSmoothing, Smoothing};
///
/// // Always keep the group's own value.
/// let identity = FnSmoothing::new("identity", |cur: &[f64], _: &[usize], _: &[f64]| cur.to_vec());
/// assert_eq!(identity.smooth(&[1.0], &[0], &[5.0]), vec![1.0]);
/// ```
#[derive(Clone)]
pub struct FnSmoothing<F> {
    name: String,
    func: F,
}

impl<F> FnSmoothing<F>
where
    F: Fn(&[f64], &[usize], &[f64]) -> Vec<f64> + Send + Sync,
{
    /// Wrap `func`; `name` only shows up in debug output and logs.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for FnSmoothing<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSmoothing")
            .field("name", &self.name)
            .finish()
    }
}

impl<F> Smoothing for FnSmoothing<F>
where
    F: Fn(&[f64], &[usize], &[f64]) -> Vec<f64> + Send + Sync,
{
    fn smooth(&self, current: &[f64], sample_count: &[usize], parent: &[f64]) -> Vec<f64> {
        (self.func)(current, sample_count, parent)
    }
}
