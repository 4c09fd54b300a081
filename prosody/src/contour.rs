//! Contours, quantizers, and position-conditioned symbol distributions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ProsodyError;
use crate::word::{FeatureValue, Sample};

/// A time-ordered sequence of contour samples (e.g. a pitch track).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Contour {
    samples: Vec<Sample>,
}

impl Contour {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Creates a contour with evenly spaced samples starting at `start`.
    pub fn from_values(start: f64, step: f64, values: &[f64]) -> Self {
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::new(start + step * i as f64, v))
            .collect();
        Self { samples }
    }

    /// Creates a contour from a word feature. A scalar becomes a single
    /// sample at time 0.
    pub fn from_feature(value: &FeatureValue) -> Self {
        match value {
            FeatureValue::Scalar(v) => Self::new(vec![Sample::new(0.0, *v)]),
            FeatureValue::Samples(s) => Self::new(s.clone()),
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Iterates over the sample values.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl From<Vec<Sample>> for Contour {
    fn from(samples: Vec<Sample>) -> Self {
        Self::new(samples)
    }
}

/// Converts a continuous contour into a fixed-length sequence of integer
/// symbols, one per model position.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait ContourQuantizer: Send + Sync {
    /// Quantizes a contour. Returns [`ProsodyError::Quantization`] when the
    /// contour cannot be represented (malformed or out of range).
    fn quantize(&self, contour: &Contour) -> Result<Vec<i32>, ProsodyError>;
}

/// Probability of a symbol at one model position, given the symbol at the
/// previous position.
///
/// `previous` is `None` at the first position.
pub trait ConditionalDistribution: Send + Sync {
    /// Returns the probability, or `None` if the transition was never seen.
    fn probability(&self, previous: Option<i32>, symbol: i32) -> Option<f64>;
}

/// A [`ConditionalDistribution`] backed by nested maps.
///
/// Keys are the decimal symbol strings; the start marker is the empty
/// string. This is also the persisted JSON form:
///
/// ```json
/// { "": { "0": 0.5, "1": 0.5 }, "0": { "1": 0.25, "0": 0.75 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DistributionTable {
    table: HashMap<String, HashMap<String, f64>>,
}

impl DistributionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the probability of `previous -> symbol`.
    pub fn insert(&mut self, previous: Option<i32>, symbol: i32, p: f64) {
        self.table
            .entry(symbol_key(previous))
            .or_default()
            .insert(symbol.to_string(), p);
    }

    /// Sets a transition, returning the table for chaining.
    pub fn with(mut self, previous: Option<i32>, symbol: i32, p: f64) -> Self {
        self.insert(previous, symbol, p);
        self
    }

    /// Returns the number of distinct previous symbols.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Checks that every probability lies in (0, 1].
    pub fn validate(&self) -> Result<(), ProsodyError> {
        for (prev, row) in &self.table {
            for (sym, &p) in row {
                if !(p > 0.0 && p <= 1.0) {
                    return Err(ProsodyError::Model(format!(
                        "probability of {prev:?} -> {sym:?} out of range: {p}"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl ConditionalDistribution for DistributionTable {
    fn probability(&self, previous: Option<i32>, symbol: i32) -> Option<f64> {
        self.table
            .get(&symbol_key(previous))?
            .get(&symbol.to_string())
            .copied()
    }
}

fn symbol_key(symbol: Option<i32>) -> String {
    symbol.map(|s| s.to_string()).unwrap_or_default()
}
