//! Word records and the feature values attached to them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single time-stamped contour measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Time in seconds.
    pub time: f64,
    pub value: f64,
}

impl Sample {
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// Value of a named feature on a word.
///
/// Serialized untagged: a bare number is a scalar, an array of
/// `{"time", "value"}` objects is a sample sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// One value for the whole word (e.g. mean pitch).
    Scalar(f64),
    /// The contour samples that fall inside the word's time span.
    Samples(Vec<Sample>),
}

impl FeatureValue {
    /// Returns the number of values this feature contributes to a window.
    pub fn len(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Samples(s) => s.len(),
        }
    }

    /// Reports whether the feature contributes nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates over the contributed values in time order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        let (scalar, samples) = match self {
            Self::Scalar(v) => (Some(*v), &[][..]),
            Self::Samples(s) => (None, s.as_slice()),
        };
        scalar.into_iter().chain(samples.iter().map(|s| s.value))
    }
}

/// An element of an ordered word sequence that can be asked for features.
///
/// Implementations are read-only from the point of view of this crate; a
/// sequence must not be mutated while a [`ContextFrame`](crate::ContextFrame)
/// walks it.
pub trait WordRecord {
    /// Returns the named feature, or `None` if the word does not carry it.
    fn feature(&self, name: &str) -> Option<&FeatureValue>;
}

/// A word with its time span, label, and feature values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub features: BTreeMap<String, FeatureValue>,
}

impl Word {
    /// Creates a word spanning `[start, end]` with no features.
    pub fn new(label: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            label: label.into(),
            features: BTreeMap::new(),
        }
    }

    /// Sets a feature, returning the word for chaining.
    pub fn with_feature(mut self, name: impl Into<String>, value: FeatureValue) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    /// Returns the word duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

impl WordRecord for Word {
    fn feature(&self, name: &str) -> Option<&FeatureValue> {
        self.features.get(name)
    }
}

impl<T: WordRecord + ?Sized> WordRecord for &T {
    fn feature(&self, name: &str) -> Option<&FeatureValue> {
        (**self).feature(name)
    }
}
