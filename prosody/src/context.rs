//! Word-based context windows over contour features.
//!
//! A [`ContextFrame`] is placed at the first word of a sequence and slid
//! forward one word at a time. At each position it exposes statistics over
//! the feature values of the words around it: up to `front` following words,
//! and (for sample-sequence features) up to `back` preceding words.
//!
//! The window is maintained incrementally; only construction and
//! [`ContextFrame::reset`] rebuild it from scratch.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::aggregate::Aggregate;
use crate::error::ProsodyError;
use crate::word::{FeatureValue, WordRecord};

/// Context sizes for a [`ContextFrame`], in words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Number of preceding words kept in the window.
    pub back: usize,
    /// Number of following words included in the window.
    pub front: usize,
}

impl ContextConfig {
    pub fn new(back: usize, front: usize) -> Self {
        Self { back, front }
    }
}

/// Shape of a feature across a word sequence, decided by the first word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// One value per word.
    Scalar,
    /// A list of time-stamped samples per word.
    Sequence,
}

impl Shape {
    fn of(value: &FeatureValue) -> Self {
        match value {
            FeatureValue::Scalar(_) => Self::Scalar,
            FeatureValue::Samples(_) => Self::Sequence,
        }
    }
}

/// Snapshot of the statistics of a window. Every field except `size` is
/// `None` for an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub mean: Option<f64>,
    pub stdev: Option<f64>,
    pub size: usize,
}

/// A window that slides over a word sequence one word at a time.
///
/// The first word's feature value fixes the [`Shape`] for the lifetime of the
/// frame:
///
/// - **Scalar**: each step evicts the oldest value and admits the value of
///   the word `front` positions ahead.
/// - **Sequence**: each step evicts the samples of the word that fell
///   `back + 1` positions behind and admits all samples of the word `front`
///   positions ahead.
///
/// Words without the feature contribute nothing. Once the position runs past
/// the last word the window is empty.
///
/// A frame borrows its words and is meant for one traversal on one thread.
pub struct ContextFrame<'a, W> {
    words: &'a [W],
    feature: String,
    back: usize,
    front: usize,
    position: usize,
    shape: Option<Shape>,
    agg: Aggregate,
}

impl<'a, W: WordRecord> ContextFrame<'a, W> {
    /// Creates a frame at the first word with the given back and front context.
    ///
    /// Returns [`ProsodyError::ShapeMismatch`] if a word inside the initial
    /// window carries a value of the other shape than the first word.
    pub fn new(
        words: &'a [W],
        feature: impl Into<String>,
        back: usize,
        front: usize,
    ) -> Result<Self, ProsodyError> {
        let feature = feature.into();
        let shape = words
            .first()
            .and_then(|w| w.feature(&feature))
            .map(Shape::of);
        let mut frame = Self {
            words,
            feature,
            back,
            front,
            position: 0,
            shape,
            agg: Aggregate::new(),
        };
        frame.agg = frame.initial_window()?;
        Ok(frame)
    }

    /// Creates a frame from a [`ContextConfig`].
    pub fn with_config(
        words: &'a [W],
        feature: impl Into<String>,
        cfg: ContextConfig,
    ) -> Result<Self, ProsodyError> {
        Self::new(words, feature, cfg.back, cfg.front)
    }

    /// Builds the window for position 0: the first word through `front`
    /// words ahead.
    fn initial_window(&self) -> Result<Aggregate, ProsodyError> {
        let words = self.words;
        let end = words.len().min(self.front + 1);
        let mut agg = Aggregate::new();
        for (idx, word) in words[..end].iter().enumerate() {
            let Some(value) = word.feature(&self.feature) else {
                trace!(feature = %self.feature, idx, "word has no feature, skipped");
                continue;
            };
            if let Some(shape) = self.shape {
                if !value.is_empty() && Shape::of(value) != shape {
                    return Err(self.shape_mismatch(idx));
                }
            }
            for v in value.values() {
                agg.insert(v);
            }
        }
        Ok(agg)
    }

    /// Moves the frame forward one word.
    ///
    /// Returns [`ProsodyError::ShapeMismatch`] if the first word carries no
    /// value for the feature, or if the word entering the window carries a
    /// value of the other shape. The frame is left unchanged on error.
    pub fn increment(&mut self) -> Result<(), ProsodyError> {
        let next = self.position.saturating_add(1);
        if next >= self.words.len() {
            if !self.agg.is_empty() {
                debug!(feature = %self.feature, position = next, "context frame ran off the end");
            }
            self.position = next;
            self.agg.clear();
            return Ok(());
        }

        let shape = self.shape.ok_or_else(|| self.shape_mismatch(0))?;
        let entering_idx = next + self.front;
        let entering = match self.words.get(entering_idx) {
            Some(w) => self.entering_value(w, shape, entering_idx)?,
            None => None,
        };

        match shape {
            Shape::Scalar => {
                self.agg.pop_oldest();
            }
            Shape::Sequence => {
                let leaving = next
                    .checked_sub(self.back + 1)
                    .and_then(|idx| self.words.get(idx))
                    .and_then(|w| match w.feature(&self.feature) {
                        Some(FeatureValue::Samples(s)) => Some(s.len()),
                        _ => None,
                    })
                    .unwrap_or(0);
                for _ in 0..leaving.min(self.agg.len()) {
                    self.agg.pop_oldest();
                }
            }
        }

        if let Some(value) = entering {
            for v in value.values() {
                self.agg.insert(v);
            }
        }
        self.position = next;
        Ok(())
    }

    fn entering_value(
        &self,
        word: &'a W,
        shape: Shape,
        idx: usize,
    ) -> Result<Option<&'a FeatureValue>, ProsodyError> {
        match word.feature(&self.feature) {
            None => {
                debug!(feature = %self.feature, idx, "word has no feature, skipped");
                Ok(None)
            }
            Some(value) if value.is_empty() => Ok(None),
            Some(value) if Shape::of(value) == shape => Ok(Some(value)),
            Some(_) => Err(self.shape_mismatch(idx)),
        }
    }

    fn shape_mismatch(&self, index: usize) -> ProsodyError {
        ProsodyError::ShapeMismatch {
            feature: self.feature.clone(),
            index,
        }
    }

    /// Moves the frame back to the first word and rebuilds the window.
    ///
    /// Fails like [`ContextFrame::new`]; the frame is left unchanged on error.
    pub fn reset(&mut self) -> Result<(), ProsodyError> {
        self.agg = self.initial_window()?;
        self.position = 0;
        Ok(())
    }

    /// Returns the index of the current word.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the feature shape, or `None` if the first word lacks the feature.
    pub fn shape(&self) -> Option<Shape> {
        self.shape
    }

    /// Returns the analyzed feature name.
    pub fn feature(&self) -> &str {
        &self.feature
    }

    /// Reports whether the frame has moved past the last word.
    pub fn is_exhausted(&self) -> bool {
        self.position >= self.words.len()
    }

    pub fn max(&mut self) -> Option<f64> {
        self.agg.max()
    }

    pub fn min(&mut self) -> Option<f64> {
        self.agg.min()
    }

    pub fn mean(&self) -> Option<f64> {
        self.agg.mean()
    }

    pub fn stdev(&self) -> Option<f64> {
        self.agg.stdev()
    }

    /// Returns the number of values in the window.
    pub fn size(&self) -> usize {
        self.agg.len()
    }

    /// Returns all statistics of the current window.
    pub fn stats(&mut self) -> WindowStats {
        WindowStats {
            max: self.agg.max(),
            min: self.agg.min(),
            mean: self.agg.mean(),
            stdev: self.agg.stdev(),
            size: self.agg.len(),
        }
    }
}

/// Walks a word sequence and returns the window statistics at every word.
///
/// The result has one entry per word. Fails wherever
/// [`ContextFrame::increment`] would.
pub fn context_stats<W: WordRecord>(
    words: &[W],
    feature: &str,
    cfg: ContextConfig,
) -> Result<Vec<WindowStats>, ProsodyError> {
    let mut frame = ContextFrame::with_config(words, feature, cfg)?;
    let mut out = Vec::with_capacity(words.len());
    for i in 0..words.len() {
        if i > 0 {
            frame.increment()?;
        }
        out.push(frame.stats());
    }
    debug!(feature, words = words.len(), back = cfg.back, front = cfg.front, "context stats computed");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::{Sample, Word};

    fn scalar_words(values: &[f64]) -> Vec<Word> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                Word::new(format!("w{i}"), i as f64, i as f64 + 1.0)
                    .with_feature("f0", FeatureValue::Scalar(v))
            })
            .collect()
    }

    fn sample_words(values: &[&[f64]]) -> Vec<Word> {
        values
            .iter()
            .enumerate()
            .map(|(i, vs)| {
                let samples = vs
                    .iter()
                    .enumerate()
                    .map(|(j, &v)| Sample::new(i as f64 + j as f64 * 0.01, v))
                    .collect();
                Word::new(format!("w{i}"), i as f64, i as f64 + 1.0)
                    .with_feature("f0", FeatureValue::Samples(samples))
            })
            .collect()
    }

    #[test]
    fn scalar_window_initial_fill() {
        let words = scalar_words(&[3.0, 7.0, 5.0, 1.0]);
        let mut frame = ContextFrame::new(&words, "f0", 0, 1).unwrap();
        assert_eq!(frame.shape(), Some(Shape::Scalar));
        assert_eq!(frame.position(), 0);
        assert_eq!(frame.size(), 2);
        assert_eq!(frame.max(), Some(7.0));
        assert_eq!(frame.min(), Some(3.0));
        assert_eq!(frame.mean(), Some(5.0));
    }

    #[test]
    fn scalar_window_slides() {
        let words = scalar_words(&[3.0, 7.0, 5.0, 1.0]);
        let mut frame = ContextFrame::new(&words, "f0", 0, 1).unwrap();

        frame.increment().unwrap();
        assert_eq!(frame.position(), 1);
        assert_eq!(frame.size(), 2);
        assert_eq!(frame.max(), Some(7.0));
        assert_eq!(frame.min(), Some(5.0));
        assert_eq!(frame.mean(), Some(6.0));

        frame.increment().unwrap();
        assert_eq!(frame.max(), Some(5.0));
        assert_eq!(frame.min(), Some(1.0));

        // Nothing left to admit at the front.
        frame.increment().unwrap();
        assert_eq!(frame.size(), 1);
        assert_eq!(frame.mean(), Some(1.0));
        assert_eq!(frame.stdev(), Some(0.0));
    }

    #[test]
    fn n_increments_empty_the_window() {
        let words = scalar_words(&[3.0, 7.0, 5.0, 1.0]);
        let mut frame = ContextFrame::new(&words, "f0", 2, 2).unwrap();
        for _ in 0..words.len() {
            frame.increment().unwrap();
        }
        assert!(frame.is_exhausted());
        assert_eq!(frame.size(), 0);
        assert_eq!(frame.max(), None);
        assert_eq!(frame.mean(), None);

        for _ in 0..3 {
            frame.increment().unwrap();
            assert_eq!(frame.size(), 0);
        }
    }

    #[test]
    fn zero_context() {
        let words = scalar_words(&[2.0, 4.0, 6.0]);
        let mut frame = ContextFrame::new(&words, "f0", 0, 0).unwrap();
        assert_eq!(frame.size(), 1);
        assert_eq!(frame.mean(), Some(2.0));
        frame.increment().unwrap();
        assert_eq!(frame.size(), 1);
        assert_eq!(frame.mean(), Some(4.0));
    }

    #[test]
    fn sequence_window_slides() {
        let words = sample_words(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0], &[7.0, 8.0]]);
        let mut frame = ContextFrame::new(&words, "f0", 1, 1).unwrap();
        assert_eq!(frame.shape(), Some(Shape::Sequence));
        assert_eq!(frame.size(), 4);
        assert_eq!(frame.max(), Some(4.0));

        // Word 0 is still inside the back context.
        frame.increment().unwrap();
        assert_eq!(frame.size(), 6);
        assert_eq!(frame.min(), Some(1.0));
        assert_eq!(frame.max(), Some(6.0));

        // Word 0 leaves, word 3 enters.
        frame.increment().unwrap();
        assert_eq!(frame.size(), 6);
        assert_eq!(frame.min(), Some(3.0));
        assert_eq!(frame.max(), Some(8.0));
        assert_eq!(frame.mean(), Some(5.5));

        // Word 1 leaves, nothing enters.
        frame.increment().unwrap();
        assert_eq!(frame.size(), 4);
        assert_eq!(frame.min(), Some(5.0));

        frame.increment().unwrap();
        assert_eq!(frame.size(), 0);
    }

    #[test]
    fn sequence_window_zero_back_context() {
        let words = sample_words(&[&[1.0], &[2.0, 3.0], &[4.0]]);
        let mut frame = ContextFrame::new(&words, "f0", 0, 0).unwrap();
        assert_eq!(frame.size(), 1);
        frame.increment().unwrap();
        assert_eq!(frame.size(), 2);
        assert_eq!(frame.mean(), Some(2.5));
        frame.increment().unwrap();
        assert_eq!(frame.size(), 1);
        assert_eq!(frame.max(), Some(4.0));
    }

    /// Reports a short sample list for the first two reads (shape probe and
    /// initial fill) and a longer one after.
    struct GrowingWord {
        reads: std::cell::Cell<usize>,
        short: FeatureValue,
        long: FeatureValue,
    }

    impl WordRecord for GrowingWord {
        fn feature(&self, _name: &str) -> Option<&FeatureValue> {
            let n = self.reads.get();
            self.reads.set(n + 1);
            Some(if n < 2 { &self.short } else { &self.long })
        }
    }

    #[test]
    fn sequence_removal_capped_at_window_size() {
        let word = |v: f64| GrowingWord {
            reads: std::cell::Cell::new(0),
            short: FeatureValue::Samples(vec![Sample::new(0.0, v)]),
            long: FeatureValue::Samples(vec![Sample::new(0.0, v); 5]),
        };
        let words = vec![word(1.0), word(2.0)];
        let mut frame = ContextFrame::new(&words, "f0", 0, 0).unwrap();
        assert_eq!(frame.size(), 1);

        // Word 0 now claims five samples but the window only holds one.
        frame.increment().unwrap();
        assert_eq!(frame.size(), 1);
        assert_eq!(frame.mean(), Some(2.0));
    }

    #[test]
    fn missing_features_contribute_nothing() {
        let mut words = scalar_words(&[1.0, 2.0, 3.0, 4.0]);
        words[2].features.clear();
        let mut frame = ContextFrame::new(&words, "f0", 0, 2).unwrap();
        assert_eq!(frame.size(), 2);
        assert_eq!(frame.mean(), Some(1.5));

        frame.increment().unwrap();
        assert_eq!(frame.size(), 2);
        assert_eq!(frame.mean(), Some(3.0));
    }

    #[test]
    fn scalar_step_ignores_back_context() {
        let words = scalar_words(&[1.0, 2.0, 3.0]);
        let mut frame = ContextFrame::new(&words, "f0", 1, 0).unwrap();
        assert_eq!(frame.size(), 1);

        // Word 0 is within the back context but a scalar step still evicts it.
        frame.increment().unwrap();
        assert_eq!(frame.position(), 1);
        assert_eq!(frame.size(), 1);
        assert_eq!(frame.mean(), Some(2.0));

        frame.increment().unwrap();
        assert_eq!(frame.size(), 1);
        assert_eq!(frame.mean(), Some(3.0));
    }

    #[test]
    fn conflicting_shape_fails_on_construction() {
        let words = vec![
            Word::new("w0", 0.0, 1.0).with_feature("f0", FeatureValue::Scalar(1.0)),
            Word::new("w1", 1.0, 2.0).with_feature(
                "f0",
                FeatureValue::Samples(vec![Sample::new(1.0, 2.0), Sample::new(1.01, 3.0)]),
            ),
        ];
        let err = ContextFrame::new(&words, "f0", 0, 1).err().unwrap();
        assert!(matches!(err, ProsodyError::ShapeMismatch { index: 1, .. }));

        // Outside the initial window the mismatch surfaces on increment.
        let mut frame = ContextFrame::new(&words, "f0", 0, 0).unwrap();
        assert_eq!(frame.size(), 1);
        let err = frame.increment().unwrap_err();
        assert!(matches!(err, ProsodyError::ShapeMismatch { index: 1, .. }));
    }

    #[test]
    fn empty_samples_do_not_conflict_with_scalar_shape() {
        let words = vec![
            Word::new("w0", 0.0, 1.0).with_feature("f0", FeatureValue::Scalar(1.0)),
            Word::new("w1", 1.0, 2.0).with_feature("f0", FeatureValue::Samples(vec![])),
        ];
        let frame = ContextFrame::new(&words, "f0", 0, 1).unwrap();
        assert_eq!(frame.size(), 1);
    }

    #[test]
    fn empty_sample_lists_contribute_nothing() {
        let words = sample_words(&[&[1.0], &[], &[3.0]]);
        let mut frame = ContextFrame::new(&words, "f0", 0, 1).unwrap();
        assert_eq!(frame.size(), 1);
        frame.increment().unwrap();
        assert_eq!(frame.size(), 1);
        assert_eq!(frame.mean(), Some(3.0));
    }

    #[test]
    fn missing_first_feature_fails_on_increment() {
        let mut words = scalar_words(&[1.0, 2.0, 3.0]);
        words[0].features.clear();
        let mut frame = ContextFrame::new(&words, "f0", 0, 1).unwrap();
        assert_eq!(frame.shape(), None);
        assert_eq!(frame.size(), 1);

        let err = frame.increment().unwrap_err();
        assert!(matches!(err, ProsodyError::ShapeMismatch { index: 0, .. }));
        assert_eq!(frame.position(), 0);
        assert_eq!(frame.size(), 1);
    }

    #[test]
    fn conflicting_shape_fails_on_increment() {
        let mut words = scalar_words(&[1.0, 2.0, 3.0]);
        words[2] = words[2]
            .clone()
            .with_feature("f0", FeatureValue::Samples(vec![Sample::new(2.0, 3.0)]));
        let mut frame = ContextFrame::new(&words, "f0", 0, 1).unwrap();
        let err = frame.increment().unwrap_err();
        assert!(matches!(err, ProsodyError::ShapeMismatch { index: 2, .. }));
        assert_eq!(frame.position(), 0);
    }

    #[test]
    fn empty_sequence() {
        let words: Vec<Word> = Vec::new();
        let mut frame = ContextFrame::new(&words, "f0", 1, 1).unwrap();
        assert_eq!(frame.size(), 0);
        assert!(frame.is_exhausted());
        frame.increment().unwrap();
        assert_eq!(frame.size(), 0);
    }

    #[test]
    fn reset_rebuilds_window() {
        let words = scalar_words(&[3.0, 7.0, 5.0, 1.0]);
        let mut frame = ContextFrame::new(&words, "f0", 0, 1).unwrap();
        frame.increment().unwrap();
        frame.increment().unwrap();
        frame.reset().unwrap();
        assert_eq!(frame.position(), 0);
        assert_eq!(frame.max(), Some(7.0));
        assert_eq!(frame.min(), Some(3.0));
    }

    #[test]
    fn max_never_below_min() {
        let words = sample_words(&[&[5.0, -1.0], &[2.0], &[8.0, 0.5, 3.0], &[-4.0], &[6.0]]);
        let mut frame = ContextFrame::new(&words, "f0", 1, 1).unwrap();
        while !frame.is_exhausted() {
            if frame.size() > 0 {
                assert!(frame.max().unwrap() >= frame.min().unwrap());
            }
            frame.increment().unwrap();
        }
    }

    #[test]
    fn context_stats_one_entry_per_word() {
        let words = scalar_words(&[3.0, 7.0, 5.0, 1.0]);
        let stats = context_stats(&words, "f0", ContextConfig::new(0, 1)).unwrap();
        assert_eq!(stats.len(), 4);
        assert_eq!(stats[0].mean, Some(5.0));
        assert_eq!(stats[1].mean, Some(6.0));
        assert_eq!(stats[3].size, 1);
        assert_eq!(stats[3].max, Some(1.0));
    }

    #[test]
    fn config_from_json() {
        let cfg: ContextConfig = serde_json::from_str(r#"{"front": 2}"#).unwrap();
        assert_eq!(cfg, ContextConfig::new(0, 2));
    }
}
