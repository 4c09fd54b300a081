//! Word-level context statistics and quantized contour models for prosodic
//! analysis.
//!
//! # Context windows
//!
//! [`ContextFrame`] slides over an ordered sequence of words and keeps
//! running statistics (max, min, mean, standard deviation, size) of a contour
//! feature over the words around the current one. A feature is either one
//! scalar per word or the list of time-stamped samples inside the word:
//!
//! ```text
//! words:    w0   w1   w2   w3   w4
//!                     ^ current
//!           [ back ]       [front]
//! ```
//!
//! Statistics are maintained incrementally by [`Aggregate`]; only the
//! extremes fall back to a rescan, and only after the current extreme
//! leaves the window.
//!
//! # Contour models
//!
//! [`QuantizedContourModel`] quantizes a [`Contour`] into one symbol per
//! position and scores it against per-position distributions conditioned on
//! the previous symbol. Quantizers and distributions are supplied by the
//! caller through [`ContourQuantizer`] and [`ConditionalDistribution`].
//!
//! # Example
//!
//! ```
//! use giztoy_prosody::{ContextFrame, FeatureValue, Word};
//!
//! let words: Vec<Word> = [3.0, 7.0, 5.0, 1.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &v)| {
//!         Word::new(format!("w{i}"), i as f64, i as f64 + 1.0)
//!             .with_feature("f0", FeatureValue::Scalar(v))
//!     })
//!     .collect();
//!
//! let mut frame = ContextFrame::new(&words, "f0", 0, 1)?;
//! assert_eq!(frame.mean(), Some(5.0));
//! frame.increment()?;
//! assert_eq!(frame.max(), Some(7.0));
//! assert_eq!(frame.min(), Some(5.0));
//! # Ok::<(), giztoy_prosody::ProsodyError>(())
//! ```

mod aggregate;
mod context;
mod contour;
mod error;
mod model;
mod word;

pub use aggregate::Aggregate;
pub use context::{context_stats, ContextConfig, ContextFrame, Shape, WindowStats};
pub use contour::{ConditionalDistribution, Contour, ContourQuantizer, DistributionTable};
pub use error::ProsodyError;
pub use model::{QuantizedContourModel, UNSEEN_LOG_LIKELIHOOD};
pub use word::{FeatureValue, Sample, Word, WordRecord};
