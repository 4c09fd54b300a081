//! Sequential multinomial model of a quantized contour.

use tracing::{debug, warn};

use crate::contour::{ConditionalDistribution, Contour, ContourQuantizer, DistributionTable};
use crate::error::ProsodyError;

/// Log likelihood reported for a contour containing an unseen transition.
/// Stands in for negative infinity.
pub const UNSEEN_LOG_LIKELIHOOD: f64 = -f64::MAX;

/// Scores contours against a chain of per-position symbol distributions.
///
/// A contour is quantized into one symbol per position; the likelihood is
/// the product over positions of `P_i(symbol_i | symbol_{i-1})`, with the
/// first position conditioned on the start marker.
///
/// # Unseen transitions
///
/// When a position has no entry for its transition, the running log
/// likelihood is replaced by [`UNSEEN_LOG_LIKELIHOOD`] and scoring carries
/// on. Later positions that do have entries still add their log
/// probability, so the result is the sentinel plus the log terms after the
/// last unseen transition. Callers ranking models should treat anything at
/// or near the sentinel as zero probability.
///
/// Evaluation keeps no state between calls and may run concurrently.
pub struct QuantizedContourModel<Q, D = DistributionTable> {
    quantizer: Q,
    positions: Vec<D>,
}

impl<Q: ContourQuantizer, D: ConditionalDistribution> QuantizedContourModel<Q, D> {
    /// Creates a model from a quantizer and one distribution per position.
    pub fn new(quantizer: Q, positions: Vec<D>) -> Self {
        Self {
            quantizer,
            positions,
        }
    }

    /// Returns the log likelihood that `contour` was generated by this model.
    ///
    /// Quantizer errors are returned unchanged. Returns
    /// [`ProsodyError::LengthMismatch`] if the quantizer produces a different
    /// number of symbols than the model has positions.
    pub fn evaluate(&self, contour: &Contour) -> Result<f64, ProsodyError> {
        let symbols = self.quantizer.quantize(contour)?;
        if symbols.len() != self.positions.len() {
            return Err(ProsodyError::LengthMismatch {
                expected: self.positions.len(),
                got: symbols.len(),
            });
        }

        let mut log_p = 0.0;
        let mut prev = None;
        for (i, (&symbol, dist)) in symbols.iter().zip(&self.positions).enumerate() {
            match dist.probability(prev, symbol) {
                Some(p) => log_p += p.ln(),
                None => {
                    debug!(position = i, ?prev, symbol, "unseen transition");
                    log_p = UNSEEN_LOG_LIKELIHOOD;
                }
            }
            prev = Some(symbol);
        }
        Ok(log_p)
    }

    /// Returns the number of positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Reports whether the model has no positions.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Returns the quantizer contours are scored through.
    pub fn quantizer(&self) -> &Q {
        &self.quantizer
    }

    /// Returns the per-position distributions, first position first.
    pub fn positions(&self) -> &[D] {
        &self.positions
    }
}

impl<Q: ContourQuantizer> QuantizedContourModel<Q, DistributionTable> {
    /// Creates a model from JSON-encoded position tables.
    ///
    /// The JSON is an array with one [`DistributionTable`] object per
    /// position. Every probability must lie in (0, 1].
    pub fn from_json(quantizer: Q, json_data: &[u8]) -> Result<Self, ProsodyError> {
        let positions: Vec<DistributionTable> = serde_json::from_slice(json_data)
            .map_err(|e| ProsodyError::Model(format!("parse model JSON: {e}")))?;
        if positions.is_empty() {
            return Err(ProsodyError::Model("empty model in JSON".into()));
        }
        for (i, table) in positions.iter().enumerate() {
            if let Err(e) = table.validate() {
                warn!(position = i, error = %e, "rejecting contour model");
                return Err(e);
            }
        }
        Ok(Self::new(quantizer, positions))
    }
}
