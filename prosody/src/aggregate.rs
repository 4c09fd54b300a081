//! Running statistics over a window of values.

use std::collections::VecDeque;

/// Running max, min, mean, and standard deviation over a multiset of values
/// that grows at one end and shrinks at the other.
///
/// Count, sum, and sum of squares are updated in O(1) on every insert and
/// remove. The extremes are cached: an insert can only push them outward, so
/// it updates them in place, but removing the current extreme drops the cache
/// and the next [`Aggregate::max`] / [`Aggregate::min`] rescans the live
/// values. The rescan is bounded by the window, not the whole sequence.
///
/// All statistics are `None` on an empty aggregate.
#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    values: VecDeque<f64>,
    sum: f64,
    sum_sq: f64,
    max: Option<f64>,
    min: Option<f64>,
}

impl Aggregate {
    /// Creates an empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value at the newest end of the window.
    pub fn insert(&mut self, value: f64) {
        if self.values.is_empty() {
            self.max = Some(value);
            self.min = Some(value);
        } else {
            if let Some(m) = self.max {
                if value > m {
                    self.max = Some(value);
                }
            }
            if let Some(m) = self.min {
                if value < m {
                    self.min = Some(value);
                }
            }
        }
        self.values.push_back(value);
        self.sum += value;
        self.sum_sq += value * value;
    }

    /// Removes one instance of `value`, searching from the oldest end.
    ///
    /// The statistics update in O(1) but the search costs O(window); callers
    /// evicting in arrival order should use [`Aggregate::pop_oldest`].
    /// Returns `false` if no such value is live; the aggregate is unchanged.
    pub fn remove(&mut self, value: f64) -> bool {
        let Some(idx) = self.values.iter().position(|&v| v == value) else {
            return false;
        };
        self.values.remove(idx);
        self.forget(value);
        true
    }

    /// Removes and returns the oldest live value.
    pub fn pop_oldest(&mut self) -> Option<f64> {
        let value = self.values.pop_front()?;
        self.forget(value);
        Some(value)
    }

    fn forget(&mut self, value: f64) {
        if self.values.is_empty() {
            // Drop accumulated rounding error along with the last value.
            self.sum = 0.0;
            self.sum_sq = 0.0;
        } else {
            self.sum -= value;
            self.sum_sq -= value * value;
        }
        if self.max == Some(value) {
            self.max = None;
        }
        if self.min == Some(value) {
            self.min = None;
        }
    }

    /// Returns the largest live value, rescanning if the cache was dropped.
    pub fn max(&mut self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        if self.max.is_none() {
            let m = self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            self.max = Some(m);
        }
        self.max
    }

    /// Returns the smallest live value, rescanning if the cache was dropped.
    pub fn min(&mut self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        if self.min.is_none() {
            let m = self.values.iter().copied().fold(f64::INFINITY, f64::min);
            self.min = Some(m);
        }
        self.min
    }

    /// Overrides the cached maximum.
    ///
    /// The caller is responsible for `value` being the true maximum of the
    /// live values.
    pub fn set_max(&mut self, value: f64) {
        self.max = Some(value);
    }

    /// Overrides the cached minimum. See [`Aggregate::set_max`].
    pub fn set_min(&mut self, value: f64) {
        self.min = Some(value);
    }

    /// Returns the arithmetic mean of the live values.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.sum / self.values.len() as f64)
    }

    /// Returns the sample (n - 1) standard deviation. A single value has a
    /// standard deviation of 0.
    pub fn stdev(&self) -> Option<f64> {
        let n = self.values.len();
        match n {
            0 => None,
            1 => Some(0.0),
            _ => {
                let n = n as f64;
                let var = (self.sum_sq - self.sum * self.sum / n) / (n - 1.0);
                Some(var.max(0.0).sqrt())
            }
        }
    }

    /// Returns the number of live values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Reports whether no values are live.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the live values, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[cfg(test)]
    fn cached_max(&self) -> Option<f64> {
        self.max
    }

    #[cfg(test)]
    fn cached_min(&self) -> Option<f64> {
        self.min
    }
}
