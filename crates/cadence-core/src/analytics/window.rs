//! Fixed-capacity sample windows

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::catalog::ContentType;
use crate::error::{CadenceError, Result, ensure_non_negative};
use crate::interval::Quality;

/// Default number of samples kept per window
pub const DEFAULT_WINDOW_SIZE: usize = 50;

// ============================================================================
// RING BUFFER
// ============================================================================

/// Ring buffer that evicts its oldest sample once full
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRing<T>")]
pub struct RingBuffer<T> {
    capacity: usize,
    samples: VecDeque<T>,
}

#[derive(Deserialize)]
struct RawRing<T> {
    capacity: usize,
    samples: VecDeque<T>,
}

impl<T> From<RawRing<T>> for RingBuffer<T> {
    fn from(raw: RawRing<T>) -> Self {
        let mut ring = Self {
            capacity: raw.capacity.max(1),
            samples: raw.samples,
        };
        while ring.samples.len() > ring.capacity {
            ring.samples.pop_front();
        }
        ring
    }
}

impl<T> RingBuffer<T> {
    /// Empty buffer holding at most `capacity` samples (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a sample, returning the evicted one if the buffer was full
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(value);
        evicted
    }

    /// Maximum number of samples
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples held
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples are held
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples, oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.samples.iter()
    }

    /// The newest `n` samples, oldest first
    pub fn latest(&self, n: usize) -> impl Iterator<Item = &T> {
        self.samples.iter().skip(self.samples.len().saturating_sub(n))
    }
}

// ============================================================================
// SAMPLE WINDOW
// ============================================================================

/// Accuracy, latency and quality samples of one stream of reviews
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleWindow {
    /// Correct / incorrect outcomes
    pub accuracy: RingBuffer<bool>,
    /// Response times in seconds
    pub response_times: RingBuffer<f64>,
    /// Grades
    pub qualities: RingBuffer<Quality>,
}

impl SampleWindow {
    /// Empty window
    pub fn new(capacity: usize) -> Self {
        Self {
            accuracy: RingBuffer::new(capacity),
            response_times: RingBuffer::new(capacity),
            qualities: RingBuffer::new(capacity),
        }
    }

    /// Record one review
    pub fn push(&mut self, quality: Quality, response_time_seconds: f64) {
        self.accuracy.push(quality.is_correct());
        self.response_times.push(response_time_seconds);
        self.qualities.push(quality);
    }

    /// Number of reviews held
    pub fn len(&self) -> usize {
        self.qualities.len()
    }

    /// Whether the window is empty
    pub fn is_empty(&self) -> bool {
        self.qualities.is_empty()
    }

    /// Fraction correct over the newest `n` reviews (0.0 when empty)
    pub fn recent_accuracy(&self, n: usize) -> f64 {
        mean(self.accuracy.latest(n).map(|&c| if c { 1.0 } else { 0.0 })).unwrap_or(0.0)
    }

    /// Mean latency over the newest `n` reviews
    pub fn recent_latency(&self, n: usize) -> Option<f64> {
        mean(self.response_times.latest(n).copied())
    }

    /// Mean grade over the newest `n` reviews (0.0 when empty)
    pub fn recent_quality(&self, n: usize) -> f64 {
        mean(self.qualities.latest(n).map(|q| q.as_f64())).unwrap_or(0.0)
    }

    /// Accuracy as a 0/1 series
    pub fn accuracy_series(&self) -> Vec<f64> {
        self.accuracy
            .iter()
            .map(|&c| if c { 1.0 } else { 0.0 })
            .collect()
    }

    /// Latency series
    pub fn latency_series(&self) -> Vec<f64> {
        self.response_times.iter().copied().collect()
    }

    /// Quality series
    pub fn quality_series(&self) -> Vec<f64> {
        self.qualities.iter().map(|q| q.as_f64()).collect()
    }

    /// Check that the three buffers describe the same reviews
    pub fn validate(&self) -> Result<()> {
        let len = self.qualities.len();
        if self.accuracy.len() != len || self.response_times.len() != len {
            return Err(CadenceError::InvalidInput(format!(
                "sample window lengths differ: {} accuracy, {} latency, {} quality",
                self.accuracy.len(),
                self.response_times.len(),
                len
            )));
        }
        if self
            .accuracy
            .iter()
            .zip(self.qualities.iter())
            .any(|(&correct, quality)| correct != quality.is_correct())
        {
            return Err(CadenceError::InvalidInput(
                "accuracy samples disagree with their grades".to_string(),
            ));
        }
        for &latency in self.response_times.iter() {
            ensure_non_negative("response_time_seconds", latency)?;
        }
        Ok(())
    }
}

/// Everything the analyzer has observed for one learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceWindow {
    /// All reviews
    pub overall: SampleWindow,
    /// Reviews split by content type, each capped at the same size
    pub by_content_type: BTreeMap<ContentType, SampleWindow>,
}

impl PerformanceWindow {
    /// Empty window set
    pub fn new(capacity: usize) -> Self {
        Self {
            overall: SampleWindow::new(capacity),
            by_content_type: BTreeMap::new(),
        }
    }

    /// Record one review everywhere it belongs
    pub fn push(&mut self, quality: Quality, response_time_seconds: f64, content_type: ContentType) {
        let capacity = self.overall.qualities.capacity();
        self.overall.push(quality, response_time_seconds);
        self.by_content_type
            .entry(content_type)
            .or_insert_with(|| SampleWindow::new(capacity))
            .push(quality, response_time_seconds);
    }

    /// Check every window
    pub fn validate(&self) -> Result<()> {
        self.overall.validate()?;
        for window in self.by_content_type.values() {
            window.validate()?;
        }
        Ok(())
    }
}

impl Default for PerformanceWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

// ============================================================================
// SERIES HELPERS
// ============================================================================

/// Arithmetic mean, `None` for an empty series
pub fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Population standard deviation (0.0 for fewer than two samples)
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let avg = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / n).sqrt()
}

/// Least-squares slope of a series against its index.
///
/// Returns 0.0 for fewer than two points or a degenerate fit.
pub fn trend(series: &[f64]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let n = series.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = series.iter().sum::<f64>() / n;

    let (num, den) = series
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, &y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });

    if den.abs() < 1e-12 || !num.is_finite() {
        0.0
    } else {
        num / den
    }
}
