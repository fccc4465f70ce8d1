use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a heart-rate reading came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSource {
    /// On-body wearable (watch, chest strap).
    OnBody,
    /// The host device itself (camera/optical reading, manual entry).
    Host,
}

/// A single heart-rate reading. Immutable once created.
///
/// BPM is typically 40-220 in practice but the range is not enforced;
/// samples are recorded as delivered and filtered downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HrSample {
    pub bpm: u32,
    pub at: DateTime<Utc>,
    pub source: SampleSource,
}

impl HrSample {
    pub fn new(bpm: u32, at: DateTime<Utc>, source: SampleSource) -> Self {
        Self { bpm, at, source }
    }
}

/// Mean BPM over `samples`, rounded to the nearest integer.
/// `None` when there are no samples -- absence is not zero.
pub(crate) fn mean_bpm(samples: &[HrSample]) -> Option<u32> {
    if samples.is_empty() {
        return None;
    }
    let sum: u64 = samples.iter().map(|s| s.bpm as u64).sum();
    Some((sum as f64 / samples.len() as f64).round() as u32)
}

pub(crate) fn max_bpm(samples: &[HrSample]) -> Option<u32> {
    samples.iter().map(|s| s.bpm).max()
}

pub(crate) fn min_bpm(samples: &[HrSample]) -> Option<u32> {
    samples.iter().map(|s| s.bpm).min()
}
