//! Beat-level modifiers - dropping, reordering, reversing, decimating,
//! and time-stretching beats
//!
//! Every modifier validates its options at construction and fails with a
//! [`ConfigError`] naming the offending value; nothing is rejected at
//! processing time.

mod double_time;
mod identity;
mod pattern_drop;
mod pattern_reverse;
mod percentage;
mod random_drop;
mod reverse_measure;
mod swap;
mod time_stretch;

pub use double_time::DoubleTimer;
pub use identity::Identity;
pub use pattern_drop::PatternBeatDropper;
pub use pattern_reverse::PatternBeatReverser;
pub use percentage::PercentageBeatDropper;
pub use random_drop::{RandomBeatDropper, RandomSampleDropper};
pub use reverse_measure::MeasureReverser;
pub use swap::BeatSwapper;
pub use time_stretch::TimeStretcher;

use crate::batch::SampleSelection;
use thiserror::Error;

/// Configuration errors raised while constructing a modifier, before any
/// batch is processed
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("pattern `{pattern}` must be a non-empty string of 0s and 1s")]
    InvalidPattern { pattern: String },
    #[error("swap pattern `{pattern}` must be colon-separated 1-based beat numbers")]
    InvalidSwapPattern { pattern: String },
    #[error("beat number {beat} is outside the measure (size {measure_size})")]
    BeatOutOfMeasure { beat: usize, measure_size: usize },
    #[error("percentage {value} must be in the range [0, 100]")]
    InvalidPercentage { value: f64 },
    #[error("BPM must be in the range [1, infinity)")]
    InvalidBpm,
    #[error("measure size must be in the range [1, infinity)")]
    InvalidMeasureSize,
    #[error("sample window of {time_ms} ms must be positive")]
    InvalidSampleWindow { time_ms: i64 },
    #[error("stretch factor {factor} must be finite and in (0, 2]")]
    InvalidStretchFactor { factor: f64 },
    #[error("window length {window_len} must be a positive even sample count")]
    InvalidWindowLength { window_len: usize },
    #[error("batch window of {time_ms} ms is shorter than one frame at {sample_rate} Hz")]
    EmptyBatchWindow { time_ms: i64, sample_rate: u32 },
}

/// Milliseconds per beat at the given tempo, by exact integer division
pub fn beat_length_ms(bpm: u32) -> i64 {
    60_000 / i64::from(bpm)
}

fn check_bpm(bpm: u32) -> Result<u32, ConfigError> {
    if bpm == 0 {
        return Err(ConfigError::InvalidBpm);
    }
    Ok(bpm)
}

fn check_percentage(value: f64) -> Result<f64, ConfigError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ConfigError::InvalidPercentage { value });
    }
    Ok(value / 100.0)
}

/// A cyclic beat pattern of `0`s and `1`s, keyed by batch index
#[derive(Debug, Clone)]
pub struct BeatPattern {
    text: String,
}

impl BeatPattern {
    /// Parse and validate a pattern string
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        if text.is_empty() || !text.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(ConfigError::InvalidPattern {
                pattern: text.to_string(),
            });
        }
        Ok(Self {
            text: text.to_string(),
        })
    }

    /// Whether the cyclic pattern position for this batch is a `1`
    pub fn marks(&self, batch_index: u64) -> bool {
        let pos = (batch_index % self.text.len() as u64) as usize;
        self.text.as_bytes()[pos] == b'1'
    }

    /// The pattern as written
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Split a batch into `measure_size` equal beat-sized sub-ranges.
///
/// When the batch length is not divisible, the tail samples form a final
/// clamped range so no sample is lost.
pub fn build_measure(measure_size: usize, batch_len: usize) -> Vec<SampleSelection> {
    let beat_size = (batch_len / measure_size).max(1);
    let mut beats = Vec::with_capacity(measure_size + 1);
    let mut low = 0;
    while low < batch_len {
        beats.push(SampleSelection::new(low, (low + beat_size).min(batch_len)));
        low += beat_size;
    }
    beats
}

/// One-sample selections at every other index of `[start, end)`, halving
/// the sample count (and duration) without resampling
pub fn double_time(start: usize, end: usize) -> Vec<SampleSelection> {
    (start..end)
        .step_by(2)
        .map(|i| SampleSelection::new(i, i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beat_length_uses_exact_division() {
        assert_eq!(beat_length_ms(120), 500);
        assert_eq!(beat_length_ms(60), 1000);
        // 7 bpm: 60000/7 = 8571.42..., truncated
        assert_eq!(beat_length_ms(7), 8571);
    }

    #[test]
    fn test_pattern_cycles() {
        let pattern = BeatPattern::parse("101").unwrap();
        assert!(pattern.marks(0));
        assert!(!pattern.marks(1));
        assert!(pattern.marks(2));
        assert!(pattern.marks(3));
    }

    #[test]
    fn test_pattern_rejects_garbage() {
        assert!(BeatPattern::parse("").is_err());
        assert!(BeatPattern::parse("10x1").is_err());
        assert!(BeatPattern::parse("2").is_err());
    }

    #[test]
    fn test_build_measure_splits_evenly() {
        let beats = build_measure(4, 16);
        assert_eq!(
            beats,
            vec![
                SampleSelection::new(0, 4),
                SampleSelection::new(4, 8),
                SampleSelection::new(8, 12),
                SampleSelection::new(12, 16),
            ]
        );
    }

    #[test]
    fn test_build_measure_clamps_tail() {
        let beats = build_measure(4, 11);
        assert_eq!(beats.len(), 6);
        assert_eq!(beats.last().unwrap().high(), 11);
        let total: usize = beats.iter().map(SampleSelection::len).sum();
        assert_eq!(total, 11);
    }

    #[test]
    fn test_double_time_selects_every_other_sample() {
        let selections = double_time(0, 10);
        let expected: Vec<SampleSelection> =
            (0..10).step_by(2).map(|i| SampleSelection::new(i, i + 1)).collect();
        assert_eq!(selections, expected);
        assert_eq!(selections.len(), 5);
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(check_percentage(-0.1).is_err());
        assert!(check_percentage(100.1).is_err());
        assert_eq!(check_percentage(25.0).unwrap(), 0.25);
    }
}
