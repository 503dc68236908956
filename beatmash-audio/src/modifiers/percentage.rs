//! Percentage beat dropper

use super::{beat_length_ms, check_bpm, check_percentage, ConfigError, SampleSelection};
use crate::modifier::SampleSelector;

/// Keeps only the leading fraction of every beat, dropping the rest
#[derive(Debug, Clone)]
pub struct PercentageBeatDropper {
    bpm: u32,
    fraction: f64,
}

impl PercentageBeatDropper {
    /// `percentage` is the share of each beat to keep, in `[0, 100]`
    pub fn new(bpm: u32, percentage: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            bpm: check_bpm(bpm)?,
            fraction: check_percentage(percentage)?,
        })
    }
}

impl SampleSelector for PercentageBeatDropper {
    fn describe(&self) -> String {
        format!("Percentage[bpm={},{}%]", self.bpm, self.fraction * 100.0)
    }

    fn requested_time_ms(&self) -> i64 {
        beat_length_ms(self.bpm)
    }

    fn select(&self, batch_len: usize, _batch_index: u64) -> Vec<SampleSelection> {
        // each batch is one beat
        vec![SampleSelection::new(
            0,
            (self.fraction * batch_len as f64) as usize,
        )]
    }
}
