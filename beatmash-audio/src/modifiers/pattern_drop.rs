//! Pattern-driven beat dropper

use super::{beat_length_ms, check_bpm, BeatPattern, ConfigError, SampleSelection};
use crate::modifier::SampleSelector;

/// Drops or keeps whole beats by cycling a `0`/`1` pattern keyed by batch
/// index: `0` drops the beat, `1` keeps it.
#[derive(Debug, Clone)]
pub struct PatternBeatDropper {
    bpm: u32,
    pattern: BeatPattern,
}

impl PatternBeatDropper {
    pub fn new(bpm: u32, pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            bpm: check_bpm(bpm)?,
            pattern: BeatPattern::parse(pattern)?,
        })
    }
}

impl SampleSelector for PatternBeatDropper {
    fn describe(&self) -> String {
        format!("Pattern[bpm={},pattern={}]", self.bpm, self.pattern.as_str())
    }

    fn requested_time_ms(&self) -> i64 {
        beat_length_ms(self.bpm)
    }

    fn select(&self, batch_len: usize, batch_index: u64) -> Vec<SampleSelection> {
        // each batch is one beat
        let high = if self.pattern.marks(batch_index) {
            batch_len
        } else {
            0
        };
        vec![SampleSelection::new(0, high)]
    }
}
