//! Pattern-driven beat reverser

use super::{beat_length_ms, check_bpm, BeatPattern, ConfigError};
use crate::modifier::{ModifyError, SampleModifier};

/// Reverses the sample order of whole beats whose cyclic pattern position
/// is `1`; other beats pass through unchanged.
///
/// Resynthesis-style: the whole batch is rewritten in place rather than
/// sliced through selections.
#[derive(Debug, Clone)]
pub struct PatternBeatReverser {
    bpm: u32,
    pattern: BeatPattern,
}

impl PatternBeatReverser {
    pub fn new(bpm: u32, pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            bpm: check_bpm(bpm)?,
            pattern: BeatPattern::parse(pattern)?,
        })
    }
}

impl SampleModifier for PatternBeatReverser {
    fn describe(&self) -> String {
        format!(
            "PatternReverseBeat[bpm={},pattern={}]",
            self.bpm,
            self.pattern.as_str()
        )
    }

    fn requested_time_ms(&self) -> i64 {
        beat_length_ms(self.bpm)
    }

    fn modify(&self, samples: &[i16], batch_index: u64) -> Result<Vec<i16>, ModifyError> {
        let mut out = samples.to_vec();
        if self.pattern.marks(batch_index) {
            out.reverse();
        }
        Ok(out)
    }
}
