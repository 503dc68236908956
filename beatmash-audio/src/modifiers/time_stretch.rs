//! Pattern-gated WSOLA time stretcher

use super::{beat_length_ms, check_bpm, BeatPattern, ConfigError};
use crate::modifier::{ModifyError, SampleModifier};
use crate::stretch::WsolaStretcher;

/// Time-stretches pattern-marked beats by a fixed factor, preserving pitch
/// via WSOLA resynthesis. Unmarked beats pass through unchanged.
///
/// The default factor of 0.5 plays marked beats at double speed.
#[derive(Debug, Clone)]
pub struct TimeStretcher {
    bpm: u32,
    pattern: BeatPattern,
    stretcher: WsolaStretcher,
}

impl TimeStretcher {
    pub fn new(bpm: u32, pattern: &str, factor: f64) -> Result<Self, ConfigError> {
        Ok(Self {
            bpm: check_bpm(bpm)?,
            pattern: BeatPattern::parse(pattern)?,
            stretcher: WsolaStretcher::new(factor)?,
        })
    }
}

impl SampleModifier for TimeStretcher {
    fn describe(&self) -> String {
        format!(
            "Stretch[bpm={},pattern={},factor={}]",
            self.bpm,
            self.pattern.as_str(),
            self.stretcher.factor()
        )
    }

    fn requested_time_ms(&self) -> i64 {
        beat_length_ms(self.bpm)
    }

    fn modify(&self, samples: &[i16], batch_index: u64) -> Result<Vec<i16>, ModifyError> {
        if self.pattern.marks(batch_index) {
            Ok(self.stretcher.stretch(samples)?)
        } else {
            Ok(samples.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marked_beats_shrink_by_factor() {
        let stretcher = TimeStretcher::new(120, "1", 0.5).unwrap();
        let beat = vec![500i16; 8192];
        let out = stretcher.modify(&beat, 0).unwrap();
        assert_eq!(out.len(), 4096);
    }

    #[test]
    fn test_unmarked_beats_pass_through() {
        let stretcher = TimeStretcher::new(120, "01", 0.5).unwrap();
        let beat: Vec<i16> = (0..64).collect();
        assert_eq!(stretcher.modify(&beat, 0).unwrap(), beat);
    }

    #[test]
    fn test_rejects_bad_factor() {
        assert!(TimeStretcher::new(120, "1", 0.0).is_err());
        assert!(TimeStretcher::new(120, "1", 9.0).is_err());
    }
}
