//! Double-time decimator

use super::{beat_length_ms, check_bpm, double_time, BeatPattern, ConfigError, SampleSelection};
use crate::modifier::SampleSelector;

/// Plays pattern-marked beats at double speed by keeping every other
/// sample, halving their duration without resampling. Unmarked beats pass
/// through whole.
#[derive(Debug, Clone)]
pub struct DoubleTimer {
    bpm: u32,
    pattern: BeatPattern,
}

impl DoubleTimer {
    pub fn new(bpm: u32, pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            bpm: check_bpm(bpm)?,
            pattern: BeatPattern::parse(pattern)?,
        })
    }
}

impl SampleSelector for DoubleTimer {
    fn describe(&self) -> String {
        format!(
            "DoubleTime[bpm={},pattern={}]",
            self.bpm,
            self.pattern.as_str()
        )
    }

    fn requested_time_ms(&self) -> i64 {
        beat_length_ms(self.bpm)
    }

    fn select(&self, batch_len: usize, batch_index: u64) -> Vec<SampleSelection> {
        // each batch is one beat
        if self.pattern.marks(batch_index) {
            double_time(0, batch_len)
        } else {
            vec![SampleSelection::new(0, batch_len)]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::SampleModifier;

    #[test]
    fn test_marked_beats_are_decimated() {
        let timer = DoubleTimer::new(120, "1").unwrap();
        let beat: Vec<i16> = (0..10).collect();
        assert_eq!(timer.modify(&beat, 0).unwrap(), vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn test_unmarked_beats_pass_through() {
        let timer = DoubleTimer::new(120, "01").unwrap();
        let beat: Vec<i16> = (0..6).collect();
        assert_eq!(timer.modify(&beat, 0).unwrap(), beat);
        assert_eq!(timer.modify(&beat, 1).unwrap(), vec![0, 2, 4]);
    }
}
