//! Beat swapper - reorders the beats of a measure

use super::{beat_length_ms, build_measure, check_bpm, ConfigError, SampleSelection};
use crate::modifier::SampleSelector;

/// Splits each batch into `measure_size` equal beats and emits them in the
/// order given by a fixed permutation pattern such as `4:1:3:2` (1-based)
#[derive(Debug, Clone)]
pub struct BeatSwapper {
    bpm: u32,
    measure_size: usize,
    order: Vec<usize>,
    pattern_text: String,
}

impl BeatSwapper {
    pub fn new(bpm: u32, measure_size: usize, pattern: &str) -> Result<Self, ConfigError> {
        if measure_size == 0 {
            return Err(ConfigError::InvalidMeasureSize);
        }
        let order = parse_order(pattern)?;
        for &beat in &order {
            if beat >= measure_size {
                return Err(ConfigError::BeatOutOfMeasure {
                    beat: beat + 1,
                    measure_size,
                });
            }
        }
        Ok(Self {
            bpm: check_bpm(bpm)?,
            measure_size,
            order,
            pattern_text: pattern.to_string(),
        })
    }
}

/// Parse `4:1:3:2` into 0-based beat indexes
fn parse_order(pattern: &str) -> Result<Vec<usize>, ConfigError> {
    pattern
        .split(':')
        .map(|token| {
            token
                .parse::<usize>()
                .ok()
                .and_then(|beat| beat.checked_sub(1))
                .ok_or_else(|| ConfigError::InvalidSwapPattern {
                    pattern: pattern.to_string(),
                })
        })
        .collect()
}

impl SampleSelector for BeatSwapper {
    fn describe(&self) -> String {
        format!(
            "Swap[bpm={},msize={},pattern={}]",
            self.bpm, self.measure_size, self.pattern_text
        )
    }

    fn requested_time_ms(&self) -> i64 {
        beat_length_ms(self.bpm) * self.measure_size as i64
    }

    fn select(&self, batch_len: usize, _batch_index: u64) -> Vec<SampleSelection> {
        // each batch is one measure; a truncated final batch may hold fewer
        // beats than the pattern references
        let by_beat = build_measure(self.measure_size, batch_len);
        self.order
            .iter()
            .filter_map(|&beat| by_beat.get(beat).copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::SampleModifier;

    #[test]
    fn test_swaps_quarters_into_pattern_order() {
        let swapper = BeatSwapper::new(120, 4, "4:1:3:2").unwrap();
        let measure: Vec<i16> = (0..16).collect();
        let out = swapper.modify(&measure, 0).unwrap();
        let expected: Vec<i16> = [12, 13, 14, 15, 0, 1, 2, 3, 8, 9, 10, 11, 4, 5, 6, 7].to_vec();
        assert_eq!(out, expected);
        assert_eq!(out.len(), measure.len());
    }

    #[test]
    fn test_beats_may_repeat_or_vanish() {
        let swapper = BeatSwapper::new(120, 2, "1:1").unwrap();
        let measure = [10i16, 11, 20, 21];
        assert_eq!(swapper.modify(&measure, 0).unwrap(), vec![10, 11, 10, 11]);
    }

    #[test]
    fn test_window_covers_a_whole_measure() {
        let swapper = BeatSwapper::new(120, 4, "1:2:3:4").unwrap();
        assert_eq!(crate::modifier::SampleSelector::requested_time_ms(&swapper), 2000);
    }

    #[test]
    fn test_rejects_out_of_measure_beat() {
        let err = BeatSwapper::new(120, 4, "1:5").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::BeatOutOfMeasure {
                beat: 5,
                measure_size: 4
            }
        ));
    }

    #[test]
    fn test_rejects_malformed_pattern() {
        assert!(BeatSwapper::new(120, 4, "1:x:3").is_err());
        assert!(BeatSwapper::new(120, 4, "0:1").is_err());
        assert!(BeatSwapper::new(120, 4, "").is_err());
    }
}
