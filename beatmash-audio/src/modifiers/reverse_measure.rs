//! Measure reverser - plays the beats of each measure backwards

use super::{beat_length_ms, build_measure, check_bpm, ConfigError, SampleSelection};
use crate::modifier::SampleSelector;

/// Splits each batch into `measure_size` equal beats and emits them in
/// reverse order (samples within each beat keep their direction)
#[derive(Debug, Clone)]
pub struct MeasureReverser {
    bpm: u32,
    measure_size: usize,
}

impl MeasureReverser {
    pub fn new(bpm: u32, measure_size: usize) -> Result<Self, ConfigError> {
        if measure_size == 0 {
            return Err(ConfigError::InvalidMeasureSize);
        }
        Ok(Self {
            bpm: check_bpm(bpm)?,
            measure_size,
        })
    }
}

impl SampleSelector for MeasureReverser {
    fn describe(&self) -> String {
        format!(
            "ReverseMeasure[bpm={},msize={}]",
            self.bpm, self.measure_size
        )
    }

    fn requested_time_ms(&self) -> i64 {
        beat_length_ms(self.bpm) * self.measure_size as i64
    }

    fn select(&self, batch_len: usize, _batch_index: u64) -> Vec<SampleSelection> {
        // each batch is one measure
        let mut by_beat = build_measure(self.measure_size, batch_len);
        by_beat.reverse();
        by_beat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::SampleModifier;

    #[test]
    fn test_two_beat_measure_swaps_halves() {
        let reverser = MeasureReverser::new(120, 2).unwrap();
        // [A, B] in equal halves becomes [B, A]
        let measure = [1i16, 2, 3, 10, 20, 30];
        assert_eq!(
            reverser.modify(&measure, 0).unwrap(),
            vec![10, 20, 30, 1, 2, 3]
        );
    }

    #[test]
    fn test_length_preserved() {
        let reverser = MeasureReverser::new(90, 4).unwrap();
        let measure: Vec<i16> = (0..21).collect();
        assert_eq!(reverser.modify(&measure, 3).unwrap().len(), measure.len());
    }

    #[test]
    fn test_rejects_zero_measure() {
        assert!(MeasureReverser::new(120, 0).is_err());
    }
}
