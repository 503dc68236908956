//! Pass-through selector, useful for format conversion runs and as a
//! pipeline baseline

use super::SampleSelection;
use crate::modifier::SampleSelector;

/// Keeps every batch untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Identity {
    pub fn new() -> Self {
        Self
    }
}

impl SampleSelector for Identity {
    fn describe(&self) -> String {
        "Identity".to_string()
    }

    fn requested_time_ms(&self) -> i64 {
        8192
    }

    fn select(&self, batch_len: usize, _batch_index: u64) -> Vec<SampleSelection> {
        vec![SampleSelection::new(0, batch_len)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::SampleModifier;

    #[test]
    fn test_identity_keeps_samples_verbatim() {
        let samples = [3i16, -7, 22, 0];
        let out = Identity::new().modify(&samples, 9).unwrap();
        assert_eq!(out, samples);
    }
}
