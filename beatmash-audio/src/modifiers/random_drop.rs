//! Seeded random beat and sample droppers
//!
//! Batches are transformed concurrently, so the drop decision for a batch
//! must not depend on evaluation order. Each draw is pure in
//! `(seed, batch_index)` and memoized through an idempotent map: threads
//! racing on the same index compute the same value.

use super::{beat_length_ms, check_bpm, check_percentage, ConfigError, SampleSelection};
use crate::modifier::SampleSelector;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Memoized per-batch drop decisions derived from a fixed seed
#[derive(Debug)]
struct DecisionTable {
    seed: u64,
    fraction: f64,
    decisions: Mutex<HashMap<u64, bool>>,
}

impl DecisionTable {
    fn new(seed: &str, fraction: f64) -> Self {
        let mut hasher = DefaultHasher::new();
        seed.hash(&mut hasher);
        Self {
            seed: hasher.finish(),
            fraction,
            decisions: Mutex::new(HashMap::new()),
        }
    }

    /// True if the batch at this index is dropped
    fn drops(&self, batch_index: u64) -> bool {
        *self
            .decisions
            .lock()
            .entry(batch_index)
            .or_insert_with(|| seeded_draw(self.seed, batch_index) < self.fraction)
    }
}

/// A uniform draw in `[0, 1)` that depends only on the seed and batch index
fn seeded_draw(seed: u64, batch_index: u64) -> f64 {
    let mixed = seed ^ batch_index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(mixed).gen::<f64>()
}

/// Drops whole beats at random with the given probability
#[derive(Debug)]
pub struct RandomBeatDropper {
    bpm: u32,
    table: DecisionTable,
    seed_text: String,
}

impl RandomBeatDropper {
    /// `percentage` is the share of beats to drop, in `[0, 100]`
    pub fn new(bpm: u32, percentage: f64, seed: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            bpm: check_bpm(bpm)?,
            table: DecisionTable::new(seed, check_percentage(percentage)?),
            seed_text: seed.to_string(),
        })
    }
}

impl SampleSelector for RandomBeatDropper {
    fn describe(&self) -> String {
        format!(
            "Random[bpm={},{}%,seed={}]",
            self.bpm,
            self.table.fraction * 100.0,
            self.seed_text
        )
    }

    fn requested_time_ms(&self) -> i64 {
        beat_length_ms(self.bpm)
    }

    fn select(&self, batch_len: usize, batch_index: u64) -> Vec<SampleSelection> {
        let high = if self.table.drops(batch_index) {
            0
        } else {
            batch_len
        };
        vec![SampleSelection::new(0, high)]
    }
}

/// Same random drop, but over fixed-length sample windows instead of beats
#[derive(Debug)]
pub struct RandomSampleDropper {
    time_ms: i64,
    table: DecisionTable,
    seed_text: String,
}

impl RandomSampleDropper {
    /// `time_ms` is the window length to consider; `percentage` the share of
    /// windows to drop, in `[0, 100]`
    pub fn new(time_ms: i64, percentage: f64, seed: &str) -> Result<Self, ConfigError> {
        if time_ms <= 0 {
            return Err(ConfigError::InvalidSampleWindow { time_ms });
        }
        Ok(Self {
            time_ms,
            table: DecisionTable::new(seed, check_percentage(percentage)?),
            seed_text: seed.to_string(),
        })
    }
}

impl SampleSelector for RandomSampleDropper {
    fn describe(&self) -> String {
        format!(
            "RandomSample[window={}ms,{}%,seed={}]",
            self.time_ms,
            self.table.fraction * 100.0,
            self.seed_text
        )
    }

    fn requested_time_ms(&self) -> i64 {
        self.time_ms
    }

    fn select(&self, batch_len: usize, batch_index: u64) -> Vec<SampleSelection> {
        let high = if self.table.drops(batch_index) {
            0
        } else {
            batch_len
        };
        vec![SampleSelection::new(0, high)]
    }
}
