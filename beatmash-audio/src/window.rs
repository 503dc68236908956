//! Window functions with a process-wide coefficient cache
//!
//! The same `(index, length)` pairs recur across millions of calls during
//! overlap-add resynthesis, so coefficients are memoized in a shared table.
//! The table is read-mostly: after the first batch populates it, concurrent
//! workers only take the read lock.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::sync::LazyLock;

/// Shared coefficient table keyed by (function, sample index, window length).
///
/// Populated lazily, never evicted. The window length is fixed per run, so
/// the table stays bounded by the small set of pairs actually used.
static COEFFICIENTS: LazyLock<RwLock<HashMap<(WindowFunction, u32, u32), f64>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// A closed set of named window functions, each a pure
/// `(index, length) -> coefficient` mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowFunction {
    /// Hann window: `0.5 * (1 - cos(2*pi*i / (n - 1)))`
    Hann,
    /// Hamming window: `0.54 - 0.46 * cos(2*pi*i / (n - 1))`
    Hamming,
}

impl WindowFunction {
    /// Coefficient for sample `i` of an `n`-sample window, memoized
    pub fn coefficient(self, i: usize, n: usize) -> f64 {
        let key = (self, i as u32, n as u32);
        if let Some(&cached) = COEFFICIENTS.read().get(&key) {
            return cached;
        }
        let value = self.compute(i, n);
        // Concurrent inserts of the same key agree: compute() is pure.
        COEFFICIENTS.write().insert(key, value);
        value
    }

    /// All `n` coefficients of an `n`-sample window
    pub fn coefficients(self, n: usize) -> Vec<f64> {
        (0..n).map(|i| self.coefficient(i, n)).collect()
    }

    fn compute(self, i: usize, n: usize) -> f64 {
        let phase = 2.0 * PI * i as f64 / (n - 1) as f64;
        match self {
            WindowFunction::Hann => 0.5 * (1.0 - phase.cos()),
            WindowFunction::Hamming => 0.54 - 0.46 * phase.cos(),
        }
    }
}
