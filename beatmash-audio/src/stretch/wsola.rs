//! WSOLA stretcher implementation

use crate::modifiers::ConfigError;
use crate::window::WindowFunction;
use std::thread;
use thiserror::Error;

/// Analysis window length in samples
pub const DEFAULT_WINDOW_LEN: usize = 1024;

/// Search tolerance around each naive analysis anchor, in samples
pub const DEFAULT_TOLERANCE: usize = 512;

/// Window-weight floor below which re-normalization divides by 1 instead,
/// avoiding blow-up at the sparse tail of the stretched array
const SMALL_MIN: f64 = 0.0001;

/// Symmetric i16 <-> f64 scaling factor (2^15)
const I16_SCALE: f64 = 32768.0;

/// Internal invariant violations inside a stretch invocation.
///
/// The window and tolerance parameters guarantee these never fire for valid
/// construction; they are reported as internal errors, not user input errors.
#[derive(Error, Debug)]
pub enum StretchError {
    #[error("cross-correlation produced no candidates (window {window}, tolerance {tolerance})")]
    EmptyCorrelation { window: usize, tolerance: usize },
    #[error("analysis read out of bounds at anchor {anchor}")]
    AnchorOutOfBounds { anchor: usize },
}

/// Time stretcher using Waveform-Similarity Overlap-Add.
///
/// A factor below 1.0 shortens the audio (0.5 = double speed, half
/// duration); pitch is preserved either way. Parameters are fixed for the
/// stretcher's lifetime.
#[derive(Debug, Clone)]
pub struct WsolaStretcher {
    window: WindowFunction,
    window_len: usize,
    tolerance: usize,
    factor: f64,
}

impl WsolaStretcher {
    /// Create a stretcher with the standard 1024-sample Hann window and
    /// 512-sample search tolerance
    pub fn new(factor: f64) -> Result<Self, ConfigError> {
        Self::with_params(factor, DEFAULT_WINDOW_LEN, DEFAULT_TOLERANCE)
    }

    /// Create a stretcher with explicit window and tolerance parameters
    pub fn with_params(
        factor: f64,
        window_len: usize,
        tolerance: usize,
    ) -> Result<Self, ConfigError> {
        if !factor.is_finite() || factor <= 0.0 || factor > 2.0 {
            return Err(ConfigError::InvalidStretchFactor { factor });
        }
        if window_len < 2 || window_len % 2 != 0 {
            return Err(ConfigError::InvalidWindowLength { window_len });
        }
        Ok(Self {
            window: WindowFunction::Hann,
            window_len,
            tolerance,
            factor,
        })
    }

    /// The configured stretch factor
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Stretch one channel of samples, yielding exactly
    /// `ceil(samples.len() * factor)` output samples
    pub fn stretch(&self, samples: &[i16]) -> Result<Vec<i16>, StretchError> {
        let w = self.window_len;
        let h = w / 2;
        let t = self.tolerance;

        let out_len = scaled_index(samples.len(), self.factor);
        if out_len == 0 {
            return Ok(Vec::new());
        }

        // Synthesis anchors at every multiple of the half-window below the
        // output length, each shifted up by one half-window; analysis
        // anchors via inverse scaling.
        let syn_anchors: Vec<usize> = (0..out_len).step_by(h).map(|pos| pos + h).collect();
        let ana_anchors: Vec<usize> = syn_anchors
            .iter()
            .map(|&syn| (syn as f64 / self.factor).floor() as usize)
            .collect();

        // Pad both sides so window and neighborhood reads never leave the
        // buffer. Positions below are all in padded coordinates.
        let pad_left = h + t;
        let last_ana = *ana_anchors.last().unwrap_or(&0);
        let body = (last_ana + w + t).max(samples.len());
        let mut padded = vec![0.0f64; pad_left + body];
        for (i, &sample) in samples.iter().enumerate() {
            padded[pad_left + i] = f64::from(sample) / I16_SCALE;
        }

        let placements = self.place_anchors(&padded, &syn_anchors, &ana_anchors)?;

        let coeffs = self.window.coefficients(w);
        let acc = accumulate(&padded, &placements, &coeffs, out_len + 2 * w);
        let OlaAccumulator {
            mut output,
            window_sum,
        } = acc;

        // Re-normalize by the accumulated window weight
        for (sample, &weight) in output.iter_mut().zip(&window_sum) {
            let divisor = if weight < SMALL_MIN { 1.0 } else { weight };
            *sample /= divisor;
        }

        // Trim the left padding and the stretched tail
        Ok(output[h..h + out_len].iter().copied().map(to_i16).collect())
    }

    /// Resolve each synthesis anchor to its drift-corrected analysis read
    /// position.
    ///
    /// Before emitting each next window, the tail half of the window just
    /// placed is cross-correlated against a +/-tolerance neighborhood of the
    /// next naive anchor; the argmax offset becomes the delta applied to the
    /// following anchors until the next search updates it.
    fn place_anchors(
        &self,
        padded: &[f64],
        syn_anchors: &[usize],
        ana_anchors: &[usize],
    ) -> Result<Vec<Placement>, StretchError> {
        let w = self.window_len;
        let h = w / 2;
        let t = self.tolerance;

        let mut placements = Vec::with_capacity(syn_anchors.len());
        let mut delta: i64 = 0;
        for (i, (&syn, &ana)) in syn_anchors.iter().zip(ana_anchors).enumerate() {
            let ana_start = ana as i64 + delta + t as i64;
            if ana_start < 0 || ana_start as usize + h + w > padded.len() {
                return Err(StretchError::AnchorOutOfBounds { anchor: i });
            }
            let ana_start = ana_start as usize;
            placements.push(Placement { syn, ana_start });

            if i + 1 < syn_anchors.len() {
                let next = ana_anchors[i + 1];
                if next < t || next + w + t > padded.len() {
                    return Err(StretchError::AnchorOutOfBounds { anchor: i + 1 });
                }
                // Natural progression of the window just placed vs. every
                // candidate alignment of the next one
                let natural = &padded[ana_start + h..ana_start + h + w];
                let neighborhood = &padded[next - t..next + w + t];
                let cc = cross_correlate(neighborhood, natural, w);
                if cc.is_empty() {
                    return Err(StretchError::EmptyCorrelation {
                        window: w,
                        tolerance: t,
                    });
                }
                delta = 1 - arg_max(&cc) as i64;
            }
        }
        Ok(placements)
    }
}

/// One window's synthesis position and drift-corrected analysis read start,
/// both in padded coordinates
#[derive(Debug, Clone, Copy)]
struct Placement {
    syn: usize,
    ana_start: usize,
}

/// Parallel overlap-add accumulators: weighted sample sums and the
/// accumulated window weight at each output position
struct OlaAccumulator {
    output: Vec<f64>,
    window_sum: Vec<f64>,
}

impl OlaAccumulator {
    fn new(len: usize) -> Self {
        Self {
            output: vec![0.0; len],
            window_sum: vec![0.0; len],
        }
    }

    fn add_window(&mut self, syn: usize, segment: &[f64], coeffs: &[f64]) {
        for (j, (&sample, &coeff)) in segment.iter().zip(coeffs).enumerate() {
            self.output[syn + j] += sample * coeff;
            self.window_sum[syn + j] += coeff;
        }
    }

    fn merge(&mut self, other: OlaAccumulator) {
        for (acc, add) in self.output.iter_mut().zip(&other.output) {
            *acc += add;
        }
        for (acc, add) in self.window_sum.iter_mut().zip(&other.window_sum) {
            *acc += add;
        }
    }
}

/// Overlap-add every placed window. Each anchor only touches the shared
/// accumulators, and elementwise addition is associative and commutative,
/// so anchor chunks are summed on separate threads and merged in any order.
fn accumulate(
    padded: &[f64],
    placements: &[Placement],
    coeffs: &[f64],
    acc_len: usize,
) -> OlaAccumulator {
    let w = coeffs.len();
    let chunk_count = placements.len().clamp(1, 4);
    let chunk_size = placements.len().div_ceil(chunk_count);

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(chunk_count);
        for chunk in placements.chunks(chunk_size.max(1)) {
            handles.push(scope.spawn(move || {
                let mut partial = OlaAccumulator::new(acc_len);
                for placement in chunk {
                    let segment = &padded[placement.ana_start..placement.ana_start + w];
                    partial.add_window(placement.syn, segment, coeffs);
                }
                partial
            }));
        }

        let mut merged = OlaAccumulator::new(acc_len);
        for handle in handles {
            merged.merge(handle.join().expect("accumulator thread panicked"));
        }
        merged
    })
}

/// Ideal scaled output index for input index `i`
fn scaled_index(i: usize, factor: f64) -> usize {
    (i as f64 * factor).ceil() as usize
}

/// Cross-correlation of `u` against `v`, restricted to the valid overlap
/// region: `conv` with `window_len` leading and `window_len + 1` trailing
/// entries dropped
fn cross_correlate(u: &[f64], v: &[f64], window_len: usize) -> Vec<f64> {
    let mut reversed = u.to_vec();
    reversed.reverse();
    conv(&reversed, v, window_len, window_len + 1)
}

/// MATLAB-style `conv(u, v)`, chopped on both ends to avoid a copy later
fn conv(u: &[f64], v: &[f64], start_chop: usize, end_chop: usize) -> Vec<f64> {
    let m = u.len();
    let n = v.len();
    let full = m + n - 1;
    if full <= start_chop + end_chop {
        return Vec::new();
    }
    let mut result = vec![0.0; full - start_chop - end_chop];
    for k in start_chop..start_chop + result.len() {
        let start = k.saturating_sub(n - 1);
        let end = k.min(m - 1);
        let mut sum = 0.0;
        for j in start..=end {
            sum += u[j] * v[k - j];
        }
        result[k - start_chop] = sum;
    }
    result
}

fn arg_max(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate().skip(1) {
        if value > values[best] {
            best = i;
        }
    }
    best
}

/// Convert a normalized sample back to i16 with deterministic
/// round-half-to-even, clamped defensively
fn to_i16(value: f64) -> i16 {
    (value * I16_SCALE)
        .round_ties_even()
        .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}
