//! Waveform-Similarity Overlap-Add time stretching
//!
//! Stretches or compresses a batch's duration by a fixed ratio while
//! preserving pitch. Analysis windows are laid on a fixed synthesis grid,
//! but each window's read position is corrected by a cross-correlation
//! search so the resynthesized waveform stays coherent instead of chopping
//! at grid points.
//!
//! The overlap-add accumulation is an associative, commutative reduction
//! over per-anchor contributions, so anchor chunks are summed on worker
//! threads and merged elementwise.

mod wsola;

pub use wsola::{StretchError, WsolaStretcher, DEFAULT_TOLERANCE, DEFAULT_WINDOW_LEN};
