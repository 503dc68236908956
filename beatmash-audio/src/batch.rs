//! Sample batches and selections - the units of work flowing through the pipeline

/// A fixed-size window of stereo samples processed as one unit.
///
/// Ownership moves through the pipeline: the framer creates a batch, hands it
/// to a worker, and the worker's output is moved to the writer. Nothing holds
/// a batch in two places at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBatch {
    /// Position of this batch in the stream, starting at 0
    pub index: u64,
    /// Left channel samples
    pub left: Vec<i16>,
    /// Right channel samples, always the same length as `left`
    pub right: Vec<i16>,
}

impl SampleBatch {
    /// Create a batch from equal-length channel buffers
    pub fn new(index: u64, left: Vec<i16>, right: Vec<i16>) -> Self {
        assert_eq!(
            left.len(),
            right.len(),
            "channel buffers must be the same length"
        );
        Self { index, left, right }
    }

    /// Number of frames (samples per channel) in this batch
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// True if the batch holds no frames
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// A half-open range `[low, high)` of sample indices to keep when assembling
/// a modifier's output.
///
/// Selections are emitted in order; the output is the concatenation of
/// `samples[low..high]` for each selection in sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SampleSelection {
    low: usize,
    high: usize,
}

impl SampleSelection {
    /// Create a selection covering `[low, high)`.
    ///
    /// Panics if `low > high`; selector implementations are expected to
    /// produce ordered bounds.
    pub fn new(low: usize, high: usize) -> Self {
        assert!(low <= high, "selection bounds out of order: [{low}, {high})");
        Self { low, high }
    }

    /// Inclusive lower bound
    pub fn low(&self) -> usize {
        self.low
    }

    /// Exclusive upper bound
    pub fn high(&self) -> usize {
        self.high
    }

    /// Number of samples selected
    pub fn len(&self) -> usize {
        self.high - self.low
    }

    /// True if the selection covers no samples
    pub fn is_empty(&self) -> bool {
        self.low == self.high
    }
}
