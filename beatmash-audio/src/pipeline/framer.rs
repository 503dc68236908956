//! Batch framer - slices the sample stream into fixed-length batches

use crate::batch::SampleBatch;
use crate::modifiers::ConfigError;
use crate::stream::{EngineError, PcmSource};
use tracing::debug;

/// Reads the decoded PCM stream and slices it into fixed-length left/right
/// channel batches.
///
/// Batch length in frames is derived once from the modifier's requested
/// time window and the stream's sample rate, and stays fixed for the run.
/// Mono input is duplicated into both channels. The final batch may be
/// truncated; a zero-length batch is never emitted.
pub struct BatchFramer<S> {
    source: S,
    frames_per_batch: usize,
    channels: u16,
    next_index: u64,
    exhausted: bool,
}

impl<S: PcmSource> BatchFramer<S> {
    /// Create a framer for a modifier wanting `time_ms` of audio per batch
    pub fn new(source: S, time_ms: i64) -> Result<Self, EngineError> {
        let sample_rate = source.sample_rate();
        let channels = source.channels();
        if channels != 1 && channels != 2 {
            return Err(EngineError::UnsupportedSource(format!(
                "expected 1 or 2 channels, got {channels}"
            )));
        }
        let frames_per_batch = time_ms.saturating_mul(i64::from(sample_rate)) / 1000;
        if frames_per_batch <= 0 {
            return Err(ConfigError::EmptyBatchWindow {
                time_ms,
                sample_rate,
            }
            .into());
        }
        debug!(
            frames_per_batch,
            sample_rate, channels, "framing input stream"
        );
        Ok(Self {
            source,
            frames_per_batch: frames_per_batch as usize,
            channels,
            next_index: 0,
            exhausted: false,
        })
    }

    /// Frames in every full batch
    pub fn frames_per_batch(&self) -> usize {
        self.frames_per_batch
    }

    /// Read the next batch, or `None` once the stream is drained
    pub fn next_batch(&mut self) -> Result<Option<SampleBatch>, EngineError> {
        if self.exhausted {
            return Ok(None);
        }

        let mut left = Vec::with_capacity(self.frames_per_batch);
        let mut right = Vec::with_capacity(self.frames_per_batch);
        while left.len() < self.frames_per_batch {
            let Some(first) = self.source.read_sample()? else {
                self.exhausted = true;
                break;
            };
            let second = if self.channels == 2 {
                match self.source.read_sample()? {
                    Some(sample) => sample,
                    None => {
                        // stray trailing sample with no partner; stream ends here
                        self.exhausted = true;
                        break;
                    }
                }
            } else {
                first
            };
            left.push(first);
            right.push(second);
        }

        if left.is_empty() {
            return Ok(None);
        }
        let batch = SampleBatch::new(self.next_index, left, right);
        self.next_index += 1;
        Ok(Some(batch))
    }
}
