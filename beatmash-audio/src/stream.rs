//! PCM stream collaborators and the engine error taxonomy
//!
//! The engine consumes raw interleaved 16-bit PCM and produces the same;
//! container decode/encode lives behind these traits (see the codec crate).

use crate::modifier::ModifyError;
use crate::modifiers::ConfigError;
use thiserror::Error;

/// Errors surfaced by the processing pipeline
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("modifier failed on batch {batch}: {source}")]
    Modify {
        batch: u64,
        #[source]
        source: ModifyError,
    },
    #[error("channel length mismatch on batch {batch}: left {left} != right {right}")]
    ChannelMismatch { batch: u64, left: usize, right: usize },
    #[error("a worker thread stopped before delivering its batch")]
    WorkerGone,
}

/// A decoded PCM source: sequential 16-bit samples at a fixed rate,
/// normalized to one or two channels before reaching the framer
pub trait PcmSource {
    /// Frames per second of the decoded stream
    fn sample_rate(&self) -> u32;

    /// Channel count, 1 or 2; interleaved left/right when 2
    fn channels(&self) -> u16;

    /// Next sample in stream order, or `None` at end of stream
    fn read_sample(&mut self) -> Result<Option<i16>, EngineError>;
}

impl<S: PcmSource + ?Sized> PcmSource for Box<S> {
    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }

    fn channels(&self) -> u16 {
        (**self).channels()
    }

    fn read_sample(&mut self) -> Result<Option<i16>, EngineError> {
        (**self).read_sample()
    }
}

/// A PCM sink accepting interleaved 16-bit stereo frames.
///
/// `finish` must run on every exit path, including aborts, so downstream
/// writers can finalize headers and flush buffers.
pub trait PcmSink {
    /// Append one stereo frame
    fn write_frame(&mut self, left: i16, right: i16) -> Result<(), EngineError>;

    /// Flush and finalize the stream
    fn finish(&mut self) -> Result<(), EngineError>;
}

/// In-memory PCM source over a sample buffer, for tests and for processing
/// already-decoded audio
#[derive(Debug, Clone)]
pub struct MemorySource {
    samples: Vec<i16>,
    position: usize,
    sample_rate: u32,
    channels: u16,
}

impl MemorySource {
    /// Wrap a buffer of interleaved (stereo) or plain (mono) samples
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            position: 0,
            sample_rate,
            channels,
        }
    }
}

impl PcmSource for MemorySource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn read_sample(&mut self) -> Result<Option<i16>, EngineError> {
        let sample = self.samples.get(self.position).copied();
        if sample.is_some() {
            self.position += 1;
        }
        Ok(sample)
    }
}

/// In-memory PCM sink collecting stereo frames
#[derive(Debug, Default)]
pub struct MemorySink {
    frames: Vec<(i16, i16)>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected stereo frames
    pub fn frames(&self) -> &[(i16, i16)] {
        &self.frames
    }

    /// Whether `finish` was invoked
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl PcmSink for MemorySink {
    fn write_frame(&mut self, left: i16, right: i16) -> Result<(), EngineError> {
        self.frames.push((left, right));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EngineError> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_drains_in_order() {
        let mut source = MemorySource::new(vec![1, 2, 3], 44_100, 1);
        assert_eq!(source.read_sample().unwrap(), Some(1));
        assert_eq!(source.read_sample().unwrap(), Some(2));
        assert_eq!(source.read_sample().unwrap(), Some(3));
        assert_eq!(source.read_sample().unwrap(), None);
        assert_eq!(source.read_sample().unwrap(), None);
    }

    #[test]
    fn test_memory_sink_records_frames_and_finish() {
        let mut sink = MemorySink::new();
        sink.write_frame(5, -5).unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.frames(), &[(5, -5)]);
        assert!(sink.is_finished());
    }
}
