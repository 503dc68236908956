//! WAV output via hound

use beatmash_audio::{EngineError, PcmSink};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Writes the processed stream as a 16-bit stereo WAV file.
///
/// The header's length fields are patched when the stream is finalized, so
/// `finish` must run even on an aborted run to leave a readable file.
pub struct WavSink {
    writer: Option<WavWriter<BufWriter<File>>>,
}

impl WavSink {
    /// Create the output file with a stereo 16-bit spec at `sample_rate`
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self, EngineError> {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec).map_err(map_hound)?;
        debug!(path = %path.display(), sample_rate, "created wav output");
        Ok(Self {
            writer: Some(writer),
        })
    }
}

impl PcmSink for WavSink {
    fn write_frame(&mut self, left: i16, right: i16) -> Result<(), EngineError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| EngineError::Decode("wav output already finalized".to_string()))?;
        writer.write_sample(left).map_err(map_hound)?;
        writer.write_sample(right).map_err(map_hound)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EngineError> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(map_hound)?;
        }
        Ok(())
    }
}

fn map_hound(e: hound::Error) -> EngineError {
    match e {
        hound::Error::IoError(e) => EngineError::Io(e),
        other => EngineError::Decode(other.to_string()),
    }
}
