//! Compressed container decoding via Symphonia

use beatmash_audio::{EngineError, PcmSource};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Streaming decoder over any container Symphonia can probe.
///
/// Packets are decoded lazily as the engine pulls samples, so a long track
/// never sits fully decoded in memory. Corrupt packets are skipped with a
/// warning, matching how most players treat damaged frames.
pub struct SymphoniaSource {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: u16,
    buffer: Vec<i16>,
    position: usize,
    eof: bool,
}

impl SymphoniaSource {
    /// Probe and open an audio file, selecting its first decodable track
    pub fn open(path: &Path) -> Result<Self, EngineError> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| EngineError::Decode(e.to_string()))?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                EngineError::UnsupportedSource("no decodable audio track".to_string())
            })?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params.sample_rate.unwrap_or(44_100);
        let channels = codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(2);
        if channels != 1 && channels != 2 {
            return Err(EngineError::UnsupportedSource(format!(
                "expected 1 or 2 channels, got {channels}"
            )));
        }

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| EngineError::Decode(e.to_string()))?;

        debug!(sample_rate, channels, track_id, "opened audio track");
        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            buffer: Vec::new(),
            position: 0,
            eof: false,
        })
    }

    /// Decode packets until the sample buffer holds data again
    fn refill(&mut self) -> Result<(), EngineError> {
        self.buffer.clear();
        self.position = 0;

        while !self.eof {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    self.eof = true;
                    return Ok(());
                }
                Err(e) => return Err(EngineError::Decode(e.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let duration = decoded.capacity() as u64;
                    let mut sample_buf = SampleBuffer::<i16>::new(duration, spec);
                    sample_buf.copy_interleaved_ref(decoded);
                    self.buffer.extend_from_slice(sample_buf.samples());
                    if !self.buffer.is_empty() {
                        return Ok(());
                    }
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    // damaged frame; drop it and keep going
                    warn!(error = e, "skipping undecodable packet");
                }
                Err(e) => return Err(EngineError::Decode(e.to_string())),
            }
        }
        Ok(())
    }
}

impl PcmSource for SymphoniaSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn read_sample(&mut self) -> Result<Option<i16>, EngineError> {
        if self.position >= self.buffer.len() {
            if self.eof {
                return Ok(None);
            }
            self.refill()?;
            if self.position >= self.buffer.len() {
                return Ok(None);
            }
        }
        let sample = self.buffer[self.position];
        self.position += 1;
        Ok(Some(sample))
    }
}
