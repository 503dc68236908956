//! Headerless 16-bit PCM streams in either byte order

use beatmash_audio::{EngineError, PcmSink, PcmSource};
use std::io::{Read, Write};
use tracing::warn;

/// Byte order of a raw 16-bit PCM stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Big,
    Little,
}

impl Endianness {
    fn decode(self, bytes: [u8; 2]) -> i16 {
        match self {
            Endianness::Big => i16::from_be_bytes(bytes),
            Endianness::Little => i16::from_le_bytes(bytes),
        }
    }

    fn encode(self, sample: i16) -> [u8; 2] {
        match self {
            Endianness::Big => sample.to_be_bytes(),
            Endianness::Little => sample.to_le_bytes(),
        }
    }
}

/// Reads headerless 16-bit PCM; the caller supplies the sample rate and
/// channel layout the bytes were recorded with
pub struct RawPcmSource<R> {
    reader: R,
    sample_rate: u32,
    channels: u16,
    endianness: Endianness,
}

impl<R: Read> RawPcmSource<R> {
    pub fn new(reader: R, sample_rate: u32, channels: u16, endianness: Endianness) -> Self {
        Self {
            reader,
            sample_rate,
            channels,
            endianness,
        }
    }

    fn read_byte(&mut self) -> Result<Option<u8>, EngineError> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R: Read> PcmSource for RawPcmSource<R> {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn read_sample(&mut self) -> Result<Option<i16>, EngineError> {
        let Some(first) = self.read_byte()? else {
            return Ok(None);
        };
        let Some(second) = self.read_byte()? else {
            warn!("stray trailing byte at end of raw stream");
            return Ok(None);
        };
        Ok(Some(self.endianness.decode([first, second])))
    }
}

/// Writes interleaved stereo 16-bit PCM with no header
pub struct RawPcmSink<W> {
    writer: W,
    endianness: Endianness,
}

impl<W: Write> RawPcmSink<W> {
    pub fn new(writer: W, endianness: Endianness) -> Self {
        Self { writer, endianness }
    }
}

impl<W: Write> PcmSink for RawPcmSink<W> {
    fn write_frame(&mut self, left: i16, right: i16) -> Result<(), EngineError> {
        self.writer.write_all(&self.endianness.encode(left))?;
        self.writer.write_all(&self.endianness.encode(right))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), EngineError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_big_endian_round_trip() {
        let mut bytes = Vec::new();
        {
            let mut sink = RawPcmSink::new(&mut bytes, Endianness::Big);
            sink.write_frame(0x0102, -2).unwrap();
            sink.finish().unwrap();
        }
        assert_eq!(bytes, vec![0x01, 0x02, 0xFF, 0xFE]);

        let mut source = RawPcmSource::new(Cursor::new(bytes), 44_100, 2, Endianness::Big);
        assert_eq!(source.read_sample().unwrap(), Some(0x0102));
        assert_eq!(source.read_sample().unwrap(), Some(-2));
        assert_eq!(source.read_sample().unwrap(), None);
    }

    #[test]
    fn test_little_endian_decoding() {
        let bytes = vec![0x02, 0x01];
        let mut source = RawPcmSource::new(Cursor::new(bytes), 8000, 1, Endianness::Little);
        assert_eq!(source.read_sample().unwrap(), Some(0x0102));
    }

    #[test]
    fn test_stray_trailing_byte_ends_stream() {
        let bytes = vec![0x00, 0x01, 0x7F];
        let mut source = RawPcmSource::new(Cursor::new(bytes), 8000, 1, Endianness::Big);
        assert_eq!(source.read_sample().unwrap(), Some(1));
        assert_eq!(source.read_sample().unwrap(), None);
    }

    #[test]
    fn test_source_reports_caller_supplied_layout() {
        let source = RawPcmSource::new(Cursor::new(vec![]), 22_050, 1, Endianness::Little);
        assert_eq!(source.sample_rate(), 22_050);
        assert_eq!(source.channels(), 1);
    }
}
