//! Container adapters for the engine's PCM stream traits.
//!
//! [`SymphoniaSource`] decodes compressed containers (MP3, FLAC, OGG, WAV,
//! AAC) into the engine's sample stream; [`RawPcmSource`]/[`RawPcmSink`]
//! handle headerless 16-bit PCM in either byte order; [`WavSink`] writes
//! the processed stream back out as a WAV file.

mod decode;
mod raw;
mod wav;

pub use decode::SymphoniaSource;
pub use raw::{Endianness, RawPcmSink, RawPcmSource};
pub use wav::WavSink;
