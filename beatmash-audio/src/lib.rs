//! Core batch audio-effect engine: beat-windowed PCM transforms and the
//! parallel pipeline that applies them.
//!
//! A [`pipeline::Pipeline`] frames a [`PcmSource`] into per-beat
//! [`SampleBatch`]es, runs a [`SampleModifier`] over both channels of each
//! batch on a worker pool, and reassembles the results in stream order
//! into a [`PcmSink`]. Modifiers range from simple beat dropping to WSOLA
//! time-stretching (see [`modifiers`] and [`stretch`]).

mod batch;
mod modifier;
mod stream;
mod window;

pub mod modifiers;
pub mod pipeline;
pub mod stretch;

pub use batch::{SampleBatch, SampleSelection};
pub use modifier::{ModifyError, SampleModifier, SampleSelector};
pub use stream::{EngineError, MemorySink, MemorySource, PcmSink, PcmSource};
pub use window::WindowFunction;
