//! Test helper modules for wkmp-pk integration tests
//!
//! - `audio_generator`: deterministic WAV fixtures (hound) with the exact
//!   PCM bytes the decoder is expected to deliver
//! - `instrumented_source`: in-memory source that records reads and releases
//!   and can inject failures

#![allow(dead_code)]

pub mod audio_generator;
pub mod instrumented_source;

pub use audio_generator::{
    generate_sine_wav, write_wav_f32, write_wav_i16, write_wav_i24, write_wav_u8, FixtureDir,
};
pub use instrumented_source::{pattern_bytes, InstrumentedSource, SourceProbe};
