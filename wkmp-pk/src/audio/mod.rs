//! Audio sources
//!
//! The packetizer only sees the [`AudioSource`] trait. [`SymphoniaSource`]
//! decodes files; [`MemorySource`] serves PCM already in memory.

pub mod decoder;
pub mod memory;
pub mod source;

pub use decoder::{SymphoniaOpener, SymphoniaSource};
pub use memory::MemorySource;
pub use source::{check_output_len, AudioSource, SampleFormat, SourceError, SourceOpener};
