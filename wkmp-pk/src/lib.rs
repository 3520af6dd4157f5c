//! # WKMP Packetizer Library (wkmp-pk)
//!
//! Decodes an audio file into a sequence of fixed-size PCM packets for a
//! downstream transport buffer.
//!
//! **Architecture:** open source -> packet geometry -> single packet buffer ->
//! sequential packet reads -> teardown. Decoding is symphonia behind the
//! [`audio::AudioSource`] trait; packets are handed to a
//! [`packetizer::PacketSink`].

pub mod audio;
pub mod config;
pub mod error;
pub mod packetizer;

pub use error::{Error, Result, Stage};
pub use packetizer::{Packetizer, RunSummary};
