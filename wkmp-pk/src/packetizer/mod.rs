//! Fixed-size PCM packetization
//!
//! Splits the decoded output of an [`AudioSource`](crate::audio::AudioSource)
//! into packets of a fixed frame count. The last packet may be short.

pub mod buffer;
pub mod geometry;
pub mod pipeline;
pub mod sink;

pub use buffer::PacketBuffer;
pub use geometry::{GeometryError, PacketCursor, PacketCursors, PacketGeometry, PacketLayout};
pub use pipeline::{Packetizer, RunSummary, DEFAULT_FRAMES_PER_PACKET};
pub use sink::{ChannelSink, DiscardSink, OwnedPacket, Packet, PacketSink, SinkError, WriterSink};
