//! Packet hand-off
//!
//! A [`PacketSink`] receives every produced packet in index order. Only the
//! valid prefix of the packet buffer is exposed; the slice is reused for the
//! next packet as soon as `on_packet` returns, so sinks that keep data must
//! copy it ([`Packet::to_owned_packet`]).

use serde::Serialize;
use std::io::Write;
use std::sync::mpsc::SyncSender;
use tracing::trace;

/// Error returned by a consumer
pub type SinkError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// One packet, borrowed from the packet buffer
#[derive(Debug, Clone, Copy)]
pub struct Packet<'a> {
    pub index: u64,
    /// Valid frames in `data` (equal to frames per packet except possibly on
    /// the last packet)
    pub frames: u64,
    pub data: &'a [u8],
}

impl Packet<'_> {
    pub fn to_owned_packet(&self) -> OwnedPacket {
        OwnedPacket {
            index: self.index,
            frames: self.frames,
            data: self.data.to_vec(),
        }
    }
}

/// A packet copied out of the packet buffer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnedPacket {
    pub index: u64,
    pub frames: u64,
    pub data: Vec<u8>,
}

/// Consumer of produced packets
pub trait PacketSink {
    /// Called once per packet, strictly in index order
    fn on_packet(&mut self, packet: Packet<'_>) -> Result<(), SinkError>;

    /// Called once after the last packet of a successful run
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<F> PacketSink for F
where
    F: FnMut(Packet<'_>) -> Result<(), SinkError>,
{
    fn on_packet(&mut self, packet: Packet<'_>) -> Result<(), SinkError> {
        self(packet)
    }
}

/// Drops every packet, keeping only counts
#[derive(Debug, Default, Clone)]
pub struct DiscardSink {
    pub packets: u64,
    pub bytes: u64,
}

impl PacketSink for DiscardSink {
    fn on_packet(&mut self, packet: Packet<'_>) -> Result<(), SinkError> {
        trace!(
            "Discarding packet {} ({} frames, {} bytes)",
            packet.index,
            packet.frames,
            packet.data.len()
        );
        self.packets += 1;
        self.bytes += packet.data.len() as u64;
        Ok(())
    }
}

/// Appends packet data to a writer (raw interleaved PCM)
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
    bytes_written: u64,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> PacketSink for WriterSink<W> {
    fn on_packet(&mut self, packet: Packet<'_>) -> Result<(), SinkError> {
        self.writer.write_all(packet.data)?;
        self.bytes_written += packet.data.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Sends copies of packets over a bounded channel
///
/// `send` blocks while the channel is full, so a slow receiver throttles
/// decoding.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: SyncSender<OwnedPacket>,
}

impl ChannelSink {
    pub fn new(sender: SyncSender<OwnedPacket>) -> Self {
        Self { sender }
    }
}

impl PacketSink for ChannelSink {
    fn on_packet(&mut self, packet: Packet<'_>) -> Result<(), SinkError> {
        self.sender
            .send(packet.to_owned_packet())
            .map_err(|_| SinkError::from("packet receiver disconnected"))
    }
}
