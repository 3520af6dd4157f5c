//! Packet geometry
//!
//! Packet size arithmetic is split in two steps so each failure surfaces at
//! the right stage:
//! 1. [`PacketLayout`]: frames per packet x bytes per frame (needs only the
//!    source format)
//! 2. [`PacketGeometry`]: layout plus the source's total frame count
//!
//! Invariants held by every `PacketGeometry`:
//! - `total_packets * frames_per_packet >= total_frames`
//! - `(total_packets - 1) * frames_per_packet < total_frames` when
//!   `total_packets > 0`

use serde::Serialize;
use std::num::NonZeroU32;
use thiserror::Error;

/// Degenerate packet sizes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("packet size is zero ({frames_per_packet} frames x {bytes_per_frame} bytes per frame)")]
    ZeroPacketSize {
        frames_per_packet: u32,
        bytes_per_frame: u32,
    },

    #[error(
        "packet size of {frames_per_packet} frames x {bytes_per_frame} bytes per frame is not addressable"
    )]
    PacketTooLarge {
        frames_per_packet: u32,
        bytes_per_frame: u32,
    },
}

/// Byte layout of one packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PacketLayout {
    frames_per_packet: NonZeroU32,
    bytes_per_frame: u32,
    packet_size_in_bytes: usize,
}

impl PacketLayout {
    /// # Errors
    /// - `ZeroPacketSize` when `bytes_per_frame` is 0 (e.g. no channels)
    /// - `PacketTooLarge` when the product does not fit in `usize`
    pub fn new(frames_per_packet: NonZeroU32, bytes_per_frame: u32) -> Result<Self, GeometryError> {
        let size = frames_per_packet.get() as u64 * bytes_per_frame as u64;

        if size == 0 {
            return Err(GeometryError::ZeroPacketSize {
                frames_per_packet: frames_per_packet.get(),
                bytes_per_frame,
            });
        }

        let packet_size_in_bytes =
            usize::try_from(size).map_err(|_| GeometryError::PacketTooLarge {
                frames_per_packet: frames_per_packet.get(),
                bytes_per_frame,
            })?;

        Ok(Self {
            frames_per_packet,
            bytes_per_frame,
            packet_size_in_bytes,
        })
    }

    /// Complete the geometry with the source length
    pub fn with_total_frames(self, total_frames: u64) -> PacketGeometry {
        PacketGeometry {
            layout: self,
            total_frames,
            total_packets: total_frames.div_ceil(self.frames_per_packet.get() as u64),
        }
    }

    pub fn frames_per_packet(&self) -> u32 {
        self.frames_per_packet.get()
    }

    pub fn bytes_per_frame(&self) -> u32 {
        self.bytes_per_frame
    }

    pub fn packet_size_in_bytes(&self) -> usize {
        self.packet_size_in_bytes
    }
}

/// Packet geometry for one run. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PacketGeometry {
    #[serde(flatten)]
    layout: PacketLayout,
    total_frames: u64,
    total_packets: u64,
}

impl PacketGeometry {
    /// Compute layout and packet count in one step
    pub fn new(
        frames_per_packet: NonZeroU32,
        bytes_per_frame: u32,
        total_frames: u64,
    ) -> Result<Self, GeometryError> {
        Ok(PacketLayout::new(frames_per_packet, bytes_per_frame)?.with_total_frames(total_frames))
    }

    pub fn layout(&self) -> PacketLayout {
        self.layout
    }

    pub fn frames_per_packet(&self) -> u32 {
        self.layout.frames_per_packet()
    }

    pub fn bytes_per_frame(&self) -> u32 {
        self.layout.bytes_per_frame()
    }

    pub fn packet_size_in_bytes(&self) -> usize {
        self.layout.packet_size_in_bytes()
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn total_packets(&self) -> u64 {
        self.total_packets
    }

    /// Loop state for `packet_index`, or `None` past the last packet
    pub fn cursor(&self, packet_index: u64) -> Option<PacketCursor> {
        if packet_index >= self.total_packets {
            return None;
        }

        let frames_per_packet = self.frames_per_packet() as u64;
        let frames_remaining = self.total_frames - packet_index * frames_per_packet;

        Some(PacketCursor {
            packet_index,
            frames_remaining,
            frames_to_read: frames_remaining.min(frames_per_packet),
        })
    }

    /// Cursors for every packet in index order
    pub fn cursors(&self) -> PacketCursors {
        PacketCursors {
            geometry: *self,
            next_index: 0,
        }
    }

    /// Bytes holding `frames` frames (at most one packet)
    pub fn valid_bytes(&self, frames: u64) -> usize {
        frames as usize * self.bytes_per_frame() as usize
    }
}

/// Per-iteration packetizer state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketCursor {
    pub packet_index: u64,
    /// Frames left in the source from this packet on
    pub frames_remaining: u64,
    /// `min(frames_remaining, frames_per_packet)`
    pub frames_to_read: u64,
}

impl PacketCursor {
    /// True when this packet is shorter than a full packet
    pub fn is_partial(&self, geometry: &PacketGeometry) -> bool {
        self.frames_to_read < geometry.frames_per_packet() as u64
    }
}

/// Iterator over a geometry's [`PacketCursor`]s
#[derive(Debug, Clone)]
pub struct PacketCursors {
    geometry: PacketGeometry,
    next_index: u64,
}

impl Iterator for PacketCursors {
    type Item = PacketCursor;

    fn next(&mut self) -> Option<PacketCursor> {
        let cursor = self.geometry.cursor(self.next_index)?;
        self.next_index += 1;
        Some(cursor)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.geometry.total_packets - self.next_index;
        match usize::try_from(remaining) {
            Ok(n) => (n, Some(n)),
            Err(_) => (usize::MAX, None),
        }
    }
}
