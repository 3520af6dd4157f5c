//! Packetization run
//!
//! A run owns exactly two resources, the audio source and the packet buffer,
//! inside a [`RunContext`]. Stages acquire into the context and the context
//! is torn down once at the end of every run, successful or not, releasing
//! only what was acquired. Teardown consumes the context, so neither resource
//! can be touched afterwards.
//!
//! Stage order:
//! 1. Open source
//! 2. Packet layout (bytes per frame x frames per packet)
//! 3. Total frame count -> total packets
//! 4. Allocate packet buffer
//! 5. Read packets 0..total_packets, handing each to the sink
//! 6. Teardown

use super::buffer::PacketBuffer;
use super::geometry::{PacketGeometry, PacketLayout};
use super::sink::{Packet, PacketSink};
use crate::audio::{AudioSource, SourceError, SourceOpener};
use crate::error::{Error, Result};
use serde::Serialize;
use std::num::NonZeroU32;
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// Default PCM frames per packet
pub const DEFAULT_FRAMES_PER_PACKET: u32 = 1024;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub geometry: PacketGeometry,
    pub packets_produced: u64,
    pub frames_produced: u64,
    pub bytes_produced: u64,
}

impl RunSummary {
    fn new(geometry: PacketGeometry) -> Self {
        Self {
            geometry,
            packets_produced: 0,
            frames_produced: 0,
            bytes_produced: 0,
        }
    }
}

/// Decodes a source into fixed-size packets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packetizer {
    frames_per_packet: NonZeroU32,
}

impl Default for Packetizer {
    fn default() -> Self {
        Self {
            frames_per_packet: NonZeroU32::new(DEFAULT_FRAMES_PER_PACKET)
                .unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl Packetizer {
    pub fn new(frames_per_packet: NonZeroU32) -> Self {
        Self { frames_per_packet }
    }

    pub fn frames_per_packet(&self) -> NonZeroU32 {
        self.frames_per_packet
    }

    /// Open `path` with `opener` and packetize it into `sink`.
    ///
    /// # Errors
    /// `SourceOpen` if the source cannot be opened, otherwise as
    /// [`run_source`](Self::run_source).
    pub fn run<O, K>(&self, opener: &O, path: &Path, sink: &mut K) -> Result<RunSummary>
    where
        O: SourceOpener,
        K: PacketSink + ?Sized,
    {
        let source = opener.open(path).map_err(|e| {
            warn!("Could not load file: {}", path.display());
            Error::SourceOpen {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        self.run_source(source, sink)
    }

    /// Packetize an already open source into `sink`.
    ///
    /// The source is released before this returns, whatever the outcome.
    /// Packets handed to the sink before a failure stay valid; none are
    /// produced after it.
    ///
    /// # Errors
    /// - `Geometry`: packet size is zero or unaddressable
    /// - `FrameCount`: the source cannot report its length
    /// - `Allocation`: the packet buffer cannot be allocated
    /// - `Read`: a read failed or came back short
    /// - `Consumer` / `ConsumerFinish`: the sink failed
    pub fn run_source<S, K>(&self, source: S, sink: &mut K) -> Result<RunSummary>
    where
        S: AudioSource,
        K: PacketSink + ?Sized,
    {
        let mut context = RunContext::new(source);
        let result = self.drive(&mut context, sink);
        context.teardown();

        match &result {
            Ok(summary) => info!(
                "Packetization completed without error: {} packets, {} frames",
                summary.packets_produced, summary.frames_produced
            ),
            Err(e) => warn!("Packetization aborted in {} stage: {}", e.stage(), e),
        }

        result
    }

    fn drive<S, K>(&self, context: &mut RunContext<S>, sink: &mut K) -> Result<RunSummary>
    where
        S: AudioSource,
        K: PacketSink + ?Sized,
    {
        let RunContext { source, buffer } = context;

        debug!(
            "Source format: {} x {} channel(s) @ {} Hz",
            source.output_format(),
            source.output_channels(),
            source.output_sample_rate()
        );

        let layout = PacketLayout::new(self.frames_per_packet, source.bytes_per_frame())?;
        let total_frames = source.length_in_pcm_frames().map_err(Error::FrameCount)?;
        let geometry = layout.with_total_frames(total_frames);

        info!("Total Frames: {}", geometry.total_frames());
        info!("Total Packets: {}", geometry.total_packets());
        debug!(
            "Packet size: {} frames x {} bytes = {} bytes",
            geometry.frames_per_packet(),
            geometry.bytes_per_frame(),
            geometry.packet_size_in_bytes()
        );

        let size = geometry.packet_size_in_bytes();
        let packet_buffer = PacketBuffer::allocate(size)
            .map_err(|e| Error::Allocation { size, source: e })?;
        let packet_buffer = buffer.insert(packet_buffer);

        packetize(source, packet_buffer, &geometry, sink)
    }
}

/// Read every packet of `geometry` from `source` through `buffer` into `sink`
fn packetize<S, K>(
    source: &mut S,
    buffer: &mut PacketBuffer,
    geometry: &PacketGeometry,
    sink: &mut K,
) -> Result<RunSummary>
where
    S: AudioSource,
    K: PacketSink + ?Sized,
{
    let mut summary = RunSummary::new(*geometry);

    for cursor in geometry.cursors() {
        let packet_index = cursor.packet_index;
        let valid_bytes = geometry.valid_bytes(cursor.frames_to_read);

        let read = source
            .read_pcm_frames(buffer.fill_region(valid_bytes), cursor.frames_to_read)
            .map_err(|e| Error::Read {
                packet_index,
                source: e,
            })?;

        if read != cursor.frames_to_read {
            return Err(Error::Read {
                packet_index,
                source: SourceError::ShortRead {
                    requested: cursor.frames_to_read,
                    read,
                },
            });
        }

        trace!(
            "Packet {}: {} frames ({} remaining)",
            packet_index,
            cursor.frames_to_read,
            cursor.frames_remaining
        );

        sink.on_packet(Packet {
            index: packet_index,
            frames: cursor.frames_to_read,
            data: buffer.valid(valid_bytes),
        })
        .map_err(|e| Error::Consumer {
            packet_index,
            source: e,
        })?;

        summary.packets_produced += 1;
        summary.frames_produced += cursor.frames_to_read;
        summary.bytes_produced += valid_bytes as u64;
    }

    sink.finish().map_err(Error::ConsumerFinish)?;

    Ok(summary)
}

/// Resources held by one run
struct RunContext<S: AudioSource> {
    source: S,
    buffer: Option<PacketBuffer>,
}

/// What teardown released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Teardown {
    buffer_released: bool,
}

impl<S: AudioSource> RunContext<S> {
    fn new(source: S) -> Self {
        Self {
            source,
            buffer: None,
        }
    }

    /// Release the buffer (if allocated), then the source.
    fn teardown(self) -> Teardown {
        let RunContext { source, buffer } = self;

        let buffer_released = match buffer {
            Some(buffer) => {
                debug!("Releasing {} byte packet buffer", buffer.len());
                drop(buffer);
                true
            }
            None => false,
        };

        drop(source);
        debug!("Released audio source");

        Teardown { buffer_released }
    }
}
