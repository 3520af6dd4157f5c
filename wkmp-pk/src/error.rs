//! Error types for wkmp-pk
//!
//! Every failure is tagged with the pipeline stage that produced it. All
//! stages are fatal; a caller may only restart the whole run.

use crate::audio::SourceError;
use crate::packetizer::{GeometryError, SinkError};
use std::collections::TryReserveError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for wkmp-pk
#[derive(Error, Debug)]
pub enum Error {
    /// Bootstrap configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration errors from wkmp-common
    #[error(transparent)]
    Common(#[from] wkmp_common::Error),

    /// Audio source could not be opened
    #[error("Could not load file {}: {source}", .path.display())]
    SourceOpen { path: PathBuf, source: SourceError },

    /// Degenerate packet size
    #[error("Invalid packet geometry: {0}")]
    Geometry(#[from] GeometryError),

    /// Source cannot report its length
    #[error("Failed to get total frames: {0}")]
    FrameCount(#[source] SourceError),

    /// Packet buffer could not be allocated
    #[error("Packet buffer allocation of {size} bytes failed: {source}")]
    Allocation {
        size: usize,
        source: TryReserveError,
    },

    /// Decode/read failure or short read while filling a packet
    #[error("Failed to read audio data for packet {packet_index}: {source}")]
    Read {
        packet_index: u64,
        source: SourceError,
    },

    /// Consumer rejected a packet
    #[error("Packet consumer failed on packet {packet_index}: {source}")]
    Consumer {
        packet_index: u64,
        source: SinkError,
    },

    /// Consumer failed to finish after the last packet
    #[error("Packet consumer failed to finish: {0}")]
    ConsumerFinish(#[source] SinkError),
}

/// Convenience Result type using wkmp-pk Error
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an [`Error`] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Config,
    SourceOpen,
    Geometry,
    FrameCount,
    Allocation,
    Read,
    Consumer,
}

impl Stage {
    /// Process exit code for a run that failed in this stage
    pub fn exit_code(self) -> u8 {
        match self {
            Stage::Config => 1,
            Stage::SourceOpen => 2,
            Stage::Geometry => 3,
            Stage::FrameCount => 4,
            Stage::Allocation => 5,
            Stage::Read => 6,
            Stage::Consumer => 7,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Config => "configuration",
            Stage::SourceOpen => "source open",
            Stage::Geometry => "packet geometry",
            Stage::FrameCount => "frame count",
            Stage::Allocation => "buffer allocation",
            Stage::Read => "packet read",
            Stage::Consumer => "packet consumer",
        })
    }
}

impl Error {
    pub fn stage(&self) -> Stage {
        match self {
            Error::Config(_) | Error::Common(_) => Stage::Config,
            Error::SourceOpen { .. } => Stage::SourceOpen,
            Error::Geometry(_) => Stage::Geometry,
            Error::FrameCount(_) => Stage::FrameCount,
            Error::Allocation { .. } => Stage::Allocation,
            Error::Read { .. } => Stage::Read,
            Error::Consumer { .. } | Error::ConsumerFinish(_) => Stage::Consumer,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.stage().exit_code()
    }
}
