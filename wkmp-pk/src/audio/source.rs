//! Audio source abstraction
//!
//! An [`AudioSource`] is an open, decodable input with a sequential read
//! cursor. It reports its output sample format, channel count and total
//! length, and copies interleaved PCM frames into caller-owned memory.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// PCM sample format delivered by a source
///
/// Samples are interleaved and little-endian. `S24` is packed into 3 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    U8,
    S16,
    S24,
    S32,
    F32,
}

impl SampleFormat {
    /// Size of one sample of one channel
    pub fn bytes_per_sample(self) -> u32 {
        match self {
            SampleFormat::U8 => 1,
            SampleFormat::S16 => 2,
            SampleFormat::S24 => 3,
            SampleFormat::S32 | SampleFormat::F32 => 4,
        }
    }

    pub fn bits_per_sample(self) -> u32 {
        self.bytes_per_sample() * 8
    }

    pub fn name(self) -> &'static str {
        match self {
            SampleFormat::U8 => "u8",
            SampleFormat::S16 => "s16",
            SampleFormat::S24 => "s24",
            SampleFormat::S32 => "s32",
            SampleFormat::F32 => "f32",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors reported by audio sources
#[derive(Error, Debug)]
pub enum SourceError {
    /// File missing or unreadable
    #[error("Failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Container or codec not recognised
    #[error("Unsupported audio format in {}: {message}", .path.display())]
    Unsupported { path: PathBuf, message: String },

    /// Container has no track with a known codec
    #[error("No decodable audio track in {}", .path.display())]
    NoAudioTrack { path: PathBuf },

    /// Streaming/unseekable input without a frame count
    #[error("Source cannot report its length in PCM frames")]
    UnknownLength,

    /// Packet demux or decode failure
    #[error("Decode error: {0}")]
    Decode(String),

    /// Fewer frames were delivered than requested
    #[error("Short read: requested {requested} frames, got {read}")]
    ShortRead { requested: u64, read: u64 },

    /// Caller's buffer cannot hold the requested frames
    #[error("Output buffer too small: need {needed} bytes, got {available}")]
    BufferTooSmall { needed: u64, available: usize },
}

/// An open, decodable audio input with a sequential read cursor
pub trait AudioSource {
    /// Sample format of the bytes written by [`read_pcm_frames`](Self::read_pcm_frames)
    fn output_format(&self) -> SampleFormat;

    /// Interleaved channel count
    fn output_channels(&self) -> u32;

    /// Sample rate in Hz (informational)
    fn output_sample_rate(&self) -> u32;

    /// Size of one PCM frame in bytes
    ///
    /// Defaults to sample size times channel count. Sources with a
    /// non-uniform layout override this.
    fn bytes_per_frame(&self) -> u32 {
        self.output_format()
            .bytes_per_sample()
            .saturating_mul(self.output_channels())
    }

    /// Total length of the source in PCM frames
    fn length_in_pcm_frames(&mut self) -> Result<u64, SourceError>;

    /// Read up to `frame_count` frames from the current cursor into `out`.
    ///
    /// Returns the number of frames written. Fewer than requested means the
    /// stream ended.
    fn read_pcm_frames(&mut self, out: &mut [u8], frame_count: u64) -> Result<u64, SourceError>;
}

/// Opens an [`AudioSource`] for a path
pub trait SourceOpener {
    type Source: AudioSource;

    fn open(&self, path: &Path) -> Result<Self::Source, SourceError>;
}

/// Validate that `out_len` bytes can hold `frame_count` frames.
///
/// Returns the number of bytes the read will fill.
pub fn check_output_len(
    out_len: usize,
    frame_count: u64,
    bytes_per_frame: u32,
) -> Result<usize, SourceError> {
    let needed = frame_count.saturating_mul(bytes_per_frame as u64);
    match usize::try_from(needed) {
        Ok(needed) if needed <= out_len => Ok(needed),
        _ => Err(SourceError::BufferTooSmall {
            needed,
            available: out_len,
        }),
    }
}
