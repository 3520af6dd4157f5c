//! In-memory PCM source
//!
//! Serves interleaved PCM bytes that are already decoded, e.g. audio produced
//! by another part of the system or synthesised for benchmarks.

use super::source::{check_output_len, AudioSource, SampleFormat, SourceError};

/// Interleaved PCM held in memory with a sequential read cursor
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    format: SampleFormat,
    channels: u32,
    sample_rate: u32,
    /// Byte offset of the read cursor
    position: usize,
}

impl MemorySource {
    /// Wrap interleaved PCM bytes.
    ///
    /// A trailing partial frame is never delivered.
    pub fn new(data: Vec<u8>, format: SampleFormat, channels: u32, sample_rate: u32) -> Self {
        Self {
            data,
            format,
            channels,
            sample_rate,
            position: 0,
        }
    }

    /// `frames` frames of digital silence
    pub fn silence(format: SampleFormat, channels: u32, sample_rate: u32, frames: u64) -> Self {
        let len = frames as usize * format.bytes_per_sample() as usize * channels as usize;
        // Unsigned 8-bit silence sits at mid-scale
        let fill = if format == SampleFormat::U8 { 0x80 } else { 0 };
        Self::new(vec![fill; len], format, channels, sample_rate)
    }

    /// Frames already read
    pub fn frames_read(&self) -> u64 {
        match self.bytes_per_frame() {
            0 => 0,
            bpf => (self.position / bpf as usize) as u64,
        }
    }
}

impl AudioSource for MemorySource {
    fn output_format(&self) -> SampleFormat {
        self.format
    }

    fn output_channels(&self) -> u32 {
        self.channels
    }

    fn output_sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn length_in_pcm_frames(&mut self) -> Result<u64, SourceError> {
        match self.bytes_per_frame() {
            0 => Ok(0),
            bpf => Ok((self.data.len() / bpf as usize) as u64),
        }
    }

    fn read_pcm_frames(&mut self, out: &mut [u8], frame_count: u64) -> Result<u64, SourceError> {
        let bytes_per_frame = self.bytes_per_frame() as usize;
        let needed = check_output_len(out.len(), frame_count, self.bytes_per_frame())?;
        if needed == 0 {
            return Ok(0);
        }

        let remaining = self.data.len() - self.position;
        let count = needed.min(remaining - remaining % bytes_per_frame);

        out[..count].copy_from_slice(&self.data[self.position..self.position + count]);
        self.position += count;

        Ok((count / bytes_per_frame) as u64)
    }
}
