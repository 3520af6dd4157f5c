//! WAV fixture generation
//!
//! Each `write_wav_*` function writes a WAV file with a deterministic ramp
//! pattern and returns the interleaved little-endian bytes the decoder should
//! hand out for it, so packet contents can be compared byte for byte.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory holding generated fixtures
pub struct FixtureDir {
    dir: TempDir,
}

impl FixtureDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }
}

fn spec(channels: u16, sample_rate: u32, bits: u16, format: SampleFormat) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: bits,
        sample_format: format,
    }
}

/// Ramp value for one sample, spread over `range` distinct values
fn ramp(frame: u64, channel: u16, range: i64) -> i64 {
    let raw = (frame as i64 * 97 + channel as i64 * 4099) % range;
    raw - range / 2
}

/// 16-bit signed integer WAV
pub fn write_wav_i16<P: AsRef<Path>>(
    path: P,
    channels: u16,
    sample_rate: u32,
    frames: u64,
) -> Result<Vec<u8>, hound::Error> {
    let mut writer = WavWriter::create(path, spec(channels, sample_rate, 16, SampleFormat::Int))?;
    let mut expected = Vec::with_capacity(frames as usize * channels as usize * 2);

    for frame in 0..frames {
        for channel in 0..channels {
            let sample = ramp(frame, channel, 1 << 16) as i16;
            writer.write_sample(sample)?;
            expected.extend_from_slice(&sample.to_le_bytes());
        }
    }

    writer.finalize()?;
    Ok(expected)
}

/// 24-bit signed integer WAV (3 bytes per sample)
pub fn write_wav_i24<P: AsRef<Path>>(
    path: P,
    channels: u16,
    sample_rate: u32,
    frames: u64,
) -> Result<Vec<u8>, hound::Error> {
    let mut writer = WavWriter::create(path, spec(channels, sample_rate, 24, SampleFormat::Int))?;
    let mut expected = Vec::with_capacity(frames as usize * channels as usize * 3);

    for frame in 0..frames {
        for channel in 0..channels {
            let sample = ramp(frame, channel, 1 << 24) as i32;
            writer.write_sample(sample)?;
            expected.extend_from_slice(&sample.to_le_bytes()[..3]);
        }
    }

    writer.finalize()?;
    Ok(expected)
}

/// 8-bit WAV (stored unsigned, offset by 128)
pub fn write_wav_u8<P: AsRef<Path>>(
    path: P,
    channels: u16,
    sample_rate: u32,
    frames: u64,
) -> Result<Vec<u8>, hound::Error> {
    let mut writer = WavWriter::create(path, spec(channels, sample_rate, 8, SampleFormat::Int))?;
    let mut expected = Vec::with_capacity(frames as usize * channels as usize);

    for frame in 0..frames {
        for channel in 0..channels {
            let sample = ramp(frame, channel, 1 << 8) as i8;
            writer.write_sample(sample)?;
            expected.push((sample as i16 + 128) as u8);
        }
    }

    writer.finalize()?;
    Ok(expected)
}

/// 32-bit float WAV
pub fn write_wav_f32<P: AsRef<Path>>(
    path: P,
    channels: u16,
    sample_rate: u32,
    frames: u64,
) -> Result<Vec<u8>, hound::Error> {
    let mut writer =
        WavWriter::create(path, spec(channels, sample_rate, 32, SampleFormat::Float))?;
    let mut expected = Vec::with_capacity(frames as usize * channels as usize * 4);

    for frame in 0..frames {
        for channel in 0..channels {
            let sample = ramp(frame, channel, 1 << 16) as f32 / 65536.0;
            writer.write_sample(sample)?;
            expected.extend_from_slice(&sample.to_le_bytes());
        }
    }

    writer.finalize()?;
    Ok(expected)
}

/// Stereo 16-bit sine wave at 44.1 kHz
pub fn generate_sine_wav<P: AsRef<Path>>(
    path: P,
    frames: u64,
    frequency_hz: f32,
    amplitude: f32,
) -> Result<(), hound::Error> {
    let sample_rate = 44100;
    let mut writer = WavWriter::create(path, spec(2, sample_rate, 16, SampleFormat::Int))?;

    for frame in 0..frames {
        let t = frame as f32 / sample_rate as f32;
        let sample = (amplitude * (2.0 * PI * frequency_hz * t).sin() * i16::MAX as f32) as i16;
        writer.write_sample(sample)?;
        writer.write_sample(sample)?;
    }

    writer.finalize()?;
    Ok(())
}
