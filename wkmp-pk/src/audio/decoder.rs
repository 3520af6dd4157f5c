//! Audio file source using symphonia
//!
//! Opens a file, probes its container, and decodes the default audio track
//! sequentially. The output sample format is negotiated from the first
//! decoded buffer (the codec's native format), so no sample-format
//! conversion happens beyond widening/narrowing into the nearest
//! [`SampleFormat`].
//!
//! Format mapping:
//! - u8, s8 -> `U8`
//! - u16, s16 -> `S16`
//! - u24, s24 -> `S24` (packed)
//! - u32, s32 -> `S32`
//! - f32, f64 -> `F32`

use super::source::{check_output_len, AudioSource, SampleFormat, SourceError, SourceOpener};
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::audio::{AudioBufferRef, SampleBuffer};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::SampleFormat as CodecSampleFormat;
use tracing::{debug, trace};

/// Opens files as [`SymphoniaSource`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaOpener;

impl SourceOpener for SymphoniaOpener {
    type Source = SymphoniaSource;

    fn open(&self, path: &Path) -> Result<SymphoniaSource, SourceError> {
        SymphoniaSource::open(path)
    }
}

/// Sequential PCM reader over a decoded audio file
pub struct SymphoniaSource {
    path: PathBuf,

    /// Symphonia format reader
    format: Box<dyn FormatReader>,

    /// Symphonia decoder
    decoder: Box<dyn Decoder>,

    /// Track being decoded
    track_id: u32,

    sample_format: SampleFormat,
    channels: u32,
    sample_rate: u32,

    /// Frame count from the container, if it has one
    n_frames: Option<u64>,

    /// Converted bytes decoded but not yet handed out
    pending: Vec<u8>,
    pending_pos: usize,

    format_negotiated: bool,
    end_of_stream: bool,
}

impl SymphoniaSource {
    /// Open and probe an audio file.
    ///
    /// Decodes the first packet to learn the output format.
    ///
    /// # Errors
    /// - `Io` if the file cannot be opened
    /// - `Unsupported` if no demuxer/decoder accepts it
    /// - `NoAudioTrack` if the container holds no decodable track
    /// - `Decode` if the first packet fails to decode
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref();
        debug!("Opening audio source: {}", path.display());

        let file = File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| SourceError::Unsupported {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| SourceError::NoAudioTrack {
                path: path.to_path_buf(),
            })?;

        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| SourceError::Unsupported {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        // Codec parameters are only a fallback for streams with no audio
        let sample_format = codec_params
            .sample_format
            .map(from_codec_format)
            .or_else(|| codec_params.bits_per_sample.map(format_for_bits))
            .unwrap_or(SampleFormat::F32);

        let mut source = Self {
            path: path.to_path_buf(),
            format,
            decoder,
            track_id,
            sample_format,
            channels: codec_params.channels.map(|c| c.count() as u32).unwrap_or(0),
            sample_rate: codec_params.sample_rate.unwrap_or(0),
            n_frames: codec_params.n_frames,
            pending: Vec::new(),
            pending_pos: 0,
            format_negotiated: false,
            end_of_stream: false,
        };

        source.decode_next()?;
        source.format_negotiated = true;

        debug!(
            "Audio format: {} x {} channel(s) @ {} Hz, {:?} frames",
            source.sample_format, source.channels, source.sample_rate, source.n_frames
        );

        Ok(source)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the next packet of our track into `pending`.
    ///
    /// Returns `false` at end of stream.
    fn decode_next(&mut self) -> Result<bool, SourceError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    trace!("Reached end of {}", self.path.display());
                    self.end_of_stream = true;
                    return Ok(false);
                }
                Err(e) => {
                    return Err(SourceError::Decode(format!("Failed to read packet: {}", e)));
                }
            };

            // Skip packets for other tracks
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = self
                .decoder
                .decode(&packet)
                .map_err(|e| SourceError::Decode(e.to_string()))?;

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            let channels = spec.channels.count() as u32;

            if !self.format_negotiated {
                self.sample_format = native_format(&decoded);
                self.channels = channels;
                self.sample_rate = spec.rate;
                self.format_negotiated = true;
            } else if channels != self.channels {
                return Err(SourceError::Decode(format!(
                    "Channel count changed mid-stream from {} to {}",
                    self.channels, channels
                )));
            }

            append_interleaved(self.sample_format, decoded, &mut self.pending);
            return Ok(true);
        }
    }
}

impl AudioSource for SymphoniaSource {
    fn output_format(&self) -> SampleFormat {
        self.sample_format
    }

    fn output_channels(&self) -> u32 {
        self.channels
    }

    fn output_sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn length_in_pcm_frames(&mut self) -> Result<u64, SourceError> {
        self.n_frames.ok_or(SourceError::UnknownLength)
    }

    fn read_pcm_frames(&mut self, out: &mut [u8], frame_count: u64) -> Result<u64, SourceError> {
        let bytes_per_frame = self.bytes_per_frame();
        let needed = check_output_len(out.len(), frame_count, bytes_per_frame)?;
        if needed == 0 {
            return Ok(0);
        }

        let mut written = 0;
        while written < needed {
            if self.pending_pos == self.pending.len() {
                self.pending.clear();
                self.pending_pos = 0;
                if self.end_of_stream || !self.decode_next()? {
                    break;
                }
                continue;
            }

            let count = (self.pending.len() - self.pending_pos).min(needed - written);
            out[written..written + count]
                .copy_from_slice(&self.pending[self.pending_pos..self.pending_pos + count]);
            written += count;
            self.pending_pos += count;
        }

        Ok((written / bytes_per_frame as usize) as u64)
    }
}

/// Output format for a decoded buffer's native sample type
fn native_format(decoded: &AudioBufferRef<'_>) -> SampleFormat {
    match decoded {
        AudioBufferRef::U8(_) | AudioBufferRef::S8(_) => SampleFormat::U8,
        AudioBufferRef::U16(_) | AudioBufferRef::S16(_) => SampleFormat::S16,
        AudioBufferRef::U24(_) | AudioBufferRef::S24(_) => SampleFormat::S24,
        AudioBufferRef::U32(_) | AudioBufferRef::S32(_) => SampleFormat::S32,
        AudioBufferRef::F32(_) | AudioBufferRef::F64(_) => SampleFormat::F32,
    }
}

fn from_codec_format(format: CodecSampleFormat) -> SampleFormat {
    match format {
        CodecSampleFormat::U8 | CodecSampleFormat::S8 => SampleFormat::U8,
        CodecSampleFormat::U16 | CodecSampleFormat::S16 => SampleFormat::S16,
        CodecSampleFormat::U24 | CodecSampleFormat::S24 => SampleFormat::S24,
        CodecSampleFormat::U32 | CodecSampleFormat::S32 => SampleFormat::S32,
        CodecSampleFormat::F32 | CodecSampleFormat::F64 => SampleFormat::F32,
    }
}

fn format_for_bits(bits: u32) -> SampleFormat {
    match bits {
        8 => SampleFormat::U8,
        16 => SampleFormat::S16,
        24 => SampleFormat::S24,
        32 => SampleFormat::S32,
        _ => SampleFormat::F32,
    }
}

/// Interleave a decoded buffer into little-endian bytes of `format`.
fn append_interleaved(format: SampleFormat, decoded: AudioBufferRef<'_>, out: &mut Vec<u8>) {
    let spec = *decoded.spec();
    let duration = decoded.capacity() as u64;

    match format {
        SampleFormat::U8 => {
            let mut buf = SampleBuffer::<u8>::new(duration, spec);
            buf.copy_interleaved_ref(decoded);
            out.extend_from_slice(buf.samples());
        }
        SampleFormat::S16 => {
            let mut buf = SampleBuffer::<i16>::new(duration, spec);
            buf.copy_interleaved_ref(decoded);
            out.reserve(buf.samples().len() * 2);
            for &sample in buf.samples() {
                out.extend_from_slice(&sample.to_le_bytes());
            }
        }
        SampleFormat::S24 => {
            // i32 carries the 24-bit value in its top three bytes
            let mut buf = SampleBuffer::<i32>::new(duration, spec);
            buf.copy_interleaved_ref(decoded);
            out.reserve(buf.samples().len() * 3);
            for &sample in buf.samples() {
                out.extend_from_slice(&(sample >> 8).to_le_bytes()[..3]);
            }
        }
        SampleFormat::S32 => {
            let mut buf = SampleBuffer::<i32>::new(duration, spec);
            buf.copy_interleaved_ref(decoded);
            out.reserve(buf.samples().len() * 4);
            for &sample in buf.samples() {
                out.extend_from_slice(&sample.to_le_bytes());
            }
        }
        SampleFormat::F32 => {
            let mut buf = SampleBuffer::<f32>::new(duration, spec);
            buf.copy_interleaved_ref(decoded);
            out.reserve(buf.samples().len() * 4);
            for &sample in buf.samples() {
                out.extend_from_slice(&sample.to_le_bytes());
            }
        }
    }
}
