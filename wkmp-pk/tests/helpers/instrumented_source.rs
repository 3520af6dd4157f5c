//! Instrumented audio source
//!
//! Wraps a [`MemorySource`] and records every read and the release of the
//! source into a shared [`SourceProbe`], which outlives the source itself.
//! Failures can be injected per read call.

use std::cell::RefCell;
use std::rc::Rc;
use wkmp_pk::audio::{AudioSource, MemorySource, SampleFormat, SourceError};

#[derive(Debug, Default)]
struct ProbeLog {
    /// `frame_count` of each read call, in order
    reads: Vec<u64>,
    /// Number of times the source was dropped
    released: u32,
}

/// Observer handle kept by the test after the source is moved into a run
#[derive(Debug, Clone, Default)]
pub struct SourceProbe {
    log: Rc<RefCell<ProbeLog>>,
}

impl SourceProbe {
    pub fn reads(&self) -> Vec<u64> {
        self.log.borrow().reads.clone()
    }

    pub fn released(&self) -> u32 {
        self.log.borrow().released
    }
}

/// Byte `i` of the stream is `i % 251`, so packet contents reveal their offset
pub fn pattern_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub struct InstrumentedSource {
    inner: MemorySource,
    probe: SourceProbe,
    fail_on_read: Option<usize>,
    short_on_read: Option<usize>,
    unknown_length: bool,
    bytes_per_frame: Option<u32>,
}

impl InstrumentedSource {
    /// `frames` frames of s16 PCM with `channels` channels
    pub fn new(frames: u64, channels: u32) -> (Self, SourceProbe) {
        let len = frames as usize * channels as usize * 2;
        let inner = MemorySource::new(pattern_bytes(len), SampleFormat::S16, channels, 44100);
        let probe = SourceProbe::default();

        let source = Self {
            inner,
            probe: probe.clone(),
            fail_on_read: None,
            short_on_read: None,
            unknown_length: false,
            bytes_per_frame: None,
        };

        (source, probe)
    }

    /// Read call `index` (0-based) returns a decode error
    pub fn fail_on_read(mut self, index: usize) -> Self {
        self.fail_on_read = Some(index);
        self
    }

    /// Read call `index` (0-based) delivers one frame less than requested
    pub fn short_on_read(mut self, index: usize) -> Self {
        self.short_on_read = Some(index);
        self
    }

    /// `length_in_pcm_frames` fails
    pub fn unknown_length(mut self) -> Self {
        self.unknown_length = true;
        self
    }

    /// Report a frame size other than the real one
    pub fn with_bytes_per_frame(mut self, bytes_per_frame: u32) -> Self {
        self.bytes_per_frame = Some(bytes_per_frame);
        self
    }
}

impl AudioSource for InstrumentedSource {
    fn output_format(&self) -> SampleFormat {
        self.inner.output_format()
    }

    fn output_channels(&self) -> u32 {
        self.inner.output_channels()
    }

    fn output_sample_rate(&self) -> u32 {
        self.inner.output_sample_rate()
    }

    fn bytes_per_frame(&self) -> u32 {
        self.bytes_per_frame
            .unwrap_or_else(|| self.inner.bytes_per_frame())
    }

    fn length_in_pcm_frames(&mut self) -> Result<u64, SourceError> {
        if self.unknown_length {
            return Err(SourceError::UnknownLength);
        }
        self.inner.length_in_pcm_frames()
    }

    fn read_pcm_frames(&mut self, out: &mut [u8], frame_count: u64) -> Result<u64, SourceError> {
        let index = {
            let mut log = self.probe.log.borrow_mut();
            log.reads.push(frame_count);
            log.reads.len() - 1
        };

        if self.fail_on_read == Some(index) {
            return Err(SourceError::Decode("injected decode failure".to_string()));
        }

        if self.short_on_read == Some(index) {
            let short = frame_count.saturating_sub(1);
            return self.inner.read_pcm_frames(out, short);
        }

        self.inner.read_pcm_frames(out, frame_count)
    }
}

impl Drop for InstrumentedSource {
    fn drop(&mut self) {
        self.probe.log.borrow_mut().released += 1;
    }
}
