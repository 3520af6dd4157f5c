//! Packet buffer
//!
//! One contiguous byte region sized to exactly one packet. Reused for every
//! packet of a run and never resized; after a read only a prefix may hold
//! valid audio.

use std::collections::TryReserveError;

/// Reusable single-packet byte buffer
#[derive(Debug)]
pub struct PacketBuffer {
    bytes: Vec<u8>,
}

impl PacketBuffer {
    /// Allocate exactly `size_in_bytes` zeroed bytes.
    ///
    /// # Errors
    /// Returns the allocator's error instead of aborting when memory cannot
    /// be obtained.
    pub fn allocate(size_in_bytes: usize) -> Result<Self, TryReserveError> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(size_in_bytes)?;
        bytes.resize(size_in_bytes, 0);
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Writable prefix for the next read
    ///
    /// # Panics
    /// If `valid_bytes` exceeds the buffer length.
    pub fn fill_region(&mut self, valid_bytes: usize) -> &mut [u8] {
        &mut self.bytes[..valid_bytes]
    }

    /// Valid prefix after a read
    ///
    /// # Panics
    /// If `valid_bytes` exceeds the buffer length.
    pub fn valid(&self, valid_bytes: usize) -> &[u8] {
        &self.bytes[..valid_bytes]
    }
}
