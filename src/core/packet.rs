//! The unit of work carried through a pipeline.
//!
//! Contents are opaque: a name for diagnostics, payload bytes and an exact
//! length in bits (a truncated transmission may end mid-byte).

use std::fmt;

/// A packet: named opaque payload with a bit-exact length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    name: String,
    data: Vec<u8>,
    bit_length: u64,
}

impl Packet {
    /// Create a packet from payload bytes.
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        let bit_length = data.len() as u64 * 8;
        Self {
            name: name.into(),
            data,
            bit_length,
        }
    }

    /// Create a zero-filled packet of an exact bit length.
    pub fn with_bit_length(name: impl Into<String>, bit_length: u64) -> Self {
        Self {
            name: name.into(),
            data: vec![0; byte_len(bit_length)],
            bit_length,
        }
    }

    /// Packet name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Payload bytes. The last byte may be partially used.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the packet, returning its payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Total length in bits.
    pub fn bit_length(&self) -> u64 {
        self.bit_length
    }

    /// Cut the packet down to `bits`, erasing from the back.
    ///
    /// Unused trailing bits of the last byte are zeroed. Does nothing if the
    /// packet is already at most `bits` long.
    pub fn truncate_bits(&mut self, bits: u64) {
        if bits >= self.bit_length {
            return;
        }
        self.bit_length = bits;
        self.data.truncate(byte_len(bits));
        let used = (bits % 8) as u32;
        if used != 0
            && let Some(last) = self.data.last_mut()
        {
            *last &= 0xFFu8 << (8 - used);
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} b)", self.name, self.bit_length)
    }
}

fn byte_len(bits: u64) -> usize {
    bits.div_ceil(8) as usize
}
