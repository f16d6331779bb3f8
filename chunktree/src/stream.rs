//! Linearized chunk content.
//!
//! Chunks can always be flattened into the sequence of bits they represent. This is not a
//! protocol codec, it does not know about any header layout. Field records write themselves
//! through their [`Fields::serialize`] implementation and everything else is raw content.
//!
//! [`Fields::serialize`]: ../chunk/trait.Fields.html#tymethod.serialize
use byteorder::{ByteOrder, NetworkEndian};

use crate::units::Bits;

/// A growable buffer of bits, most significant bit of each octet first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MemoryOutputStream {
    data: Vec<u8>,
    length: Bits,
}

impl MemoryOutputStream {
    /// An empty stream.
    pub fn new() -> Self {
        MemoryOutputStream::default()
    }

    /// An empty stream with room for `bytes` octets.
    pub fn with_capacity(bytes: usize) -> Self {
        MemoryOutputStream {
            data: Vec::with_capacity(bytes),
            length: Bits::ZERO,
        }
    }

    /// The number of bits written so far.
    pub fn length(&self) -> Bits {
        self.length
    }

    /// The written octets.
    ///
    /// If the length is not byte aligned the last octet is padded with zero bits.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Unwrap the written octets.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Check if only whole octets were written.
    pub fn is_byte_aligned(&self) -> bool {
        self.length.is_byte_aligned()
    }

    /// Read back a single bit.
    ///
    /// # Panics
    ///
    /// This method panics if the position was not written.
    pub fn bit_at(&self, position: Bits) -> bool {
        assert!(position < self.length, "bit {} is beyond the stream length {}", position, self.length);
        let index = position.bit_index();
        self.data[index / 8] & (0x80 >> (index % 8)) != 0
    }

    /// Read back all bits.
    pub fn to_bits(&self) -> Vec<bool> {
        (0..self.length.get())
            .map(|i| self.bit_at(Bits(i)))
            .collect()
    }

    /// Append a single bit.
    pub fn write_bit(&mut self, bit: bool) {
        let index = self.length.bit_index();
        if index % 8 == 0 {
            self.data.push(0);
        }
        if bit {
            self.data[index / 8] |= 0x80 >> (index % 8);
        }
        self.length += Bits(1);
    }

    /// Append bits in order.
    pub fn write_bits(&mut self, bits: &[bool]) {
        for &bit in bits {
            self.write_bit(bit);
        }
    }

    /// Append `length` copies of the same bit.
    pub fn write_bit_repeatedly(&mut self, bit: bool, length: Bits) {
        if !bit && self.is_byte_aligned() && length.is_byte_aligned() {
            return self.write_byte_repeatedly(0, length.whole_bytes());
        }
        for _ in 0..length.get() {
            self.write_bit(bit);
        }
    }

    /// Append a single octet.
    pub fn write_byte(&mut self, byte: u8) {
        if self.is_byte_aligned() {
            self.data.push(byte);
            self.length += Bits::from_bytes(1);
        } else {
            for i in 0..8 {
                self.write_bit(byte & (0x80 >> i) != 0);
            }
        }
    }

    /// Append octets in order.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.is_byte_aligned() {
            self.data.extend_from_slice(bytes);
            self.length += Bits::from_bytes(bytes.len() as u64);
        } else {
            for &byte in bytes {
                self.write_byte(byte);
            }
        }
    }

    /// Append `count` copies of the same octet.
    pub fn write_byte_repeatedly(&mut self, byte: u8, count: u64) {
        for _ in 0..count {
            self.write_byte(byte);
        }
    }

    /// Append a 16-bit value in network byte order.
    pub fn write_u16(&mut self, value: u16) {
        let mut buf = [0; 2];
        NetworkEndian::write_u16(&mut buf, value);
        self.write_bytes(&buf);
    }

    /// Append a 32-bit value in network byte order.
    pub fn write_u32(&mut self, value: u32) {
        let mut buf = [0; 4];
        NetworkEndian::write_u32(&mut buf, value);
        self.write_bytes(&buf);
    }

    /// Append a 64-bit value in network byte order.
    pub fn write_u64(&mut self, value: u64) {
        let mut buf = [0; 8];
        NetworkEndian::write_u64(&mut buf, value);
        self.write_bytes(&buf);
    }

    /// Append a part of another stream.
    ///
    /// # Panics
    ///
    /// This method panics if the part is not within the other stream.
    pub fn write_stream_range(&mut self, other: &MemoryOutputStream, offset: Bits, length: Bits) {
        assert!(offset + length <= other.length, "range {}+{} is beyond the stream length {}",
            offset, length, other.length);
        if offset.is_byte_aligned() && length.is_byte_aligned() {
            let start = offset.byte_index();
            self.write_bytes(&other.data[start..start + length.byte_index()]);
        } else {
            for i in offset.get()..(offset + length).get() {
                self.write_bit(other.bit_at(Bits(i)));
            }
        }
    }
}
