//! Chunks that carry their content themselves.
//!
//! The count chunks represent a run of identical bits or octets without storing them, which is
//! what a simulation uses for payload it does not care about. The explicit chunks store the
//! content. Bits are granular to the bit, bytes to the octet; an operation on an explicit or
//! counted byte chunk that is not byte aligned can not be represented by the same kind.
use core::{fmt, mem};

use bytes::{Bytes, BytesMut};

use crate::units::Bits;

/// The empty chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmptyChunk;

/// A run of `length` identical bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitCountChunk {
    length: Bits,
    data: bool,
}

/// Explicit bits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitsChunk {
    bits: Vec<bool>,
}

/// A run of identical octets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteCountChunk {
    length: u64,
    data: u8,
}

/// Explicit octets.
///
/// Parts of the content share the same storage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BytesChunk {
    bytes: Bytes,
}

impl BitCountChunk {
    /// A run of zero bits.
    pub fn new(length: Bits) -> Self {
        BitCountChunk::with_data(length, false)
    }

    /// A run of the given bit.
    pub fn with_data(length: Bits, data: bool) -> Self {
        BitCountChunk { length, data }
    }

    /// The number of bits.
    pub fn length(&self) -> Bits {
        self.length
    }

    /// The repeated bit.
    pub fn data(&self) -> bool {
        self.data
    }

    /// Change the number of bits.
    pub fn set_length(&mut self, length: Bits) {
        self.length = length;
    }

    pub(crate) fn part(&self, length: Bits) -> Self {
        BitCountChunk::with_data(length, self.data)
    }

    pub(crate) fn insert_at_back(&mut self, other: &Self) {
        self.length += other.length;
    }

    pub(crate) fn insert_at_front(&mut self, other: &Self) {
        self.length += other.length;
    }

    pub(crate) fn remove_at_front(&mut self, length: Bits) {
        self.length -= length;
    }

    pub(crate) fn remove_at_back(&mut self, length: Bits) {
        self.length -= length;
    }
}

impl BitsChunk {
    /// Explicit bits, first bit first.
    pub fn new(bits: Vec<bool>) -> Self {
        BitsChunk { bits }
    }

    /// The number of bits.
    pub fn length(&self) -> Bits {
        Bits(self.bits.len() as u64)
    }

    /// The bits.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Replace all bits.
    pub fn set_bits(&mut self, bits: Vec<bool>) {
        self.bits = bits;
    }

    /// Change a single bit.
    ///
    /// # Panics
    ///
    /// This method panics if the index is out of bounds.
    pub fn set_bit(&mut self, index: usize, bit: bool) {
        self.bits[index] = bit;
    }

    pub(crate) fn part(&self, offset: Bits, length: Bits) -> Self {
        let start = offset.bit_index();
        BitsChunk::new(self.bits[start..start + length.bit_index()].to_vec())
    }

    pub(crate) fn insert_at_back(&mut self, other: &Self) {
        self.bits.extend_from_slice(&other.bits);
    }

    pub(crate) fn insert_at_front(&mut self, other: &Self) {
        let mut bits = other.bits.clone();
        bits.extend_from_slice(&self.bits);
        self.bits = bits;
    }

    pub(crate) fn remove_at_front(&mut self, length: Bits) {
        self.bits.drain(..length.bit_index());
    }

    pub(crate) fn remove_at_back(&mut self, length: Bits) {
        let end = self.bits.len() - length.bit_index();
        self.bits.truncate(end);
    }
}

impl ByteCountChunk {
    /// The filler octet of counted bytes, a printable question mark.
    pub const DEFAULT_DATA: u8 = b'?';

    /// A run of `length` filler octets.
    pub fn new(length: u64) -> Self {
        ByteCountChunk::with_data(length, Self::DEFAULT_DATA)
    }

    /// A run of `length` copies of an octet.
    pub fn with_data(length: u64, data: u8) -> Self {
        ByteCountChunk { length, data }
    }

    /// The length in bits.
    pub fn length(&self) -> Bits {
        Bits::from_bytes(self.length)
    }

    /// The number of octets.
    pub fn byte_length(&self) -> u64 {
        self.length
    }

    /// The repeated octet.
    pub fn data(&self) -> u8 {
        self.data
    }

    /// Change the number of octets.
    pub fn set_byte_length(&mut self, length: u64) {
        self.length = length;
    }

    /// The octets of the part, if it is byte aligned.
    pub(crate) fn part(&self, offset: Bits, length: Bits) -> Option<Self> {
        if !offset.is_byte_aligned() {
            return None;
        }
        length.bytes().map(|bytes| ByteCountChunk::with_data(bytes, self.data))
    }

    pub(crate) fn insert_at_back(&mut self, other: &Self) {
        self.length += other.length;
    }

    pub(crate) fn insert_at_front(&mut self, other: &Self) {
        self.length += other.length;
    }

    pub(crate) fn remove_at_front(&mut self, length: Bits) {
        self.length -= length.whole_bytes();
    }

    pub(crate) fn remove_at_back(&mut self, length: Bits) {
        self.length -= length.whole_bytes();
    }
}

impl Default for ByteCountChunk {
    fn default() -> Self {
        ByteCountChunk::new(0)
    }
}

impl BytesChunk {
    /// Explicit octets.
    pub fn new(bytes: Bytes) -> Self {
        BytesChunk { bytes }
    }

    /// The length in bits.
    pub fn length(&self) -> Bits {
        Bits::from_bytes(self.bytes.len() as u64)
    }

    /// The octets.
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Replace all octets.
    pub fn set_bytes(&mut self, bytes: impl Into<Bytes>) {
        self.bytes = bytes.into();
    }

    /// Change a single octet.
    ///
    /// The content is copied first if its storage is shared with another chunk.
    ///
    /// # Panics
    ///
    /// This method panics if the index is out of bounds.
    pub fn set_byte(&mut self, index: usize, byte: u8) {
        let mut bytes = BytesMut::from(&self.bytes[..]);
        bytes[index] = byte;
        self.bytes = bytes.freeze();
    }

    /// The octets of the part, if it is byte aligned.
    pub(crate) fn part(&self, offset: Bits, length: Bits) -> Option<Self> {
        let start = offset.bytes()? as usize;
        let len = length.bytes()? as usize;
        Some(BytesChunk::new(self.bytes.slice(start..start + len)))
    }

    /// Append in place when the storage is not shared, otherwise copy into new storage.
    pub(crate) fn insert_at_back(&mut self, other: &Self) {
        let mut bytes = match mem::take(&mut self.bytes).try_into_mut() {
            Ok(bytes) => bytes,
            Err(shared) => {
                chunk_trace!("copying {} shared octets to append {}", shared.len(), other.bytes.len());
                let mut bytes = BytesMut::with_capacity(shared.len() + other.bytes.len());
                bytes.extend_from_slice(&shared);
                bytes
            },
        };
        bytes.extend_from_slice(&other.bytes);
        self.bytes = bytes.freeze();
    }

    /// There is no headroom before the storage so prepending always copies.
    pub(crate) fn insert_at_front(&mut self, other: &Self) {
        let mut bytes = BytesMut::with_capacity(self.bytes.len() + other.bytes.len());
        bytes.extend_from_slice(&other.bytes);
        bytes.extend_from_slice(&self.bytes);
        self.bytes = bytes.freeze();
    }

    pub(crate) fn remove_at_front(&mut self, length: Bits) {
        let _ = self.bytes.split_to(length.byte_index());
    }

    pub(crate) fn remove_at_back(&mut self, length: Bits) {
        let end = self.bytes.len() - length.byte_index();
        self.bytes.truncate(end);
    }
}

impl fmt::Display for EmptyChunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EmptyChunk")
    }
}

impl fmt::Display for BitCountChunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BitCountChunk, length = {}, data = {}", self.length, self.data as u8)
    }
}

impl fmt::Display for BitsChunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BitsChunk, length = {}, bits = {{", self.length())?;
        for &bit in self.bits.iter().take(32) {
            write!(f, "{}", bit as u8)?;
        }
        if self.bits.len() > 32 {
            write!(f, "...")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for ByteCountChunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ByteCountChunk, length = {}, data = {}", self.length(), self.data)
    }
}

impl fmt::Display for BytesChunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "BytesChunk, length = {}, bytes = {{", self.length())?;
        for (i, byte) in self.bytes.iter().take(16).enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        if self.bytes.len() > 16 {
            write!(f, " ...")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_part_shares_storage() {
        let chunk = BytesChunk::new(Bytes::from_static(&[1, 2, 3, 4]));
        let part = chunk.part(Bits::from_bytes(1), Bits::from_bytes(2)).unwrap();
        assert_eq!(&part.bytes()[..], &[2, 3]);
        assert!(chunk.part(Bits(4), Bits::from_bytes(1)).is_none());
        assert!(chunk.part(Bits::ZERO, Bits(12)).is_none());
    }

    #[test]
    fn bytes_insert_and_remove() {
        let mut chunk = BytesChunk::new(Bytes::from_static(&[3, 4]));
        chunk.insert_at_front(&BytesChunk::new(Bytes::from_static(&[1, 2])));
        chunk.insert_at_back(&BytesChunk::new(Bytes::from_static(&[5])));
        assert_eq!(&chunk.bytes()[..], &[1, 2, 3, 4, 5]);
        chunk.remove_at_front(Bits::from_bytes(1));
        chunk.remove_at_back(Bits::from_bytes(2));
        assert_eq!(&chunk.bytes()[..], &[2, 3]);
    }

    #[test]
    fn bytes_append_reuses_storage() {
        let mut storage = BytesMut::with_capacity(64);
        storage.extend_from_slice(&[1]);
        let start = storage.as_ptr();
        let mut chunk = BytesChunk::new(storage.freeze());
        for byte in 2..=32u8 {
            chunk.insert_at_back(&BytesChunk::new(Bytes::from(vec![byte])));
            assert_eq!(chunk.bytes().as_ptr(), start);
        }
        assert_eq!(chunk.length(), Bits::from_bytes(32));
        assert_eq!(chunk.bytes()[31], 32);
    }

    #[test]
    fn bytes_append_copies_shared_storage() {
        let mut chunk = BytesChunk::new(Bytes::from(vec![1u8, 2]));
        let shared = chunk.bytes().clone();
        chunk.insert_at_back(&BytesChunk::new(Bytes::from_static(&[3])));
        assert_ne!(chunk.bytes().as_ptr(), shared.as_ptr());
        assert_eq!(&shared[..], &[1, 2]);
        assert_eq!(&chunk.bytes()[..], &[1, 2, 3]);
    }

    #[test]
    fn bits_insert_and_remove() {
        let mut chunk = BitsChunk::new(vec![true, false]);
        chunk.insert_at_front(&BitsChunk::new(vec![false]));
        chunk.insert_at_back(&BitsChunk::new(vec![true, true]));
        assert_eq!(chunk.bits(), &[false, true, false, true, true]);
        chunk.remove_at_front(Bits(2));
        chunk.remove_at_back(Bits(1));
        assert_eq!(chunk.bits(), &[false, true]);
        assert_eq!(chunk.part(Bits(1), Bits(1)).bits(), &[true]);
    }

    #[test]
    fn counts() {
        let mut chunk = ByteCountChunk::new(10);
        assert_eq!(chunk.data(), b'?');
        chunk.remove_at_front(Bits::from_bytes(4));
        assert_eq!(chunk.length(), Bits::from_bytes(6));
        assert!(chunk.part(Bits(3), Bits::from_bytes(1)).is_none());

        let mut bits = BitCountChunk::new(Bits(5));
        bits.insert_at_back(&BitCountChunk::new(Bits(3)));
        assert_eq!(bits.length(), Bits(8));
        assert!(!bits.data());
    }

    #[test]
    fn display() {
        let chunk = BytesChunk::new(Bytes::from_static(&[0x0a, 0xff]));
        assert_eq!(chunk.to_string(), "BytesChunk, length = 2 B, bytes = {0a ff}");
        let chunk = BitsChunk::new(vec![true, false, true]);
        assert_eq!(chunk.to_string(), "BitsChunk, length = 3 b, bits = {101}");
    }
}
