//! Zero-copy views of chunk parts.
use core::fmt;

use super::{ChunkKind, ChunkPtr};
use crate::cursor::Cursor;
use crate::stream::MemoryOutputStream;
use crate::units::Bits;

/// A contiguous part of another chunk.
///
/// The sliced chunk is shared and immutable. A slice never refers to another slice, the view is
/// always expressed relative to the innermost chunk.
#[derive(Clone, Debug)]
pub struct SliceChunk {
    target: ChunkPtr,
    offset: Bits,
    length: Bits,
}

impl SliceChunk {
    /// A view of `length` bits of `target` starting at `offset`.
    ///
    /// # Panics
    ///
    /// This method panics if the range is not within `target` or if `target` is still mutable.
    pub fn new(target: &ChunkPtr, offset: Bits, length: Bits) -> Self {
        check_usage!(offset + length <= target.length(),
            "slice at {} of length {} is beyond the chunk length {}", offset, length, target.length());
        check_usage!(target.is_immutable(), "can not slice mutable {:?} chunk", target.chunk_type());

        match target.kind() {
            ChunkKind::Slice(inner) => SliceChunk {
                target: inner.target.clone(),
                offset: inner.offset + offset,
                length,
            },
            _ => SliceChunk {
                target: target.clone(),
                offset,
                length,
            },
        }
    }

    /// The sliced chunk.
    pub fn target(&self) -> &ChunkPtr {
        &self.target
    }

    /// The start of the view within the sliced chunk.
    pub fn offset(&self) -> Bits {
        self.offset
    }

    /// The length of the view.
    pub fn length(&self) -> Bits {
        self.length
    }

    /// Check if the view is all of the sliced chunk.
    pub fn covers_target(&self) -> bool {
        self.offset.is_zero() && self.length == self.target.length()
    }

    /// Check if `other` continues this view in the same chunk.
    pub fn connects_at_back(&self, other: &SliceChunk) -> bool {
        ChunkPtr::ptr_eq(&self.target, &other.target)
            && self.offset + self.length == other.offset
    }

    /// Check if `other` precedes this view in the same chunk.
    pub fn connects_at_front(&self, other: &SliceChunk) -> bool {
        ChunkPtr::ptr_eq(&self.target, &other.target)
            && other.offset + other.length == self.offset
    }

    pub(crate) fn insert_at_back(&mut self, other: &SliceChunk) {
        self.length += other.length;
    }

    pub(crate) fn insert_at_front(&mut self, other: &SliceChunk) {
        self.offset = other.offset;
        self.length += other.length;
    }

    pub(crate) fn remove_at_front(&mut self, length: Bits) {
        self.offset += length;
        self.length -= length;
    }

    pub(crate) fn remove_at_back(&mut self, length: Bits) {
        self.length -= length;
    }

    pub(crate) fn peek_part(&self, offset: Bits, length: Bits) -> ChunkPtr {
        self.target.peek(&Cursor::forward(self.offset + offset), length)
    }

    pub(crate) fn serialize(&self, stream: &mut MemoryOutputStream) {
        let whole = self.target.to_stream();
        stream.write_stream_range(&whole, self.offset, self.length);
    }
}

impl fmt::Display for SliceChunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SliceChunk, offset = {}, length = {}, chunk = {{{}}}",
            self.offset, self.length, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{Chunk, ChunkType};

    fn frozen(chunk: Chunk) -> ChunkPtr {
        ChunkPtr::immutable(chunk)
    }

    #[test]
    fn slice_of_slice_collapses() {
        let target = frozen(Chunk::bytes(vec![0u8; 10]));
        let outer = frozen(Chunk::slice(&target, Bits::from_bytes(2), Bits::from_bytes(6)));
        let inner = SliceChunk::new(&outer, Bits::from_bytes(1), Bits::from_bytes(3));
        assert!(ChunkPtr::ptr_eq(inner.target(), &target));
        assert_eq!(inner.offset(), Bits::from_bytes(3));
        assert_eq!(inner.length(), Bits::from_bytes(3));
    }

    #[test]
    fn contiguity() {
        let target = frozen(Chunk::byte_count(10));
        let other = frozen(Chunk::byte_count(10));
        let a = SliceChunk::new(&target, Bits::ZERO, Bits::from_bytes(4));
        let b = SliceChunk::new(&target, Bits::from_bytes(4), Bits::from_bytes(2));
        let c = SliceChunk::new(&other, Bits::from_bytes(4), Bits::from_bytes(2));
        assert!(a.connects_at_back(&b));
        assert!(b.connects_at_front(&a));
        assert!(!a.connects_at_front(&b));
        assert!(!a.connects_at_back(&c));
    }

    #[test]
    fn peeks_into_target() {
        let target = frozen(Chunk::bytes(vec![1u8, 2, 3, 4, 5, 6]));
        let slice = SliceChunk::new(&target, Bits::from_bytes(2), Bits::from_bytes(3));
        let part = slice.peek_part(Bits::from_bytes(1), Bits::from_bytes(2));
        assert_eq!(part.chunk_type(), ChunkType::Bytes);
        assert_eq!(part.to_stream().data(), &[4, 5]);
    }

    #[test]
    fn serialize_unaligned() {
        let target = frozen(Chunk::bytes(vec![0x0fu8, 0xf0]));
        let slice = SliceChunk::new(&target, Bits(4), Bits(8));
        let mut stream = MemoryOutputStream::new();
        slice.serialize(&mut stream);
        assert_eq!(stream.data(), &[0xff]);
    }

    #[test]
    #[should_panic]
    fn mutable_target() {
        let target = ChunkPtr::new(Chunk::byte_count(4));
        let _ = SliceChunk::new(&target, Bits::ZERO, Bits(1));
    }

    #[test]
    #[should_panic]
    fn out_of_bounds() {
        let target = frozen(Chunk::byte_count(4));
        let _ = SliceChunk::new(&target, Bits::from_bytes(2), Bits::from_bytes(3));
    }
}
