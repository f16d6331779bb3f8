//! Concatenation of chunks.
//!
//! A sequence keeps its elements in a minimal form:
//!
//! * No element is empty.
//! * No element is a sequence, or a slice of a sequence. Both are flattened into the elements
//!   they consist of when inserted. A fully covered element of a sliced sequence is reused, only
//!   the partially covered ones at the boundaries are peeked.
//! * Connecting elements which can be represented as one are merged on insertion, for example two
//!   explicit byte chunks or two slices continuing each other in the same chunk.
//!
//! Elements are shared with other chunks. They are changed only after [`ChunkPtr::make_mut`]
//! ensured that the sequence owns them exclusively, so merging into an element never affects
//! another chunk referring to it.
//!
//! [`ChunkPtr::make_mut`]: ../struct.ChunkPtr.html#method.make_mut
use core::cell::Cell;
use core::cmp;
use core::fmt;
use std::collections::vec_deque::{self, VecDeque};

use super::{Chunk, ChunkKind, ChunkPtr};
use crate::cursor::Cursor;
use crate::units::Bits;

/// An ordered concatenation of chunks.
#[derive(Debug, Default)]
pub struct SequenceChunk {
    children: VecDeque<ChunkPtr>,
    /// Sum of the element lengths, computed lazily.
    length: Cell<Option<Bits>>,
}

impl SequenceChunk {
    /// An empty sequence.
    pub fn new() -> Self {
        SequenceChunk::default()
    }

    /// The number of elements.
    pub fn width(&self) -> usize {
        self.children.len()
    }

    /// The elements in order.
    pub fn children(&self) -> vec_deque::Iter<'_, ChunkPtr> {
        self.children.iter()
    }

    /// The element at `index` from the front.
    pub fn child(&self, index: usize) -> Option<&ChunkPtr> {
        self.children.get(index)
    }

    /// The total length of all elements.
    pub fn length(&self) -> Bits {
        match self.length.get() {
            Some(length) => length,
            None => {
                let length = self.children.iter().map(|child| child.length()).sum();
                self.length.set(Some(length));
                length
            },
        }
    }

    /// Check that the elements are in their minimal form and the cached length is accurate.
    pub fn is_flat(&self) -> bool {
        let sum: Bits = self.children.iter().map(|child| child.length()).sum();
        let cached = self.length.get().map_or(true, |length| length == sum);
        cached && self.children.iter().all(|child| !child.is_empty() && match child.kind() {
            ChunkKind::Sequence(_) => false,
            ChunkKind::Slice(slice) => slice.target().as_sequence().is_none(),
            _ => true,
        })
    }

    fn invalidate(&mut self) {
        *self.length.get_mut() = None;
    }

    /// The element at `index` counted in the direction of the cursor.
    fn element(&self, cursor: &Cursor, index: usize) -> Option<&ChunkPtr> {
        if index >= self.children.len() {
            return None;
        }

        if cursor.is_forward() {
            self.children.get(index)
        } else {
            self.children.get(self.children.len() - 1 - index)
        }
    }

    pub(crate) fn seek_cursor(&self, cursor: &mut Cursor, position: Bits) {
        cursor.set_position(position);
        if position.is_zero() {
            cursor.set_index(Some(0));
            return;
        }

        let mut boundary = Bits::ZERO;
        for index in 0..self.children.len() {
            if let Some(child) = self.element(cursor, index) {
                boundary += child.length();
            }
            if boundary == position {
                cursor.set_index(Some(index + 1));
                return;
            }
            if boundary > position {
                break;
            }
        }
        cursor.set_index(None);
    }

    pub(crate) fn move_cursor(&self, cursor: &mut Cursor, length: Bits) {
        if length.is_zero() {
            return;
        }

        let index = match cursor.index() {
            Some(index) => match self.element(cursor, index) {
                Some(child) if child.length() == length => Some(index + 1),
                _ => None,
            },
            None => None,
        };
        cursor.set_position(cursor.position() + length);
        cursor.set_index(index);
    }

    /// A proper part of the sequence.
    pub(crate) fn peek_part(&self, cursor: &Cursor, offset: Bits, length: Bits) -> ChunkPtr {
        if let Some(child) = cursor.index().and_then(|index| self.element(cursor, index)) {
            if child.length() == length {
                return child.clone();
            }
        }

        let end = offset + length;
        let mut position = Bits::ZERO;
        for child in &self.children {
            let child_end = position + child.length();
            if position == offset && child_end == end {
                return child.clone();
            }
            if position <= offset && end <= child_end {
                return child.peek_at(offset - position, length);
            }
            if offset < child_end {
                break;
            }
            position = child_end;
        }

        chunk_trace!("peek at {} of length {} spans multiple elements", offset, length);
        let mut part = SequenceChunk::new();
        part.insert_range_at_back(self, offset, length);
        if part.width() == 1 {
            if let Some(only) = part.children.pop_front() {
                return only;
            }
        }
        ChunkPtr::immutable(Chunk::new(ChunkKind::Sequence(part)))
    }

    pub(crate) fn insert_at_back(&mut self, chunk: &ChunkPtr) {
        self.invalidate();
        match chunk.kind() {
            ChunkKind::Empty(_) => {},
            ChunkKind::Slice(slice) => match slice.target().as_sequence() {
                Some(target) => {
                    chunk_trace!("flattening slice of sequence at {} of length {}",
                        slice.offset(), slice.length());
                    self.insert_range_at_back(target, slice.offset(), slice.length())
                },
                None => self.insert_element_at_back(chunk),
            },
            ChunkKind::Sequence(sequence) => sequence
                .children()
                .for_each(|child| self.insert_at_back(child)),
            _ => self.insert_element_at_back(chunk),
        }
        check_implementation!(self.is_flat());
    }

    pub(crate) fn insert_at_front(&mut self, chunk: &ChunkPtr) {
        self.invalidate();
        match chunk.kind() {
            ChunkKind::Empty(_) => {},
            ChunkKind::Slice(slice) => match slice.target().as_sequence() {
                Some(target) => {
                    chunk_trace!("flattening slice of sequence at {} of length {}",
                        slice.offset(), slice.length());
                    self.insert_range_at_front(target, slice.offset(), slice.length())
                },
                None => self.insert_element_at_front(chunk),
            },
            ChunkKind::Sequence(sequence) => sequence
                .children()
                .rev()
                .for_each(|child| self.insert_at_front(child)),
            _ => self.insert_element_at_front(chunk),
        }
        check_implementation!(self.is_flat());
    }

    /// Append the elements of `source` covering the range, peeking the partial ones.
    fn insert_range_at_back(&mut self, source: &SequenceChunk, offset: Bits, length: Bits) {
        let end = offset + length;
        let mut position = Bits::ZERO;
        for child in source.children() {
            let child_end = position + child.length();
            if position >= end {
                break;
            }
            if child_end > offset {
                if offset <= position && child_end <= end {
                    self.insert_at_back(child);
                } else {
                    let start = cmp::max(offset, position);
                    let stop = cmp::min(end, child_end);
                    self.insert_at_back(&child.peek_at(start - position, stop - start));
                }
            }
            position = child_end;
        }
    }

    /// Prepend the elements of `source` covering the range, last one first.
    fn insert_range_at_front(&mut self, source: &SequenceChunk, offset: Bits, length: Bits) {
        let end = offset + length;
        let mut position = source.length();
        for child in source.children().rev() {
            let child_start = position - child.length();
            if position <= offset {
                break;
            }
            if child_start < end {
                if offset <= child_start && position <= end {
                    self.insert_at_front(child);
                } else {
                    let start = cmp::max(offset, child_start);
                    let stop = cmp::min(end, position);
                    self.insert_at_front(&child.peek_at(start - child_start, stop - start));
                }
            }
            position = child_start;
        }
    }

    fn insert_element_at_back(&mut self, chunk: &ChunkPtr) {
        if chunk.is_empty() {
            return;
        }

        if let Some(last) = self.children.back_mut() {
            if last.can_insert_at_back(chunk) {
                chunk_trace!("merging {:?} chunk of length {} into the last element",
                    chunk.chunk_type(), chunk.length());
                let merged = last.make_mut();
                merged.insert_at_back(chunk);
                merged.mark_immutable();
                *last = last.simplify();
                return;
            }
        }

        self.children.push_back(chunk.clone());
    }

    fn insert_element_at_front(&mut self, chunk: &ChunkPtr) {
        if chunk.is_empty() {
            return;
        }

        if let Some(first) = self.children.front_mut() {
            if first.can_insert_at_front(chunk) {
                chunk_trace!("merging {:?} chunk of length {} into the first element",
                    chunk.chunk_type(), chunk.length());
                let merged = first.make_mut();
                merged.insert_at_front(chunk);
                merged.mark_immutable();
                *first = first.simplify();
                return;
            }
        }

        self.children.push_front(chunk.clone());
    }

    pub(crate) fn remove_at_front(&mut self, length: Bits) {
        self.invalidate();
        let mut remaining = length;
        while !remaining.is_zero() {
            let child_length = match self.children.front() {
                Some(child) => child.length(),
                None => break,
            };
            if child_length <= remaining {
                self.children.pop_front();
                remaining -= child_length;
            } else {
                let rest = self.children[0].peek_at(remaining, child_length - remaining);
                self.children[0] = rest;
                break;
            }
        }
        check_implementation!(self.is_flat());
    }

    pub(crate) fn remove_at_back(&mut self, length: Bits) {
        self.invalidate();
        let mut remaining = length;
        while !remaining.is_zero() {
            let last = match self.children.len().checked_sub(1) {
                Some(last) => last,
                None => break,
            };
            let child_length = self.children[last].length();
            if child_length <= remaining {
                self.children.pop_back();
                remaining -= child_length;
            } else {
                let rest = self.children[last].peek_at(Bits::ZERO, child_length - remaining);
                self.children[last] = rest;
                break;
            }
        }
        check_implementation!(self.is_flat());
    }
}

impl Clone for SequenceChunk {
    fn clone(&self) -> Self {
        let children = self.children
            .iter()
            .map(|child| if child.is_immutable() { child.clone() } else { child.dup() })
            .collect();
        SequenceChunk {
            children,
            length: self.length.clone(),
        }
    }
}

impl fmt::Display for SequenceChunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SequenceChunk, length = {}, elements = [", self.length())?;
        for (i, child) in self.children.iter().enumerate() {
            if i != 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::ChunkType;

    fn sequence(children: &[Chunk]) -> ChunkPtr {
        let mut sequence = ChunkPtr::new(Chunk::sequence());
        for child in children {
            sequence.make_mut().insert_at_back(&ChunkPtr::immutable(child.clone()));
        }
        sequence.mark_immutable();
        sequence
    }

    fn abc() -> ChunkPtr {
        sequence(&[
            Chunk::bytes(vec![1u8, 2, 3]),
            Chunk::byte_count(2),
            Chunk::bits(vec![true; 4]),
        ])
    }

    #[test]
    fn seek_to_boundaries() {
        let seq = abc();
        let mut cursor = Cursor::forward(Bits::ZERO);
        seq.seek_cursor(&mut cursor, Bits::from_bytes(3));
        assert_eq!(cursor.index(), Some(1));
        seq.seek_cursor(&mut cursor, Bits::from_bytes(4));
        assert_eq!(cursor.index(), None);
        seq.seek_cursor(&mut cursor, Bits::from_bytes(5) + Bits(4));
        assert_eq!(cursor.index(), Some(3));

        let mut cursor = Cursor::backward(Bits::ZERO);
        seq.seek_cursor(&mut cursor, Bits(4));
        assert_eq!(cursor.index(), Some(1));
    }

    #[test]
    fn move_by_elements() {
        let seq = abc();
        let mut cursor = Cursor::forward(Bits::ZERO);
        seq.move_cursor(&mut cursor, Bits::from_bytes(3));
        assert_eq!(cursor.index(), Some(1));
        seq.move_cursor(&mut cursor, Bits::from_bytes(1));
        assert_eq!(cursor.index(), None);
        assert_eq!(cursor.position(), Bits::from_bytes(4));
    }

    #[test]
    fn resolved_peek_returns_element() {
        let seq = abc();
        let mut cursor = Cursor::forward(Bits::ZERO);
        seq.seek_cursor(&mut cursor, Bits::from_bytes(3));
        let peeked = seq.peek(&cursor, Bits::from_bytes(2));
        assert!(ChunkPtr::ptr_eq(&peeked, seq.as_sequence().unwrap().child(1).unwrap()));

        let cursor = Cursor::backward(Bits::ZERO);
        let peeked = seq.peek(&cursor, Bits(4));
        assert!(ChunkPtr::ptr_eq(&peeked, seq.as_sequence().unwrap().child(2).unwrap()));
    }

    #[test]
    fn peek_inside_element() {
        let seq = abc();
        let part = seq.peek_at(Bits::from_bytes(1), Bits::from_bytes(1));
        assert_eq!(part.chunk_type(), ChunkType::Bytes);
        assert_eq!(part.to_stream().data(), &[2]);
    }

    #[test]
    fn peek_across_elements() {
        let seq = abc();
        let part = seq.peek_at(Bits::from_bytes(2), Bits::from_bytes(2));
        assert_eq!(part.chunk_type(), ChunkType::Sequence);
        assert!(part.is_immutable());
        assert_eq!(part.as_sequence().unwrap().width(), 2);
        assert_eq!(part.to_stream().data(), &[3, b'?']);
    }

    #[test]
    fn merge_bytes() {
        let seq = sequence(&[Chunk::bytes(vec![1u8; 10]), Chunk::bytes(vec![2u8; 5])]);
        let inner = seq.as_sequence().unwrap();
        assert_eq!(inner.width(), 1);
        assert_eq!(seq.length(), Bits::from_bytes(15));
    }

    #[test]
    fn merge_appends_in_place() {
        let mut storage = bytes::BytesMut::with_capacity(64);
        storage.extend_from_slice(&[0]);
        let start = storage.as_ptr();
        let mut seq = ChunkPtr::new(Chunk::sequence());
        seq.make_mut().insert_at_back(&ChunkPtr::immutable(Chunk::bytes(storage.freeze())));
        for byte in 1..48u8 {
            seq.make_mut().insert_at_back(&ChunkPtr::immutable(Chunk::bytes(vec![byte])));
            let inner = seq.as_sequence().unwrap();
            assert_eq!(inner.width(), 1);
            let merged = inner.child(0).unwrap().as_bytes().unwrap();
            assert_eq!(merged.bytes().as_ptr(), start);
        }
        assert_eq!(seq.length(), Bits::from_bytes(48));
        assert_eq!(seq.to_stream().data()[47], 47);
    }

    #[test]
    fn merge_leaves_shared_element_alone() {
        let first = ChunkPtr::immutable(Chunk::bytes(vec![1u8, 2]));
        let mut seq = ChunkPtr::new(Chunk::sequence());
        seq.make_mut().insert_at_back(&first);
        seq.make_mut().insert_at_back(&ChunkPtr::immutable(Chunk::bytes(vec![3u8])));
        assert_eq!(first.length(), Bits::from_bytes(2));
        assert_eq!(seq.as_sequence().unwrap().width(), 1);
        assert_eq!(seq.to_stream().data(), &[1, 2, 3]);
    }

    #[test]
    fn remove_partially() {
        let mut seq = abc();
        seq.make_mut().remove_at_front(Bits::from_bytes(4));
        let inner = seq.as_sequence().unwrap();
        assert_eq!(inner.width(), 2);
        assert_eq!(inner.child(0).unwrap().length(), Bits::from_bytes(1));
        assert!(inner.is_flat());

        seq.make_mut().remove_at_back(Bits(2));
        assert_eq!(seq.length(), Bits::from_bytes(1) + Bits(2));
    }

    #[test]
    fn insert_slice_of_sequence_front() {
        let source = abc();
        let slice = ChunkPtr::immutable(Chunk::slice(&source, Bits::from_bytes(1), Bits::from_bytes(4)));
        let mut seq = ChunkPtr::new(Chunk::sequence());
        seq.make_mut().insert_at_front(&ChunkPtr::immutable(Chunk::bits(vec![false])));
        seq.make_mut().insert_at_front(&slice);
        let inner = seq.as_sequence().unwrap();
        assert!(inner.is_flat());
        assert_eq!(inner.width(), 3);
        assert!(ChunkPtr::ptr_eq(inner.child(1).unwrap(), source.as_sequence().unwrap().child(1).unwrap()));
        assert_eq!(seq.length(), Bits::from_bytes(4) + Bits(1));
    }

    #[test]
    fn dup_shares_immutable_elements() {
        let seq = abc();
        let copy = seq.dup();
        assert!(copy.is_mutable());
        let (a, b) = (seq.as_sequence().unwrap(), copy.as_sequence().unwrap());
        for (x, y) in a.children().zip(b.children()) {
            assert!(ChunkPtr::ptr_eq(x, y));
        }
    }
}
