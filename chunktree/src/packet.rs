//! The packet container.
//!
//! A [`Packet`] owns one immutable top-level chunk and two cursors into it. The content between
//! the front cursor and the back cursor is the *data* of the packet. A protocol receiving the
//! packet pops its header at the front (and its trailer at the back, if any), which advances the
//! cursors without touching the content. Since the content itself is never changed in place,
//! cloning a packet is cheap and the clone is fully independent.
//!
//! Building a packet works the other way around: a protocol sending the packet inserts its
//! header at the front. The content is then rebuilt by copy-on-write. This requires that no
//! header or trailer is popped, since the popped part would otherwise silently become data.
//!
//! [`Packet`]: struct.Packet.html
use core::fmt;

use crate::chunk::{Chunk, ChunkPtr};
use crate::cursor::Cursor;
use crate::error::Result;
use crate::peek::PeekFlags;
use crate::units::Bits;

/// Content with popped headers and trailers.
#[derive(Clone, Debug)]
pub struct Packet {
    content: ChunkPtr,
    front: Cursor,
    back: Cursor,
    total_length: Bits,
}

impl Packet {
    /// A packet of the given content.
    ///
    /// The content is marked immutable.
    pub fn new(content: ChunkPtr) -> Self {
        content.mark_immutable();
        let total_length = content.length();
        Packet {
            content,
            front: Cursor::forward(Bits::ZERO),
            back: Cursor::backward(Bits::ZERO),
            total_length,
        }
    }

    /// The whole content, including popped parts.
    pub fn content(&self) -> &ChunkPtr {
        &self.content
    }

    /// The length of the whole content.
    pub fn total_length(&self) -> Bits {
        self.total_length
    }

    /// The length of the content between the popped parts.
    pub fn data_length(&self) -> Bits {
        self.total_length - self.front.position() - self.back.position()
    }

    /// The offset of the data, the length of popped headers.
    pub fn front_offset(&self) -> Bits {
        self.front.position()
    }

    /// The offset of the end of the data, from the start of the content.
    pub fn back_offset(&self) -> Bits {
        self.total_length - self.back.position()
    }

    /// Move the start of the data.
    ///
    /// # Panics
    ///
    /// This method panics if the offset is beyond the back offset.
    pub fn set_front_offset(&mut self, offset: Bits) {
        check_usage!(offset <= self.back_offset(),
            "front offset {} is beyond the back offset {}", offset, self.back_offset());
        self.content.seek_cursor(&mut self.front, offset);
    }

    /// Move the end of the data.
    ///
    /// # Panics
    ///
    /// This method panics if the offset is before the front offset or beyond the content.
    pub fn set_back_offset(&mut self, offset: Bits) {
        check_usage!(self.front_offset() <= offset && offset <= self.total_length,
            "back offset {} is not between the front offset {} and the length {}",
            offset, self.front_offset(), self.total_length);
        self.content.seek_cursor(&mut self.back, self.total_length - offset);
    }

    /// Peek at the start of the data.
    ///
    /// # Panics
    ///
    /// This method panics if the data is shorter than `length`.
    pub fn peek_at_front(&self, length: Bits) -> ChunkPtr {
        self.check_data(length);
        self.content.peek(&self.front, length)
    }

    /// Peek at the end of the data.
    ///
    /// # Panics
    ///
    /// This method panics if the data is shorter than `length`.
    pub fn peek_at_back(&self, length: Bits) -> ChunkPtr {
        self.check_data(length);
        self.content.peek(&self.back, length)
    }

    /// Peek at the start of the data, failing on conditions not allowed by `flags`.
    ///
    /// The part is truncated to the data if `flags` allows incomplete results. Offsets in errors
    /// are relative to the start of the content.
    pub fn try_peek_at_front(&self, length: Bits, flags: PeekFlags) -> Result<ChunkPtr> {
        self.content.try_peek_within(&self.front, length, self.data_length(), flags)
    }

    /// Peek at the end of the data, failing on conditions not allowed by `flags`.
    ///
    /// The part is truncated to the data if `flags` allows incomplete results. Offsets in errors
    /// are relative to the start of the content.
    pub fn try_peek_at_back(&self, length: Bits, flags: PeekFlags) -> Result<ChunkPtr> {
        self.content.try_peek_within(&self.back, length, self.data_length(), flags)
    }

    /// Peek at all of the data.
    pub fn peek_data(&self) -> ChunkPtr {
        self.content.peek(&self.front, self.data_length())
    }

    /// Peek at all of the content, including popped parts.
    pub fn peek_all(&self) -> ChunkPtr {
        self.content.simplify()
    }

    /// Peek at a part of the content, including popped parts.
    ///
    /// # Panics
    ///
    /// This method panics if the part is not within the content.
    pub fn peek_at(&self, offset: Bits, length: Bits) -> ChunkPtr {
        self.content.peek_at(offset, length)
    }

    /// Peek at a part of the data.
    ///
    /// # Panics
    ///
    /// This method panics if the part is not within the data.
    pub fn peek_data_at(&self, offset: Bits, length: Bits) -> ChunkPtr {
        check_usage!(offset + length <= self.data_length(),
            "part at {} of length {} is beyond the data length {}", offset, length, self.data_length());
        self.content.peek_at(self.front_offset() + offset, length)
    }

    /// Peek at the start of the data and pop it as a header.
    ///
    /// # Panics
    ///
    /// This method panics if the data is shorter than `length`.
    pub fn pop_at_front(&mut self, length: Bits) -> ChunkPtr {
        let header = self.peek_at_front(length);
        self.content.move_cursor(&mut self.front, length);
        header
    }

    /// Peek at the end of the data and pop it as a trailer.
    ///
    /// # Panics
    ///
    /// This method panics if the data is shorter than `length`.
    pub fn pop_at_back(&mut self, length: Bits) -> ChunkPtr {
        let trailer = self.peek_at_back(length);
        self.content.move_cursor(&mut self.back, length);
        trailer
    }

    /// Pop a header, failing on conditions not allowed by `flags`.
    ///
    /// On failure nothing is popped.
    pub fn try_pop_at_front(&mut self, length: Bits, flags: PeekFlags) -> Result<ChunkPtr> {
        let header = self.try_peek_at_front(length, flags)?;
        self.content.move_cursor(&mut self.front, header.length());
        Ok(header)
    }

    /// Pop a trailer, failing on conditions not allowed by `flags`.
    ///
    /// On failure nothing is popped.
    pub fn try_pop_at_back(&mut self, length: Bits, flags: PeekFlags) -> Result<ChunkPtr> {
        let trailer = self.try_peek_at_back(length, flags)?;
        self.content.move_cursor(&mut self.back, trailer.length());
        Ok(trailer)
    }

    /// Insert a header before the content.
    ///
    /// The chunk is marked immutable.
    ///
    /// # Panics
    ///
    /// This method panics if a header is popped.
    pub fn insert_at_front(&mut self, chunk: &ChunkPtr) {
        check_usage!(self.front_offset().is_zero(), "can not insert at the front with a popped header");
        chunk.mark_immutable();
        if chunk.is_empty() {
            return;
        }

        if self.content.is_empty() {
            self.content = chunk.clone();
        } else if self.content.can_insert_at_front(chunk) {
            let content = self.content.make_mut();
            content.insert_at_front(chunk);
            content.mark_immutable();
            self.content = self.content.simplify();
        } else {
            let mut sequence = Chunk::sequence();
            sequence.insert_at_back(chunk);
            sequence.insert_at_back(&self.content);
            self.content = ChunkPtr::immutable(sequence).simplify();
        }
        self.content_changed();
    }

    /// Insert a trailer after the content.
    ///
    /// The chunk is marked immutable.
    ///
    /// # Panics
    ///
    /// This method panics if a trailer is popped.
    pub fn insert_at_back(&mut self, chunk: &ChunkPtr) {
        check_usage!(self.back.position().is_zero(), "can not insert at the back with a popped trailer");
        chunk.mark_immutable();
        if chunk.is_empty() {
            return;
        }

        if self.content.is_empty() {
            self.content = chunk.clone();
        } else if self.content.can_insert_at_back(chunk) {
            let content = self.content.make_mut();
            content.insert_at_back(chunk);
            content.mark_immutable();
            self.content = self.content.simplify();
        } else {
            let mut sequence = Chunk::sequence();
            sequence.insert_at_back(&self.content);
            sequence.insert_at_back(chunk);
            self.content = ChunkPtr::immutable(sequence).simplify();
        }
        self.content_changed();
    }

    /// Remove the start of the content and return it.
    ///
    /// # Panics
    ///
    /// This method panics if a header is popped or if the data is shorter than `length`.
    pub fn remove_at_front(&mut self, length: Bits) -> ChunkPtr {
        check_usage!(self.front_offset().is_zero(), "can not remove at the front with a popped header");
        self.check_data(length);
        let removed = self.content.peek_at(Bits::ZERO, length);
        self.remove_content_at_front(length);
        removed
    }

    /// Remove the end of the content and return it.
    ///
    /// # Panics
    ///
    /// This method panics if a trailer is popped or if the data is shorter than `length`.
    pub fn remove_at_back(&mut self, length: Bits) -> ChunkPtr {
        check_usage!(self.back.position().is_zero(), "can not remove at the back with a popped trailer");
        self.check_data(length);
        let removed = self.content.peek_at(self.total_length - length, length);
        self.remove_content_at_back(length);
        removed
    }

    /// Drop the popped headers from the content.
    pub fn trim_front(&mut self) {
        let length = self.front_offset();
        self.front = Cursor::forward(Bits::ZERO);
        self.remove_content_at_front(length);
    }

    /// Drop the popped trailers from the content.
    pub fn trim_back(&mut self) {
        let length = self.back.position();
        self.back = Cursor::backward(Bits::ZERO);
        self.remove_content_at_back(length);
    }

    /// Drop both popped headers and trailers from the content.
    pub fn trim(&mut self) {
        self.trim_front();
        self.trim_back();
    }

    /// Check if the content contains bit errors.
    pub fn has_bit_error(&self) -> bool {
        self.content.is_incorrect()
    }

    fn check_data(&self, length: Bits) {
        check_usage!(length <= self.data_length(),
            "length {} is beyond the data length {}", length, self.data_length());
    }

    fn remove_content_at_front(&mut self, length: Bits) {
        if length.is_zero() {
            return;
        }

        let total = self.content.length();
        if length == total {
            self.content = ChunkPtr::immutable(Chunk::empty());
        } else if self.content.can_remove_at_front(length) {
            let content = self.content.make_mut();
            content.remove_at_front(length);
            content.mark_immutable();
            self.content = self.content.simplify();
        } else {
            self.content = self.content.peek_at(length, total - length);
        }
        self.content_changed();
    }

    fn remove_content_at_back(&mut self, length: Bits) {
        if length.is_zero() {
            return;
        }

        let total = self.content.length();
        if length == total {
            self.content = ChunkPtr::immutable(Chunk::empty());
        } else if self.content.can_remove_at_back(length) {
            let content = self.content.make_mut();
            content.remove_at_back(length);
            content.mark_immutable();
            self.content = self.content.simplify();
        } else {
            self.content = self.content.peek_at(Bits::ZERO, total - length);
        }
        self.content_changed();
    }

    /// Re-resolve both cursors after the content was replaced.
    fn content_changed(&mut self) {
        self.total_length = self.content.length();
        let (front, back) = (self.front.position(), self.back.position());
        self.content.seek_cursor(&mut self.front, front);
        self.content.seek_cursor(&mut self.back, back);
        chunk_debug!("packet content is now a {:?} chunk of length {}",
            self.content.chunk_type(), self.total_length);
    }
}

impl Default for Packet {
    fn default() -> Self {
        Packet::new(ChunkPtr::new(Chunk::empty()))
    }
}

impl From<Chunk> for Packet {
    fn from(chunk: Chunk) -> Self {
        Packet::new(ChunkPtr::new(chunk))
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Packet, front = {}, back = {}, content = {{{}}}",
            self.front_offset(), self.back_offset(), self.content)
    }
}
