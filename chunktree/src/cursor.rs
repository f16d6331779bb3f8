//! Cursors into chunk content.
//!
//! A cursor is the position from which a chunk is peeked. Besides the bit position it may cache
//! the index of the sequence element that starts at that position. Consuming a sequence one
//! element at a time, which is what decapsulating one header after another does, then resolves
//! every peek without scanning the sequence from the start.
//!
//! The cursor does not borrow the chunk it refers to. Resolving and advancing it is done by the
//! chunk, see [`Chunk::seek_cursor`] and [`Chunk::move_cursor`]. A cursor used with a different
//! chunk than the one that resolved it must be re-seeked first.
//!
//! [`Chunk::seek_cursor`]: ../chunk/struct.Chunk.html#method.seek_cursor
//! [`Chunk::move_cursor`]: ../chunk/struct.Chunk.html#method.move_cursor
use crate::units::Bits;

/// A position within a chunk, measured from either end.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cursor {
    forward: bool,
    position: Bits,
    index: Option<usize>,
}

impl Cursor {
    /// A cursor measuring from the beginning of the chunk.
    ///
    /// The start of any chunk is trivially resolved to its first element.
    pub fn forward(position: Bits) -> Self {
        Cursor::with_index(true, position, Self::initial_index(position))
    }

    /// A cursor measuring from the end of the chunk.
    ///
    /// Both the position and the element index are counted backwards from the end.
    pub fn backward(position: Bits) -> Self {
        Cursor::with_index(false, position, Self::initial_index(position))
    }

    /// A cursor with an explicitly resolved element index.
    pub fn with_index(forward: bool, position: Bits, index: Option<usize>) -> Self {
        Cursor { forward, position, index }
    }

    fn initial_index(position: Bits) -> Option<usize> {
        if position.is_zero() {
            Some(0)
        } else {
            None
        }
    }

    /// Check if the position is measured from the beginning.
    pub fn is_forward(&self) -> bool {
        self.forward
    }

    /// Check if the position is measured from the end.
    pub fn is_backward(&self) -> bool {
        !self.forward
    }

    /// The position relative to the end this cursor measures from.
    pub fn position(&self) -> Bits {
        self.position
    }

    /// The index of the element starting at the position, if resolved.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Set the position without resolving the element index.
    pub fn set_position(&mut self, position: Bits) {
        self.position = position;
    }

    /// Set the resolved element index.
    pub fn set_index(&mut self, index: Option<usize>) {
        self.index = index;
    }

    /// Convert the cursor position into an offset from the beginning.
    ///
    /// `total` is the length of the chunk and `length` the length of the part which starts (for
    /// a forward cursor) or ends (for a backward cursor) at the cursor.
    pub fn offset_from_front(&self, total: Bits, length: Bits) -> Bits {
        if self.forward {
            self.position
        } else {
            total - self.position - length
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_is_resolved() {
        assert_eq!(Cursor::forward(Bits::ZERO).index(), Some(0));
        assert_eq!(Cursor::backward(Bits::ZERO).index(), Some(0));
        assert_eq!(Cursor::forward(Bits(3)).index(), None);
    }

    #[test]
    fn backward_offset() {
        let cursor = Cursor::backward(Bits::from_bytes(2));
        assert_eq!(
            cursor.offset_from_front(Bits::from_bytes(10), Bits::from_bytes(3)),
            Bits::from_bytes(5));
        let cursor = Cursor::forward(Bits::from_bytes(2));
        assert_eq!(
            cursor.offset_from_front(Bits::from_bytes(10), Bits::from_bytes(3)),
            Bits::from_bytes(2));
    }
}
