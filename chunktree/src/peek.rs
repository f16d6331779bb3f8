//! Checked peeking.
//!
//! A plain [`ChunkPtr::peek`] returns whatever represents the requested part, including content
//! that is incomplete, incorrect or improperly represented. A protocol parsing a header usually
//! can not handle those cases and would have to check every result. The checked variants take
//! [`PeekFlags`] declaring what the caller is prepared to handle and report everything else as a
//! [`PeekError`].
//!
//! The conversions additionally provide a fixed representation. Serializing content into bytes
//! or bits is expensive and loses the structure of field records, so it must be allowed
//! explicitly.
//!
//! [`ChunkPtr::peek`]: ../chunk/struct.ChunkPtr.html#method.peek
//! [`PeekFlags`]: struct.PeekFlags.html
//! [`PeekError`]: ../error/enum.PeekError.html
use bitflags::bitflags;

use crate::chunk::{Chunk, ChunkFlags, ChunkPtr, ChunkType};
use crate::cursor::Cursor;
use crate::error::{PeekError, Result};
use crate::units::Bits;

bitflags! {
    /// The conditions a caller of a checked peek can handle.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PeekFlags: u8 {
        /// An empty result.
        const ALLOW_EMPTY = 1 << 0;
        /// A result that is only partially known, including a part cut short by the end of the
        /// content.
        const ALLOW_INCOMPLETE = 1 << 1;
        /// A result containing bit errors.
        const ALLOW_INCORRECT = 1 << 2;
        /// A result that does not properly represent its data.
        const ALLOW_IMPROPERLY_REPRESENTED = 1 << 3;
        /// Serializing the result into another representation.
        const ALLOW_SERIALIZATION = 1 << 4;
        /// Everything.
        const ALLOW_ALL = Self::ALLOW_EMPTY.bits()
            | Self::ALLOW_INCOMPLETE.bits()
            | Self::ALLOW_INCORRECT.bits()
            | Self::ALLOW_IMPROPERLY_REPRESENTED.bits()
            | Self::ALLOW_SERIALIZATION.bits();
    }
}

impl ChunkPtr {
    /// Peek at a part, failing on conditions not allowed by `flags`.
    ///
    /// If the content ends before the requested length then the available part is returned,
    /// marked incomplete, provided that `flags` allows incomplete results.
    ///
    /// # Panics
    ///
    /// This method panics if the cursor itself is beyond the content.
    pub fn try_peek(&self, cursor: &Cursor, length: Bits, flags: PeekFlags) -> Result<ChunkPtr> {
        let total = self.length();
        check_usage!(cursor.position() <= total,
            "cursor at {} is beyond the chunk length {}", cursor.position(), total);
        self.try_peek_within(cursor, length, total - cursor.position(), flags)
    }

    /// Peek at a part that may extend over at most `available` bits after the cursor.
    ///
    /// Offsets in errors are relative to the start of this chunk.
    pub(crate) fn try_peek_within(&self, cursor: &Cursor, length: Bits, available: Bits, flags: PeekFlags)
        -> Result<ChunkPtr>
    {
        let total = self.length();
        let (part, offset) = if length > available {
            let offset = cursor.offset_from_front(total, available);
            if !flags.contains(PeekFlags::ALLOW_INCOMPLETE) {
                return Err(PeekError::Incomplete { offset, length });
            }
            chunk_trace!("peek of length {} truncated to the available {}", length, available);
            (truncated(&self.peek(cursor, available)), offset)
        } else {
            (self.peek(cursor, length), cursor.offset_from_front(total, length))
        };

        check_status(&part, offset, flags)?;
        Ok(part)
    }

    /// Peek at a part as explicit bytes.
    ///
    /// The part is returned as it is if it is already a bytes chunk. Otherwise it is serialized
    /// into a new one, which requires [`ALLOW_SERIALIZATION`]. The status of the content carries
    /// over.
    ///
    /// [`ALLOW_SERIALIZATION`]: ../peek/struct.PeekFlags.html#associatedconstant.ALLOW_SERIALIZATION
    pub fn try_peek_as_bytes(&self, cursor: &Cursor, length: Bits, flags: PeekFlags) -> Result<ChunkPtr> {
        let part = self.try_peek(cursor, length, flags)?;
        if part.chunk_type() == ChunkType::Bytes {
            return Ok(part);
        }

        if !part.length().is_byte_aligned() {
            let offset = cursor.offset_from_front(self.length(), part.length());
            return Err(PeekError::Unaligned { offset, length: part.length() });
        }

        convert(&part, flags, |part| Chunk::bytes(part.to_stream().into_data()))
    }

    /// Peek at a part as explicit bits.
    ///
    /// The part is returned as it is if it is already a bits chunk. Otherwise it is serialized
    /// into a new one, which requires [`ALLOW_SERIALIZATION`]. The status of the content carries
    /// over.
    ///
    /// [`ALLOW_SERIALIZATION`]: ../peek/struct.PeekFlags.html#associatedconstant.ALLOW_SERIALIZATION
    pub fn try_peek_as_bits(&self, cursor: &Cursor, length: Bits, flags: PeekFlags) -> Result<ChunkPtr> {
        let part = self.try_peek(cursor, length, flags)?;
        if part.chunk_type() == ChunkType::Bits {
            return Ok(part);
        }

        convert(&part, flags, |part| Chunk::bits(part.to_stream().to_bits()))
    }
}

/// The part cut short by the end of the content.
fn truncated(part: &ChunkPtr) -> ChunkPtr {
    let mut incomplete = Chunk::clone(part);
    incomplete.mark_incomplete();
    ChunkPtr::immutable(incomplete)
}

fn convert<F>(part: &ChunkPtr, flags: PeekFlags, serialize: F) -> Result<ChunkPtr>
    where F: FnOnce(&Chunk) -> Chunk
{
    if !part.is_empty() && !flags.contains(PeekFlags::ALLOW_SERIALIZATION) {
        return Err(PeekError::SerializationDisallowed { from: part.chunk_type() });
    }

    chunk_debug!("serializing {:?} chunk of length {}", part.chunk_type(), part.length());
    let converted = serialize(part).with_status(part.status());
    Ok(ChunkPtr::immutable(converted))
}

fn check_status(part: &Chunk, offset: Bits, flags: PeekFlags) -> Result<()> {
    let length = part.length();
    if part.is_empty() && !flags.contains(PeekFlags::ALLOW_EMPTY) {
        return Err(PeekError::Empty { offset });
    }

    let status = part.status();
    if status.contains(ChunkFlags::INCOMPLETE) && !flags.contains(PeekFlags::ALLOW_INCOMPLETE) {
        return Err(PeekError::Incomplete { offset, length });
    }
    if status.contains(ChunkFlags::INCORRECT) && !flags.contains(PeekFlags::ALLOW_INCORRECT) {
        return Err(PeekError::Incorrect { offset, length });
    }
    if status.contains(ChunkFlags::IMPROPERLY_REPRESENTED)
        && !flags.contains(PeekFlags::ALLOW_IMPROPERLY_REPRESENTED)
    {
        return Err(PeekError::ImproperlyRepresented { offset, length });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content() -> ChunkPtr {
        let mut sequence = ChunkPtr::new(Chunk::sequence());
        sequence.make_mut().insert_at_back(&ChunkPtr::immutable(Chunk::bytes(vec![1u8, 2])));
        sequence.make_mut().insert_at_back(&ChunkPtr::immutable(Chunk::byte_count(2)));
        let mut broken = Chunk::bits(vec![true; 8]);
        broken.mark_incorrect();
        sequence.make_mut().insert_at_back(&ChunkPtr::immutable(broken));
        sequence.mark_immutable();
        sequence
    }

    #[test]
    fn status_is_checked() {
        let content = content();
        let start = Cursor::forward(Bits::ZERO);
        assert!(content.try_peek(&start, Bits::from_bytes(4), PeekFlags::empty()).is_ok());
        assert_eq!(
            content.try_peek(&start, Bits::from_bytes(5), PeekFlags::empty()).unwrap_err(),
            PeekError::Incorrect { offset: Bits::ZERO, length: Bits::from_bytes(5) });
        assert!(content.try_peek(&start, Bits::from_bytes(5), PeekFlags::ALLOW_INCORRECT).is_ok());
        assert_eq!(
            content.try_peek(&start, Bits::ZERO, PeekFlags::empty()).unwrap_err(),
            PeekError::Empty { offset: Bits::ZERO });
    }

    #[test]
    fn truncated_peek() {
        let content = content();
        let cursor = Cursor::forward(Bits::from_bytes(3));
        assert_eq!(
            content.try_peek(&cursor, Bits::from_bytes(4), PeekFlags::ALLOW_INCORRECT).unwrap_err(),
            PeekError::Incomplete { offset: Bits::from_bytes(3), length: Bits::from_bytes(4) });

        let flags = PeekFlags::ALLOW_INCORRECT | PeekFlags::ALLOW_INCOMPLETE;
        let part = content.try_peek(&cursor, Bits::from_bytes(4), flags).unwrap();
        assert_eq!(part.length(), Bits::from_bytes(2));
        assert!(part.is_incomplete());
        assert!(part.is_incorrect());
        assert!(content.is_complete());
    }

    #[test]
    fn conversion_requires_serialization() {
        let content = content();
        let start = Cursor::forward(Bits::ZERO);

        let direct = content.try_peek_as_bytes(&start, Bits::from_bytes(2), PeekFlags::empty()).unwrap();
        assert_eq!(direct.chunk_type(), ChunkType::Bytes);

        assert_eq!(
            content.try_peek_as_bytes(&start, Bits::from_bytes(3), PeekFlags::empty()).unwrap_err(),
            PeekError::SerializationDisallowed { from: ChunkType::Sequence });

        let bytes = content
            .try_peek_as_bytes(&start, Bits::from_bytes(3), PeekFlags::ALLOW_SERIALIZATION)
            .unwrap();
        assert_eq!(bytes.as_bytes().unwrap().bytes().as_ref(), &[1, 2, b'?']);
        assert!(bytes.is_immutable());
    }

    #[test]
    fn conversion_keeps_status() {
        let content = content();
        let back = Cursor::backward(Bits::ZERO);
        let bits = content
            .try_peek_as_bits(&back, Bits::from_bytes(2), PeekFlags::ALLOW_ALL)
            .unwrap();
        assert_eq!(bits.chunk_type(), ChunkType::Bits);
        assert!(bits.is_incorrect());
        assert_eq!(bits.as_bits().unwrap().bits().len(), 16);
    }

    #[test]
    fn unaligned_bytes() {
        let content = ChunkPtr::immutable(Chunk::bits(vec![false; 12]));
        let start = Cursor::forward(Bits::ZERO);
        assert_eq!(
            content.try_peek_as_bytes(&start, Bits(12), PeekFlags::ALLOW_ALL).unwrap_err(),
            PeekError::Unaligned { offset: Bits::ZERO, length: Bits(12) });
    }
}
