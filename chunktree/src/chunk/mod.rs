//! The chunk tree.
//!
//! A [`Chunk`] is one node of packet content. Its representation is one of the closed set of
//! [`ChunkKind`]s, which splits into leaves that carry content themselves and the two composite
//! kinds, [`SliceChunk`] and [`SequenceChunk`], that refer to other chunks.
//!
//! ## Sharing and mutation
//!
//! Chunks are referred to through [`ChunkPtr`], a reference counted handle. Handing out a
//! `ChunkPtr` is cheap and the way in which packets share content. Each node carries an
//! *immutable* flag. A fresh chunk is mutable and populated by its creator; it is marked
//! immutable before it is exposed any further, for example before it is inserted into a packet.
//! Marking is recursive and can not be undone by anyone but the exclusive owner, see
//! [`ChunkPtr::make_mut`].
//!
//! All changing operations take `&mut Chunk`. Behind a shared handle this reference can only be
//! obtained by `make_mut`, which duplicates the node if anyone else refers to it. Two packets
//! sharing content can thus never observe each other's changes, regardless of the immutable
//! flag. The flag on top of that protects content that was published deliberately; changing an
//! immutable chunk is a usage error and panics.
//!
//! ## Peeking
//!
//! [`ChunkPtr::peek`] returns the most specific chunk that represents the requested part:
//!
//! * An empty part is an [`EmptyChunk`].
//! * The whole chunk is the chunk itself, except for a slice of a whole chunk (which is that
//!   chunk) and a sequence of a single element (which is that element).
//! * A part of explicit bits or bit counts is a chunk of the same kind, as is a byte aligned part
//!   of explicit bytes or byte counts.
//! * A part of a slice is peeked from the sliced chunk.
//! * A part of a sequence is the element that represents it, or a part of that element, or a new
//!   sequence of the (partial) elements spanning it.
//! * Any other part is a new [`SliceChunk`].
//!
//! New chunks created by peeking are immutable and carry the status flags of their source.
use core::cell::Cell;
use core::fmt;
use core::ops::Deref;
use std::rc::Rc;

use bitflags::bitflags;
use bytes::Bytes;

use crate::cursor::Cursor;
use crate::stream::MemoryOutputStream;
use crate::units::Bits;

pub mod fields;
pub mod leaf;
pub mod sequence;
pub mod slice;

pub use self::fields::{Fields, FieldsChunk};
pub use self::leaf::{BitCountChunk, BitsChunk, ByteCountChunk, BytesChunk, EmptyChunk};
pub use self::sequence::SequenceChunk;
pub use self::slice::SliceChunk;

bitflags! {
    /// The flags stored on a single chunk node.
    ///
    /// The status queries of [`Chunk`] also take descendants into account, these are only the
    /// flags of the node itself.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ChunkFlags: u8 {
        /// The node may no longer be changed.
        const IMMUTABLE = 1 << 0;
        /// The content is only partially known.
        const INCOMPLETE = 1 << 1;
        /// The content contains simulated bit errors.
        const INCORRECT = 1 << 2;
        /// The representation does not properly represent the data.
        const IMPROPERLY_REPRESENTED = 1 << 3;
    }
}

impl ChunkFlags {
    /// The flags describing the content, without the mutability state.
    pub fn status(self) -> ChunkFlags {
        self - ChunkFlags::IMMUTABLE
    }
}

/// The kind of a chunk, without its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkType {
    /// An [`EmptyChunk`](leaf/struct.EmptyChunk.html).
    Empty,
    /// A [`BitCountChunk`](leaf/struct.BitCountChunk.html).
    BitCount,
    /// A [`BitsChunk`](leaf/struct.BitsChunk.html).
    Bits,
    /// A [`ByteCountChunk`](leaf/struct.ByteCountChunk.html).
    ByteCount,
    /// A [`BytesChunk`](leaf/struct.BytesChunk.html).
    Bytes,
    /// A [`FieldsChunk`](fields/struct.FieldsChunk.html).
    Fields,
    /// A [`SliceChunk`](slice/struct.SliceChunk.html).
    Slice,
    /// A [`SequenceChunk`](sequence/struct.SequenceChunk.html).
    Sequence,
}

/// The representation of a chunk.
#[derive(Clone, Debug)]
pub enum ChunkKind {
    /// No content at all.
    Empty(EmptyChunk),
    /// A number of identical bits.
    BitCount(BitCountChunk),
    /// Explicit bits.
    Bits(BitsChunk),
    /// A number of identical bytes.
    ByteCount(ByteCountChunk),
    /// Explicit bytes.
    Bytes(BytesChunk),
    /// A typed record of protocol fields.
    Fields(FieldsChunk),
    /// A part of another chunk.
    Slice(SliceChunk),
    /// A concatenation of other chunks.
    Sequence(SequenceChunk),
}

/// A node of packet content.
///
/// See the [module documentation](index.html) for the rules of sharing and mutation.
///
/// `Clone` on a chunk is the *dup* operation: the copy is mutable and independent of the
/// original. Immutable children of a sequence are shared by reference with the copy, mutable
/// ones are duplicated as well.
#[derive(Debug)]
pub struct Chunk {
    flags: Cell<ChunkFlags>,
    kind: ChunkKind,
}

/// A shared handle to a chunk.
///
/// Cloning the handle shares the chunk, it does not copy it. Use [`dup`](#method.dup) for an
/// independent copy and [`make_mut`](#method.make_mut) to change the chunk.
#[derive(Clone, Debug)]
pub struct ChunkPtr {
    inner: Rc<Chunk>,
}

impl Chunk {
    /// Create a mutable chunk with the given representation.
    pub fn new(kind: ChunkKind) -> Self {
        Chunk {
            flags: Cell::new(ChunkFlags::empty()),
            kind,
        }
    }

    /// A chunk without content.
    pub fn empty() -> Self {
        Chunk::new(ChunkKind::Empty(EmptyChunk))
    }

    /// A chunk of `length` zero bits.
    pub fn bit_count(length: Bits) -> Self {
        Chunk::new(ChunkKind::BitCount(BitCountChunk::new(length)))
    }

    /// A chunk of explicit bits.
    pub fn bits(bits: Vec<bool>) -> Self {
        Chunk::new(ChunkKind::Bits(BitsChunk::new(bits)))
    }

    /// A chunk of `bytes` filler octets.
    pub fn byte_count(bytes: u64) -> Self {
        Chunk::new(ChunkKind::ByteCount(ByteCountChunk::new(bytes)))
    }

    /// A chunk of explicit bytes.
    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        Chunk::new(ChunkKind::Bytes(BytesChunk::new(bytes.into())))
    }

    /// A chunk of a typed field record.
    pub fn fields<F: Fields>(fields: F) -> Self {
        Chunk::new(ChunkKind::Fields(FieldsChunk::new(fields)))
    }

    /// A view of `length` bits of `target` starting at `offset`.
    ///
    /// A slice of a slice refers to the innermost sliced chunk directly.
    ///
    /// # Panics
    ///
    /// This method panics if the range is not within `target` or if `target` is still mutable.
    pub fn slice(target: &ChunkPtr, offset: Bits, length: Bits) -> Self {
        Chunk::new(ChunkKind::Slice(SliceChunk::new(target, offset, length)))
    }

    /// An empty sequence.
    pub fn sequence() -> Self {
        Chunk::new(ChunkKind::Sequence(SequenceChunk::new()))
    }

    /// The representation of this chunk.
    pub fn kind(&self) -> &ChunkKind {
        &self.kind
    }

    /// The kind of this chunk.
    pub fn chunk_type(&self) -> ChunkType {
        match &self.kind {
            ChunkKind::Empty(_) => ChunkType::Empty,
            ChunkKind::BitCount(_) => ChunkType::BitCount,
            ChunkKind::Bits(_) => ChunkType::Bits,
            ChunkKind::ByteCount(_) => ChunkType::ByteCount,
            ChunkKind::Bytes(_) => ChunkType::Bytes,
            ChunkKind::Fields(_) => ChunkType::Fields,
            ChunkKind::Slice(_) => ChunkType::Slice,
            ChunkKind::Sequence(_) => ChunkType::Sequence,
        }
    }

    /// The sequence representation, if this is one.
    pub fn as_sequence(&self) -> Option<&SequenceChunk> {
        match &self.kind {
            ChunkKind::Sequence(sequence) => Some(sequence),
            _ => None,
        }
    }

    /// The slice representation, if this is one.
    pub fn as_slice(&self) -> Option<&SliceChunk> {
        match &self.kind {
            ChunkKind::Slice(slice) => Some(slice),
            _ => None,
        }
    }

    /// The explicit bytes, if this is a bytes chunk.
    pub fn as_bytes(&self) -> Option<&BytesChunk> {
        match &self.kind {
            ChunkKind::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// The explicit bits, if this is a bits chunk.
    pub fn as_bits(&self) -> Option<&BitsChunk> {
        match &self.kind {
            ChunkKind::Bits(bits) => Some(bits),
            _ => None,
        }
    }

    /// Change the explicit bytes, if this is a bytes chunk.
    ///
    /// # Panics
    ///
    /// This method panics if the chunk is immutable.
    pub fn as_bytes_mut(&mut self) -> Option<&mut BytesChunk> {
        self.check_mutable();
        match &mut self.kind {
            ChunkKind::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Change the explicit bits, if this is a bits chunk.
    ///
    /// # Panics
    ///
    /// This method panics if the chunk is immutable.
    pub fn as_bits_mut(&mut self) -> Option<&mut BitsChunk> {
        self.check_mutable();
        match &mut self.kind {
            ChunkKind::Bits(bits) => Some(bits),
            _ => None,
        }
    }

    /// The field record, if this is a fields chunk of the record type `T`.
    pub fn downcast_fields<T: Fields>(&self) -> Option<&T> {
        match &self.kind {
            ChunkKind::Fields(fields) => fields.downcast_ref(),
            _ => None,
        }
    }

    /// Change the field record, if this is a fields chunk of the record type `T`.
    ///
    /// # Panics
    ///
    /// This method panics if the chunk is immutable.
    pub fn downcast_fields_mut<T: Fields>(&mut self) -> Option<&mut T> {
        self.check_mutable();
        match &mut self.kind {
            ChunkKind::Fields(fields) => fields.downcast_mut(),
            _ => None,
        }
    }

    /// The length of the represented content.
    pub fn length(&self) -> Bits {
        match &self.kind {
            ChunkKind::Empty(_) => Bits::ZERO,
            ChunkKind::BitCount(chunk) => chunk.length(),
            ChunkKind::Bits(chunk) => chunk.length(),
            ChunkKind::ByteCount(chunk) => chunk.length(),
            ChunkKind::Bytes(chunk) => chunk.length(),
            ChunkKind::Fields(chunk) => chunk.length(),
            ChunkKind::Slice(chunk) => chunk.length(),
            ChunkKind::Sequence(chunk) => chunk.length(),
        }
    }

    /// Check if the chunk represents no content.
    pub fn is_empty(&self) -> bool {
        self.length().is_zero()
    }

    /// The flags of this node alone.
    pub fn flags(&self) -> ChunkFlags {
        self.flags.get()
    }

    /// Check if the chunk can still be changed.
    ///
    /// A sequence is mutable if it or any of its elements is.
    pub fn is_mutable(&self) -> bool {
        if !self.flags.get().contains(ChunkFlags::IMMUTABLE) {
            return true;
        }

        match &self.kind {
            ChunkKind::Sequence(sequence) => sequence.children().any(|child| child.is_mutable()),
            _ => false,
        }
    }

    /// Check if the chunk can no longer be changed.
    pub fn is_immutable(&self) -> bool {
        !self.is_mutable()
    }

    /// Forbid all further changes of this chunk and all its descendants.
    ///
    /// This is idempotent. Note that there is no way to mark a chunk mutable again, except by
    /// its exclusive owner through [`ChunkPtr::make_mut`].
    ///
    /// [`ChunkPtr::make_mut`]: struct.ChunkPtr.html#method.make_mut
    pub fn mark_immutable(&self) {
        let flags = self.flags.get();
        if flags.contains(ChunkFlags::IMMUTABLE) && !self.is_mutable() {
            return;
        }

        self.flags.set(flags | ChunkFlags::IMMUTABLE);
        match &self.kind {
            ChunkKind::Sequence(sequence) => sequence
                .children()
                .for_each(|child| child.mark_immutable()),
            ChunkKind::Slice(slice) => slice.target().mark_immutable(),
            _ => {},
        }
    }

    fn check_mutable(&self) {
        check_usage!(self.is_mutable(), "{:?} chunk is immutable", self.chunk_type());
    }

    /// Check if this chunk or any descendant is only partially known.
    pub fn is_incomplete(&self) -> bool {
        self.has_status(ChunkFlags::INCOMPLETE)
    }

    /// Check if neither this chunk nor any descendant is only partially known.
    pub fn is_complete(&self) -> bool {
        !self.is_incomplete()
    }

    /// Check if this chunk or any descendant contains bit errors.
    pub fn is_incorrect(&self) -> bool {
        self.has_status(ChunkFlags::INCORRECT)
    }

    /// Check if neither this chunk nor any descendant contains bit errors.
    pub fn is_correct(&self) -> bool {
        !self.is_incorrect()
    }

    /// Check if this chunk or any descendant misrepresents its data.
    pub fn is_improperly_represented(&self) -> bool {
        self.has_status(ChunkFlags::IMPROPERLY_REPRESENTED)
    }

    /// Check if neither this chunk nor any descendant misrepresents its data.
    pub fn is_properly_represented(&self) -> bool {
        !self.is_improperly_represented()
    }

    /// The status flags of this chunk and all its descendants combined.
    pub fn status(&self) -> ChunkFlags {
        let mut status = ChunkFlags::empty();
        for flag in [
            ChunkFlags::INCOMPLETE,
            ChunkFlags::INCORRECT,
            ChunkFlags::IMPROPERLY_REPRESENTED,
        ].iter() {
            if self.has_status(*flag) {
                status |= *flag;
            }
        }
        status
    }

    fn has_status(&self, flag: ChunkFlags) -> bool {
        if self.flags.get().contains(flag) {
            return true;
        }

        match &self.kind {
            ChunkKind::Sequence(sequence) => sequence.children().any(|child| child.has_status(flag)),
            ChunkKind::Slice(slice) => slice.target().has_status(flag),
            _ => false,
        }
    }

    /// Mark the content as only partially known.
    ///
    /// # Panics
    ///
    /// This method panics if the chunk is immutable.
    pub fn mark_incomplete(&mut self) {
        self.mark_status(ChunkFlags::INCOMPLETE);
    }

    /// Mark the content as containing bit errors.
    ///
    /// # Panics
    ///
    /// This method panics if the chunk is immutable.
    pub fn mark_incorrect(&mut self) {
        self.mark_status(ChunkFlags::INCORRECT);
    }

    /// Mark the representation as not properly representing the data.
    ///
    /// # Panics
    ///
    /// This method panics if the chunk is immutable.
    pub fn mark_improperly_represented(&mut self) {
        self.mark_status(ChunkFlags::IMPROPERLY_REPRESENTED);
    }

    fn mark_status(&mut self, flag: ChunkFlags) {
        self.check_mutable();
        self.flags.get_mut().insert(flag);
    }

    /// Resolve a cursor to a position.
    pub fn seek_cursor(&self, cursor: &mut Cursor, position: Bits) {
        match &self.kind {
            ChunkKind::Sequence(sequence) => sequence.seek_cursor(cursor, position),
            _ => {
                cursor.set_position(position);
                cursor.set_index(if position.is_zero() { Some(0) } else { None });
            },
        }
    }

    /// Advance a cursor by the given length.
    pub fn move_cursor(&self, cursor: &mut Cursor, length: Bits) {
        match &self.kind {
            ChunkKind::Sequence(sequence) => sequence.move_cursor(cursor, length),
            _ => {
                let position = cursor.position() + length;
                cursor.set_position(position);
                cursor.set_index(if position.is_zero() { Some(0) } else { None });
            },
        }
    }

    /// Check if `chunk` can be appended to this chunk without changing its kind.
    pub fn can_insert_at_back(&self, chunk: &Chunk) -> bool {
        match (&self.kind, &chunk.kind) {
            (ChunkKind::Sequence(_), _) => true,
            (ChunkKind::Slice(this), ChunkKind::Slice(other)) => this.connects_at_back(other),
            _ => self.can_merge_leaf(chunk),
        }
    }

    /// Check if `chunk` can be prepended to this chunk without changing its kind.
    pub fn can_insert_at_front(&self, chunk: &Chunk) -> bool {
        match (&self.kind, &chunk.kind) {
            (ChunkKind::Sequence(_), _) => true,
            (ChunkKind::Slice(this), ChunkKind::Slice(other)) => this.connects_at_front(other),
            _ => self.can_merge_leaf(chunk),
        }
    }

    /// Leaves merge with leaves of the same kind and status. Merging with different status would
    /// smear a flag over content it does not describe.
    fn can_merge_leaf(&self, chunk: &Chunk) -> bool {
        let kinds = match (&self.kind, &chunk.kind) {
            (ChunkKind::BitCount(this), ChunkKind::BitCount(other)) => this.data() == other.data(),
            (ChunkKind::Bits(_), ChunkKind::Bits(_)) => true,
            (ChunkKind::ByteCount(this), ChunkKind::ByteCount(other)) => this.data() == other.data(),
            (ChunkKind::Bytes(_), ChunkKind::Bytes(_)) => true,
            _ => false,
        };
        kinds && self.status() == chunk.status()
    }

    /// Append `chunk` to this chunk.
    ///
    /// # Panics
    ///
    /// This method panics if this chunk is immutable or can not represent the result, see
    /// [`can_insert_at_back`](#method.can_insert_at_back).
    pub fn insert_at_back(&mut self, chunk: &ChunkPtr) {
        self.check_mutable();
        check_usage!(self.can_insert_at_back(chunk), "can not insert {:?} chunk at the back of {:?} chunk",
            chunk.chunk_type(), self.chunk_type());
        match (&mut self.kind, chunk.kind()) {
            (ChunkKind::Sequence(this), _) => this.insert_at_back(chunk),
            (ChunkKind::Slice(this), ChunkKind::Slice(other)) => this.insert_at_back(other),
            (ChunkKind::BitCount(this), ChunkKind::BitCount(other)) => this.insert_at_back(other),
            (ChunkKind::Bits(this), ChunkKind::Bits(other)) => this.insert_at_back(other),
            (ChunkKind::ByteCount(this), ChunkKind::ByteCount(other)) => this.insert_at_back(other),
            (ChunkKind::Bytes(this), ChunkKind::Bytes(other)) => this.insert_at_back(other),
            _ => unreachable!("insertion was checked"),
        }
    }

    /// Prepend `chunk` to this chunk.
    ///
    /// # Panics
    ///
    /// This method panics if this chunk is immutable or can not represent the result, see
    /// [`can_insert_at_front`](#method.can_insert_at_front).
    pub fn insert_at_front(&mut self, chunk: &ChunkPtr) {
        self.check_mutable();
        check_usage!(self.can_insert_at_front(chunk), "can not insert {:?} chunk at the front of {:?} chunk",
            chunk.chunk_type(), self.chunk_type());
        match (&mut self.kind, chunk.kind()) {
            (ChunkKind::Sequence(this), _) => this.insert_at_front(chunk),
            (ChunkKind::Slice(this), ChunkKind::Slice(other)) => this.insert_at_front(other),
            (ChunkKind::BitCount(this), ChunkKind::BitCount(other)) => this.insert_at_front(other),
            (ChunkKind::Bits(this), ChunkKind::Bits(other)) => this.insert_at_front(other),
            (ChunkKind::ByteCount(this), ChunkKind::ByteCount(other)) => this.insert_at_front(other),
            (ChunkKind::Bytes(this), ChunkKind::Bytes(other)) => this.insert_at_front(other),
            _ => unreachable!("insertion was checked"),
        }
    }

    /// Check if `length` bits can be removed from the front without changing the kind.
    pub fn can_remove_at_front(&self, length: Bits) -> bool {
        self.can_remove(length)
    }

    /// Check if `length` bits can be removed from the back without changing the kind.
    pub fn can_remove_at_back(&self, length: Bits) -> bool {
        self.can_remove(length)
    }

    fn can_remove(&self, length: Bits) -> bool {
        match &self.kind {
            ChunkKind::BitCount(_)
            | ChunkKind::Bits(_)
            | ChunkKind::Slice(_)
            | ChunkKind::Sequence(_) => true,
            ChunkKind::ByteCount(_) | ChunkKind::Bytes(_) => length.is_byte_aligned(),
            ChunkKind::Empty(_) | ChunkKind::Fields(_) => length.is_zero(),
        }
    }

    /// Remove `length` bits from the front of this chunk.
    ///
    /// # Panics
    ///
    /// This method panics if the length exceeds the chunk, if the chunk is immutable or if it can
    /// not represent the result, see [`can_remove_at_front`](#method.can_remove_at_front).
    pub fn remove_at_front(&mut self, length: Bits) {
        self.check_removal(length);
        match &mut self.kind {
            ChunkKind::Sequence(this) => this.remove_at_front(length),
            ChunkKind::Slice(this) => this.remove_at_front(length),
            ChunkKind::BitCount(this) => this.remove_at_front(length),
            ChunkKind::Bits(this) => this.remove_at_front(length),
            ChunkKind::ByteCount(this) => this.remove_at_front(length),
            ChunkKind::Bytes(this) => this.remove_at_front(length),
            ChunkKind::Empty(_) | ChunkKind::Fields(_) => {},
        }
    }

    /// Remove `length` bits from the back of this chunk.
    ///
    /// # Panics
    ///
    /// This method panics if the length exceeds the chunk, if the chunk is immutable or if it can
    /// not represent the result, see [`can_remove_at_back`](#method.can_remove_at_back).
    pub fn remove_at_back(&mut self, length: Bits) {
        self.check_removal(length);
        match &mut self.kind {
            ChunkKind::Sequence(this) => this.remove_at_back(length),
            ChunkKind::Slice(this) => this.remove_at_back(length),
            ChunkKind::BitCount(this) => this.remove_at_back(length),
            ChunkKind::Bits(this) => this.remove_at_back(length),
            ChunkKind::ByteCount(this) => this.remove_at_back(length),
            ChunkKind::Bytes(this) => this.remove_at_back(length),
            ChunkKind::Empty(_) | ChunkKind::Fields(_) => {},
        }
    }

    fn check_removal(&self, length: Bits) {
        check_usage!(length <= self.length(), "can not remove {} from a chunk of length {}",
            length, self.length());
        self.check_mutable();
        check_usage!(self.can_remove(length), "can not remove {} from {:?} chunk",
            length, self.chunk_type());
    }

    /// Write the content of this chunk.
    pub fn serialize(&self, stream: &mut MemoryOutputStream) {
        match &self.kind {
            ChunkKind::Empty(_) => {},
            ChunkKind::BitCount(chunk) => stream.write_bit_repeatedly(chunk.data(), chunk.length()),
            ChunkKind::Bits(chunk) => stream.write_bits(chunk.bits()),
            ChunkKind::ByteCount(chunk) => stream.write_byte_repeatedly(chunk.data(), chunk.byte_length()),
            ChunkKind::Bytes(chunk) => stream.write_bytes(chunk.bytes()),
            ChunkKind::Fields(chunk) => chunk.serialize(stream),
            ChunkKind::Slice(chunk) => chunk.serialize(stream),
            ChunkKind::Sequence(chunk) => chunk
                .children()
                .for_each(|child| child.serialize(stream)),
        }
    }

    /// Collect the content of this chunk.
    pub fn to_stream(&self) -> MemoryOutputStream {
        let mut stream = MemoryOutputStream::with_capacity(self.length().whole_bytes() as usize + 1);
        self.serialize(&mut stream);
        stream
    }

    /// Check if both chunks represent the same bits, regardless of representation.
    pub fn content_eq(&self, other: &Chunk) -> bool {
        self.length() == other.length() && self.to_stream() == other.to_stream()
    }

    /// Add status flags to a chunk under construction.
    pub(crate) fn with_status(self, status: ChunkFlags) -> Self {
        self.flags.set(self.flags.get() | status.status());
        self
    }

    /// A new chunk derived from this one, with its status but immutable.
    fn derive(&self, kind: ChunkKind) -> ChunkPtr {
        let chunk = Chunk {
            flags: Cell::new(self.flags.get().status()),
            kind,
        };
        ChunkPtr::immutable(chunk)
    }
}

impl Clone for Chunk {
    fn clone(&self) -> Self {
        Chunk {
            flags: Cell::new(self.flags.get().status()),
            kind: self.kind.clone(),
        }
    }
}

impl From<ChunkKind> for Chunk {
    fn from(kind: ChunkKind) -> Self {
        Chunk::new(kind)
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ChunkKind::Empty(chunk) => fmt::Display::fmt(chunk, f),
            ChunkKind::BitCount(chunk) => fmt::Display::fmt(chunk, f),
            ChunkKind::Bits(chunk) => fmt::Display::fmt(chunk, f),
            ChunkKind::ByteCount(chunk) => fmt::Display::fmt(chunk, f),
            ChunkKind::Bytes(chunk) => fmt::Display::fmt(chunk, f),
            ChunkKind::Fields(chunk) => fmt::Display::fmt(chunk, f),
            ChunkKind::Slice(chunk) => fmt::Display::fmt(chunk, f),
            ChunkKind::Sequence(chunk) => fmt::Display::fmt(chunk, f),
        }
    }
}

impl ChunkPtr {
    /// Share a chunk.
    pub fn new(chunk: Chunk) -> Self {
        ChunkPtr { inner: Rc::new(chunk) }
    }

    /// Share a chunk after marking it immutable.
    pub fn immutable(chunk: Chunk) -> Self {
        chunk.mark_immutable();
        ChunkPtr::new(chunk)
    }

    /// Check if both handles refer to the very same chunk.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.inner, &other.inner)
    }

    /// The number of handles sharing the chunk.
    pub fn owners(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    /// Check if this is the only handle to the chunk.
    pub fn is_exclusive(&self) -> bool {
        self.owners() == 1
    }

    /// The chunk, if it is exclusively owned and still mutable.
    pub fn get_mut(&mut self) -> Option<&mut Chunk> {
        Rc::get_mut(&mut self.inner)
            .filter(|chunk| chunk.is_mutable())
    }

    /// Get a mutable chunk with the content of the shared one.
    ///
    /// If this handle is the exclusive owner then the chunk is changed in place. Since nobody
    /// else can observe it, it becomes mutable even if it had been marked immutable before. Its
    /// descendants stay as they are. Otherwise the chunk is duplicated first and this handle
    /// refers to the copy afterwards, leaving all other handles untouched.
    pub fn make_mut(&mut self) -> &mut Chunk {
        if !self.is_exclusive() {
            chunk_trace!("duplicating shared {:?} chunk of length {} with {} owners",
                self.chunk_type(), self.length(), self.owners());
        }

        let chunk = Rc::make_mut(&mut self.inner);
        chunk.flags.get_mut().remove(ChunkFlags::IMMUTABLE);
        chunk
    }

    /// An independent, mutable copy of the chunk.
    pub fn dup(&self) -> ChunkPtr {
        ChunkPtr::new(Chunk::clone(&self.inner))
    }

    /// The most specific chunk that represents `length` bits at the cursor.
    ///
    /// See the [module documentation](index.html#peeking) for the possible results.
    ///
    /// # Panics
    ///
    /// This method panics if the requested part is not within the chunk.
    pub fn peek(&self, cursor: &Cursor, length: Bits) -> ChunkPtr {
        let total = self.length();
        check_usage!(cursor.position() + length <= total,
            "can not peek {} at {} of a chunk of length {}", length, cursor.position(), total);
        let offset = cursor.offset_from_front(total, length);

        if length.is_zero() {
            return ChunkPtr::immutable(Chunk::empty());
        }

        if length == total {
            return self.peek_whole();
        }

        match &self.kind {
            ChunkKind::Empty(_) => unreachable!("an empty chunk has no non-empty part"),
            ChunkKind::BitCount(chunk) => self.derive(ChunkKind::BitCount(chunk.part(length))),
            ChunkKind::Bits(chunk) => self.derive(ChunkKind::Bits(chunk.part(offset, length))),
            ChunkKind::ByteCount(chunk) => match chunk.part(offset, length) {
                Some(part) => self.derive(ChunkKind::ByteCount(part)),
                None => self.slice_part(offset, length),
            },
            ChunkKind::Bytes(chunk) => match chunk.part(offset, length) {
                Some(part) => self.derive(ChunkKind::Bytes(part)),
                None => self.slice_part(offset, length),
            },
            ChunkKind::Fields(_) => self.slice_part(offset, length),
            ChunkKind::Slice(chunk) => chunk.peek_part(offset, length),
            ChunkKind::Sequence(chunk) => chunk.peek_part(cursor, offset, length),
        }
    }

    /// Peek at an offset from the beginning.
    pub fn peek_at(&self, offset: Bits, length: Bits) -> ChunkPtr {
        self.peek(&Cursor::forward(offset), length)
    }

    /// The simplest representation of the whole chunk.
    pub fn simplify(&self) -> ChunkPtr {
        self.peek_at(Bits::ZERO, self.length())
    }

    fn peek_whole(&self) -> ChunkPtr {
        match &self.kind {
            ChunkKind::Slice(slice) if slice.covers_target() => slice.target().clone(),
            ChunkKind::Sequence(sequence) if sequence.width() == 1 => match sequence.child(0) {
                Some(only) => only.clone(),
                None => self.clone(),
            },
            _ => self.clone(),
        }
    }

    fn slice_part(&self, offset: Bits, length: Bits) -> ChunkPtr {
        ChunkPtr::immutable(Chunk::slice(self, offset, length))
    }
}

impl Deref for ChunkPtr {
    type Target = Chunk;

    fn deref(&self) -> &Chunk {
        &self.inner
    }
}

impl From<Chunk> for ChunkPtr {
    fn from(chunk: Chunk) -> Self {
        ChunkPtr::new(chunk)
    }
}

impl fmt::Display for ChunkPtr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}
