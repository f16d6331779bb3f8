//! Errors of checked peeking.
use thiserror::Error;

use crate::chunk::ChunkType;
use crate::units::Bits;

/// The error type for checked peeking.
///
/// None of these describe a bug. They report that the requested part exists but is not in a
/// state or representation the caller declared it can handle, see [`PeekFlags`]. Out of bounds
/// ranges and similar misuse panic instead.
///
/// [`PeekFlags`]: ../peek/struct.PeekFlags.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PeekError {
    /// The requested part is empty.
    #[error("peeked part at {offset} is empty")]
    Empty {
        /// Offset of the part from the beginning of the chunk.
        offset: Bits,
    },

    /// The requested part is only partially known, for example after a truncated capture.
    #[error("peeked part at {offset} of length {length} is incomplete")]
    Incomplete {
        /// Offset of the part from the beginning of the chunk.
        offset: Bits,
        /// Length of the part.
        length: Bits,
    },

    /// The requested part contains simulated bit errors.
    #[error("peeked part at {offset} of length {length} is incorrect")]
    Incorrect {
        /// Offset of the part from the beginning of the chunk.
        offset: Bits,
        /// Length of the part.
        length: Bits,
    },

    /// The requested part does not represent its data properly.
    #[error("peeked part at {offset} of length {length} is improperly represented")]
    ImproperlyRepresented {
        /// Offset of the part from the beginning of the chunk.
        offset: Bits,
        /// Length of the part.
        length: Bits,
    },

    /// The part would have to be serialized to provide the requested representation.
    #[error("converting a {from:?} chunk requires serialization which was not allowed")]
    SerializationDisallowed {
        /// The kind of chunk that represents the part.
        from: ChunkType,
    },

    /// A byte representation was requested for a part that is not made of whole octets.
    #[error("part at {offset} of length {length} is not byte aligned")]
    Unaligned {
        /// Offset of the part from the beginning of the chunk.
        offset: Bits,
        /// Length of the part.
        length: Bits,
    },
}

/// The result type for checked peeking.
pub type Result<T> = core::result::Result<T, PeekError>;
