//! Structurally shared chunk trees for packet content.
//!
//! ## Table of contents
//!
//! Each chapter builds on the chunks of the previous one. The packet container at the end is
//! only a thin layer of cursors over a single chunk tree.
//!
//! 1. [Design](#design-and-relevant-core-concepts)
//! 2. [The chunk module](chunk/index.html)
//!    1. [Leaf chunks](chunk/leaf/index.html)
//!    1. [Field records](chunk/fields/index.html)
//!    1. [Slices](chunk/slice/index.html)
//!    1. [Sequences](chunk/sequence/index.html)
//! 3. [Cursors](cursor/index.html)
//! 4. [Checked peeking](peek/index.html)
//! 5. [The packet container](packet/index.html)
//!
//! ## Design and relevant core concepts
//!
//! Packet content is modelled as a tree of *chunks*. A leaf chunk is atomic content: explicit
//! bits or bytes, a run of identical bits or bytes that only matters for its length, or a typed
//! record of protocol fields. A slice is a zero-copy view of a part of another chunk and a
//! sequence concatenates other chunks. Every protocol layer builds, slices and strips headers
//! through the same small interface: query the length, `peek` at some range, insert at either
//! end and remove from either end.
//!
//! Content is shared aggressively. A retransmitted segment, a duplicated frame or a promiscuous
//! capture all refer to the very same chunks. This is only sound because of two rules:
//!
//! * A chunk is *immutable* once it has been exposed beyond its creator. Immutability is
//!   monotonic and covers every descendant.
//! * A chunk is changed in place only by its exclusive owner. The shared handle, [`ChunkPtr`],
//!   only hands out `&mut Chunk` through [`ChunkPtr::make_mut`] which duplicates the chunk first
//!   when anyone else still refers to it. There is no other way to reach a mutable chunk behind a
//!   shared handle.
//!
//! Sequences keep their representation minimal. Nested sequences and slices of sequences are
//! flattened into their elements when inserted, and connecting leaf content is merged into a
//! single leaf. The nesting depth of composite chunks thus never exceeds one.
//!
//! Misuse, such as peeking outside of a chunk or inserting into an immutable chunk, is a bug in
//! the calling protocol code and panics. The status flags (`incomplete`, `incorrect`, improperly
//! represented) on the other hand describe simulated conditions of the content and it is up to
//! the caller to decide how to handle them, see [`PeekFlags`].
//!
//! [`ChunkPtr`]: chunk/struct.ChunkPtr.html
//! [`ChunkPtr::make_mut`]: chunk/struct.ChunkPtr.html#method.make_mut
//! [`PeekFlags`]: peek/struct.PeekFlags.html
#![warn(missing_docs)]
#![warn(unreachable_pub)]

#[macro_use] mod macros;
pub mod chunk;
pub mod cursor;
pub mod error;
pub mod packet;
pub mod peek;
pub mod stream;
pub mod units;

pub use chunk::{Chunk, ChunkFlags, ChunkKind, ChunkPtr, ChunkType, Fields};
pub use cursor::Cursor;
pub use error::PeekError;
pub use packet::Packet;
pub use peek::PeekFlags;
pub use stream::MemoryOutputStream;
pub use units::Bits;
