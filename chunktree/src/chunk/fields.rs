//! Typed protocol headers as chunks.
use core::any::Any;
use core::fmt;

use crate::stream::MemoryOutputStream;
use crate::units::Bits;

/// A record of protocol fields.
///
/// This is how a protocol model stores its header: as a plain struct instead of octets. The
/// record knows its length on the wire and how to write itself, the chunk machinery never looks
/// at the individual fields.
///
/// Implementations are usually a `Clone` struct and the object plumbing is boilerplate:
///
/// ```
/// use core::any::Any;
/// use chunktree::{Bits, Fields, MemoryOutputStream};
///
/// #[derive(Clone, Debug)]
/// struct Ports {
///     src: u16,
///     dst: u16,
/// }
///
/// impl Fields for Ports {
///     fn chunk_length(&self) -> Bits {
///         Bits::from_bytes(4)
///     }
///
///     fn serialize(&self, stream: &mut MemoryOutputStream) {
///         stream.write_u16(self.src);
///         stream.write_u16(self.dst);
///     }
///
///     fn dup(&self) -> Box<dyn Fields> {
///         Box::new(self.clone())
///     }
///
///     fn as_any(&self) -> &dyn Any { self }
///     fn as_any_mut(&mut self) -> &mut dyn Any { self }
/// }
/// ```
pub trait Fields: Any + fmt::Debug {
    /// The length of the serialized record.
    fn chunk_length(&self) -> Bits;

    /// Write exactly `chunk_length` bits.
    fn serialize(&self, stream: &mut MemoryOutputStream);

    /// An independent copy of the record.
    fn dup(&self) -> Box<dyn Fields>;

    /// Upcast for downcasting to the concrete record.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for downcasting to the concrete record.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A chunk holding a field record.
///
/// A field record can not be cut. Parts of it are peeked as slices, and it can not be merged
/// with anything else.
#[derive(Debug)]
pub struct FieldsChunk {
    fields: Box<dyn Fields>,
}

impl FieldsChunk {
    /// Wrap a record.
    pub fn new<F: Fields>(fields: F) -> Self {
        FieldsChunk { fields: Box::new(fields) }
    }

    /// The record as a trait object.
    pub fn fields(&self) -> &dyn Fields {
        &*self.fields
    }

    /// The record, if it is a `T`.
    pub fn downcast_ref<T: Fields>(&self) -> Option<&T> {
        self.fields.as_any().downcast_ref()
    }

    /// The record, if it is a `T`.
    pub fn downcast_mut<T: Fields>(&mut self) -> Option<&mut T> {
        self.fields.as_any_mut().downcast_mut()
    }

    /// The length of the serialized record.
    pub fn length(&self) -> Bits {
        self.fields.chunk_length()
    }

    pub(crate) fn serialize(&self, stream: &mut MemoryOutputStream) {
        let start = stream.length();
        self.fields.serialize(stream);
        check_usage!(stream.length() - start == self.length(),
            "{:?} serialized {} instead of its length {}",
            self.fields, stream.length() - start, self.length());
    }
}

impl Clone for FieldsChunk {
    fn clone(&self) -> Self {
        FieldsChunk { fields: self.fields.dup() }
    }
}

impl fmt::Display for FieldsChunk {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FieldsChunk, length = {}, fields = {:?}", self.length(), self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Tag(u8);

    impl Fields for Tag {
        fn chunk_length(&self) -> Bits {
            Bits::from_bytes(1)
        }

        fn serialize(&self, stream: &mut MemoryOutputStream) {
            stream.write_byte(self.0);
        }

        fn dup(&self) -> Box<dyn Fields> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn Any { self }
        fn as_any_mut(&mut self) -> &mut dyn Any { self }
    }

    #[derive(Clone, Debug)]
    struct Liar;

    impl Fields for Liar {
        fn chunk_length(&self) -> Bits {
            Bits::from_bytes(2)
        }

        fn serialize(&self, stream: &mut MemoryOutputStream) {
            stream.write_byte(0);
        }

        fn dup(&self) -> Box<dyn Fields> {
            Box::new(self.clone())
        }

        fn as_any(&self) -> &dyn Any { self }
        fn as_any_mut(&mut self) -> &mut dyn Any { self }
    }

    #[test]
    fn downcast() {
        let mut chunk = FieldsChunk::new(Tag(7));
        assert_eq!(chunk.downcast_ref::<Tag>(), Some(&Tag(7)));
        assert!(chunk.downcast_ref::<Liar>().is_none());
        chunk.downcast_mut::<Tag>().unwrap().0 = 9;

        let copy = chunk.clone();
        chunk.downcast_mut::<Tag>().unwrap().0 = 1;
        assert_eq!(copy.downcast_ref::<Tag>(), Some(&Tag(9)));
    }

    #[test]
    fn serialize() {
        let mut stream = MemoryOutputStream::new();
        FieldsChunk::new(Tag(0x42)).serialize(&mut stream);
        assert_eq!(stream.data(), &[0x42]);
    }

    #[test]
    #[should_panic]
    fn wrong_serialized_length() {
        let mut stream = MemoryOutputStream::new();
        FieldsChunk::new(Liar).serialize(&mut stream);
    }
}
