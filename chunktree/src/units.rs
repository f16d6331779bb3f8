//! Bit-granular lengths and offsets.
use core::{fmt, ops};

/// A length or offset measured in bits.
///
/// Chunk content is not required to be byte aligned, for example a physical layer preamble or a
/// compressed header can end in the middle of an octet. All chunk lengths and positions are thus
/// expressed in bits. Use [`Bits::from_bytes`] for the common byte-sized case.
///
/// [`Bits::from_bytes`]: #method.from_bytes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bits(pub u64);

impl Bits {
    /// The empty length.
    pub const ZERO: Bits = Bits(0);

    /// A length of `bits` bits.
    pub const fn new(bits: u64) -> Self {
        Bits(bits)
    }

    /// A length of `bytes` octets.
    pub const fn from_bytes(bytes: u64) -> Self {
        Bits(bytes * 8)
    }

    /// The number of bits.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Check if this is a whole number of octets.
    pub const fn is_byte_aligned(self) -> bool {
        self.0 % 8 == 0
    }

    /// The number of octets, if this is a whole number of them.
    pub fn bytes(self) -> Option<u64> {
        if self.is_byte_aligned() {
            Some(self.0 / 8)
        } else {
            None
        }
    }

    /// The number of whole octets, rounding down.
    pub const fn whole_bytes(self) -> u64 {
        self.0 / 8
    }

    /// The number of octets as an index into byte storage.
    ///
    /// # Panics
    ///
    /// This method panics if the length is not byte aligned.
    pub fn byte_index(self) -> usize {
        assert!(self.is_byte_aligned(), "{} is not byte aligned", self);
        (self.0 / 8) as usize
    }

    /// The number of bits as an index into bit storage.
    pub fn bit_index(self) -> usize {
        self.0 as usize
    }

    /// Subtract, returning `None` instead of wrapping.
    pub fn checked_sub(self, other: Bits) -> Option<Bits> {
        self.0.checked_sub(other.0).map(Bits)
    }

    /// Check if this is the empty length.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl ops::Add for Bits {
    type Output = Bits;

    fn add(self, other: Bits) -> Bits {
        Bits(self.0 + other.0)
    }
}

impl ops::AddAssign for Bits {
    fn add_assign(&mut self, other: Bits) {
        self.0 += other.0;
    }
}

impl ops::Sub for Bits {
    type Output = Bits;

    fn sub(self, other: Bits) -> Bits {
        Bits(self.0 - other.0)
    }
}

impl ops::SubAssign for Bits {
    fn sub_assign(&mut self, other: Bits) {
        self.0 -= other.0;
    }
}

impl core::iter::Sum for Bits {
    fn sum<I: Iterator<Item = Bits>>(iter: I) -> Bits {
        iter.fold(Bits::ZERO, ops::Add::add)
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.bytes() {
            Some(bytes) if bytes != 0 => write!(f, "{} B", bytes),
            _ => write!(f, "{} b", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment() {
        assert_eq!(Bits::from_bytes(3), Bits(24));
        assert_eq!(Bits(24).bytes(), Some(3));
        assert_eq!(Bits(25).bytes(), None);
        assert_eq!(Bits(25).whole_bytes(), 3);
        assert!(Bits::ZERO.is_byte_aligned());
    }

    #[test]
    fn display() {
        assert_eq!(Bits::from_bytes(4).to_string(), "4 B");
        assert_eq!(Bits(3).to_string(), "3 b");
        assert_eq!(Bits::ZERO.to_string(), "0 b");
    }

    #[test]
    fn sum_of_lengths() {
        let total: Bits = [Bits(3), Bits(5), Bits::from_bytes(1)].iter().cloned().sum();
        assert_eq!(total, Bits(16));
    }
}
