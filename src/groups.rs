//! Bitmask of capture groups written during an evaluation

use bitflags::bitflags;

bitflags! {
    /// One bit per capture index. Parents OR their children's sets together so the
    /// caller learns which slots were written without rescanning the capture buffer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GroupSet: u64 {
        const _ = !0;
    }
}

impl GroupSet {
    /// Number of group indices a set can represent
    pub const CAPACITY: usize = u64::BITS as usize;

    /// Set holding just `index`, or empty when the index has no bit
    pub fn for_group(index: usize) -> Self {
        if index < Self::CAPACITY {
            Self::from_bits_retain(1 << index)
        } else {
            Self::empty()
        }
    }

    /// Check whether `index` was written
    pub fn contains_group(self, index: usize) -> bool {
        !self.intersection(Self::for_group(index)).is_empty()
    }

    /// Group indices in ascending order
    pub fn groups(self) -> impl Iterator<Item = usize> {
        (0..Self::CAPACITY).filter(move |&index| self.contains_group(index))
    }
}
