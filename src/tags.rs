use std::ops::{BitAnd, BitOr, BitOrAssign, BitXor};

/// Highest number of tags a configuration may declare.
pub const MAX_TAGS: usize = 31;

/// Set of tags a client belongs to, or the set a monitor is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct TagMask(u32);

impl TagMask {
    pub const EMPTY: TagMask = TagMask(0);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn tag(index: usize) -> Self {
        if index >= MAX_TAGS {
            return Self::EMPTY;
        }
        Self(1 << index)
    }

    /// Mask with the lowest `count` bits set.
    pub fn all(count: usize) -> Self {
        let count = count.min(MAX_TAGS);
        Self((1u32 << count) - 1)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn intersects(self, other: TagMask) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn contains(self, index: usize) -> bool {
        index < MAX_TAGS && self.0 & (1 << index) != 0
    }

    /// Flips membership of every tag in `other`.
    pub const fn toggle(self, other: TagMask) -> TagMask {
        TagMask(self.0 ^ other.0)
    }

    /// Indices of the tags present in the mask, lowest first.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..MAX_TAGS).filter(move |&i| self.contains(i))
    }
}

impl BitAnd for TagMask {
    type Output = TagMask;

    fn bitand(self, rhs: Self) -> Self::Output {
        TagMask(self.0 & rhs.0)
    }
}

impl BitOr for TagMask {
    type Output = TagMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        TagMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for TagMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitXor for TagMask {
    type Output = TagMask;

    fn bitxor(self, rhs: Self) -> Self::Output {
        TagMask(self.0 ^ rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_sets_exactly_count_bits() {
        assert_eq!(TagMask::all(9).bits(), 0x1ff);
        assert_eq!(TagMask::all(31).bits(), 0x7fff_ffff);
        assert_eq!(TagMask::all(0), TagMask::EMPTY);
    }

    #[test]
    fn tag_out_of_range_is_empty() {
        assert_eq!(TagMask::tag(3).bits(), 8);
        assert!(TagMask::tag(31).is_empty());
        assert!(!TagMask::all(9).contains(9));
    }

    #[test]
    fn iter_yields_set_indices() {
        let mask = TagMask::tag(0) | TagMask::tag(4) | TagMask::tag(8);
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![0, 4, 8]);
    }

    #[test]
    fn xor_toggles_membership() {
        let mask = TagMask::tag(1) | TagMask::tag(2);
        let toggled = mask.toggle(TagMask::tag(2));
        assert_eq!(toggled, TagMask::tag(1));
        assert!(toggled.intersects(mask));
        assert!(!toggled.intersects(TagMask::tag(2)));
    }
}
