//! Storage layout tags and layout masks

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Memory layout of a numeric table, usable both as a single tag and as a
/// bitmask of several layouts.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct StorageLayout(u32);

impl StorageLayout {
    /// No layout (empty mask)
    pub const NONE: Self = Self(0);
    /// Dense, rows stored contiguously
    pub const ROW_MAJOR: Self = Self(1 << 0);
    /// Dense, columns stored contiguously
    pub const COLUMN_MAJOR: Self = Self(1 << 1);
    /// Compressed sparse rows
    pub const CSR: Self = Self(1 << 2);
    /// Upper triangle of a symmetric matrix, packed by rows
    pub const UPPER_PACKED_SYMMETRIC: Self = Self(1 << 3);
    /// Lower triangle of a symmetric matrix, packed by rows
    pub const LOWER_PACKED_SYMMETRIC: Self = Self(1 << 4);
    /// Upper triangular matrix, packed by rows
    pub const UPPER_PACKED_TRIANGULAR: Self = Self(1 << 5);
    /// Lower triangular matrix, packed by rows
    pub const LOWER_PACKED_TRIANGULAR: Self = Self(1 << 6);

    /// All packed layouts
    pub const PACKED: Self = Self(
        Self::UPPER_PACKED_SYMMETRIC.0
            | Self::LOWER_PACKED_SYMMETRIC.0
            | Self::UPPER_PACKED_TRIANGULAR.0
            | Self::LOWER_PACKED_TRIANGULAR.0,
    );
    /// Every known layout
    pub const ALL: Self = Self(
        Self::ROW_MAJOR.0 | Self::COLUMN_MAJOR.0 | Self::CSR.0 | Self::PACKED.0,
    );

    /// Raw bit representation
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns true if this layout shares any bit with `mask`
    #[inline]
    pub const fn intersects(self, mask: Self) -> bool {
        self.0 & mask.0 != 0
    }

    /// Returns the bits of both masks
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns this mask with the bits of `other` removed
    #[inline]
    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Returns true for packed symmetric or triangular layouts
    #[inline]
    pub const fn is_packed(self) -> bool {
        self.intersects(Self::PACKED)
    }

    fn names(self) -> Vec<&'static str> {
        const NAMED: [(StorageLayout, &str); 7] = [
            (StorageLayout::ROW_MAJOR, "row_major"),
            (StorageLayout::COLUMN_MAJOR, "column_major"),
            (StorageLayout::CSR, "csr"),
            (StorageLayout::UPPER_PACKED_SYMMETRIC, "upper_packed_symmetric"),
            (StorageLayout::LOWER_PACKED_SYMMETRIC, "lower_packed_symmetric"),
            (StorageLayout::UPPER_PACKED_TRIANGULAR, "upper_packed_triangular"),
            (StorageLayout::LOWER_PACKED_TRIANGULAR, "lower_packed_triangular"),
        ];
        NAMED
            .iter()
            .filter(|(layout, _)| self.intersects(*layout))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for StorageLayout {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for StorageLayout {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for StorageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

impl fmt::Debug for StorageLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StorageLayout({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_mask() {
        assert!(StorageLayout::UPPER_PACKED_TRIANGULAR.is_packed());
        assert!(StorageLayout::LOWER_PACKED_SYMMETRIC.intersects(StorageLayout::PACKED));
        assert!(!StorageLayout::ROW_MAJOR.is_packed());
        assert!(!StorageLayout::CSR.intersects(StorageLayout::PACKED));
    }

    #[test]
    fn test_without() {
        let not_csr = StorageLayout::ALL.without(StorageLayout::CSR);
        assert!(!StorageLayout::CSR.intersects(not_csr));
        assert!(StorageLayout::ROW_MAJOR.intersects(not_csr));
    }

    #[test]
    fn test_display() {
        assert_eq!(StorageLayout::CSR.to_string(), "csr");
        assert_eq!(
            (StorageLayout::ROW_MAJOR | StorageLayout::CSR).to_string(),
            "row_major|csr"
        );
        assert_eq!(StorageLayout::NONE.to_string(), "none");
    }
}
