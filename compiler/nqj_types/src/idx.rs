//! Type handle.

use std::fmt;

/// Index of a type in the [`Pool`](crate::Pool).
///
/// Types are interned, so equal types always have equal indices and type
/// equality is an integer comparison.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct Idx(u32);

impl Idx {
    pub const INT: Self = Self(0);
    pub const BOOL: Self = Self(1);
    /// Type of the `null` literal.
    pub const NULL: Self = Self(2);
    /// Error sentinel: compatible with every type so one error does not cascade.
    pub const ANY: Self = Self(3);

    /// First index handed out for class and array types.
    pub const FIRST_DYNAMIC: u32 = 4;

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_any(self) -> bool {
        self.0 == Self::ANY.0
    }
}

impl fmt::Debug for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::INT => write!(f, "Idx::INT"),
            Self::BOOL => write!(f, "Idx::BOOL"),
            Self::NULL => write!(f, "Idx::NULL"),
            Self::ANY => write!(f, "Idx::ANY"),
            Self(raw) => write!(f, "Idx({raw})"),
        }
    }
}
