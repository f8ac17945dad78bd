//! Typed indices into the [`Module`](super::Module) arenas.
//!
//! Each id space is distinct so an expression index can never be used to
//! look up a statement or a declaration.

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub const fn new(index: u32) -> Self {
                $name(index)
            }

            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_id!(
    /// Index of an expression node.
    ExprId
);
define_id!(
    /// Index of a statement node.
    StmtId
);
define_id!(
    /// Index of a variable declaration (field, parameter, or local).
    VarId
);
define_id!(
    /// Index of a function or method declaration.
    FuncId
);
define_id!(
    /// Index of a class declaration.
    ClassId
);

/// Contiguous run of expression ids in [`Module`](super::Module)'s flat list.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ExprRange {
    pub start: u32,
    pub len: u32,
}

impl ExprRange {
    pub const EMPTY: ExprRange = ExprRange { start: 0, len: 0 };

    #[inline]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Contiguous run of statement ids in [`Module`](super::Module)'s flat list.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct StmtRange {
    pub start: u32,
    pub len: u32,
}

impl StmtRange {
    pub const EMPTY: StmtRange = StmtRange { start: 0, len: 0 };

    #[inline]
    pub const fn len(self) -> usize {
        self.len as usize
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}
