//! Interned type storage.
//!
//! Every type lives exactly once in the pool. Interning canonicalizes
//! array types per base type, so `int[]` built twice yields the same [`Idx`].

use nqj_ir::ClassId;
use rustc_hash::FxHashMap;

use crate::Idx;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeData {
    Int,
    Bool,
    Null,
    Any,
    Class(ClassId),
    Array(Idx),
}

#[derive(Clone, Debug)]
pub struct Pool {
    items: Vec<TypeData>,
    intern_map: FxHashMap<TypeData, Idx>,
}

impl Pool {
    pub fn new() -> Self {
        let mut pool = Pool {
            items: Vec::with_capacity(16),
            intern_map: FxHashMap::default(),
        };
        // Order must match the Idx constants.
        for data in [TypeData::Int, TypeData::Bool, TypeData::Null, TypeData::Any] {
            pool.intern(data);
        }
        debug_assert_eq!(pool.items.len(), Idx::FIRST_DYNAMIC as usize);
        pool
    }

    fn intern(&mut self, data: TypeData) -> Idx {
        if let Some(&idx) = self.intern_map.get(&data) {
            return idx;
        }
        let raw = u32::try_from(self.items.len())
            .unwrap_or_else(|_| panic!("type pool exceeded u32::MAX entries"));
        let idx = Idx::from_raw(raw);
        self.items.push(data);
        self.intern_map.insert(data, idx);
        idx
    }

    pub fn class(&mut self, class: ClassId) -> Idx {
        self.intern(TypeData::Class(class))
    }

    /// The canonical array type with element type `base`.
    pub fn array(&mut self, base: Idx) -> Idx {
        self.intern(TypeData::Array(base))
    }

    #[inline]
    pub fn data(&self, idx: Idx) -> TypeData {
        self.items[idx.index()]
    }

    pub fn class_of(&self, idx: Idx) -> Option<ClassId> {
        match self.data(idx) {
            TypeData::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn array_base(&self, idx: Idx) -> Option<Idx> {
        match self.data(idx) {
            TypeData::Array(base) => Some(base),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}
