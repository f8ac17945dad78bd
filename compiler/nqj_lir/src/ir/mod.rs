//! LIR data model.

use std::fmt;

use smallvec::SmallVec;

// ── ID newtypes ─────────────────────────────────────────────────────

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub fn new(raw: u32) -> Self {
                Self(raw)
            }

            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Struct type in a [`Prog`](crate::Prog).
    StructId,
    "%struct"
);
define_id!(
    /// Global in a [`Prog`](crate::Prog).
    GlobalId,
    "@global"
);
define_id!(
    /// Procedure in a [`Prog`](crate::Prog).
    ProcId,
    "@proc"
);
define_id!(
    /// Basic block within one [`Proc`].
    BlockId,
    "bb"
);
define_id!(
    /// Single-assignment temporary within one [`Proc`].
    TempVar,
    "%t"
);

/// Convert a collection length to a `u32` id.
///
/// # Panics
/// Panics past `u32::MAX` entries.
pub(crate) fn id_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("LIR collection exceeded u32::MAX entries"))
}

// ── Types ───────────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum LirType {
    /// 32-bit signed integer.
    Int,
    /// 1-bit boolean.
    Bool,
    /// 8-bit untyped memory, the pointee of raw allocations.
    Byte,
    /// Type of the `null` constant; compatible with every pointer.
    NullPointer,
    Pointer(Box<LirType>),
    Struct(StructId),
    /// Inline array; length 0 marks a trailing variable-length member.
    Array { elem: Box<LirType>, len: u32 },
    Proc {
        ret: Box<LirType>,
        params: Vec<LirType>,
    },
}

impl LirType {
    #[must_use]
    pub fn pointer_to(self) -> LirType {
        LirType::Pointer(Box::new(self))
    }

    pub fn pointee(&self) -> Option<&LirType> {
        match self {
            LirType::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Size in bytes of scalar types; `None` for structs, arrays and procedures.
    pub fn byte_size(&self) -> Option<u32> {
        match self {
            LirType::Int => Some(4),
            LirType::Bool | LirType::Byte => Some(1),
            LirType::Pointer(_) | LirType::NullPointer => Some(8),
            LirType::Struct(_) | LirType::Array { .. } | LirType::Proc { .. } => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct StructField {
    pub name: String,
    pub ty: LirType,
}

impl StructField {
    pub fn new(name: impl Into<String>, ty: LirType) -> Self {
        StructField {
            name: name.into(),
            ty,
        }
    }
}

/// Named, ordered field list.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct TypeStruct {
    pub name: String,
    pub fields: Vec<StructField>,
}

// ── Constants and globals ───────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Const {
    Int(i32),
    Bool(bool),
    Null,
    ProcRef(ProcId),
    Struct { ty: StructId, values: Vec<Const> },
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Global {
    pub name: String,
    pub ty: LirType,
    pub is_constant: bool,
    pub init: Const,
}

// ── Instructions ────────────────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Operand {
    Var(TempVar),
    ConstInt(i32),
    ConstBool(bool),
    Null,
    ProcRef(ProcId),
    GlobalRef(GlobalId),
    /// Byte size of a struct type, as an `Int`.
    Sizeof(StructId),
}

impl From<TempVar> for Operand {
    fn from(var: TempVar) -> Self {
        Operand::Var(var)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Sdiv,
    And,
    Or,
    Eq,
    /// Signed less-than.
    Slt,
}

impl BinOp {
    /// Result type: `Int` for arithmetic, `Bool` for logic and comparisons.
    pub fn result_type(self) -> LirType {
        match self {
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Sdiv => LirType::Int,
            BinOp::And | BinOp::Or | BinOp::Eq | BinOp::Slt => LirType::Bool,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Instr {
    /// Stack slot for one value of `ty`; `dst` is a pointer to it.
    Alloca { dst: TempVar, ty: LirType },
    /// Heap allocation of `size` bytes, zeroed; `dst` is a byte pointer.
    Alloc { dst: TempVar, size: Operand },
    Load { dst: TempVar, address: Operand },
    Store { address: Operand, value: Operand },
    /// Address arithmetic: first index steps over `base`, the rest select
    /// struct fields or array elements.
    GetElementPtr {
        dst: TempVar,
        base: Operand,
        indices: SmallVec<[Operand; 3]>,
    },
    BinaryOp {
        dst: TempVar,
        left: Operand,
        op: BinOp,
        right: Operand,
    },
    /// Reinterpret a pointer as the type of `dst`.
    Bitcast { dst: TempVar, value: Operand },
    Call {
        dst: TempVar,
        function: Operand,
        args: SmallVec<[Operand; 4]>,
    },
    /// Print an `Int` followed by a newline.
    Print { value: Operand },
    Comment { text: String },
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Terminator {
    Branch {
        cond: Operand,
        then_block: BlockId,
        else_block: BlockId,
    },
    Jump {
        target: BlockId,
    },
    Return {
        value: Operand,
    },
    /// Abort the program with a runtime error.
    HaltWithError {
        message: String,
    },
}

impl Terminator {
    pub fn successors(&self) -> SmallVec<[BlockId; 2]> {
        match self {
            Terminator::Branch {
                then_block,
                else_block,
                ..
            } => smallvec::smallvec![*then_block, *else_block],
            Terminator::Jump { target } => smallvec::smallvec![*target],
            Terminator::Return { .. } | Terminator::HaltWithError { .. } => SmallVec::new(),
        }
    }
}

// ── Blocks and procedures ───────────────────────────────────────────

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BasicBlock {
    pub id: BlockId,
    /// Readable label; not necessarily unique.
    pub name: String,
    pub body: Vec<Instr>,
    pub terminator: Terminator,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Param {
    pub var: TempVar,
    pub name: String,
    pub ty: LirType,
}

/// A procedure. `blocks[0]` is the entry block.
///
/// A procedure declared but not yet defined has no blocks.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Proc {
    pub name: String,
    pub return_type: LirType,
    pub params: Vec<Param>,
    pub blocks: Vec<BasicBlock>,
    /// Type of each temporary, indexed by `TempVar::index()`.
    pub var_types: Vec<LirType>,
    /// Readable name of each temporary.
    pub var_names: Vec<String>,
}

impl Proc {
    /// A signature with no body; parameters occupy the first temporaries.
    pub fn declaration(name: String, return_type: LirType, params: Vec<(String, LirType)>) -> Self {
        let mut var_types = Vec::with_capacity(params.len());
        let mut var_names = Vec::with_capacity(params.len());
        let params = params
            .into_iter()
            .enumerate()
            .map(|(i, (name, ty))| {
                var_types.push(ty.clone());
                var_names.push(name.clone());
                Param {
                    var: TempVar::new(id_u32(i)),
                    name,
                    ty,
                }
            })
            .collect();
        Proc {
            name,
            return_type,
            params,
            blocks: Vec::new(),
            var_types,
            var_names,
        }
    }

    pub fn is_defined(&self) -> bool {
        !self.blocks.is_empty()
    }

    pub fn entry(&self) -> BlockId {
        BlockId::new(0)
    }

    #[inline]
    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.index()]
    }

    #[inline]
    pub fn var_type(&self, var: TempVar) -> &LirType {
        &self.var_types[var.index()]
    }

    /// Type of a pointer to this procedure.
    pub fn proc_type(&self) -> LirType {
        LirType::Proc {
            ret: Box::new(self.return_type.clone()),
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
        }
    }

    pub fn instr_count(&self) -> usize {
        self.blocks.iter().map(|b| b.body.len()).sum()
    }

    /// Blocks reachable from the entry block, in discovery order.
    pub fn reachable_blocks(&self) -> Vec<BlockId> {
        if self.blocks.is_empty() {
            return Vec::new();
        }
        let mut seen = vec![false; self.blocks.len()];
        let mut order = Vec::new();
        let mut stack = vec![self.entry()];
        while let Some(id) = stack.pop() {
            if std::mem::replace(&mut seen[id.index()], true) {
                continue;
            }
            order.push(id);
            let succs = self.block(id).terminator.successors();
            stack.extend(succs.into_iter().rev());
        }
        order
    }
}
