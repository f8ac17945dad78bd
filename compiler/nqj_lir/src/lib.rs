//! NQJ LIR - the low-level IR produced by lowering.
//!
//! A [`Prog`] owns three collections: named struct types (object, array
//! and vtable layouts), constant globals (one vtable instance per class),
//! and procedures. A [`Proc`] is a list of basic blocks; each block holds
//! straight-line [`Instr`]uctions and exactly one [`Terminator`]. Values
//! live in single-assignment [`TempVar`]s scoped to one procedure.
//!
//! Procedures are built with [`ProcBuilder`], which keeps the blocks in a
//! per-procedure arena and tracks the block currently receiving
//! instructions.

mod builder;
mod ir;
mod prog;

pub use builder::ProcBuilder;
pub use ir::{
    BasicBlock, BinOp, BlockId, Const, Global, GlobalId, Instr, LirType, Operand, Param, Proc,
    ProcId, StructField, StructId, TempVar, Terminator, TypeStruct,
};
pub use prog::Prog;
