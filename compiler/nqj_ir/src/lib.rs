//! NQJ IR - source-level data structures.
//!
//! This crate holds everything the semantic-analysis and lowering phases
//! read about a parsed program:
//! - [`Name`] and [`StringInterner`] for identifiers
//! - [`Span`] and [`LineIndex`] for source locations
//! - the arena AST ([`Module`] with [`ExprId`]/[`StmtId`]/... handles)
//! - [`ModuleBuilder`], the allocation front end used by parsers and tests
//!
//! The AST is immutable once built. Later phases attach their results in
//! side tables keyed by the typed ids defined here.

mod ast;
mod builder;
mod interner;
mod name;
mod span;
mod stack;

pub use ast::{
    BinaryOp, ClassDecl, ClassId, Expr, ExprId, ExprKind, ExprRange, FuncId, FunctionDecl, Module,
    Stmt, StmtId, StmtKind, StmtRange, TypeExpr, UnaryOp, VarDecl, VarId, VarKind,
};
pub use builder::ModuleBuilder;
pub use interner::{InternError, StringInterner};
pub use name::Name;
pub use span::{LineIndex, Span};
pub use stack::ensure_sufficient_stack;
