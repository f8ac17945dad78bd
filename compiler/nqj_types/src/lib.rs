//! Semantic analysis for NQJ.
//!
//! [`check_module`] runs the whole pass over a parsed [`Module`](nqj_ir::Module):
//!
//! ```text
//! NameTable      functions, classes, parent links, cycle detection
//!   └─ ClassContext (per class)   own members, then inherited ones
//!        └─ signatures            field, parameter and return types
//!             └─ entry function   shape of `int main()`
//!                  └─ bodies      statements and expressions (ExprChecker)
//! ```
//!
//! Errors are accumulated, never thrown. The result is a [`TypedModule`]
//! holding the type of every expression and the declaration every name
//! resolved to; lowering reads these tables instead of resolving again.

mod check;
mod class_context;
mod env;
mod idx;
mod name_table;
mod output;
mod pool;
mod type_error;

pub use check::{check_module, CheckOptions, ModuleChecker};
pub use class_context::ClassContext;
pub use env::{Binding, TypeContext};
pub use idx::Idx;
pub use name_table::{Builtin, FunctionRef, NameTable};
pub use output::{Resolution, TypedModule};
pub use pool::{Pool, TypeData};
pub use type_error::{ElementRef, TypeCheckError, TypeErrorKind};
