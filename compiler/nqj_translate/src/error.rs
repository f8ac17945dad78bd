//! Internal invariant violations during lowering.
//!
//! User mistakes are reported by analysis; anything that fails here means
//! the module reached lowering in a state analysis should have rejected.

use nqj_ir::{ExprId, FuncId, VarId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("cannot lower a module with {0} semantic error(s)")]
    ModuleHasErrors(usize),

    #[error("entry function `{0}` not found")]
    MissingEntry(String),

    #[error("expression {expr:?} has no resolved {expected}")]
    MissingResolution {
        expr: ExprId,
        expected: &'static str,
    },

    #[error("expression {0:?} is not an address")]
    NotAnAddress(ExprId),

    #[error("address expression {0:?} used as a value without a read")]
    AddressAsValue(ExprId),

    #[error("the error type reached lowering")]
    ErrorType,

    #[error("variable {0:?} has no storage in the current procedure")]
    UnboundVariable(VarId),

    #[error("`this` used outside a method")]
    ThisOutsideMethod,

    #[error("function {0:?} has no procedure")]
    UndeclaredFunction(FuncId),

    #[error("method `{0}` has no vtable slot")]
    MissingSlot(String),

    #[error("type {0} has no static size")]
    UnsizedType(String),
}
