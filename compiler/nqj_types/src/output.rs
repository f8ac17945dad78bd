//! Type checker output.

use nqj_ir::{ClassId, ExprId, FuncId, VarId};
use rustc_hash::FxHashMap;

use crate::{ClassContext, FunctionRef, Idx, NameTable, TypeCheckError};

/// What a name-bearing expression resolved to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Resolution {
    /// `VarUse`: a local, a parameter, or a field of the enclosing class.
    Var(VarId),
    /// `FieldAccess` on a receiver whose static class is `class`.
    Field { class: ClassId, field: VarId },
    /// `MethodCall` on a receiver whose static class is `class`.
    Method { class: ClassId, method: FuncId },
    /// `FunctionCall`.
    Function(FunctionRef),
    /// `NewObject`.
    Class(ClassId),
    /// `ArrayLookup`: the type of the indexed array.
    Array(Idx),
}

/// Everything semantic analysis learned about a module.
///
/// Only meaningful for lowering when [`has_errors`](Self::has_errors) is false.
#[derive(Clone, Debug)]
pub struct TypedModule {
    pub names: NameTable,
    /// Indexed by `ClassId`.
    pub class_contexts: Vec<ClassContext>,
    /// Indexed by `ExprId`.
    pub expr_types: Vec<Idx>,
    /// Indexed by `VarId`.
    pub var_types: Vec<Idx>,
    /// Indexed by `FuncId`.
    pub return_types: Vec<Idx>,
    pub resolutions: FxHashMap<ExprId, Resolution>,
    pub errors: Vec<TypeCheckError>,
}

impl TypedModule {
    #[inline]
    pub fn expr_type(&self, expr: ExprId) -> Idx {
        self.expr_types[expr.index()]
    }

    #[inline]
    pub fn var_type(&self, var: VarId) -> Idx {
        self.var_types[var.index()]
    }

    #[inline]
    pub fn return_type(&self, func: FuncId) -> Idx {
        self.return_types[func.index()]
    }

    pub fn resolution(&self, expr: ExprId) -> Option<Resolution> {
        self.resolutions.get(&expr).copied()
    }

    pub fn class_context(&self, class: ClassId) -> &ClassContext {
        &self.class_contexts[class.index()]
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
