//! Pass 1: declared types of fields, parameters and function results.
//!
//! Each declaration is resolved exactly once, so an unknown class name
//! produces one error per declaration no matter how often it is used.
//! Local variables are resolved later, when their declaration statement
//! is reached.

use nqj_ir::{Span, TypeExpr, VarKind};

use super::ModuleChecker;
use crate::{ElementRef, Idx, TypeErrorKind};

impl ModuleChecker<'_> {
    pub(super) fn resolve_type(&mut self, ty: &TypeExpr, element: ElementRef, span: Span) -> Idx {
        match ty {
            TypeExpr::Int => Idx::INT,
            TypeExpr::Bool => Idx::BOOL,
            TypeExpr::Class(name) => {
                if let Some(class) = self.names.lookup_class(*name) {
                    self.names.class_type(class)
                } else {
                    let name = self.name_str(*name);
                    self.push_error(element, span, TypeErrorKind::UndefinedClass { name });
                    Idx::ANY
                }
            }
            TypeExpr::Array(inner) => {
                let base = self.resolve_type(inner, element, span);
                if base.is_any() {
                    Idx::ANY
                } else {
                    self.names.array_type(base)
                }
            }
        }
    }

    pub(super) fn resolve_signatures(&mut self) {
        let module = self.module;
        for (id, var) in module.vars() {
            if var.kind != VarKind::Local {
                let ty = self.resolve_type(&var.ty, ElementRef::Var(id), var.span);
                self.var_types[id.index()] = ty;
            }
        }
        for (id, func) in module.functions() {
            let ty = self.resolve_type(&func.return_type, ElementRef::Function(id), func.span);
            self.return_types[id.index()] = ty;
        }
    }
}
