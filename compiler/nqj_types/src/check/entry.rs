//! Pass 2: the entry function.

use nqj_ir::{Span, StmtKind};

use super::ModuleChecker;
use crate::{ElementRef, FunctionRef, Idx, TypeErrorKind};

impl ModuleChecker<'_> {
    /// The entry function must exist, return `int`, take no parameters,
    /// and end its body with a `return`.
    pub(super) fn check_entry(&mut self) {
        let entry = self.name_str(self.entry);
        let Some(FunctionRef::User(func)) = self.names.lookup_function(self.entry) else {
            self.push_error(
                ElementRef::Module,
                Span::DUMMY,
                TypeErrorKind::MissingEntry { entry },
            );
            return;
        };

        let decl = self.module.function(func);
        let element = ElementRef::Function(func);
        if self.return_types[func.index()] != Idx::INT {
            self.push_error(
                element,
                decl.span,
                TypeErrorKind::EntryReturnType {
                    entry: entry.clone(),
                },
            );
        }
        if !decl.params.is_empty() {
            self.push_error(
                element,
                decl.span,
                TypeErrorKind::EntryParams {
                    entry: entry.clone(),
                },
            );
        }

        let ends_in_return = match &self.module.stmt(decl.body).kind {
            StmtKind::Block(stmts) => self
                .module
                .stmts_in(*stmts)
                .last()
                .is_some_and(|&last| matches!(self.module.stmt(last).kind, StmtKind::Return(_))),
            _ => false,
        };
        if !ends_in_return {
            self.push_error(
                element,
                decl.span,
                TypeErrorKind::EntryMissingReturn { entry },
            );
        }
    }
}
