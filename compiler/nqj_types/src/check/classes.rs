//! Class-level rules: member uniqueness and override legality.

use nqj_ir::{ClassId, FuncId};
use rustc_hash::FxHashSet;

use super::ModuleChecker;
use crate::{ElementRef, Idx, TypeErrorKind};

impl ModuleChecker<'_> {
    pub(super) fn check_class(&mut self, class: ClassId) {
        let module = self.module;
        let decl = module.class(class);
        let _span =
            tracing::debug_span!("check_class", name = self.interner.lookup(decl.name)).entered();

        let mut seen = FxHashSet::default();
        for &field in &decl.fields {
            let var = module.var(field);
            if !seen.insert(var.name) {
                let name = self.name_str(var.name);
                self.push_error(
                    ElementRef::Var(field),
                    var.span,
                    TypeErrorKind::DuplicateField { name },
                );
            }
        }

        let mut seen = FxHashSet::default();
        for &method in &decl.methods {
            let func = module.function(method);
            if !seen.insert(func.name) {
                let name = self.name_str(func.name);
                self.push_error(
                    ElementRef::Function(method),
                    func.span,
                    TypeErrorKind::DuplicateMethod { name },
                );
            }
        }

        for ancestor in self.names.ancestors(class) {
            for &method in &decl.methods {
                let name = module.function(method).name;
                for &inherited in &module.class(ancestor).methods {
                    if module.function(inherited).name == name {
                        self.check_override(method, inherited);
                    }
                }
            }
        }

        for &method in &decl.methods {
            self.check_function(method);
        }
    }

    /// Same return type and arity make `method` an override of `inherited`,
    /// which then needs identical parameter types. Anything else is overloading.
    fn check_override(&mut self, method: FuncId, inherited: FuncId) {
        let module = self.module;
        let (own, base) = (module.function(method), module.function(inherited));
        let same_return = same_type(
            self.return_types[method.index()],
            self.return_types[inherited.index()],
        );

        if same_return && own.params.len() == base.params.len() {
            for (&p, &q) in own.params.iter().zip(&base.params) {
                if !same_type(self.var_types[p.index()], self.var_types[q.index()]) {
                    let span = module.var(p).span;
                    self.push_error(
                        ElementRef::Var(p),
                        span,
                        TypeErrorKind::OverrideParamMismatch,
                    );
                }
            }
        } else {
            let name = self.name_str(own.name);
            self.push_error(
                ElementRef::Function(method),
                own.span,
                TypeErrorKind::IllegalOverload { name },
            );
        }
    }
}

/// Type identity, treating the error sentinel as matching anything.
fn same_type(a: Idx, b: Idx) -> bool {
    a == b || a.is_any() || b.is_any()
}
