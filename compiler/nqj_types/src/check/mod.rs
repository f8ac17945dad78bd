//! Module-level semantic checker.
//!
//! ```text
//! Pass 0: NameTable + ClassContexts (construction errors)
//! Pass 1: signatures   field, parameter and return types
//! Pass 2: entry        `int main()` exists and has the right shape
//! Pass 3: bodies       global functions, then classes in declaration order
//! ```
//!
//! Every pass reports into one error list and keeps going, using
//! [`Idx::ANY`] wherever a type could not be determined.

mod bodies;
mod classes;
mod entry;
mod expr;
mod signatures;


use nqj_ir::{ExprId, Module, Name, Span, StringInterner};
use rustc_hash::FxHashMap;

use crate::class_context::build_class_contexts;
use crate::{
    ClassContext, ElementRef, Idx, NameTable, Resolution, TypeCheckError, TypeErrorKind,
    TypedModule,
};

/// Knobs for the checker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckOptions {
    /// Name of the entry function.
    pub entry_point: String,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            entry_point: "main".to_owned(),
        }
    }
}

/// Check a module and return everything learned about it.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(classes = module.class_count(), functions = module.function_count())
)]
pub fn check_module(
    module: &Module,
    interner: &StringInterner,
    options: &CheckOptions,
) -> TypedModule {
    let mut checker = ModuleChecker::new(module, interner, options);
    checker.resolve_signatures();
    checker.check_entry();
    checker.check_bodies();
    let typed = checker.finish();
    tracing::debug!(errors = typed.errors.len(), "semantic analysis finished");
    typed
}

pub struct ModuleChecker<'a> {
    module: &'a Module,
    interner: &'a StringInterner,
    entry: Name,
    names: NameTable,
    contexts: Vec<ClassContext>,
    expr_types: Vec<Idx>,
    var_types: Vec<Idx>,
    return_types: Vec<Idx>,
    resolutions: FxHashMap<ExprId, Resolution>,
    errors: Vec<TypeCheckError>,
}

impl<'a> ModuleChecker<'a> {
    /// Build the name table and class contexts for `module`.
    pub fn new(module: &'a Module, interner: &'a StringInterner, options: &CheckOptions) -> Self {
        let mut errors = Vec::new();
        let names = NameTable::build(module, interner, &mut errors);
        let contexts = build_class_contexts(module, &names);
        ModuleChecker {
            module,
            interner,
            entry: interner.intern(&options.entry_point),
            names,
            contexts,
            expr_types: vec![Idx::ANY; module.expr_count()],
            var_types: vec![Idx::ANY; module.var_count()],
            return_types: vec![Idx::ANY; module.function_count()],
            resolutions: FxHashMap::default(),
            errors,
        }
    }

    #[inline]
    pub fn module(&self) -> &'a Module {
        self.module
    }

    #[inline]
    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    pub fn names(&self) -> &NameTable {
        &self.names
    }

    pub fn push_error(&mut self, element: ElementRef, span: Span, kind: TypeErrorKind) {
        tracing::trace!(?element, %kind, "semantic error");
        self.errors.push(TypeCheckError::new(element, span, kind));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[TypeCheckError] {
        &self.errors
    }

    fn name_str(&self, name: Name) -> String {
        self.interner.lookup(name).to_owned()
    }

    fn display(&self, ty: Idx) -> String {
        self.names.display(ty, self.interner)
    }

    fn is_subtype(&self, sub: Idx, sup: Idx) -> bool {
        self.names.is_subtype(sub, sup)
    }

    pub fn finish(self) -> TypedModule {
        TypedModule {
            names: self.names,
            class_contexts: self.contexts,
            expr_types: self.expr_types,
            var_types: self.var_types,
            return_types: self.return_types,
            resolutions: self.resolutions,
            errors: self.errors,
        }
    }
}
