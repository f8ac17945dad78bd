//! Flattened per-class member view.
//!
//! A [`ClassContext`] answers "what does `name` mean inside class C" for
//! fields and methods in O(1). It is filled from the class's own members
//! first, then from each ancestor nearest-first, always insert-if-absent:
//! the nearest declaration wins, which gives shadowing and inheritance
//! with one rule.

use nqj_ir::{ClassId, FuncId, Module, Name, VarId};
use rustc_hash::FxHashMap;

use crate::NameTable;

#[derive(Clone, Debug)]
pub struct ClassContext {
    class: ClassId,
    fields: FxHashMap<Name, VarId>,
    methods: FxHashMap<Name, FuncId>,
}

impl ClassContext {
    fn new(class: ClassId) -> Self {
        ClassContext {
            class,
            fields: FxHashMap::default(),
            methods: FxHashMap::default(),
        }
    }

    /// Insert the declared members of `source`, keeping existing entries.
    fn merge_declared(&mut self, module: &Module, source: ClassId) {
        let decl = module.class(source);
        for &field in &decl.fields {
            self.fields.entry(module.var(field).name).or_insert(field);
        }
        for &method in &decl.methods {
            self.methods
                .entry(module.function(method).name)
                .or_insert(method);
        }
    }

    pub fn class(&self) -> ClassId {
        self.class
    }

    pub fn field(&self, name: Name) -> Option<VarId> {
        self.fields.get(&name).copied()
    }

    pub fn method(&self, name: Name) -> Option<FuncId> {
        self.methods.get(&name).copied()
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn method_count(&self) -> usize {
        self.methods.len()
    }
}

/// Build the context of every class, indexed by `ClassId`.
///
/// All classes get their own members before any inherited ones are merged.
#[tracing::instrument(level = "debug", skip_all, fields(classes = module.class_count()))]
pub fn build_class_contexts(module: &Module, names: &NameTable) -> Vec<ClassContext> {
    let mut contexts: Vec<ClassContext> = module
        .classes()
        .map(|(id, _)| {
            let mut ctx = ClassContext::new(id);
            ctx.merge_declared(module, id);
            ctx
        })
        .collect();

    for ctx in &mut contexts {
        for ancestor in names.ancestors(ctx.class) {
            ctx.merge_declared(module, ancestor);
        }
    }
    contexts
}
