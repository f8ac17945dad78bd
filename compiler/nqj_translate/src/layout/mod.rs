//! Flattened object and vtable layouts.
//!
//! A class's fields are its parent's fields followed by its own, so every
//! inherited field keeps the slot it has in the parent. A field that
//! shadows an inherited one gets a new slot; the inherited slot stays in
//! the layout, reachable only from ancestor code.
//!
//! Vtables are built from the parent's finished slot list: an override
//! replaces the parent's entry in place, a new method is appended. A
//! method therefore has the same slot in every class of its chain,
//! regardless of the order methods are declared in.

use nqj_ir::{ClassId, FuncId, Module, Name, VarId};
use nqj_types::NameTable;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassShape {
    /// Field at object slot `i + 1`; slot 0 holds the vtable pointer.
    pub fields: Vec<VarId>,
    /// Implementation at vtable slot `i`.
    pub methods: Vec<FuncId>,
}

impl ClassShape {
    /// Object struct index of `field`, counting the vtable pointer.
    pub fn field_slot(&self, field: VarId) -> Option<u32> {
        self.fields
            .iter()
            .position(|&f| f == field)
            .and_then(|i| u32::try_from(i + 1).ok())
    }

    /// Vtable index of the method called `name`.
    pub fn method_slot(&self, module: &Module, name: Name) -> Option<u32> {
        self.methods
            .iter()
            .position(|&m| module.function(m).name == name)
            .and_then(|i| u32::try_from(i).ok())
    }

    fn derive(parent: &ClassShape, module: &Module, class: ClassId) -> ClassShape {
        let decl = module.class(class);
        let mut shape = parent.clone();
        shape.fields.extend_from_slice(&decl.fields);
        for &method in &decl.methods {
            let name = module.function(method).name;
            match shape.method_slot(module, name) {
                Some(slot) => {
                    tracing::trace!(?method, slot, "override keeps inherited vtable slot");
                    shape.methods[slot as usize] = method;
                }
                None => {
                    tracing::trace!(?method, slot = shape.methods.len(), "new vtable slot");
                    shape.methods.push(method);
                }
            }
        }
        shape
    }
}

/// Shapes of every class, indexed by `ClassId`.
///
/// Classes are processed root-first along each ancestor chain, so a
/// parent's shape is final before any child derives from it.
#[tracing::instrument(level = "debug", skip_all, fields(classes = module.class_count()))]
pub fn compute_class_shapes(module: &Module, names: &NameTable) -> Vec<ClassShape> {
    let mut shapes: Vec<Option<ClassShape>> = vec![None; module.class_count()];
    let root = ClassShape::default();

    for (class, _) in module.classes() {
        let mut chain = names.ancestors(class);
        chain.reverse();
        chain.push(class);

        let mut parent: Option<ClassId> = None;
        for &link in &chain {
            if shapes[link.index()].is_none() {
                let base = parent
                    .and_then(|p| shapes[p.index()].as_ref())
                    .unwrap_or(&root);
                let shape = ClassShape::derive(base, module, link);
                shapes[link.index()] = Some(shape);
            }
            parent = Some(link);
        }
    }

    shapes.into_iter().map(Option::unwrap_or_default).collect()
}

#[cfg(test)]
mod tests;
