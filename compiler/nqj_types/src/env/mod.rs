//! Lexical variable environment.
//!
//! `TypeContext` is a persistent map behind an `Rc`: cloning is O(1) and
//! the first `bind` on a shared clone copies the bindings. Entering a block
//! therefore clones the enclosing context and binds into the clone; the
//! enclosing scope and sibling blocks never see those bindings.

use std::rc::Rc;

use nqj_ir::{ClassId, Name, VarId};
use rustc_hash::FxHashMap;

use crate::Idx;

/// A variable visible in some scope.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Binding {
    pub ty: Idx,
    pub decl: VarId,
}

#[derive(Clone, Debug)]
struct TypeContextInner {
    vars: FxHashMap<Name, Binding>,
    return_type: Idx,
    this_class: Option<ClassId>,
}

#[derive(Clone, Debug)]
pub struct TypeContext(Rc<TypeContextInner>);

impl TypeContext {
    /// Context for the body of a function returning `return_type`.
    ///
    /// `this_class` is the enclosing class for methods, `None` for global functions.
    pub fn new(return_type: Idx, this_class: Option<ClassId>) -> Self {
        TypeContext(Rc::new(TypeContextInner {
            vars: FxHashMap::default(),
            return_type,
            this_class,
        }))
    }

    /// Bind `name` in this context, replacing any binding it shadows.
    pub fn bind(&mut self, name: Name, binding: Binding) {
        Rc::make_mut(&mut self.0).vars.insert(name, binding);
    }

    pub fn lookup(&self, name: Name) -> Option<Binding> {
        self.0.vars.get(&name).copied()
    }

    pub fn return_type(&self) -> Idx {
        self.0.return_type
    }

    pub fn this_class(&self) -> Option<ClassId> {
        self.0.this_class
    }
}
