//! Program-wide names: global functions, classes, and the inheritance tree.
//!
//! The table is built once per program. Construction reports duplicate
//! functions and classes, self-inheritance, unknown parents, and cyclic
//! chains. Cycle detection happens here, once, so every later ancestor
//! query is a bounded walk that never reports anything.

use nqj_ir::{ClassId, FuncId, Module, Name, StringInterner};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{ElementRef, Idx, Pool, TypeCheckError, TypeData, TypeErrorKind};

/// Functions provided by the runtime rather than declared in the program.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Builtin {
    /// `int printInt(int elem)`: prints its argument, returns 0.
    PrintInt,
}

impl Builtin {
    pub const ALL: [Builtin; 1] = [Builtin::PrintInt];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::PrintInt => "printInt",
        }
    }

    pub fn params(self) -> &'static [Idx] {
        match self {
            Builtin::PrintInt => &[Idx::INT],
        }
    }

    pub fn return_type(self) -> Idx {
        match self {
            Builtin::PrintInt => Idx::INT,
        }
    }
}

/// What a global function name refers to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FunctionRef {
    User(FuncId),
    Builtin(Builtin),
}

#[derive(Clone, Debug)]
pub struct NameTable {
    pool: Pool,
    functions: FxHashMap<Name, FunctionRef>,
    classes: FxHashMap<Name, ClassId>,
    /// Declared name of each class, indexed by `ClassId`.
    class_names: Vec<Name>,
    /// Direct parent of each class; `None` for roots and rejected parents.
    parents: Vec<Option<ClassId>>,
}

impl NameTable {
    /// Build the table, appending construction errors to `errors`.
    pub fn build(
        module: &Module,
        interner: &StringInterner,
        errors: &mut Vec<TypeCheckError>,
    ) -> Self {
        let mut table = NameTable {
            pool: Pool::new(),
            functions: FxHashMap::default(),
            classes: FxHashMap::default(),
            class_names: Vec::with_capacity(module.class_count()),
            parents: vec![None; module.class_count()],
        };

        for builtin in Builtin::ALL {
            table
                .functions
                .insert(interner.intern(builtin.name()), FunctionRef::Builtin(builtin));
        }
        for &func in module.global_functions() {
            let decl = module.function(func);
            if table.functions.contains_key(&decl.name) {
                errors.push(TypeCheckError::new(
                    ElementRef::Function(func),
                    decl.span,
                    TypeErrorKind::DuplicateFunction {
                        name: interner.lookup(decl.name).to_owned(),
                    },
                ));
            } else {
                table.functions.insert(decl.name, FunctionRef::User(func));
            }
        }

        for (id, class) in module.classes() {
            table.class_names.push(class.name);
            if table.classes.contains_key(&class.name) {
                errors.push(TypeCheckError::new(
                    ElementRef::Class(id),
                    class.span,
                    TypeErrorKind::DuplicateClass {
                        name: interner.lookup(class.name).to_owned(),
                    },
                ));
            } else {
                table.classes.insert(class.name, id);
            }
        }

        for (id, class) in module.classes() {
            let Some(parent) = class.extends else {
                continue;
            };
            if parent == class.name {
                errors.push(TypeCheckError::new(
                    ElementRef::Class(id),
                    class.span,
                    TypeErrorKind::SelfInheritance,
                ));
                continue;
            }
            match table.classes.get(&parent) {
                Some(&p) => table.parents[id.index()] = Some(p),
                None => errors.push(TypeCheckError::new(
                    ElementRef::Class(id),
                    class.span,
                    TypeErrorKind::UndefinedClass {
                        name: interner.lookup(parent).to_owned(),
                    },
                )),
            }
        }

        let cyclic = table.detect_cycles(module, errors);
        tracing::debug!(
            functions = table.functions.len(),
            classes = table.class_names.len(),
            cyclic,
            "name table built"
        );
        table
    }

    /// Report every class whose parent chain revisits a class; returns how many.
    fn detect_cycles(&self, module: &Module, errors: &mut Vec<TypeCheckError>) -> usize {
        let mut cyclic = 0;
        for (id, class) in module.classes() {
            let mut visited = FxHashSet::default();
            visited.insert(id);
            let mut current = self.parents[id.index()];
            while let Some(p) = current {
                if !visited.insert(p) {
                    cyclic += 1;
                    errors.push(TypeCheckError::new(
                        ElementRef::Class(id),
                        class.span,
                        TypeErrorKind::CyclicInheritance,
                    ));
                    break;
                }
                current = self.parents[p.index()];
            }
        }
        cyclic
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn lookup_function(&self, name: Name) -> Option<FunctionRef> {
        self.functions.get(&name).copied()
    }

    pub fn lookup_class(&self, name: Name) -> Option<ClassId> {
        self.classes.get(&name).copied()
    }

    pub fn class_name(&self, class: ClassId) -> Name {
        self.class_names[class.index()]
    }

    pub fn parent(&self, class: ClassId) -> Option<ClassId> {
        self.parents[class.index()]
    }

    /// Ancestors of `class`, nearest first.
    ///
    /// The walk stops at the first repeated class, so cyclic chains yield
    /// each class at most once and never include `class` itself.
    pub fn ancestors(&self, class: ClassId) -> Vec<ClassId> {
        let mut visited = FxHashSet::default();
        visited.insert(class);
        let mut chain = Vec::new();
        let mut current = self.parents[class.index()];
        while let Some(p) = current {
            if !visited.insert(p) {
                break;
            }
            chain.push(p);
            current = self.parents[p.index()];
        }
        chain
    }

    /// Whether `sub` is `sup` or one of its descendants.
    pub fn is_subclass(&self, sub: ClassId, sup: ClassId) -> bool {
        sub == sup || self.ancestors(sub).contains(&sup)
    }

    pub fn class_type(&mut self, class: ClassId) -> Idx {
        self.pool.class(class)
    }

    /// The canonical array type over `base`.
    pub fn array_type(&mut self, base: Idx) -> Idx {
        self.pool.array(base)
    }

    /// Subtyping, with `Any` compatible in both directions.
    pub fn is_subtype(&self, sub: Idx, sup: Idx) -> bool {
        if sub == sup || sub.is_any() || sup.is_any() {
            return true;
        }
        match (self.pool.data(sub), self.pool.data(sup)) {
            (TypeData::Null, TypeData::Class(_) | TypeData::Array(_)) => true,
            (TypeData::Class(a), TypeData::Class(b)) => self.is_subclass(a, b),
            _ => false,
        }
    }

    /// Source-level spelling of a type, for messages.
    pub fn display(&self, ty: Idx, interner: &StringInterner) -> String {
        match self.pool.data(ty) {
            TypeData::Int => "int".to_owned(),
            TypeData::Bool => "boolean".to_owned(),
            TypeData::Null => "null".to_owned(),
            TypeData::Any => "any".to_owned(),
            TypeData::Class(c) => interner.lookup(self.class_name(c)).to_owned(),
            TypeData::Array(base) => format!("{}[]", self.display(base, interner)),
        }
    }
}
