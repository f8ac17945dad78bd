//! Lowering orchestration: structs, procedures, vtables.

mod constructors;
mod types;

use nqj_ir::{ClassId, FuncId, Module, Name, StringInterner, VarId};
use nqj_lir::{Const, Global, GlobalId, LirType, ProcId, Prog, StructField, StructId};
use nqj_types::TypedModule;
use rustc_hash::FxHashMap;

use crate::layout::{compute_class_shapes, ClassShape};
use crate::lower::FnLowerer;
use crate::TranslateError;

use constructors::Constructors;
pub(crate) use types::default_value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Global function lowered last.
    pub entry_point: String,
    /// Bracket every statement with `Comment` instructions.
    pub statement_comments: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        TranslateOptions {
            entry_point: "main".to_owned(),
            statement_comments: true,
        }
    }
}

/// Struct and global ids of one class.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ClassStructs {
    pub object: StructId,
    pub vtable: StructId,
    pub vtable_global: Option<GlobalId>,
}

pub(crate) struct Translator<'a> {
    pub(crate) module: &'a Module,
    pub(crate) interner: &'a StringInterner,
    pub(crate) typed: &'a TypedModule,
    pub(crate) options: &'a TranslateOptions,
    pub(crate) prog: Prog,
    shapes: Vec<ClassShape>,
    classes: Vec<ClassStructs>,
    /// Indexed by `FuncId`.
    func_procs: Vec<Option<ProcId>>,
    array_structs: FxHashMap<LirType, StructId>,
    constructors: Constructors,
}

/// Lower a checked module into a LIR program.
///
/// # Errors
/// Fails if `typed` carries semantic errors, or if the tables produced by
/// analysis are inconsistent with the module.
#[tracing::instrument(level = "debug", skip_all, fields(entry = %options.entry_point))]
pub fn translate(
    module: &Module,
    interner: &StringInterner,
    typed: &TypedModule,
    options: &TranslateOptions,
) -> Result<Prog, TranslateError> {
    if typed.has_errors() {
        return Err(TranslateError::ModuleHasErrors(typed.errors.len()));
    }
    let entry_name = interner.try_lookup(&options.entry_point);
    let entry = module
        .global_functions()
        .iter()
        .copied()
        .find(|&f| Some(module.function(f).name) == entry_name)
        .ok_or_else(|| TranslateError::MissingEntry(options.entry_point.clone()))?;

    let mut tr = Translator::new(module, interner, typed, options);
    tr.create_class_structs();
    tr.layout_classes()?;
    tr.declare_procs()?;

    for &func in module.global_functions() {
        if func != entry {
            tr.lower_function(func)?;
        }
    }
    for (class, decl) in module.classes() {
        for &method in &decl.methods {
            tr.lower_function(method)?;
        }
        tr.finish_vtable(class)?;
    }
    tr.lower_function(entry)?;
    tr.materialize_constructors()?;

    tracing::debug!(
        procs = tr.prog.proc_count(),
        structs = tr.prog.structs().count(),
        "lowering complete"
    );
    Ok(tr.prog)
}

impl<'a> Translator<'a> {
    fn new(
        module: &'a Module,
        interner: &'a StringInterner,
        typed: &'a TypedModule,
        options: &'a TranslateOptions,
    ) -> Self {
        Translator {
            module,
            interner,
            typed,
            options,
            prog: Prog::new(),
            shapes: compute_class_shapes(module, &typed.names),
            classes: Vec::with_capacity(module.class_count()),
            func_procs: vec![None; module.function_count()],
            array_structs: FxHashMap::default(),
            constructors: Constructors::default(),
        }
    }

    pub(crate) fn name_str(&self, name: Name) -> &'static str {
        self.interner.lookup(name)
    }

    fn class_name(&self, class: ClassId) -> &'static str {
        self.name_str(self.module.class(class).name)
    }

    // ── Classes ─────────────────────────────────────────────────────

    /// Empty object and vtable structs, so types can refer to any class.
    fn create_class_structs(&mut self) {
        for (class, decl) in self.module.classes() {
            let name = self.name_str(decl.name);
            let object = self.prog.declare_struct(name);
            let vtable = self.prog.declare_struct(format!("{name}_vtable"));
            debug_assert_eq!(class.index(), self.classes.len());
            self.classes.push(ClassStructs {
                object,
                vtable,
                vtable_global: None,
            });
        }
    }

    /// Object struct fields: vtable pointer, then the flattened fields.
    fn layout_classes(&mut self) -> Result<(), TranslateError> {
        for (class, _) in self.module.classes() {
            let structs = self.classes[class.index()];
            let mut fields = vec![StructField::new(
                "vtable",
                LirType::Struct(structs.vtable).pointer_to(),
            )];
            for i in 0..self.shapes[class.index()].fields.len() {
                let var = self.shapes[class.index()].fields[i];
                let ty = self.lower_type(self.typed.var_type(var))?;
                fields.push(StructField::new(self.name_str(self.module.var(var).name), ty));
            }
            self.prog.define_struct(structs.object, fields);
        }
        Ok(())
    }

    /// Vtable struct and its constant instance, from the finished shape.
    fn finish_vtable(&mut self, class: ClassId) -> Result<(), TranslateError> {
        let structs = self.classes[class.index()];
        let mut fields = Vec::new();
        let mut values = Vec::new();
        for &method in &self.shapes[class.index()].methods {
            let proc = self.proc_for(method)?;
            let ty = self.prog.proc(proc).proc_type().pointer_to();
            fields.push(StructField::new(self.name_str(self.module.function(method).name), ty));
            values.push(Const::ProcRef(proc));
        }
        tracing::trace!(class = self.class_name(class), slots = fields.len(), "vtable finished");
        self.prog.define_struct(structs.vtable, fields);

        let global = self.prog.add_global(Global {
            name: format!("{}_vtable_instance", self.class_name(class)),
            ty: LirType::Struct(structs.vtable),
            is_constant: true,
            init: Const::Struct {
                ty: structs.vtable,
                values,
            },
        });
        self.classes[class.index()].vtable_global = Some(global);
        Ok(())
    }

    pub(crate) fn class_structs(&self, class: ClassId) -> ClassStructs {
        self.classes[class.index()]
    }

    pub(crate) fn shape(&self, class: ClassId) -> &ClassShape {
        &self.shapes[class.index()]
    }

    pub(crate) fn object_pointer(&self, class: ClassId) -> LirType {
        LirType::Struct(self.classes[class.index()].object).pointer_to()
    }

    pub(crate) fn field_slot(&self, class: ClassId, field: VarId) -> Result<u32, TranslateError> {
        self.shape(class)
            .field_slot(field)
            .ok_or(TranslateError::UnboundVariable(field))
    }

    pub(crate) fn method_slot(&self, class: ClassId, name: Name) -> Result<u32, TranslateError> {
        self.shape(class)
            .method_slot(self.module, name)
            .ok_or_else(|| TranslateError::MissingSlot(self.name_str(name).to_owned()))
    }

    /// Whether some strict descendant of `class` dispatches `method`'s name
    /// to a different implementation.
    pub(crate) fn is_overridden_below(&self, class: ClassId, method: FuncId) -> bool {
        let name = self.module.function(method).name;
        self.module.classes().any(|(other, _)| {
            other != class
                && self.typed.names.is_subclass(other, class)
                && self.typed.class_context(other).method(name) != Some(method)
        })
    }

    // ── Procedures ──────────────────────────────────────────────────

    /// Declare a procedure for every function and method.
    fn declare_procs(&mut self) -> Result<(), TranslateError> {
        let module = self.module;
        for (func, decl) in module.functions() {
            let mut params = Vec::with_capacity(decl.params.len() + 1);
            let name = match decl.owner {
                Some(class) => {
                    params.push(("this".to_owned(), self.object_pointer(class)));
                    format!("{}_{}", self.name_str(decl.name), self.class_name(class))
                }
                None => self.name_str(decl.name).to_owned(),
            };
            for &param in &decl.params {
                let ty = self.lower_type(self.typed.var_type(param))?;
                params.push((self.name_str(module.var(param).name).to_owned(), ty));
            }
            let ret = self.lower_type(self.typed.return_type(func))?;
            self.func_procs[func.index()] = Some(self.prog.declare_proc(name, ret, params));
        }
        Ok(())
    }

    pub(crate) fn proc_for(&self, func: FuncId) -> Result<ProcId, TranslateError> {
        self.func_procs[func.index()].ok_or(TranslateError::UndeclaredFunction(func))
    }

    #[tracing::instrument(
        level = "debug",
        skip(self),
        fields(name = self.name_str(self.module.function(func).name))
    )]
    fn lower_function(&mut self, func: FuncId) -> Result<(), TranslateError> {
        let proc = self.proc_for(func)?;
        let body = FnLowerer::new(self, func, proc).lower()?;
        self.prog.define_proc(proc, body);
        Ok(())
    }
}
