//! Whole-program container.
//!
//! Struct types and procedures are registered in two phases: `declare_*`
//! reserves an ID so recursive references can be formed, `define_*`
//! fills in the body later.

use rustc_hash::FxHashMap;

use crate::ir::{
    id_u32, Global, GlobalId, LirType, Operand, Proc, ProcId, StructField, StructId,
    TypeStruct,
};

#[derive(Clone, Default, Debug)]
pub struct Prog {
    structs: Vec<TypeStruct>,
    globals: Vec<Global>,
    procs: Vec<Proc>,
    proc_names: FxHashMap<String, ProcId>,
}

impl Prog {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Structs ─────────────────────────────────────────────────────

    /// Reserve a struct type with no fields yet.
    pub fn declare_struct(&mut self, name: impl Into<String>) -> StructId {
        let id = StructId::new(id_u32(self.structs.len()));
        self.structs.push(TypeStruct {
            name: name.into(),
            fields: Vec::new(),
        });
        id
    }

    pub fn define_struct(&mut self, id: StructId, fields: Vec<StructField>) {
        let def = &mut self.structs[id.index()];
        debug_assert!(
            def.fields.is_empty(),
            "struct {} defined twice",
            def.name
        );
        def.fields = fields;
    }

    #[inline]
    pub fn struct_def(&self, id: StructId) -> &TypeStruct {
        &self.structs[id.index()]
    }

    pub fn structs(&self) -> impl Iterator<Item = (StructId, &TypeStruct)> {
        self.structs
            .iter()
            .enumerate()
            .map(|(i, s)| (StructId::new(id_u32(i)), s))
    }

    /// Type of field `index` of struct `id`.
    pub fn field_type(&self, id: StructId, index: usize) -> Option<&LirType> {
        self.structs[id.index()].fields.get(index).map(|f| &f.ty)
    }

    // ── Globals ─────────────────────────────────────────────────────

    pub fn add_global(&mut self, global: Global) -> GlobalId {
        let id = GlobalId::new(id_u32(self.globals.len()));
        self.globals.push(global);
        id
    }

    #[inline]
    pub fn global(&self, id: GlobalId) -> &Global {
        &self.globals[id.index()]
    }

    pub fn globals(&self) -> impl Iterator<Item = (GlobalId, &Global)> {
        self.globals
            .iter()
            .enumerate()
            .map(|(i, g)| (GlobalId::new(id_u32(i)), g))
    }

    // ── Procedures ──────────────────────────────────────────────────

    /// Register a procedure signature; the body is supplied by [`Prog::define_proc`].
    pub fn declare_proc(
        &mut self,
        name: impl Into<String>,
        return_type: LirType,
        params: Vec<(String, LirType)>,
    ) -> ProcId {
        let name = name.into();
        let id = ProcId::new(id_u32(self.procs.len()));
        self.proc_names.insert(name.clone(), id);
        self.procs.push(Proc::declaration(name, return_type, params));
        id
    }

    /// Install the body of a declared procedure.
    pub fn define_proc(&mut self, id: ProcId, proc: Proc) {
        let slot = &mut self.procs[id.index()];
        debug_assert!(!slot.is_defined(), "procedure {} defined twice", slot.name);
        debug_assert_eq!(slot.name, proc.name, "procedure body installed under wrong id");
        *slot = proc;
    }

    #[inline]
    pub fn proc(&self, id: ProcId) -> &Proc {
        &self.procs[id.index()]
    }

    pub fn proc_by_name(&self, name: &str) -> Option<ProcId> {
        self.proc_names.get(name).copied()
    }

    pub fn procs(&self) -> impl Iterator<Item = (ProcId, &Proc)> {
        self.procs
            .iter()
            .enumerate()
            .map(|(i, p)| (ProcId::new(id_u32(i)), p))
    }

    pub fn proc_count(&self) -> usize {
        self.procs.len()
    }

    // ── Typing ──────────────────────────────────────────────────────

    /// Type of an operand; temporaries are looked up in `var_types`.
    pub fn operand_type(&self, var_types: &[LirType], operand: &Operand) -> LirType {
        match operand {
            Operand::Var(v) => var_types[v.index()].clone(),
            Operand::ConstInt(_) | Operand::Sizeof(_) => LirType::Int,
            Operand::ConstBool(_) => LirType::Bool,
            Operand::Null => LirType::NullPointer,
            Operand::ProcRef(id) => self.proc(*id).proc_type().pointer_to(),
            Operand::GlobalRef(id) => self.global(*id).ty.clone().pointer_to(),
        }
    }

    /// Byte size of a struct, with fields packed in declaration order.
    ///
    /// Returns `None` if a field has no static size.
    pub fn struct_size(&self, id: StructId) -> Option<u32> {
        self.struct_def(id)
            .fields
            .iter()
            .try_fold(0u32, |acc, field| Some(acc + self.type_size(&field.ty)?))
    }

    /// Byte size of any sized type; trailing zero-length arrays count as 0.
    pub fn type_size(&self, ty: &LirType) -> Option<u32> {
        match ty {
            LirType::Struct(id) => self.struct_size(*id),
            LirType::Array { elem, len } => Some(self.type_size(elem)? * *len),
            LirType::Proc { .. } => None,
            scalar => scalar.byte_size(),
        }
    }
}
