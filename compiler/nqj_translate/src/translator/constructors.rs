//! Allocation procedures for `new T[n]` and `new C()`.
//!
//! Lowering only declares a constructor the first time an element type or
//! class is instantiated; bodies are emitted after every other procedure,
//! in first-use order.

use nqj_ir::ClassId;
use nqj_lir::{BinOp, LirType, Operand, Proc, ProcBuilder, ProcId};
use rustc_hash::FxHashMap;
use smallvec::smallvec;

use super::{default_value, Translator};
use crate::TranslateError;

#[derive(Clone, Debug)]
enum Pending {
    Array(LirType),
    Object(ClassId),
}

#[derive(Default)]
pub(super) struct Constructors {
    pending: Vec<(ProcId, Pending)>,
    arrays: FxHashMap<LirType, ProcId>,
    objects: FxHashMap<ClassId, ProcId>,
}

impl Translator<'_> {
    /// `newArray_<elem>(int size)`, declared on first use.
    pub(crate) fn new_array_proc(&mut self, elem: LirType) -> ProcId {
        if let Some(&proc) = self.constructors.arrays.get(&elem) {
            return proc;
        }
        let array = self.array_struct(elem.clone());
        let name = format!("newArray_{}", self.type_name(&elem));
        tracing::trace!(%name, "deferred array constructor");
        let proc = self.prog.declare_proc(
            name,
            LirType::Struct(array).pointer_to(),
            vec![("size".to_owned(), LirType::Int)],
        );
        self.constructors.arrays.insert(elem.clone(), proc);
        self.constructors.pending.push((proc, Pending::Array(elem)));
        proc
    }

    /// `newObject_<C>()`, declared on first use.
    pub(crate) fn new_object_proc(&mut self, class: ClassId) -> ProcId {
        if let Some(&proc) = self.constructors.objects.get(&class) {
            return proc;
        }
        let name = format!("newObject_{}", self.class_name(class));
        tracing::trace!(%name, "deferred object constructor");
        let proc = self
            .prog
            .declare_proc(name, self.object_pointer(class), Vec::new());
        self.constructors.objects.insert(class, proc);
        self.constructors.pending.push((proc, Pending::Object(class)));
        proc
    }

    /// Emit the body of every constructor declared so far.
    pub(super) fn materialize_constructors(&mut self) -> Result<(), TranslateError> {
        let pending = std::mem::take(&mut self.constructors.pending);
        for (proc, kind) in pending {
            let body = match kind {
                Pending::Array(elem) => self.array_constructor(proc, &elem)?,
                Pending::Object(class) => self.object_constructor(proc, class)?,
            };
            self.prog.define_proc(proc, body);
        }
        Ok(())
    }

    fn array_constructor(&mut self, proc: ProcId, elem: &LirType) -> Result<Proc, TranslateError> {
        let array = self.array_struct(elem.clone());
        let array_ptr = LirType::Struct(array).pointer_to();
        let elem_size = elem
            .byte_size()
            .ok_or_else(|| TranslateError::UnsizedType(self.type_name(elem)))?;

        let mut b = ProcBuilder::new(self.prog.proc(proc));
        let size = Operand::Var(b.params()[0].var);

        let negative =
            b.emit_binary(size.clone(), BinOp::Slt, Operand::ConstInt(0), "size_negative");
        let negative_bb = b.new_block("negative_size");
        let ok_bb = b.new_block("size_ok");
        b.terminate_branch(Operand::Var(negative), negative_bb, ok_bb);
        b.position_at(negative_bb);
        b.terminate_halt("Array Size must be positive");

        b.position_at(ok_bb);
        let data_bytes = b.emit_binary(
            size.clone(),
            BinOp::Mul,
            Operand::ConstInt(i32::try_from(elem_size).unwrap_or(i32::MAX)),
            "data_bytes",
        );
        let total = b.emit_binary(
            Operand::Var(data_bytes),
            BinOp::Add,
            Operand::Sizeof(array),
            "total_bytes",
        );
        let raw = b.emit_alloc(Operand::Var(total), "raw");
        let new_array = b.emit_bitcast(Operand::Var(raw), array_ptr, "new_array");
        let length = b.emit_gep(
            Operand::Var(new_array),
            smallvec![Operand::ConstInt(0), Operand::ConstInt(0)],
            LirType::Int.pointer_to(),
            "length_addr",
        );
        b.emit_store(Operand::Var(length), size.clone());

        let counter = b.emit_alloca(LirType::Int, "i_slot");
        b.emit_store(Operand::Var(counter), Operand::ConstInt(0));
        let cond_bb = b.new_block("init_cond");
        let body_bb = b.new_block("init_body");
        let end_bb = b.new_block("init_end");
        b.terminate_jump(cond_bb);

        b.position_at(cond_bb);
        let i = b.emit_load(Operand::Var(counter), LirType::Int, "i");
        let more = b.emit_binary(Operand::Var(i), BinOp::Slt, size, "more");
        b.terminate_branch(Operand::Var(more), body_bb, end_bb);

        b.position_at(body_bb);
        let slot = b.emit_gep(
            Operand::Var(new_array),
            smallvec![Operand::ConstInt(0), Operand::ConstInt(1), Operand::Var(i)],
            elem.clone().pointer_to(),
            "elem_addr",
        );
        b.emit_store(Operand::Var(slot), default_value(elem));
        let next = b.emit_binary(Operand::Var(i), BinOp::Add, Operand::ConstInt(1), "next_i");
        b.emit_store(Operand::Var(counter), Operand::Var(next));
        b.terminate_jump(cond_bb);

        b.position_at(end_bb);
        b.terminate_return(Operand::Var(new_array));
        Ok(b.finish())
    }

    fn object_constructor(&mut self, proc: ProcId, class: ClassId) -> Result<Proc, TranslateError> {
        let structs = self.class_structs(class);
        let vtable = structs
            .vtable_global
            .ok_or_else(|| {
                TranslateError::MissingSlot(format!("{}_vtable_instance", self.class_name(class)))
            })?;

        let mut b = ProcBuilder::new(self.prog.proc(proc));
        let raw = b.emit_alloc(Operand::Sizeof(structs.object), "raw");
        let object = b.emit_bitcast(Operand::Var(raw), self.object_pointer(class), "new_object");
        let vtable_addr = b.emit_gep(
            Operand::Var(object),
            smallvec![Operand::ConstInt(0), Operand::ConstInt(0)],
            LirType::Struct(structs.vtable).pointer_to().pointer_to(),
            "vtable_addr",
        );
        b.emit_store(Operand::Var(vtable_addr), Operand::GlobalRef(vtable));

        let fields = &self.prog.struct_def(structs.object).fields;
        for (slot, field) in fields.iter().enumerate().skip(1) {
            let slot = i32::try_from(slot).unwrap_or(i32::MAX);
            let addr = b.emit_gep(
                Operand::Var(object),
                smallvec![Operand::ConstInt(0), Operand::ConstInt(slot)],
                field.ty.clone().pointer_to(),
                &format!("{}_addr", field.name),
            );
            b.emit_store(Operand::Var(addr), default_value(&field.ty));
        }
        b.terminate_return(Operand::Var(object));
        Ok(b.finish())
    }
}
