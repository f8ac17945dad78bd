//! Lowering of one function or method body.
//!
//! Every parameter and local gets a stack slot, and every field of the
//! receiver gets its address computed once at entry, so all variable
//! accesses are a load or store through an address in `slots`.

mod address;
mod checks;
mod expr;
mod stmt;

use nqj_ir::{ClassId, ExprId, ExprKind, FuncId, StmtId, StmtKind, VarId};
use nqj_lir::{LirType, Operand, Proc, ProcBuilder, ProcId, TempVar};
use nqj_types::Resolution;
use rustc_hash::FxHashMap;
use smallvec::smallvec;

use crate::translator::{default_value, Translator};
use crate::TranslateError;

pub(crate) struct FnLowerer<'t, 'a> {
    tr: &'t mut Translator<'a>,
    func: FuncId,
    /// Owner class when lowering a method.
    class: Option<ClassId>,
    builder: ProcBuilder,
    this: Option<TempVar>,
    /// Address of every variable visible in this procedure.
    slots: FxHashMap<VarId, TempVar>,
}

impl<'t, 'a> FnLowerer<'t, 'a> {
    pub(crate) fn new(tr: &'t mut Translator<'a>, func: FuncId, proc: ProcId) -> Self {
        let builder = ProcBuilder::new(tr.prog.proc(proc));
        let class = tr.module.function(func).owner;
        FnLowerer {
            tr,
            func,
            class,
            builder,
            this: None,
            slots: FxHashMap::default(),
        }
    }

    pub(crate) fn lower(mut self) -> Result<Proc, TranslateError> {
        self.bind_receiver_fields();
        self.bind_params();
        let body = self.tr.module.function(self.func).body;
        self.alloc_locals(body)?;
        self.lower_stmt(body)?;
        if !self.builder.is_terminated() {
            let message = format!("Missing return in procedure {}", self.builder.name());
            self.builder.terminate_halt(message);
        }
        Ok(self.builder.finish())
    }

    // ── Entry block setup ───────────────────────────────────────────

    fn bind_receiver_fields(&mut self) {
        let Some(class) = self.class else {
            return;
        };
        let this = self.builder.params()[0].var;
        self.this = Some(this);

        let object = self.tr.class_structs(class).object;
        let fields = self.tr.shape(class).fields.clone();
        for (i, field) in fields.into_iter().enumerate() {
            let slot = i + 1;
            let def = &self.tr.prog.struct_def(object).fields[slot];
            let (ty, name) = (def.ty.clone().pointer_to(), format!("{}_addr", def.name));
            let addr = self.builder.emit_gep(
                Operand::Var(this),
                smallvec![Operand::ConstInt(0), const_index(slot)],
                ty,
                &name,
            );
            self.slots.insert(field, addr);
        }
    }

    fn bind_params(&mut self) {
        let offset = usize::from(self.class.is_some());
        let module = self.tr.module;
        let params = &module.function(self.func).params;
        for (i, &param) in params.iter().enumerate() {
            let lir = self.builder.params()[offset + i].clone();
            let slot = self.builder.emit_alloca(lir.ty, &lir.name);
            self.builder.emit_store(Operand::Var(slot), Operand::Var(lir.var));
            self.slots.insert(param, slot);
        }
    }

    /// One zero-initialized slot per local declared anywhere in `body`.
    fn alloc_locals(&mut self, body: StmtId) -> Result<(), TranslateError> {
        let module = self.tr.module;
        let mut work = vec![body];
        while let Some(stmt) = work.pop() {
            match &module.stmt(stmt).kind {
                StmtKind::Block(range) => work.extend(module.stmts_in(*range).iter().rev()),
                StmtKind::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    work.push(*else_branch);
                    work.push(*then_branch);
                }
                StmtKind::While { body, .. } => work.push(*body),
                StmtKind::VarDecl(var) => {
                    let ty = self.tr.lower_type(self.tr.typed.var_type(*var))?;
                    let name = self.tr.name_str(module.var(*var).name);
                    let init = default_value(&ty);
                    let slot = self.builder.emit_alloca(ty, name);
                    self.builder.emit_store(Operand::Var(slot), init);
                    self.slots.insert(*var, slot);
                }
                StmtKind::Assign { .. } | StmtKind::Expr(_) | StmtKind::Return(_) => {}
            }
        }
        Ok(())
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn line_of(&self, expr: ExprId) -> u32 {
        let module = self.tr.module;
        module.line_of(module.expr(expr).span)
    }

    /// `this` and fresh objects need no null check.
    fn is_never_null(&self, expr: ExprId) -> bool {
        matches!(
            self.tr.module.expr(expr).kind,
            ExprKind::This | ExprKind::NewObject(_)
        )
    }

    fn operand_type(&self, operand: &Operand) -> LirType {
        self.tr.prog.operand_type(self.builder.var_types(), operand)
    }

    /// Bitcast pointer `value` when it flows into a slot of another pointer type.
    ///
    /// The `null` constant is compatible with every pointer and is never cast.
    fn convert(&mut self, value: Operand, expected: &LirType) -> Operand {
        if matches!(value, Operand::Null) || expected.pointee().is_none() {
            return value;
        }
        let actual = self.operand_type(&value);
        if actual == *expected || actual.pointee().is_none() {
            return value;
        }
        Operand::Var(self.builder.emit_bitcast(value, expected.clone(), "cast"))
    }

    fn this_value(&self) -> Result<Operand, TranslateError> {
        self.this
            .map(Operand::Var)
            .ok_or(TranslateError::ThisOutsideMethod)
    }

    fn resolution(
        &self,
        expr: ExprId,
        expected: &'static str,
    ) -> Result<Resolution, TranslateError> {
        self.tr
            .typed
            .resolution(expr)
            .ok_or(TranslateError::MissingResolution { expr, expected })
    }

    fn slot_of(&self, var: VarId) -> Result<TempVar, TranslateError> {
        self.slots
            .get(&var)
            .copied()
            .ok_or(TranslateError::UnboundVariable(var))
    }
}

/// A struct or array index as an operand.
pub(crate) fn const_index(index: usize) -> Operand {
    Operand::ConstInt(i32::try_from(index).unwrap_or(i32::MAX))
}
