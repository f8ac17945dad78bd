//! Value (r-value) lowering.

use nqj_ir::{ensure_sufficient_stack, BinaryOp, ExprId, ExprKind, ExprRange, UnaryOp};
use nqj_lir::{BinOp, LirType, Operand, ProcId};
use nqj_types::{Builtin, FunctionRef, Resolution};
use smallvec::{smallvec, SmallVec};

use super::{const_index, FnLowerer};
use crate::TranslateError;

type Args = SmallVec<[Operand; 4]>;

impl FnLowerer<'_, '_> {
    pub(super) fn lower_expr(&mut self, expr: ExprId) -> Result<Operand, TranslateError> {
        ensure_sufficient_stack(|| self.lower_expr_inner(expr))
    }

    fn lower_expr_inner(&mut self, expr: ExprId) -> Result<Operand, TranslateError> {
        let module = self.tr.module;
        match &module.expr(expr).kind {
            ExprKind::Number(n) => Ok(Operand::ConstInt(*n)),
            ExprKind::Bool(b) => Ok(Operand::ConstBool(*b)),
            ExprKind::Null => Ok(Operand::Null),
            ExprKind::This => self.this_value(),
            ExprKind::Unary { op, operand } => {
                let value = self.lower_expr(*operand)?;
                let dst = match op {
                    UnaryOp::Neg => {
                        self.builder
                            .emit_binary(Operand::ConstInt(0), BinOp::Sub, value, "neg")
                    }
                    UnaryOp::Not => {
                        self.builder
                            .emit_binary(Operand::ConstBool(false), BinOp::Eq, value, "not")
                    }
                };
                Ok(Operand::Var(dst))
            }
            ExprKind::Binary { op, left, right } => self.lower_binary(expr, *op, *left, *right),
            ExprKind::Read(address) => {
                let addr = self.lower_address(*address)?;
                let ty = self
                    .operand_type(&addr)
                    .pointee()
                    .cloned()
                    .ok_or(TranslateError::NotAnAddress(*address))?;
                Ok(Operand::Var(self.builder.emit_load(addr, ty, "read")))
            }
            ExprKind::VarUse(_) | ExprKind::FieldAccess { .. } | ExprKind::ArrayLookup { .. } => {
                Err(TranslateError::AddressAsValue(expr))
            }
            ExprKind::ArrayLength(array) => {
                let base = self.lower_expr(*array)?;
                let line = self.line_of(expr);
                self.null_check(
                    &base,
                    format!("Nullpointer exception when reading array length in line {line}"),
                );
                Ok(self.array_length(&base))
            }
            ExprKind::NewArray { size, .. } => {
                let elem_ty = self
                    .tr
                    .typed
                    .names
                    .pool()
                    .array_base(self.tr.typed.expr_type(expr))
                    .ok_or(TranslateError::ErrorType)?;
                let elem = self.tr.lower_type(elem_ty)?;
                let size = self.lower_expr(*size)?;
                let proc = self.tr.new_array_proc(elem);
                let ret = self.tr.prog.proc(proc).return_type.clone();
                let dst = self
                    .builder
                    .emit_call(Operand::ProcRef(proc), smallvec![size], ret, "new_array");
                Ok(Operand::Var(dst))
            }
            ExprKind::NewObject(_) => {
                let Resolution::Class(class) = self.resolution(expr, "class")? else {
                    return Err(TranslateError::MissingResolution {
                        expr,
                        expected: "class",
                    });
                };
                let proc = self.tr.new_object_proc(class);
                let ret = self.tr.object_pointer(class);
                let dst = self
                    .builder
                    .emit_call(Operand::ProcRef(proc), SmallVec::new(), ret, "new_object");
                Ok(Operand::Var(dst))
            }
            ExprKind::FunctionCall { args, .. } => self.lower_function_call(expr, *args),
            ExprKind::MethodCall { receiver, args, .. } => {
                self.lower_method_call(expr, *receiver, *args)
            }
        }
    }

    fn lower_binary(
        &mut self,
        expr: ExprId,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    ) -> Result<Operand, TranslateError> {
        let lhs = self.lower_expr(left)?;
        let op = match op {
            BinaryOp::And => return self.lower_and(lhs, right),
            BinaryOp::Div => {
                let rhs = self.lower_expr(right)?;
                let line = self.line_of(expr);
                return Ok(self.checked_div(lhs, rhs, line));
            }
            BinaryOp::Equals => {
                let rhs = self.lower_expr(right)?;
                let lhs_ty = self.operand_type(&lhs);
                let rhs = self.convert(rhs, &lhs_ty);
                return Ok(Operand::Var(self.builder.emit_binary(lhs, BinOp::Eq, rhs, "eq")));
            }
            BinaryOp::Add => BinOp::Add,
            BinaryOp::Sub => BinOp::Sub,
            BinaryOp::Mul => BinOp::Mul,
            BinaryOp::Less => BinOp::Slt,
        };
        let rhs = self.lower_expr(right)?;
        Ok(Operand::Var(self.builder.emit_binary(lhs, op, rhs, "binop")))
    }

    /// `lhs && right`, evaluating `right` only when `lhs` holds.
    fn lower_and(&mut self, lhs: Operand, right: ExprId) -> Result<Operand, TranslateError> {
        let result = self.builder.emit_alloca(LirType::Bool, "and_slot");
        self.builder.emit_store(Operand::Var(result), lhs.clone());
        let rhs_bb = self.builder.new_block("and_rhs");
        let end_bb = self.builder.new_block("and_end");
        self.builder.terminate_branch(lhs, rhs_bb, end_bb);

        self.builder.position_at(rhs_bb);
        let rhs = self.lower_expr(right)?;
        self.builder.emit_store(Operand::Var(result), rhs);
        self.builder.terminate_jump(end_bb);

        self.builder.position_at(end_bb);
        Ok(Operand::Var(self.builder.emit_load(
            Operand::Var(result),
            LirType::Bool,
            "and_result",
        )))
    }

    fn lower_function_call(
        &mut self,
        expr: ExprId,
        args: ExprRange,
    ) -> Result<Operand, TranslateError> {
        let Resolution::Function(target) = self.resolution(expr, "function")? else {
            return Err(TranslateError::MissingResolution {
                expr,
                expected: "function",
            });
        };
        match target {
            FunctionRef::Builtin(Builtin::PrintInt) => {
                let arg = self
                    .tr
                    .module
                    .exprs_in(args)
                    .first()
                    .copied()
                    .ok_or(TranslateError::MissingResolution {
                        expr,
                        expected: "argument",
                    })?;
                let value = self.lower_expr(arg)?;
                self.builder.emit_print(value);
                Ok(Operand::ConstInt(0))
            }
            FunctionRef::User(func) => {
                let proc = self.tr.proc_for(func)?;
                let (params, ret, name) = self.signature(proc);
                let args = self.lower_args(args, &params)?;
                let dst = self.builder.emit_call(
                    Operand::ProcRef(proc),
                    args,
                    ret,
                    &format!("{name}_result"),
                );
                Ok(Operand::Var(dst))
            }
        }
    }

    /// Method call, direct when the receiver's dynamic class is known.
    ///
    /// `new C().m()` always calls `C`'s implementation. `this.m()` does so
    /// when no subclass of the current class redefines `m`. Everything
    /// else loads the procedure from the receiver's vtable.
    fn lower_method_call(
        &mut self,
        expr: ExprId,
        receiver: ExprId,
        args: ExprRange,
    ) -> Result<Operand, TranslateError> {
        let Resolution::Method { class, method } = self.resolution(expr, "method")? else {
            return Err(TranslateError::MissingResolution {
                expr,
                expected: "method",
            });
        };
        let module = self.tr.module;
        let receiver_kind = &module.expr(receiver).kind;
        let direct = match receiver_kind {
            ExprKind::NewObject(_) => true,
            ExprKind::This => !self.tr.is_overridden_below(class, method),
            _ => false,
        };
        let object = self.lower_expr(receiver)?;
        let method_name = self.tr.name_str(module.function(method).name);

        if direct {
            let proc = self.tr.proc_for(method)?;
            let (params, ret, _) = self.signature(proc);
            let mut call_args: Args = smallvec![self.convert(object, &params[0])];
            call_args.extend(self.lower_args(args, &params[1..])?);
            let dst = self.builder.emit_call(
                Operand::ProcRef(proc),
                call_args,
                ret,
                &format!("{method_name}_result"),
            );
            return Ok(Operand::Var(dst));
        }

        if !self.is_never_null(receiver) {
            let line = self.line_of(expr);
            self.null_check(&object, format!("Nullpointer exception in line {line}"));
        }
        let slot = self.tr.method_slot(class, module.function(method).name)?;
        let implementation = self.tr.shape(class).methods[slot as usize];
        let (params, ret, _) = self.signature(self.tr.proc_for(implementation)?);
        let proc_ptr = LirType::Proc {
            ret: Box::new(ret.clone()),
            params: params.clone(),
        }
        .pointer_to();

        let vtable_ptr = LirType::Struct(self.tr.class_structs(class).vtable).pointer_to();
        let vtable_addr = self.builder.emit_gep(
            object.clone(),
            smallvec![Operand::ConstInt(0), Operand::ConstInt(0)],
            vtable_ptr.clone().pointer_to(),
            "vtable_addr",
        );
        let vtable = self
            .builder
            .emit_load(Operand::Var(vtable_addr), vtable_ptr, "vtable");
        let entry = self.builder.emit_gep(
            Operand::Var(vtable),
            smallvec![Operand::ConstInt(0), const_index(slot as usize)],
            proc_ptr.clone().pointer_to(),
            &format!("{method_name}_slot"),
        );
        let target = self
            .builder
            .emit_load(Operand::Var(entry), proc_ptr, method_name);

        let mut call_args: Args = smallvec![self.convert(object, &params[0])];
        call_args.extend(self.lower_args(args, &params[1..])?);
        let dst = self.builder.emit_call(
            Operand::Var(target),
            call_args,
            ret,
            &format!("{method_name}_result"),
        );
        Ok(Operand::Var(dst))
    }

    /// Parameter types, return type and name of a declared procedure.
    fn signature(&self, proc: ProcId) -> (Vec<LirType>, LirType, String) {
        let decl = self.tr.prog.proc(proc);
        (
            decl.params.iter().map(|p| p.ty.clone()).collect(),
            decl.return_type.clone(),
            decl.name.clone(),
        )
    }

    /// Lower call arguments left to right, converting each to its parameter type.
    fn lower_args(&mut self, args: ExprRange, params: &[LirType]) -> Result<Args, TranslateError> {
        let module = self.tr.module;
        let mut out = Args::new();
        for (i, &arg) in module.exprs_in(args).iter().enumerate() {
            let value = self.lower_expr(arg)?;
            let value = match params.get(i) {
                Some(ty) => self.convert(value, ty),
                None => value,
            };
            out.push(value);
        }
        Ok(out)
    }
}
