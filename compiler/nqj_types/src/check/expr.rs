//! Expression typing and name resolution (the expression checker).
//!
//! Every expression gets a type in `expr_types`; every name-bearing
//! expression that resolves gets an entry in `resolutions`. Failures
//! report once and yield [`Idx::ANY`] so the enclosing expression does not
//! report again.

use nqj_ir::{
    ensure_sufficient_stack, BinaryOp, ClassId, ExprId, ExprKind, ExprRange, FuncId, Name, TypeExpr,
    UnaryOp,
};

use super::ModuleChecker;
use crate::{ElementRef, FunctionRef, Idx, Resolution, TypeContext, TypeErrorKind};

/// Parameter types and result of a resolved callee.
struct Signature {
    params: Vec<Idx>,
    ret: Idx,
}

impl ModuleChecker<'_> {
    /// Compute, record and return the type of `expr`.
    pub(super) fn check_expr(&mut self, expr: ExprId, ctx: &TypeContext) -> Idx {
        let ty = ensure_sufficient_stack(|| self.infer_expr(expr, ctx));
        self.expr_types[expr.index()] = ty;
        ty
    }

    /// Check `expr` and report if its type is not a subtype of `expected`.
    fn expect(&mut self, expr: ExprId, expected: Idx, ctx: &TypeContext) -> Idx {
        let found = self.check_expr(expr, ctx);
        if !self.is_subtype(found, expected) {
            let (expected, found) = (self.display(expected), self.display(found));
            self.error_at(expr, TypeErrorKind::Mismatch { expected, found });
        }
        found
    }

    fn error_at(&mut self, expr: ExprId, kind: TypeErrorKind) {
        let span = self.module.expr(expr).span;
        self.push_error(ElementRef::Expr(expr), span, kind);
    }

    fn resolve(&mut self, expr: ExprId, resolution: Resolution) {
        self.resolutions.insert(expr, resolution);
    }

    fn infer_expr(&mut self, expr: ExprId, ctx: &TypeContext) -> Idx {
        let module = self.module;
        match &module.expr(expr).kind {
            ExprKind::Number(_) => Idx::INT,
            ExprKind::Bool(_) => Idx::BOOL,
            ExprKind::Null => Idx::NULL,
            ExprKind::This => match ctx.this_class() {
                Some(class) => self.names.class_type(class),
                None => {
                    self.error_at(expr, TypeErrorKind::ThisOutsideClass);
                    Idx::ANY
                }
            },
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Neg => {
                    self.expect(*operand, Idx::INT, ctx);
                    Idx::INT
                }
                UnaryOp::Not => {
                    self.expect(*operand, Idx::BOOL, ctx);
                    Idx::BOOL
                }
            },
            ExprKind::Binary { op, left, right } => self.infer_binary(*op, *left, *right, ctx),
            ExprKind::Read(address) => self.check_expr(*address, ctx),
            ExprKind::VarUse(name) => self.infer_var_use(expr, *name, ctx),
            ExprKind::FieldAccess { receiver, field } => {
                self.infer_field_access(expr, *receiver, *field, ctx)
            }
            ExprKind::ArrayLookup { array, index } => {
                let array_ty = self.check_expr(*array, ctx);
                self.expect(*index, Idx::INT, ctx);
                if let Some(base) = self.names.pool().array_base(array_ty) {
                    self.resolve(expr, Resolution::Array(array_ty));
                    base
                } else {
                    if !array_ty.is_any() {
                        let found = self.display(array_ty);
                        self.error_at(*array, TypeErrorKind::ArrayLookupOnNonArray { found });
                    }
                    Idx::ANY
                }
            }
            ExprKind::ArrayLength(array) => {
                let array_ty = self.check_expr(*array, ctx);
                if !array_ty.is_any() && self.names.pool().array_base(array_ty).is_none() {
                    let found = self.display(array_ty);
                    self.error_at(*array, TypeErrorKind::ExpectedArray { found });
                }
                Idx::INT
            }
            ExprKind::NewArray { base, size } => {
                self.expect(*size, Idx::INT, ctx);
                let array = TypeExpr::Array(Box::new(base.clone()));
                let span = module.expr(expr).span;
                self.resolve_type(&array, ElementRef::Expr(expr), span)
            }
            ExprKind::NewObject(name) => {
                if let Some(class) = self.names.lookup_class(*name) {
                    self.resolve(expr, Resolution::Class(class));
                    self.names.class_type(class)
                } else {
                    let name = self.name_str(*name);
                    self.error_at(expr, TypeErrorKind::UndefinedClass { name });
                    Idx::ANY
                }
            }
            ExprKind::FunctionCall { name, args } => {
                self.infer_function_call(expr, *name, *args, ctx)
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => self.infer_method_call(expr, *receiver, *method, *args, ctx),
        }
    }

    fn infer_binary(
        &mut self,
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
        ctx: &TypeContext,
    ) -> Idx {
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                self.expect(left, Idx::INT, ctx);
                self.expect(right, Idx::INT, ctx);
                Idx::INT
            }
            BinaryOp::Less => {
                self.expect(left, Idx::INT, ctx);
                self.expect(right, Idx::INT, ctx);
                Idx::BOOL
            }
            BinaryOp::And => {
                self.expect(left, Idx::BOOL, ctx);
                self.expect(right, Idx::BOOL, ctx);
                Idx::BOOL
            }
            BinaryOp::Equals => {
                let l = self.check_expr(left, ctx);
                let r = self.check_expr(right, ctx);
                if !self.is_subtype(l, r) && !self.is_subtype(r, l) {
                    let (left_ty, right_ty) = (self.display(l), self.display(r));
                    self.error_at(
                        right,
                        TypeErrorKind::IncomparableTypes {
                            left: left_ty,
                            right: right_ty,
                        },
                    );
                }
                Idx::BOOL
            }
        }
    }

    /// Nearest lexical binding first, then fields of the enclosing class.
    fn infer_var_use(&mut self, expr: ExprId, name: Name, ctx: &TypeContext) -> Idx {
        if let Some(binding) = ctx.lookup(name) {
            self.resolve(expr, Resolution::Var(binding.decl));
            return binding.ty;
        }
        let field = ctx
            .this_class()
            .and_then(|class| self.contexts[class.index()].field(name));
        if let Some(field) = field {
            self.resolve(expr, Resolution::Var(field));
            return self.var_types[field.index()];
        }
        let name = self.name_str(name);
        self.error_at(expr, TypeErrorKind::UndefinedVariable { name });
        Idx::ANY
    }

    /// Type of `receiver` as a class, reporting non-class receivers.
    fn receiver_class(&mut self, receiver: ExprId, ctx: &TypeContext) -> Option<ClassId> {
        let ty = self.check_expr(receiver, ctx);
        if let Some(class) = self.names.pool().class_of(ty) {
            return Some(class);
        }
        if !ty.is_any() {
            let found = self.display(ty);
            self.error_at(receiver, TypeErrorKind::ExpectedObject { found });
        }
        None
    }

    fn infer_field_access(
        &mut self,
        expr: ExprId,
        receiver: ExprId,
        field: Name,
        ctx: &TypeContext,
    ) -> Idx {
        let Some(class) = self.receiver_class(receiver, ctx) else {
            return Idx::ANY;
        };
        if let Some(var) = self.contexts[class.index()].field(field) {
            self.resolve(expr, Resolution::Field { class, field: var });
            self.var_types[var.index()]
        } else {
            let name = self.name_str(field);
            self.error_at(expr, TypeErrorKind::UndefinedField { name });
            Idx::ANY
        }
    }

    fn infer_method_call(
        &mut self,
        expr: ExprId,
        receiver: ExprId,
        method: Name,
        args: ExprRange,
        ctx: &TypeContext,
    ) -> Idx {
        let Some(class) = self.receiver_class(receiver, ctx) else {
            self.check_args_unchecked(args, ctx);
            return Idx::ANY;
        };
        let Some(func) = self.contexts[class.index()].method(method) else {
            let name = self.name_str(method);
            self.error_at(expr, TypeErrorKind::UndefinedMethod { name });
            self.check_args_unchecked(args, ctx);
            return Idx::ANY;
        };
        self.resolve(expr, Resolution::Method { class, method: func });
        let signature = self.user_signature(func);
        self.check_args(expr, args, &signature, ctx);
        signature.ret
    }

    fn infer_function_call(
        &mut self,
        expr: ExprId,
        name: Name,
        args: ExprRange,
        ctx: &TypeContext,
    ) -> Idx {
        let Some(target) = self.names.lookup_function(name) else {
            let name = self.name_str(name);
            self.error_at(expr, TypeErrorKind::UndefinedFunction { name });
            self.check_args_unchecked(args, ctx);
            return Idx::ANY;
        };
        self.resolve(expr, Resolution::Function(target));
        let signature = match target {
            FunctionRef::User(func) => self.user_signature(func),
            FunctionRef::Builtin(builtin) => Signature {
                params: builtin.params().to_vec(),
                ret: builtin.return_type(),
            },
        };
        self.check_args(expr, args, &signature, ctx);
        signature.ret
    }

    fn user_signature(&self, func: FuncId) -> Signature {
        let decl = self.module.function(func);
        Signature {
            params: decl
                .params
                .iter()
                .map(|p| self.var_types[p.index()])
                .collect(),
            ret: self.return_types[func.index()],
        }
    }

    /// Exact arity, then positional subtyping for the arguments present.
    fn check_args(
        &mut self,
        call: ExprId,
        args: ExprRange,
        signature: &Signature,
        ctx: &TypeContext,
    ) {
        let module = self.module;
        let args = module.exprs_in(args);
        if args.len() < signature.params.len() {
            self.error_at(call, TypeErrorKind::NotEnoughArguments);
        } else if args.len() > signature.params.len() {
            self.error_at(call, TypeErrorKind::TooManyArguments);
        }
        for (i, &arg) in args.iter().enumerate() {
            match signature.params.get(i) {
                Some(&param) => {
                    self.expect(arg, param, ctx);
                }
                None => {
                    self.check_expr(arg, ctx);
                }
            }
        }
    }

    /// Type the arguments of a call whose callee could not be resolved.
    fn check_args_unchecked(&mut self, args: ExprRange, ctx: &TypeContext) {
        let module = self.module;
        for &arg in module.exprs_in(args) {
            self.check_expr(arg, ctx);
        }
    }
}
