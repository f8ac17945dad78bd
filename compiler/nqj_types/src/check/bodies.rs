//! Pass 3: function bodies and statements.

use nqj_ir::{ensure_sufficient_stack, ExprId, FuncId, StmtId, StmtKind, StmtRange, VarId};
use rustc_hash::FxHashSet;

use super::ModuleChecker;
use crate::{Binding, ElementRef, Idx, TypeContext, TypeErrorKind};

impl ModuleChecker<'_> {
    pub(super) fn check_bodies(&mut self) {
        let module = self.module;
        for &func in module.global_functions() {
            self.check_function(func);
        }
        for (class, _) in module.classes() {
            self.check_class(class);
        }
    }

    /// Check parameters, then the body in a fresh context seeded with them.
    pub(super) fn check_function(&mut self, func: FuncId) {
        let module = self.module;
        let decl = module.function(func);
        let _span = tracing::debug_span!("check_function", name = self.interner.lookup(decl.name))
            .entered();

        let mut ctx = TypeContext::new(self.return_types[func.index()], decl.owner);
        let mut seen = FxHashSet::default();
        for &param in &decl.params {
            let var = module.var(param);
            if seen.insert(var.name) {
                ctx.bind(
                    var.name,
                    Binding {
                        ty: self.var_types[param.index()],
                        decl: param,
                    },
                );
            } else {
                let name = self.name_str(var.name);
                self.push_error(
                    ElementRef::Var(param),
                    var.span,
                    TypeErrorKind::DuplicateParam { name },
                );
            }
        }
        self.check_stmt(decl.body, &ctx);
    }

    fn check_stmt(&mut self, stmt: StmtId, ctx: &TypeContext) {
        ensure_sufficient_stack(|| self.check_stmt_inner(stmt, ctx));
    }

    fn check_stmt_inner(&mut self, stmt: StmtId, ctx: &TypeContext) {
        let module = self.module;
        let node = module.stmt(stmt);
        let element = ElementRef::Stmt(stmt);
        match node.kind {
            StmtKind::Block(stmts) => self.check_block(stmts, ctx),
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(cond, "if", element, ctx);
                self.check_stmt(then_branch, ctx);
                self.check_stmt(else_branch, ctx);
            }
            StmtKind::While { cond, body } => {
                self.check_condition(cond, "while", element, ctx);
                self.check_stmt(body, ctx);
            }
            StmtKind::Assign { address, value } => {
                if !module.expr(address).kind.is_address() {
                    self.push_error(element, node.span, TypeErrorKind::NotAssignable);
                }
                let target = self.check_expr(address, ctx);
                let value = self.check_expr(value, ctx);
                if !self.is_subtype(value, target) {
                    let (target, value) = (self.display(target), self.display(value));
                    self.push_error(
                        element,
                        node.span,
                        TypeErrorKind::AssignMismatch { target, value },
                    );
                }
            }
            StmtKind::Expr(expr) => {
                self.check_expr(expr, ctx);
            }
            StmtKind::Return(expr) => {
                let found = self.check_expr(expr, ctx);
                let expected = ctx.return_type();
                if !self.is_subtype(found, expected) {
                    let (expected, found) = (self.display(expected), self.display(found));
                    self.push_error(
                        element,
                        node.span,
                        TypeErrorKind::ReturnMismatch { expected, found },
                    );
                }
            }
            // Only reachable outside a block, where the declaration has no scope.
            StmtKind::VarDecl(var) => {
                self.resolve_local(var);
            }
        }
    }

    /// Check a block in order. Declarations extend a private copy of `ctx`
    /// that the rest of the block sees.
    fn check_block(&mut self, stmts: StmtRange, ctx: &TypeContext) {
        let module = self.module;
        let mut scope = ctx.clone();
        let mut declared = FxHashSet::default();
        for &stmt in module.stmts_in(stmts) {
            let StmtKind::VarDecl(var) = module.stmt(stmt).kind else {
                self.check_stmt(stmt, &scope);
                continue;
            };
            let ty = self.resolve_local(var);
            let decl = module.var(var);
            if declared.insert(decl.name) {
                scope.bind(decl.name, Binding { ty, decl: var });
            } else {
                let name = self.name_str(decl.name);
                self.push_error(
                    ElementRef::Var(var),
                    decl.span,
                    TypeErrorKind::DuplicateVariable { name },
                );
            }
        }
    }

    fn resolve_local(&mut self, var: VarId) -> Idx {
        let decl = self.module.var(var);
        let ty = self.resolve_type(&decl.ty, ElementRef::Var(var), decl.span);
        self.var_types[var.index()] = ty;
        ty
    }

    fn check_condition(
        &mut self,
        cond: ExprId,
        keyword: &'static str,
        element: ElementRef,
        ctx: &TypeContext,
    ) {
        let found = self.check_expr(cond, ctx);
        if !self.is_subtype(found, Idx::BOOL) {
            let found = self.display(found);
            let span = self.module.expr(cond).span;
            self.push_error(
                element,
                span,
                TypeErrorKind::ConditionNotBool { keyword, found },
            );
        }
    }
}
