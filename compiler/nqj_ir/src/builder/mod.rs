//! Allocation front end for [`Module`].
//!
//! Parsers and tests construct programs bottom-up: expressions first, then
//! the statements that use them, then the declarations that own the
//! statements. Every node receives the builder's current span.
//!
//! Without real source text the builder tracks a synthetic line cursor
//! ([`ModuleBuilder::at_line`]); the finished module's [`LineIndex`] then
//! maps each node back to the line it was created on.

use crate::ast::index_u32;
use crate::{
    BinaryOp, ClassDecl, ClassId, Expr, ExprId, ExprKind, ExprRange, FuncId, FunctionDecl,
    LineIndex, Module, Name, Span, Stmt, StmtId, StmtKind, StmtRange, StringInterner, TypeExpr,
    UnaryOp, VarDecl, VarId, VarKind,
};

pub struct ModuleBuilder<'a> {
    interner: &'a StringInterner,
    module: Module,
    span: Span,
    /// Highest synthetic line used so far.
    max_line: u32,
    line_index: Option<LineIndex>,
}

impl<'a> ModuleBuilder<'a> {
    pub fn new(interner: &'a StringInterner) -> Self {
        ModuleBuilder {
            interner,
            module: Module::default(),
            span: Span::new(0, 1),
            max_line: 1,
            line_index: None,
        }
    }

    /// Use the line structure of real source text instead of synthetic lines.
    #[must_use]
    pub fn with_source(mut self, source: &str) -> Self {
        self.line_index = Some(LineIndex::new(source));
        self
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    /// Attach `span` to every node created from now on.
    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    /// Attach synthetic line `line` (1-based) to every node created from now on.
    pub fn at_line(&mut self, line: u32) {
        let line = line.max(1);
        self.max_line = self.max_line.max(line);
        self.span = Span::new(line - 1, line);
    }

    pub fn class_type(&self, name: &str) -> TypeExpr {
        TypeExpr::Class(self.name(name))
    }

    // ── Declarations ────────────────────────────────────────────────

    /// Declare a class with no members yet.
    pub fn class(&mut self, name: &str, extends: Option<&str>) -> ClassId {
        let id = ClassId::new(index_u32(self.module.classes.len()));
        let decl = ClassDecl {
            name: self.name(name),
            extends: extends.map(|p| self.name(p)),
            fields: Vec::new(),
            methods: Vec::new(),
            span: self.span,
        };
        self.module.classes.push(decl);
        id
    }

    pub fn field(&mut self, class: ClassId, name: &str, ty: TypeExpr) -> VarId {
        let id = self.push_var(name, ty, VarKind::Field(class));
        self.module.classes[class.index()].fields.push(id);
        id
    }

    /// Add a method to `class`. `body` becomes the method's top-level block.
    pub fn method(
        &mut self,
        class: ClassId,
        name: &str,
        return_type: TypeExpr,
        params: &[(&str, TypeExpr)],
        body: &[StmtId],
    ) -> FuncId {
        let id = self.push_function(name, return_type, params, body, Some(class));
        self.module.classes[class.index()].methods.push(id);
        id
    }

    /// Add a top-level function.
    pub fn function(
        &mut self,
        name: &str,
        return_type: TypeExpr,
        params: &[(&str, TypeExpr)],
        body: &[StmtId],
    ) -> FuncId {
        let id = self.push_function(name, return_type, params, body, None);
        self.module.global_functions.push(id);
        id
    }

    fn push_function(
        &mut self,
        name: &str,
        return_type: TypeExpr,
        params: &[(&str, TypeExpr)],
        body: &[StmtId],
        owner: Option<ClassId>,
    ) -> FuncId {
        let id = FuncId::new(index_u32(self.module.functions.len()));
        let params = params
            .iter()
            .map(|(pname, ty)| self.push_var(pname, ty.clone(), VarKind::Param(id)))
            .collect();
        let span = self.span;
        let body = self.block(body);
        self.module.functions.push(FunctionDecl {
            name: self.name(name),
            return_type,
            params,
            body,
            owner,
            span,
        });
        id
    }

    fn push_var(&mut self, name: &str, ty: TypeExpr, kind: VarKind) -> VarId {
        let id = VarId::new(index_u32(self.module.vars.len()));
        let decl = VarDecl {
            name: self.name(name),
            ty,
            kind,
            span: self.span,
        };
        self.module.vars.push(decl);
        id
    }

    // ── Statements ──────────────────────────────────────────────────

    fn push_stmt(&mut self, kind: StmtKind) -> StmtId {
        let id = StmtId::new(index_u32(self.module.stmts.len()));
        self.module.stmts.push(Stmt {
            kind,
            span: self.span,
        });
        id
    }

    pub fn block(&mut self, stmts: &[StmtId]) -> StmtId {
        let range = StmtRange {
            start: index_u32(self.module.stmt_lists.len()),
            len: index_u32(stmts.len()),
        };
        self.module.stmt_lists.extend_from_slice(stmts);
        self.push_stmt(StmtKind::Block(range))
    }

    /// Local variable declaration statement.
    pub fn local(&mut self, name: &str, ty: TypeExpr) -> StmtId {
        let var = self.push_var(name, ty, VarKind::Local);
        self.push_stmt(StmtKind::VarDecl(var))
    }

    pub fn if_else(&mut self, cond: ExprId, then_branch: StmtId, else_branch: StmtId) -> StmtId {
        self.push_stmt(StmtKind::If {
            cond,
            then_branch,
            else_branch,
        })
    }

    /// `if` with an empty `else` block.
    pub fn if_then(&mut self, cond: ExprId, then_branch: StmtId) -> StmtId {
        let else_branch = self.block(&[]);
        self.if_else(cond, then_branch, else_branch)
    }

    pub fn while_loop(&mut self, cond: ExprId, body: StmtId) -> StmtId {
        self.push_stmt(StmtKind::While { cond, body })
    }

    pub fn assign(&mut self, address: ExprId, value: ExprId) -> StmtId {
        self.push_stmt(StmtKind::Assign { address, value })
    }

    /// `x = value;` for a plain variable.
    pub fn assign_var(&mut self, name: &str, value: ExprId) -> StmtId {
        let address = self.var(name);
        self.assign(address, value)
    }

    pub fn expr_stmt(&mut self, expr: ExprId) -> StmtId {
        self.push_stmt(StmtKind::Expr(expr))
    }

    pub fn ret(&mut self, value: ExprId) -> StmtId {
        self.push_stmt(StmtKind::Return(value))
    }

    // ── Expressions ─────────────────────────────────────────────────

    fn push_expr(&mut self, kind: ExprKind) -> ExprId {
        let id = ExprId::new(index_u32(self.module.exprs.len()));
        self.module.exprs.push(Expr {
            kind,
            span: self.span,
        });
        id
    }

    fn expr_list(&mut self, exprs: &[ExprId]) -> ExprRange {
        let range = ExprRange {
            start: index_u32(self.module.expr_lists.len()),
            len: index_u32(exprs.len()),
        };
        self.module.expr_lists.extend_from_slice(exprs);
        range
    }

    pub fn int(&mut self, value: i32) -> ExprId {
        self.push_expr(ExprKind::Number(value))
    }

    pub fn bool(&mut self, value: bool) -> ExprId {
        self.push_expr(ExprKind::Bool(value))
    }

    pub fn null(&mut self) -> ExprId {
        self.push_expr(ExprKind::Null)
    }

    pub fn this(&mut self) -> ExprId {
        self.push_expr(ExprKind::This)
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.push_expr(ExprKind::Unary { op, operand })
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.push_expr(ExprKind::Binary { op, left, right })
    }

    /// Address of a variable.
    pub fn var(&mut self, name: &str) -> ExprId {
        let name = self.name(name);
        self.push_expr(ExprKind::VarUse(name))
    }

    /// Value read from an address expression.
    pub fn read(&mut self, address: ExprId) -> ExprId {
        self.push_expr(ExprKind::Read(address))
    }

    /// Value of a variable: `read(var(name))`.
    pub fn read_var(&mut self, name: &str) -> ExprId {
        let address = self.var(name);
        self.read(address)
    }

    /// Address of `receiver.field`.
    pub fn field_access(&mut self, receiver: ExprId, field: &str) -> ExprId {
        let field = self.name(field);
        self.push_expr(ExprKind::FieldAccess { receiver, field })
    }

    /// Address of `array[index]`.
    pub fn array_lookup(&mut self, array: ExprId, index: ExprId) -> ExprId {
        self.push_expr(ExprKind::ArrayLookup { array, index })
    }

    pub fn array_length(&mut self, array: ExprId) -> ExprId {
        self.push_expr(ExprKind::ArrayLength(array))
    }

    pub fn new_array(&mut self, base: TypeExpr, size: ExprId) -> ExprId {
        self.push_expr(ExprKind::NewArray { base, size })
    }

    pub fn new_object(&mut self, class: &str) -> ExprId {
        let name = self.name(class);
        self.push_expr(ExprKind::NewObject(name))
    }

    pub fn call(&mut self, function: &str, args: &[ExprId]) -> ExprId {
        let name = self.name(function);
        let args = self.expr_list(args);
        self.push_expr(ExprKind::FunctionCall { name, args })
    }

    pub fn method_call(&mut self, receiver: ExprId, method: &str, args: &[ExprId]) -> ExprId {
        let method = self.name(method);
        let args = self.expr_list(args);
        self.push_expr(ExprKind::MethodCall {
            receiver,
            method,
            args,
        })
    }

    /// Finish building and return the module.
    pub fn finish(mut self) -> Module {
        self.module.line_index = self
            .line_index
            .take()
            .unwrap_or_else(|| LineIndex::from_line_starts((0..self.max_line).collect()));
        self.module
    }
}
