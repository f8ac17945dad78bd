//! Arena AST for NQJ programs.
//!
//! A [`Module`] owns every node of one program in flat vectors. Nodes refer
//! to each other through the typed ids in [`ids`]; child lists are ranges
//! into shared id vectors. The tree is built once (see
//! [`ModuleBuilder`](crate::ModuleBuilder)) and read-only afterwards.

mod ids;

pub use ids::{ClassId, ExprId, ExprRange, FuncId, StmtId, StmtRange, VarId};

use crate::{LineIndex, Name, Span};

/// Type syntax as written in declarations and `new` expressions.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeExpr {
    Int,
    Bool,
    Class(Name),
    Array(Box<TypeExpr>),
}

impl TypeExpr {
    /// `T[]` for this `T`.
    #[must_use]
    pub fn array_of(self) -> TypeExpr {
        TypeExpr::Array(Box::new(self))
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    /// `-e`
    Neg,
    /// `!e`
    Not,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Less,
    Equals,
    And,
}

/// Expression node kinds.
///
/// `VarUse`, `FieldAccess` and `ArrayLookup` denote addresses; their value
/// is obtained by wrapping them in `Read`. The target of an assignment is
/// always one of these three kinds.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum ExprKind {
    Number(i32),
    Bool(bool),
    Null,
    This,
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    /// Value stored at an address expression.
    Read(ExprId),
    VarUse(Name),
    FieldAccess {
        receiver: ExprId,
        field: Name,
    },
    ArrayLookup {
        array: ExprId,
        index: ExprId,
    },
    ArrayLength(ExprId),
    NewArray {
        base: TypeExpr,
        size: ExprId,
    },
    NewObject(Name),
    FunctionCall {
        name: Name,
        args: ExprRange,
    },
    MethodCall {
        receiver: ExprId,
        method: Name,
        args: ExprRange,
    },
}

impl ExprKind {
    /// Whether this kind denotes an address rather than a value.
    pub const fn is_address(&self) -> bool {
        matches!(
            self,
            ExprKind::VarUse(_) | ExprKind::FieldAccess { .. } | ExprKind::ArrayLookup { .. }
        )
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum StmtKind {
    Block(StmtRange),
    If {
        cond: ExprId,
        then_branch: StmtId,
        else_branch: StmtId,
    },
    While {
        cond: ExprId,
        body: StmtId,
    },
    Assign {
        address: ExprId,
        value: ExprId,
    },
    Expr(ExprId),
    Return(ExprId),
    VarDecl(VarId),
}

impl StmtKind {
    /// Short label for the statement kind, used in comments and traces.
    pub const fn label(&self) -> &'static str {
        match self {
            StmtKind::Block(_) => "block",
            StmtKind::If { .. } => "if",
            StmtKind::While { .. } => "while",
            StmtKind::Assign { .. } => "assign",
            StmtKind::Expr(_) => "expression",
            StmtKind::Return(_) => "return",
            StmtKind::VarDecl(_) => "variable declaration",
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

/// Where a variable declaration lives.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum VarKind {
    Field(ClassId),
    Param(FuncId),
    Local,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct VarDecl {
    pub name: Name,
    pub ty: TypeExpr,
    pub kind: VarKind,
    pub span: Span,
}

/// Global function or method. Methods have an `owner`.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FunctionDecl {
    pub name: Name,
    pub return_type: TypeExpr,
    pub params: Vec<VarId>,
    /// Always a `StmtKind::Block`.
    pub body: StmtId,
    pub owner: Option<ClassId>,
    pub span: Span,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ClassDecl {
    pub name: Name,
    pub extends: Option<Name>,
    pub fields: Vec<VarId>,
    pub methods: Vec<FuncId>,
    pub span: Span,
}

/// One parsed program.
#[derive(Clone, Debug, Default)]
pub struct Module {
    pub(crate) exprs: Vec<Expr>,
    pub(crate) stmts: Vec<Stmt>,
    pub(crate) expr_lists: Vec<ExprId>,
    pub(crate) stmt_lists: Vec<StmtId>,
    pub(crate) vars: Vec<VarDecl>,
    pub(crate) functions: Vec<FunctionDecl>,
    pub(crate) classes: Vec<ClassDecl>,
    /// Top-level functions in declaration order.
    pub(crate) global_functions: Vec<FuncId>,
    pub(crate) line_index: LineIndex,
}

impl Module {
    #[inline]
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    #[inline]
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    #[inline]
    pub fn var(&self, id: VarId) -> &VarDecl {
        &self.vars[id.index()]
    }

    #[inline]
    pub fn function(&self, id: FuncId) -> &FunctionDecl {
        &self.functions[id.index()]
    }

    #[inline]
    pub fn class(&self, id: ClassId) -> &ClassDecl {
        &self.classes[id.index()]
    }

    pub fn exprs_in(&self, range: ExprRange) -> &[ExprId] {
        let start = range.start as usize;
        &self.expr_lists[start..start + range.len()]
    }

    pub fn stmts_in(&self, range: StmtRange) -> &[StmtId] {
        let start = range.start as usize;
        &self.stmt_lists[start..start + range.len()]
    }

    /// Classes in declaration order.
    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDecl)> + '_ {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId::new(index_u32(i)), c))
    }

    /// All variable declarations: fields, parameters and locals.
    pub fn vars(&self) -> impl Iterator<Item = (VarId, &VarDecl)> + '_ {
        self.vars
            .iter()
            .enumerate()
            .map(|(i, v)| (VarId::new(index_u32(i)), v))
    }

    /// All functions and methods, in creation order.
    pub fn functions(&self) -> impl Iterator<Item = (FuncId, &FunctionDecl)> + '_ {
        self.functions
            .iter()
            .enumerate()
            .map(|(i, f)| (FuncId::new(index_u32(i)), f))
    }

    pub fn global_functions(&self) -> &[FuncId] {
        &self.global_functions
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Line on which `span` starts.
    #[inline]
    pub fn line_of(&self, span: Span) -> u32 {
        self.line_index.line_of_span(span)
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

/// Convert an arena length to a `u32` index.
///
/// # Panics
/// Panics if an arena grows past `u32::MAX` entries.
pub(crate) fn index_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("AST arena exceeded u32::MAX entries ({len})"))
}
