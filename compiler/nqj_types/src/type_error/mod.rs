//! Semantic errors.
//!
//! A [`TypeCheckError`] pairs the offending source element with a
//! [`TypeErrorKind`]. Kinds carry the names and rendered types they
//! mention, so the message can be produced without the interner or pool.

use std::fmt;

use nqj_diagnostic::{Diagnostic, ErrorCode};
use nqj_ir::{ClassId, ExprId, FuncId, Span, StmtId, VarId};

/// The source element an error is attached to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ElementRef {
    /// The program as a whole (e.g. a missing entry function).
    Module,
    Class(ClassId),
    Function(FuncId),
    Var(VarId),
    Stmt(StmtId),
    Expr(ExprId),
}

impl ElementRef {
    /// Short label text for the element's span.
    pub const fn label(self) -> &'static str {
        match self {
            ElementRef::Module => "in this program",
            ElementRef::Class(_) => "in this class",
            ElementRef::Function(_) => "in this function",
            ElementRef::Var(_) => "in this declaration",
            ElementRef::Stmt(_) => "in this statement",
            ElementRef::Expr(_) => "in this expression",
        }
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum TypeErrorKind {
    // Entry function
    MissingEntry { entry: String },
    EntryReturnType { entry: String },
    EntryParams { entry: String },
    EntryMissingReturn { entry: String },

    // Declarations
    DuplicateFunction { name: String },
    DuplicateClass { name: String },
    SelfInheritance,
    UndefinedClass { name: String },
    CyclicInheritance,
    DuplicateParam { name: String },
    DuplicateField { name: String },
    DuplicateMethod { name: String },
    DuplicateVariable { name: String },
    OverrideParamMismatch,
    IllegalOverload { name: String },

    // Statements
    ReturnMismatch { expected: String, found: String },
    AssignMismatch { target: String, value: String },
    ConditionNotBool { keyword: &'static str, found: String },
    NotAssignable,

    // Expressions
    Mismatch { expected: String, found: String },
    ExpectedArray { found: String },
    ArrayLookupOnNonArray { found: String },
    ExpectedObject { found: String },
    IncomparableTypes { left: String, right: String },
    NotEnoughArguments,
    TooManyArguments,
    UndefinedFunction { name: String },
    UndefinedMethod { name: String },
    UndefinedField { name: String },
    UndefinedVariable { name: String },
    ThisOutsideClass,
}

impl TypeErrorKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            TypeErrorKind::MissingEntry { .. }
            | TypeErrorKind::EntryReturnType { .. }
            | TypeErrorKind::EntryParams { .. }
            | TypeErrorKind::EntryMissingReturn { .. } => ErrorCode::E2016,
            TypeErrorKind::DuplicateFunction { .. }
            | TypeErrorKind::DuplicateClass { .. }
            | TypeErrorKind::DuplicateParam { .. }
            | TypeErrorKind::DuplicateField { .. }
            | TypeErrorKind::DuplicateMethod { .. }
            | TypeErrorKind::DuplicateVariable { .. } => ErrorCode::E2006,
            TypeErrorKind::SelfInheritance => ErrorCode::E2009,
            TypeErrorKind::UndefinedClass { .. } => ErrorCode::E2002,
            TypeErrorKind::CyclicInheritance => ErrorCode::E2008,
            TypeErrorKind::OverrideParamMismatch | TypeErrorKind::IllegalOverload { .. } => {
                ErrorCode::E2011
            }
            TypeErrorKind::ReturnMismatch { .. }
            | TypeErrorKind::AssignMismatch { .. }
            | TypeErrorKind::Mismatch { .. }
            | TypeErrorKind::NotAssignable
            | TypeErrorKind::ExpectedObject { .. } => ErrorCode::E2001,
            TypeErrorKind::ConditionNotBool { .. } => ErrorCode::E2014,
            TypeErrorKind::ExpectedArray { .. } | TypeErrorKind::ArrayLookupOnNonArray { .. } => {
                ErrorCode::E2012
            }
            TypeErrorKind::IncomparableTypes { .. } => ErrorCode::E2013,
            TypeErrorKind::NotEnoughArguments | TypeErrorKind::TooManyArguments => {
                ErrorCode::E2004
            }
            TypeErrorKind::UndefinedFunction { .. } => ErrorCode::E2010,
            TypeErrorKind::UndefinedMethod { .. } => ErrorCode::E2007,
            TypeErrorKind::UndefinedField { .. } => ErrorCode::E2005,
            TypeErrorKind::UndefinedVariable { .. } => ErrorCode::E2003,
            TypeErrorKind::ThisOutsideClass => ErrorCode::E2015,
        }
    }
}

impl fmt::Display for TypeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeErrorKind::MissingEntry { entry } => {
                write!(f, "Method int {entry}() must be present")
            }
            TypeErrorKind::EntryReturnType { entry } => {
                write!(f, "Return type of the {entry} method must be int")
            }
            TypeErrorKind::EntryParams { entry } => {
                write!(f, "{} method does not take parameters", capitalize(entry))
            }
            TypeErrorKind::EntryMissingReturn { entry } => write!(
                f,
                "{} method does not have a return statement as the last statement",
                capitalize(entry)
            ),
            TypeErrorKind::DuplicateFunction { name } => {
                write!(f, "There already is a global function with name {name} defined")
            }
            TypeErrorKind::DuplicateClass { name } => {
                write!(f, "There already is a class with name {name} defined")
            }
            TypeErrorKind::SelfInheritance => write!(f, "Class cannot inherit from itself"),
            TypeErrorKind::UndefinedClass { name } => write!(f, "Class {name} is not defined"),
            TypeErrorKind::CyclicInheritance => write!(f, "Cyclic inheritance occurred"),
            TypeErrorKind::DuplicateParam { name } => {
                write!(f, "Parameter with name {name} already exists.")
            }
            TypeErrorKind::DuplicateField { name } => {
                write!(f, "Field with name {name} already exists.")
            }
            TypeErrorKind::DuplicateMethod { name } => {
                write!(f, "Method with name {name} already exists.")
            }
            TypeErrorKind::DuplicateVariable { name } => {
                write!(f, "A variable with name {name} is already defined.")
            }
            TypeErrorKind::OverrideParamMismatch => write!(f, "Arguments must have the same type"),
            TypeErrorKind::IllegalOverload { name } => {
                write!(f, "Overloading of {name} is illegal.")
            }
            TypeErrorKind::ReturnMismatch { expected, found } => {
                write!(f, "Should return value of type {expected}, but found {found}.")
            }
            TypeErrorKind::AssignMismatch { target, value } => {
                write!(f, "Cannot assign value of type {value} to {target}.")
            }
            TypeErrorKind::ConditionNotBool { keyword, found } => write!(
                f,
                "Condition of {keyword}-statement must be of type boolean, \
                 but this is of type {found}."
            ),
            TypeErrorKind::NotAssignable => write!(
                f,
                "Left side of an assignment must be a variable, field or array element."
            ),
            TypeErrorKind::Mismatch { expected, found } => {
                write!(f, "Expected expression of type {expected} but found {found}.")
            }
            TypeErrorKind::ExpectedArray { found } => {
                write!(f, "Expected expression of array type, but found {found}.")
            }
            TypeErrorKind::ArrayLookupOnNonArray { found } => {
                write!(f, "Expected an array for array-lookup, but found {found}")
            }
            TypeErrorKind::ExpectedObject { found } => {
                write!(f, "Expected expression of class type, but found {found}.")
            }
            TypeErrorKind::IncomparableTypes { left, right } => {
                write!(f, "Cannot compare types {left} and {right}.")
            }
            TypeErrorKind::NotEnoughArguments => write!(f, "Not enough arguments."),
            TypeErrorKind::TooManyArguments => write!(f, "Too many arguments."),
            TypeErrorKind::UndefinedFunction { name } => {
                write!(f, "Function {name} does not exists.")
            }
            TypeErrorKind::UndefinedMethod { name } => write!(f, "Method {name} is not defined."),
            TypeErrorKind::UndefinedField { name } => write!(f, "Field {name} is not defined."),
            TypeErrorKind::UndefinedVariable { name } => {
                write!(f, "Variable {name} is not defined.")
            }
            TypeErrorKind::ThisOutsideClass => {
                write!(f, "Keyword this is not available outside of a class.")
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A semantic error with its location.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeCheckError {
    pub element: ElementRef,
    pub span: Span,
    pub kind: TypeErrorKind,
}

impl TypeCheckError {
    pub fn new(element: ElementRef, span: Span, kind: TypeErrorKind) -> Self {
        TypeCheckError {
            element,
            span,
            kind,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    /// Convert into a reportable diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.code())
            .with_message(self.message())
            .with_label(self.span, self.element.label())
    }
}

impl fmt::Display for TypeCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)
    }
}
