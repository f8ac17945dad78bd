//! Semantic errors as reported through the pipeline.

use nqj_ir::{Span, TypeExpr};
use nqjc::{CompileError, ErrorCode};
use pretty_assertions::assert_eq;

use crate::common::{compile_err, main_returning, main_with, messages};

#[test]
fn missing_entry_is_the_only_error() {
    let errors = messages(|b| {
        let t = b.bool(true);
        let ret = b.ret(t);
        b.function("helper", TypeExpr::Bool, &[], &[ret]);
    });
    assert_eq!(errors, vec!["Method int main() must be present".to_owned()]);
}

#[test]
fn entry_must_return_int() {
    let errors = messages(|b| {
        let t = b.bool(true);
        let ret = b.ret(t);
        b.function("main", TypeExpr::Bool, &[], &[ret]);
    });
    assert!(
        errors.contains(&"Return type of the main method must be int".to_owned()),
        "{errors:?}"
    );
}

#[test]
fn returning_wrong_type_is_a_mismatch() {
    let err = compile_err(|b| {
        let t = b.bool(true);
        main_returning(b, &[], t);
    });
    let diagnostics = err.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, ErrorCode::E2001);
    assert_eq!(
        diagnostics[0].message,
        "Should return value of type int, but found boolean."
    );
}

#[test]
fn class_extending_itself() {
    let errors = messages(|b| {
        b.class("A", Some("A"));
        main_with(b, &[]);
    });
    assert!(
        errors.contains(&"Class cannot inherit from itself".to_owned()),
        "{errors:?}"
    );
}

#[test]
fn two_class_cycle_reports_each_class() {
    let errors = messages(|b| {
        b.class("A", Some("B"));
        b.class("B", Some("A"));
        main_with(b, &[]);
    });
    let cycles = errors
        .iter()
        .filter(|m| *m == "Cyclic inheritance occurred")
        .count();
    assert_eq!(cycles, 2, "{errors:?}");
}

#[test]
fn diagnostics_point_at_the_offending_line() {
    let err = compile_err(|b| {
        b.at_line(3);
        let x = b.read_var("x");
        let stmt = b.expr_stmt(x);
        b.at_line(4);
        main_with(b, &[stmt]);
    });
    let diagnostics = err.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.code, ErrorCode::E2003);
    assert_eq!(diagnostic.message, "Variable x is not defined.");
    assert_eq!(diagnostic.primary_span(), Some(Span::new(2, 3)));
    assert!(!diagnostic.is_internal());
}

#[test]
fn semantic_errors_block_lowering() {
    let err = compile_err(|b| {
        let x = b.read_var("missing");
        main_returning(b, &[], x);
    });
    assert!(matches!(err, CompileError::Semantic(ref d) if !d.is_empty()));
    assert!(err.to_string().ends_with("semantic error(s)"));
}
