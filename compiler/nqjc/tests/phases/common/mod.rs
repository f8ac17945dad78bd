//! Shared helpers for the phase tests.

pub mod interp;

use nqj_ir::{ClassId, ExprId, StmtId, TypeExpr};
use nqjc::{compile, CompileError, CompileOptions, Module, ModuleBuilder, Prog, StringInterner};

pub use interp::{Outcome, Run};

/// Build a module with `f`.
pub fn build(interner: &StringInterner, f: impl FnOnce(&mut ModuleBuilder<'_>)) -> Module {
    let mut b = ModuleBuilder::new(interner);
    f(&mut b);
    b.finish()
}

/// Compile with default options, expecting success.
pub fn compile_ok(f: impl FnOnce(&mut ModuleBuilder<'_>)) -> Prog {
    let interner = StringInterner::new();
    let module = build(&interner, f);
    match compile(&module, &interner, &CompileOptions::default()) {
        Ok(prog) => prog,
        Err(err) => panic!("compile failed: {err}: {:#?}", err.diagnostics()),
    }
}

/// Compile with default options, expecting semantic errors.
pub fn compile_err(f: impl FnOnce(&mut ModuleBuilder<'_>)) -> CompileError {
    let interner = StringInterner::new();
    let module = build(&interner, f);
    compile(&module, &interner, &CompileOptions::default()).expect_err("compile succeeded")
}

/// Error messages reported for the module built by `f`, in report order.
pub fn messages(f: impl FnOnce(&mut ModuleBuilder<'_>)) -> Vec<String> {
    compile_err(f)
        .diagnostics()
        .iter()
        .map(|d| d.message.clone())
        .collect()
}

/// Compile and execute `main`.
pub fn run(f: impl FnOnce(&mut ModuleBuilder<'_>)) -> Run {
    let prog = compile_ok(f);
    interp::run(&prog, "main").unwrap_or_else(|err| panic!("bad program: {err}"))
}

/// `int main() { <stmts> return <result>; }`
pub fn main_returning(b: &mut ModuleBuilder<'_>, stmts: &[StmtId], result: ExprId) {
    let ret = b.ret(result);
    let mut body = stmts.to_vec();
    body.push(ret);
    b.function("main", TypeExpr::Int, &[], &body);
}

/// `int main() { <stmts> return 0; }`
pub fn main_with(b: &mut ModuleBuilder<'_>, stmts: &[StmtId]) {
    let zero = b.int(0);
    main_returning(b, stmts, zero);
}

/// A method `int <name>() { return <value>; }` on `class`.
pub fn const_method(b: &mut ModuleBuilder<'_>, class: ClassId, name: &str, value: i32) {
    let v = b.int(value);
    let ret = b.ret(v);
    b.method(class, name, TypeExpr::Int, &[], &[ret]);
}
