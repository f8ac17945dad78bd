//! Runtime behavior of lowered programs.

use nqj_ir::{BinaryOp, ClassId, ExprId, StmtId, TypeExpr, UnaryOp};
use nqjc::ModuleBuilder;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use crate::common::{compile_ok, const_method, interp, main_returning, run, Outcome, Run};

fn returned(value: i32) -> Run {
    Run {
        outcome: Outcome::Returned(value),
        output: Vec::new(),
    }
}

fn halted(message: &str) -> Run {
    Run {
        outcome: Outcome::Halted(message.to_owned()),
        output: Vec::new(),
    }
}

/// `int <name>() { <body> }` on `class`.
fn method(b: &mut ModuleBuilder<'_>, class: ClassId, name: &str, body: &[StmtId]) {
    b.method(class, name, TypeExpr::Int, &[], body);
}

/// `<name> = <value>;`
fn set(b: &mut ModuleBuilder<'_>, name: &str, value: ExprId) -> StmtId {
    b.assign_var(name, value)
}

fn int_var(b: &mut ModuleBuilder<'_>, name: &str, value: i32) -> [StmtId; 2] {
    let decl = b.local(name, TypeExpr::Int);
    let v = b.int(value);
    [decl, set(b, name, v)]
}

fn add(b: &mut ModuleBuilder<'_>, left: ExprId, right: ExprId) -> ExprId {
    b.binary(BinaryOp::Add, left, right)
}

/// `<name> = <name> + <delta>;`
fn bump(b: &mut ModuleBuilder<'_>, name: &str, delta: ExprId) -> StmtId {
    let current = b.read_var(name);
    let sum = add(b, current, delta);
    set(b, name, sum)
}

/// `A a; a = new <class>();`
fn object_var(
    b: &mut ModuleBuilder<'_>,
    name: &str,
    static_class: &str,
    class: &str,
) -> [StmtId; 2] {
    let ty = b.class_type(static_class);
    let decl = b.local(name, ty);
    let obj = b.new_object(class);
    [decl, set(b, name, obj)]
}

// ── Dispatch ────────────────────────────────────────────────────────

#[test]
fn overriding_method_is_called_through_parent_type() {
    let result = run(|b| {
        let a = b.class("A", None);
        const_method(b, a, "f", 1);
        let bc = b.class("B", Some("A"));
        const_method(b, bc, "f", 2);
        let [decl, init] = object_var(b, "a", "A", "B");
        let recv = b.read_var("a");
        let call = b.method_call(recv, "f", &[]);
        main_returning(b, &[decl, init], call);
    });
    assert_eq!(result, returned(2));
}

/// `class A { int f() { return this.g(); } int g() { return 1; } }`
/// `class B extends A { int g() { return 2; } }`, calling `f` on a `class`.
fn this_dispatch(b: &mut ModuleBuilder<'_>, class: &str) {
    let a = b.class("A", None);
    let this = b.this();
    let g = b.method_call(this, "g", &[]);
    let ret = b.ret(g);
    method(b, a, "f", &[ret]);
    const_method(b, a, "g", 1);
    let bc = b.class("B", Some("A"));
    const_method(b, bc, "g", 2);
    let [decl, init] = object_var(b, "a", "A", class);
    let recv = b.read_var("a");
    let call = b.method_call(recv, "f", &[]);
    main_returning(b, &[decl, init], call);
}

#[test]
fn call_on_this_dispatches_to_override() {
    assert_eq!(run(|b| this_dispatch(b, "A")), returned(1));
    assert_eq!(run(|b| this_dispatch(b, "B")), returned(2));
}

#[test]
fn shadowed_fields_keep_separate_storage() {
    // class A { int x; int getA() { return this.x; } }
    // class B extends A {
    //     int x; int set() { this.x = 5; return 0; } int getB() { return this.x; }
    // }
    let result = run(|b| {
        let a = b.class("A", None);
        b.field(a, "x", TypeExpr::Int);
        let this = b.this();
        let fx = b.field_access(this, "x");
        let x = b.read(fx);
        let ret = b.ret(x);
        method(b, a, "getA", &[ret]);

        let bc = b.class("B", Some("A"));
        b.field(bc, "x", TypeExpr::Int);
        let this = b.this();
        let fx = b.field_access(this, "x");
        let five = b.int(5);
        let store = b.assign(fx, five);
        let zero = b.int(0);
        let ret = b.ret(zero);
        method(b, bc, "set", &[store, ret]);
        let this = b.this();
        let fx = b.field_access(this, "x");
        let x = b.read(fx);
        let ret = b.ret(x);
        method(b, bc, "getB", &[ret]);

        let [decl, init] = object_var(b, "b", "B", "B");
        let recv = b.read_var("b");
        let call = b.method_call(recv, "set", &[]);
        let stmt = b.expr_stmt(call);
        let recv = b.read_var("b");
        let get_a = b.method_call(recv, "getA", &[]);
        let ten = b.int(10);
        let scaled = b.binary(BinaryOp::Mul, get_a, ten);
        let recv = b.read_var("b");
        let get_b = b.method_call(recv, "getB", &[]);
        let result = add(b, scaled, get_b);
        main_returning(b, &[decl, init, stmt], result);
    });
    assert_eq!(result, returned(5));
}

/// Three classes `A <: B <: C` each optionally overriding `f` and `g`.
/// Every call goes through a variable of static type `A`.
fn dispatch_table(overrides: [bool; 4]) -> Vec<i32> {
    let classes = ["A", "B", "C"];
    let prog = compile_ok(|b| {
        for (level, class) in classes.iter().enumerate() {
            let parent = level.checked_sub(1).map(|p| classes[p]);
            let id = b.class(class, parent);
            for (m, name) in ["f", "g"].into_iter().enumerate() {
                if level == 0 || overrides[(level - 1) * 2 + m] {
                    let value = i32::try_from(level * 10 + m).unwrap();
                    const_method(b, id, name, value);
                }
            }
        }
        let a_ty = b.class_type("A");
        let mut body = vec![b.local("v", a_ty)];
        for class in classes {
            let obj = b.new_object(class);
            body.push(set(b, "v", obj));
            for name in ["f", "g"] {
                let recv = b.read_var("v");
                let call = b.method_call(recv, name, &[]);
                let print = b.call("printInt", &[call]);
                body.push(b.expr_stmt(print));
            }
        }
        let zero = b.int(0);
        main_returning(b, &body, zero);
    });
    let run = interp::run(&prog, "main").unwrap();
    assert_eq!(run.outcome, Outcome::Returned(0));
    run.output
}

fn expected_dispatch(overrides: [bool; 4]) -> Vec<i32> {
    let mut out = Vec::new();
    for level in 0..3 {
        for m in 0..2 {
            let owner = (0..=level)
                .rev()
                .find(|&l| l == 0 || overrides[(l - 1) * 2 + m])
                .unwrap_or(0);
            out.push(i32::try_from(owner * 10 + m).unwrap());
        }
    }
    out
}

#[test]
fn partial_overrides_resolve_to_nearest_ancestor() {
    let overrides = [false, true, true, false];
    assert_eq!(dispatch_table(overrides), vec![0, 1, 0, 11, 20, 11]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn vtables_dispatch_to_nearest_override(overrides in any::<[bool; 4]>()) {
        prop_assert_eq!(dispatch_table(overrides), expected_dispatch(overrides));
    }
}

// ── Control flow ────────────────────────────────────────────────────

#[test]
fn while_loop_prints_and_accumulates() {
    let result = run(|b| {
        let [di, ii] = int_var(b, "i", 0);
        let [ds, is] = int_var(b, "s", 0);
        let i = b.read_var("i");
        let five = b.int(5);
        let cond = b.binary(BinaryOp::Less, i, five);
        let i = b.read_var("i");
        let print = b.call("printInt", &[i]);
        let print = b.expr_stmt(print);
        let i = b.read_var("i");
        let acc = bump(b, "s", i);
        let one = b.int(1);
        let step = bump(b, "i", one);
        let body = b.block(&[print, acc, step]);
        let lp = b.while_loop(cond, body);
        let s = b.read_var("s");
        main_returning(b, &[di, ii, ds, is, lp], s);
    });
    assert_eq!(
        result,
        Run {
            outcome: Outcome::Returned(10),
            output: vec![0, 1, 2, 3, 4],
        }
    );
}

#[test]
fn recursive_function() {
    // int fact(int n) { if (n < 1) { return 1; } return n * fact(n - 1); }
    let result = run(|b| {
        let n = b.read_var("n");
        let one = b.int(1);
        let cond = b.binary(BinaryOp::Less, n, one);
        let one = b.int(1);
        let base = b.ret(one);
        let then = b.block(&[base]);
        let iff = b.if_then(cond, then);
        let n = b.read_var("n");
        let one = b.int(1);
        let pred = b.binary(BinaryOp::Sub, n, one);
        let rec = b.call("fact", &[pred]);
        let n = b.read_var("n");
        let prod = b.binary(BinaryOp::Mul, n, rec);
        let ret = b.ret(prod);
        b.function("fact", TypeExpr::Int, &[("n", TypeExpr::Int)], &[iff, ret]);
        let five = b.int(5);
        let call = b.call("fact", &[five]);
        main_returning(b, &[], call);
    });
    assert_eq!(result, returned(120));
}

#[test]
fn and_short_circuits() {
    // int x; x = 0; if (x < 0 && 1 / x == 0) { return 1; } return 7;
    let result = run(|b| {
        let [decl, init] = int_var(b, "x", 0);
        let x = b.read_var("x");
        let zero = b.int(0);
        let left = b.binary(BinaryOp::Less, x, zero);
        let one = b.int(1);
        let x = b.read_var("x");
        let div = b.binary(BinaryOp::Div, one, x);
        let zero = b.int(0);
        let right = b.binary(BinaryOp::Equals, div, zero);
        let cond = b.binary(BinaryOp::And, left, right);
        let one = b.int(1);
        let ret = b.ret(one);
        let then = b.block(&[ret]);
        let iff = b.if_then(cond, then);
        let seven = b.int(7);
        main_returning(b, &[decl, init, iff], seven);
    });
    assert_eq!(result, returned(7));
}

#[test]
fn not_and_negation() {
    // if (!(1 < 0)) { return -3; } return 0;
    let result = run(|b| {
        let one = b.int(1);
        let zero = b.int(0);
        let less = b.binary(BinaryOp::Less, one, zero);
        let cond = b.unary(UnaryOp::Not, less);
        let three = b.int(3);
        let neg = b.unary(UnaryOp::Neg, three);
        let ret = b.ret(neg);
        let then = b.block(&[ret]);
        let iff = b.if_then(cond, then);
        let zero = b.int(0);
        main_returning(b, &[iff], zero);
    });
    assert_eq!(result, returned(-3));
}

#[test]
fn function_without_return_halts() {
    let result = run(|b| {
        let n = b.read_var("n");
        let zero = b.int(0);
        let cond = b.binary(BinaryOp::Less, n, zero);
        let one = b.int(1);
        let ret = b.ret(one);
        let then = b.block(&[ret]);
        let iff = b.if_then(cond, then);
        b.function("f", TypeExpr::Int, &[("n", TypeExpr::Int)], &[iff]);
        let five = b.int(5);
        let call = b.call("f", &[five]);
        main_returning(b, &[], call);
    });
    assert_eq!(result, halted("Missing return in procedure f"));
}

// ── Arithmetic ──────────────────────────────────────────────────────

fn divide(dividend: i32, divisor: i32) -> Run {
    run(|b| {
        let [dd, id] = int_var(b, "d", divisor);
        b.at_line(6);
        let left = b.int(dividend);
        let right = b.read_var("d");
        let div = b.binary(BinaryOp::Div, left, right);
        main_returning(b, &[dd, id], div);
    })
}

#[test]
fn division_truncates() {
    assert_eq!(divide(7, 2), returned(3));
    assert_eq!(divide(-7, 2), returned(-3));
}

#[test]
fn division_by_zero_halts_with_line() {
    assert_eq!(divide(1, 0), halted("Division by zero in line 6"));
}

#[test]
fn literal_division_by_zero_halts() {
    let result = run(|b| {
        b.at_line(1);
        let one = b.int(1);
        let zero = b.int(0);
        let div = b.binary(BinaryOp::Div, one, zero);
        main_returning(b, &[], div);
    });
    assert_eq!(result, halted("Division by zero in line 1"));
}

#[test]
fn min_divided_by_minus_one_is_min() {
    assert_eq!(divide(i32::MIN, -1), returned(i32::MIN));
}

#[test]
fn arithmetic_wraps() {
    let result = run(|b| {
        let max = b.int(i32::MAX);
        let one = b.int(1);
        let sum = add(b, max, one);
        main_returning(b, &[], sum);
    });
    assert_eq!(result, returned(i32::MIN));
}

// ── Arrays ──────────────────────────────────────────────────────────

fn int_array(b: &mut ModuleBuilder<'_>, name: &str, size: i32) -> [StmtId; 2] {
    let decl = b.local(name, TypeExpr::Int.array_of());
    let size = b.int(size);
    let array = b.new_array(TypeExpr::Int, size);
    [decl, set(b, name, array)]
}

fn store_at(b: &mut ModuleBuilder<'_>, array: &str, index: i32, value: i32) -> StmtId {
    let base = b.read_var(array);
    let index = b.int(index);
    let slot = b.array_lookup(base, index);
    let value = b.int(value);
    b.assign(slot, value)
}

#[test]
fn array_elements_and_length() {
    let result = run(|b| {
        let [decl, init] = int_array(b, "a", 4);
        let store = store_at(b, "a", 3, 9);
        let base = b.read_var("a");
        let three = b.int(3);
        let slot = b.array_lookup(base, three);
        let elem = b.read(slot);
        let base = b.read_var("a");
        let len = b.array_length(base);
        let base = b.read_var("a");
        let zero = b.int(0);
        let slot = b.array_lookup(base, zero);
        let first = b.read(slot);
        let sum = add(b, elem, len);
        let sum = add(b, sum, first);
        main_returning(b, &[decl, init, store], sum);
    });
    assert_eq!(result, returned(13));
}

#[test]
fn out_of_bounds_index_halts_with_line() {
    for index in [5, -1] {
        let result = run(|b| {
            let [decl, init] = int_array(b, "a", 5);
            b.at_line(7);
            let store = store_at(b, "a", index, 1);
            b.at_line(8);
            let zero = b.int(0);
            main_returning(b, &[decl, init, store], zero);
        });
        assert_eq!(result, halted("Index out of bounds error in line 7"), "index {index}");
    }
}

#[test]
fn reading_past_the_end_halts() {
    // int[] a; a = new int[3]; return a[5];
    let result = run(|b| {
        let [decl, init] = int_array(b, "a", 3);
        b.at_line(3);
        let base = b.read_var("a");
        let five = b.int(5);
        let slot = b.array_lookup(base, five);
        let value = b.read(slot);
        main_returning(b, &[decl, init], value);
    });
    assert_eq!(result, halted("Index out of bounds error in line 3"));
}

#[test]
fn negative_array_size_halts() {
    let result = run(|b| {
        let [decl, init] = int_array(b, "a", -1);
        let zero = b.int(0);
        main_returning(b, &[decl, init], zero);
    });
    assert_eq!(result, halted("Array Size must be positive"));
}

#[test]
fn empty_array_has_zero_length() {
    let result = run(|b| {
        let [decl, init] = int_array(b, "a", 0);
        let base = b.read_var("a");
        let len = b.array_length(base);
        main_returning(b, &[decl, init], len);
    });
    assert_eq!(result, returned(0));
}

#[test]
fn nested_arrays() {
    // int[][] m; m = new int[][2]; m[0] = new int[3]; m[0][2] = 7;
    // return m[0][2] + m[0].length;
    let result = run(|b| {
        let decl = b.local("m", TypeExpr::Int.array_of().array_of());
        let two = b.int(2);
        let outer = b.new_array(TypeExpr::Int.array_of(), two);
        let init = set(b, "m", outer);
        let m = b.read_var("m");
        let zero = b.int(0);
        let row = b.array_lookup(m, zero);
        let three = b.int(3);
        let inner = b.new_array(TypeExpr::Int, three);
        let fill = b.assign(row, inner);
        let m = b.read_var("m");
        let zero = b.int(0);
        let row = b.array_lookup(m, zero);
        let row = b.read(row);
        let two = b.int(2);
        let cell = b.array_lookup(row, two);
        let seven = b.int(7);
        let store = b.assign(cell, seven);

        let m = b.read_var("m");
        let zero = b.int(0);
        let row = b.array_lookup(m, zero);
        let row = b.read(row);
        let two = b.int(2);
        let cell = b.array_lookup(row, two);
        let value = b.read(cell);
        let m = b.read_var("m");
        let zero = b.int(0);
        let row = b.array_lookup(m, zero);
        let row = b.read(row);
        let len = b.array_length(row);
        let sum = add(b, value, len);
        main_returning(b, &[decl, init, fill, store], sum);
    });
    assert_eq!(result, returned(10));
}

/// Address of `ps[i]`.
fn ps_at_i(b: &mut ModuleBuilder<'_>) -> ExprId {
    let ps = b.read_var("ps");
    let i = b.read_var("i");
    b.array_lookup(ps, i)
}

#[test]
fn array_of_objects() {
    // class P { int v; }
    // P[] ps; ps = new P[3]; int i; i = 0; int s; s = 0;
    // while (i < 3) { ps[i] = new P(); ps[i].v = i * i; s = s + ps[i].v; i = i + 1; }
    // return s;
    let result = run(|b| {
        let p = b.class("P", None);
        b.field(p, "v", TypeExpr::Int);
        let p_ty = b.class_type("P");
        let decl = b.local("ps", p_ty.clone().array_of());
        let three = b.int(3);
        let array = b.new_array(p_ty, three);
        let init = set(b, "ps", array);
        let [di, ii] = int_var(b, "i", 0);
        let [ds, is] = int_var(b, "s", 0);

        let i = b.read_var("i");
        let three = b.int(3);
        let cond = b.binary(BinaryOp::Less, i, three);

        let slot = ps_at_i(b);
        let obj = b.new_object("P");
        let create = b.assign(slot, obj);
        let slot = ps_at_i(b);
        let elem = b.read(slot);
        let field = b.field_access(elem, "v");
        let i = b.read_var("i");
        let i2 = b.read_var("i");
        let square = b.binary(BinaryOp::Mul, i, i2);
        let write = b.assign(field, square);
        let slot = ps_at_i(b);
        let elem = b.read(slot);
        let field = b.field_access(elem, "v");
        let v = b.read(field);
        let acc = bump(b, "s", v);
        let one = b.int(1);
        let step = bump(b, "i", one);
        let body = b.block(&[create, write, acc, step]);
        let lp = b.while_loop(cond, body);
        let s = b.read_var("s");
        main_returning(b, &[decl, init, di, ii, ds, is, lp], s);
    });
    assert_eq!(result, returned(5));
}

// ── Null checks ─────────────────────────────────────────────────────

#[test]
fn null_field_access_halts_with_line() {
    let result = run(|b| {
        let a = b.class("A", None);
        b.field(a, "x", TypeExpr::Int);
        let ty = b.class_type("A");
        let decl = b.local("a", ty);
        let null = b.null();
        let init = set(b, "a", null);
        b.at_line(9);
        let recv = b.read_var("a");
        let field = b.field_access(recv, "x");
        let x = b.read(field);
        main_returning(b, &[decl, init], x);
    });
    assert_eq!(result, halted("Nullpointer exception in line 9"));
}

#[test]
fn null_method_receiver_halts() {
    let result = run(|b| {
        let a = b.class("A", None);
        const_method(b, a, "f", 1);
        let ty = b.class_type("A");
        let decl = b.local("a", ty);
        b.at_line(4);
        let recv = b.read_var("a");
        let call = b.method_call(recv, "f", &[]);
        main_returning(b, &[decl], call);
    });
    assert_eq!(result, halted("Nullpointer exception in line 4"));
}

#[test]
fn null_array_length_halts() {
    let result = run(|b| {
        let decl = b.local("a", TypeExpr::Int.array_of());
        b.at_line(2);
        let base = b.read_var("a");
        let len = b.array_length(base);
        main_returning(b, &[decl], len);
    });
    assert_eq!(
        result,
        halted("Nullpointer exception when reading array length in line 2")
    );
}

#[test]
fn null_compares_equal_to_default_reference() {
    // A a; if (a == null) { return 1; } return 0;
    let result = run(|b| {
        b.class("A", None);
        let ty = b.class_type("A");
        let decl = b.local("a", ty);
        let a = b.read_var("a");
        let null = b.null();
        let cond = b.binary(BinaryOp::Equals, a, null);
        let one = b.int(1);
        let ret = b.ret(one);
        let then = b.block(&[ret]);
        let iff = b.if_then(cond, then);
        let zero = b.int(0);
        main_returning(b, &[decl, iff], zero);
    });
    assert_eq!(result, returned(1));
}
