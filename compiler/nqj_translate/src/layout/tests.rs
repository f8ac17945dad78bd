use nqj_ir::{ModuleBuilder, StringInterner, TypeExpr};
use nqj_types::{check_module, CheckOptions};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;

/// One class per entry: (name, parent, declared method names in order, declared fields).
type Hierarchy<'a> = &'a [(&'a str, Option<&'a str>, &'a [&'a str], &'a [&'a str])];

fn shapes_of(hierarchy: Hierarchy<'_>) -> (StringInterner, Module, Vec<ClassShape>) {
    let interner = StringInterner::new();
    let module = {
        let mut b = ModuleBuilder::new(&interner);
        for &(name, parent, methods, fields) in hierarchy {
            let class = b.class(name, parent);
            for field in fields {
                b.field(class, field, TypeExpr::Int);
            }
            for method in methods {
                let zero = b.int(0);
                let ret = b.ret(zero);
                b.method(class, method, TypeExpr::Int, &[], &[ret]);
            }
        }
        b.finish()
    };
    let typed = check_module(&module, &interner, &CheckOptions::default());
    let shapes = compute_class_shapes(&module, &typed.names);
    (interner, module, shapes)
}

fn slot_names(interner: &StringInterner, module: &Module, shape: &ClassShape) -> Vec<String> {
    shape
        .methods
        .iter()
        .map(|&m| {
            let f = module.function(m);
            let owner = f.owner.map_or("", |c| interner.lookup(module.class(c).name));
            format!("{}_{owner}", interner.lookup(f.name))
        })
        .collect()
}

#[test]
fn fields_are_parent_first() {
    let (interner, module, shapes) = shapes_of(&[
        ("A", None, &[], &["x", "y"]),
        ("B", Some("A"), &[], &["z"]),
    ]);
    let names: Vec<_> = shapes[1]
        .fields
        .iter()
        .map(|&f| interner.lookup(module.var(f).name))
        .collect();
    assert_eq!(names, vec!["x", "y", "z"]);
    assert_eq!(shapes[1].field_slot(shapes[1].fields[2]), Some(3));
}

#[test]
fn shadowing_field_keeps_hidden_slot() {
    let (_, _, shapes) = shapes_of(&[("A", None, &[], &["x"]), ("B", Some("A"), &[], &["x"])]);
    assert_eq!(shapes[1].fields.len(), 2);
    assert_eq!(shapes[1].field_slot(shapes[0].fields[0]), Some(1));
    assert_eq!(shapes[1].field_slot(shapes[1].fields[1]), Some(2));
}

#[test]
fn override_declared_after_new_method_keeps_slot() {
    let (interner, module, shapes) = shapes_of(&[
        ("A", None, &["f", "g"], &[]),
        ("B", Some("A"), &["h", "g"], &[]),
        ("C", Some("B"), &["f"], &[]),
    ]);
    assert_eq!(slot_names(&interner, &module, &shapes[0]), vec!["f_A", "g_A"]);
    assert_eq!(
        slot_names(&interner, &module, &shapes[1]),
        vec!["f_A", "g_B", "h_B"]
    );
    assert_eq!(
        slot_names(&interner, &module, &shapes[2]),
        vec!["f_C", "g_B", "h_B"]
    );
}

#[test]
fn child_declared_before_parent() {
    let (interner, module, shapes) = shapes_of(&[
        ("B", Some("A"), &["g"], &[]),
        ("A", None, &["f"], &[]),
    ]);
    assert_eq!(slot_names(&interner, &module, &shapes[0]), vec!["f_A", "g_B"]);
}

const METHOD_POOL: [&str; 4] = ["a", "b", "c", "d"];

fn level() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(METHOD_POOL.to_vec(), 0..=METHOD_POOL.len()).prop_shuffle()
}

proptest! {
    #[test]
    fn method_slots_are_stable_down_the_chain(levels in proptest::collection::vec(level(), 3..6)) {
        let names: Vec<String> = (0..levels.len()).map(|i| format!("K{i}")).collect();
        let hierarchy: Vec<(&str, Option<&str>, &[&str], &[&str])> = levels
            .iter()
            .enumerate()
            .map(|(i, methods)| {
                let parent = i.checked_sub(1).map(|p| names[p].as_str());
                (names[i].as_str(), parent, methods.as_slice(), &[][..])
            })
            .collect();
        let (interner, module, shapes) = shapes_of(&hierarchy);

        for depth in 1..shapes.len() {
            let parent = &shapes[depth - 1];
            let child = &shapes[depth];
            prop_assert!(child.methods.len() >= parent.methods.len());
            for (slot, &method) in parent.methods.iter().enumerate() {
                let name = module.function(method).name;
                prop_assert_eq!(child.method_slot(&module, name), Some(slot as u32));
            }
        }
        for shape in &shapes {
            let mut seen = slot_names(&interner, &module, shape);
            seen.sort();
            seen.dedup();
            prop_assert_eq!(seen.len(), shape.methods.len());
        }
    }
}
