use pseudo_compiler::frontend::source::Position;
use pseudo_compiler::ir::symbol_table::{ScopeTree, SymbolError, VariableInfo};
use pseudo_compiler::ir::{Callee, Type, Value};

fn int_var(name: &str) -> VariableInfo {
    VariableInfo {
        storage: Value::Global {
            name: name.to_string(),
            ty: Type::i32().ptr_to(),
        },
        declared_at: None,
    }
}

fn callee(name: &str) -> Callee {
    Callee {
        name: name.to_string(),
        ret: Type::i32(),
        params: Vec::new(),
        variadic: false,
    }
}

#[test]
fn child_sees_parent_bindings() {
    let mut scopes = ScopeTree::new();
    let root = scopes.root();
    scopes.declare_variable(root, "x", int_var("x")).unwrap();

    let child = scopes.push_child_scope(root);
    assert!(scopes.resolve_variable(child, "x").is_some());
    assert!(scopes.lookup_local(child, "x").is_none());
    assert_eq!(scopes.parent(child), Some(root));
}

#[test]
fn inner_binding_shadows_outer() {
    let mut scopes = ScopeTree::new();
    let root = scopes.root();
    scopes.declare_variable(root, "x", int_var("x")).unwrap();
    let child = scopes.push_child_scope(root);
    scopes.declare_variable(child, "x", int_var("x.1")).unwrap();

    let found = scopes.resolve_variable(child, "x").unwrap();
    assert_eq!(found.storage.to_string(), "@x.1");
    let outer = scopes.resolve_variable(root, "x").unwrap();
    assert_eq!(outer.storage.to_string(), "@x");
}

#[test]
fn redefinition_in_same_scope_fails() {
    let mut scopes = ScopeTree::new();
    let root = scopes.root();
    scopes.declare_variable(root, "x", int_var("x")).unwrap();
    assert_eq!(
        scopes.declare_variable(root, "x", int_var("x")),
        Err(SymbolError::Redefinition {
            name: "x".to_string(),
            previous: None,
        })
    );
}

#[test]
fn redefinition_reports_where_the_name_was_bound() {
    let mut scopes = ScopeTree::new();
    let root = scopes.root();
    let first = Position {
        offset: 0,
        line: 1,
        column: 9,
    };
    let declared = VariableInfo {
        declared_at: Some(first),
        ..int_var("x")
    };
    scopes.declare_variable(root, "x", declared).unwrap();
    match scopes.declare_variable(root, "x", int_var("x.1")) {
        Err(SymbolError::Redefinition { previous, .. }) => assert_eq!(previous, Some(first)),
        other => panic!("Expected redefinition, got {:?}", other),
    }
}

#[test]
fn parent_does_not_see_child_bindings() {
    let mut scopes = ScopeTree::new();
    let root = scopes.root();
    let child = scopes.push_child_scope(root);
    scopes.declare_variable(child, "tmp", int_var("tmp")).unwrap();
    assert!(scopes.resolve_variable(root, "tmp").is_none());
}

#[test]
fn discard_drops_bindings_lifo() {
    let mut scopes = ScopeTree::new();
    let root = scopes.root();
    let outer = scopes.push_child_scope(root);
    let inner = scopes.push_child_scope(outer);
    assert_eq!(scopes.depth(), 3);

    // Not the newest scope: ignored.
    scopes.discard(outer);
    assert_eq!(scopes.depth(), 3);

    scopes.discard(inner);
    scopes.discard(outer);
    assert_eq!(scopes.depth(), 1);

    // A discarded scope can no longer take bindings.
    assert_eq!(
        scopes.declare_variable(inner, "x", int_var("x")),
        Err(SymbolError::UnknownScope)
    );
}

#[test]
fn root_is_never_discarded() {
    let mut scopes = ScopeTree::new();
    let root = scopes.root();
    scopes.discard(root);
    assert_eq!(scopes.depth(), 1);
    assert!(scopes.is_root(root));
}

#[test]
fn functions_live_in_root_only() {
    let mut scopes = ScopeTree::new();
    let root = scopes.root();
    let child = scopes.push_child_scope(root);

    assert_eq!(
        scopes.declare_function(child, "f", callee("f")),
        Err(SymbolError::NotRootScope("f".to_string()))
    );
    scopes.declare_function(root, "f", callee("f")).unwrap();
    assert_eq!(
        scopes.declare_function(root, "f", callee("f")),
        Err(SymbolError::Redefinition {
            name: "f".to_string(),
            previous: None,
        })
    );
    assert_eq!(scopes.resolve_function("f").map(|c| c.name.as_str()), Some("f"));
}

#[test]
fn variables_and_functions_use_separate_namespaces() {
    let mut scopes = ScopeTree::new();
    let root = scopes.root();
    scopes.declare_function(root, "puts", callee("puts")).unwrap();
    scopes.declare_variable(root, "puts", int_var("puts.1")).unwrap();
    assert!(scopes.resolve_function("puts").is_some());
    assert_eq!(
        scopes.resolve_variable(root, "puts").and_then(|v| v.value_type()),
        Some(Type::i32())
    );
}
