use codegraph_core::types::{NodeLabel, RelKind};

use crate::common::analyze_repo;

const CALC: &str = "\
class Calculator {
public:
    int add(int a, int b);
};

int Calculator::add(int a, int b) { return a + b; }

void use() {
    Calculator c;
    c.add(1, 2);
}
";

#[test]
fn test_cpp_out_of_class_method() {
    let (_dir, graph) = analyze_repo(&[("calc.cpp", CALC)]);

    let methods = graph.node_keys(NodeLabel::Method);
    assert!(
        methods.iter().any(|m| m.ends_with("Calculator.add")),
        "expected a Method ending Calculator.add, got {methods:?}"
    );
    assert!(graph.has_edge(RelKind::Calls, "calc.use", "calc.Calculator.add"));
    assert!(graph.has_edge(
        RelKind::DefinesMethod,
        "calc.Calculator",
        "calc.Calculator.add"
    ));
}

#[test]
fn test_cpp_declaration_and_definition_are_one_method() {
    let (_dir, graph) = analyze_repo(&[("calc.cpp", CALC)]);

    let adds: Vec<_> = graph
        .node_keys(NodeLabel::Method)
        .into_iter()
        .filter(|m| m.contains("Calculator.add"))
        .collect();
    assert_eq!(adds, vec!["calc.Calculator.add".to_string()]);
}

#[test]
fn test_cpp_inheritance_edge() {
    let (_dir, graph) = analyze_repo(&[(
        "shapes.cpp",
        "class Shape {\npublic:\n    int area();\n};\nclass Circle : public Shape {\n};\n",
    )]);

    assert!(graph.has_edge(RelKind::Inherits, "shapes.Circle", "shapes.Shape"));
}
