use codegraph_core::types::RelKind;

use crate::common::analyze_repo;

const POINT: &str = "\
trait Display {
    fn fmt(&self) -> String;
}

struct Point {
    x: i32,
}

impl Display for Point {
    fn fmt(&self) -> String {
        String::new()
    }
}

fn show(p: &Point) {
    p.fmt();
}
";

#[test]
fn test_rust_trait_method_through_impl() {
    let (_dir, graph) = analyze_repo(&[("src/point.rs", POINT)]);

    assert!(graph.has_edge(
        RelKind::Implements,
        "src.point.Point",
        "src.point.Display"
    ));
    assert!(graph.has_edge(
        RelKind::DefinesMethod,
        "src.point.Point",
        "src.point.Point.fmt"
    ));
    assert!(graph.has_edge(RelKind::Calls, "src.point.show", "src.point.Point.fmt"));
}

#[test]
fn test_rust_inherent_impl_methods() {
    let (_dir, graph) = analyze_repo(&[(
        "lib.rs",
        "struct Counter { n: u32 }\nimpl Counter {\n    fn new() -> Self { Counter { n: 0 } }\n    fn bump(&mut self) { self.tick(); }\n    fn tick(&mut self) { self.n += 1; }\n}\nfn main() {\n    let c = Counter::new();\n}\n",
    )]);

    assert!(graph.has_edge(
        RelKind::DefinesMethod,
        "lib.Counter",
        "lib.Counter.new"
    ));
    // self-dispatch inside an impl block.
    assert!(graph.has_edge(RelKind::Calls, "lib.Counter.bump", "lib.Counter.tick"));
    // `Counter::new` resolves as a static method path.
    assert!(graph.has_edge(RelKind::Calls, "lib.main", "lib.Counter.new"));
}
