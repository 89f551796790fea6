use codegraph_core::types::RelKind;

use crate::common::analyze_repo;

#[test]
fn test_no_calls_buffered_before_defines() {
    // The recording sink preserves emission order: every DEFINES /
    // DEFINES_METHOD must be queued before the first CALLS edge.
    let (_dir, graph) = analyze_repo(&[
        ("pkg/__init__.py", ""),
        ("pkg/a.py", "def hello(): pass\n"),
        ("pkg/b.py", "from .a import hello\ndef main(): hello()\n"),
        (
            "s.lua",
            "local T = {}\nfunction T:go()\nend\nlocal function run()\n    T.go()\nend\n",
        ),
    ]);

    let first_call = graph
        .sink
        .relationships
        .iter()
        .position(|r| r.kind == RelKind::Calls)
        .expect("fixture produces CALLS edges");
    let last_define = graph
        .sink
        .relationships
        .iter()
        .rposition(|r| matches!(r.kind, RelKind::Defines | RelKind::DefinesMethod))
        .expect("fixture produces DEFINES edges");

    assert!(
        last_define < first_call,
        "a CALLS edge was buffered at {first_call} before the last DEFINES at {last_define}"
    );
}

#[test]
fn test_call_identity_ignores_line() {
    // Two call sites to the same target from the same caller collapse into
    // one edge; the line attribute is not part of identity.
    let (_dir, graph) = analyze_repo(&[(
        "a.py",
        "def helper(): pass\ndef main():\n    helper()\n    helper()\n",
    )]);

    let calls: Vec<_> = graph
        .edges(RelKind::Calls)
        .into_iter()
        .filter(|(s, t)| s == "a.main" && t == "a.helper")
        .collect();
    assert_eq!(calls.len(), 1);
}
