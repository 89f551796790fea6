use codegraph_core::types::RelKind;

use crate::common::analyze_repo;

const STORAGE: &str = "\
local Storage = {}
Storage.__index = Storage

local instance = nil

function Storage:getInstance()
    return instance
end

function Storage:save(key, value)
    self.data[key] = value
end

function Storage:load(key)
    return self.data[key]
end

return Storage
";

const CTRL: &str = "\
local Storage = require('storage.Storage')

local Ctrl = {}
Ctrl.__index = Ctrl

function Ctrl:loadScene()
    local s = Storage:getInstance()
    s:save('k', 'v')
    return s:load('k')
end

return Ctrl
";

#[test]
fn test_lua_singleton_dispatch_across_files() {
    let (_dir, graph) = analyze_repo(&[
        ("storage/Storage.lua", STORAGE),
        ("controllers/Ctrl.lua", CTRL),
    ]);

    let caller = "controllers.Ctrl.Ctrl:loadScene";
    assert!(graph.has_edge(
        RelKind::Calls,
        caller,
        "storage.Storage.Storage:getInstance"
    ));
    assert!(graph.has_edge(RelKind::Calls, caller, "storage.Storage.Storage:save"));
    assert!(graph.has_edge(RelKind::Calls, caller, "storage.Storage.Storage:load"));
}

#[test]
fn test_lua_colon_methods_attach_to_table_class() {
    let (_dir, graph) = analyze_repo(&[("storage/Storage.lua", STORAGE)]);

    assert!(graph.has_edge(
        RelKind::DefinesMethod,
        "storage.Storage.Storage",
        "storage.Storage.Storage:save"
    ));
}

#[test]
fn test_lua_dot_call_reaches_colon_method() {
    // Dot and colon call forms resolve to the same method.
    let (_dir, graph) = analyze_repo(&[
        ("storage/Storage.lua", STORAGE),
        (
            "main.lua",
            "local Storage = require('storage.Storage')\nlocal function go()\n    Storage.getInstance()\nend\n",
        ),
    ]);

    assert!(graph.has_edge(
        RelKind::Calls,
        "main.go",
        "storage.Storage.Storage:getInstance"
    ));
}
