//! Golden snapshot of label resolution for the reference model.

use bagview_scene::{resolve_bindings, NodePath};
use bagview_testkit::assert_json_snapshot;
use serde::Serialize;

#[derive(Serialize)]
struct BindingsSummary {
    color_target: Option<String>,
    title: Option<String>,
    flavor: Option<String>,
}

#[test]
fn reference_model_bindings_are_stable() {
    let graph =
        bagview_assets::graph_from_file("assets/model/package.json").expect("reference model");
    let bindings = resolve_bindings(&graph);

    let node_name = |path: &NodePath| graph.node(path).map(|n| n.name.clone());
    let summary = BindingsSummary {
        color_target: bindings.color_target.as_ref().and_then(&node_name),
        title: bindings.title.as_ref().and_then(|s| node_name(&s.path)),
        flavor: bindings.flavor.as_ref().and_then(|s| node_name(&s.path)),
    };

    assert_json_snapshot("tests/golden/reference_bindings.json", &summary)
        .expect("bindings snapshot");
}
