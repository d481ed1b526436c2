use orchdoc::core::workflow::graph::DanglingLink;
use orchdoc::core::workflow::{parse_workflow, parse_workflow_str, FlowGraph};
use orchdoc_types::EdgeKind;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn execution_order_follows_links_depth_first() {
    let doc = parse_workflow(&fixture("create_avi_lb.xml")).unwrap();
    let graph = FlowGraph::build(&doc);

    assert_eq!(
        graph.execution_order(),
        vec!["item0", "item1", "item3", "item6", "item4", "item2", "item5"]
    );
    assert!(graph.unreachable_items().is_empty());
    assert!(graph.dangling_links().is_empty());
}

#[test]
fn unreachable_items_trail_the_execution_order() {
    let doc = parse_workflow(&fixture("broken_flow.xml")).unwrap();
    let graph = FlowGraph::build(&doc);

    assert_eq!(graph.execution_order(), vec!["item0", "item1"]);
    assert_eq!(graph.unreachable_items(), vec!["item1".to_string()]);
    assert_eq!(
        graph.dangling_links(),
        &[DanglingLink {
            from: Some("item0".to_string()),
            target: "item9".to_string(),
            kind: EdgeKind::Next,
        }]
    );
}

#[test]
fn error_handler_targets_count_as_reachable() {
    let xml = r#"<workflow root-name="item0">
  <error-handler name="item2"/>
  <workflow-item name="item0" out-name="item1" type="task"/>
  <workflow-item name="item1" type="end"/>
  <workflow-item name="item2" type="end" end-mode="1"/>
</workflow>"#;
    let doc = parse_workflow_str(xml, None).unwrap();
    let graph = FlowGraph::build(&doc);

    assert!(graph.unreachable_items().is_empty());
    assert_eq!(graph.execution_order(), vec!["item0", "item1", "item2"]);
}

#[test]
fn unknown_root_and_handler_targets_are_dangling() {
    let xml = r#"<workflow root-name="missing">
  <error-handler name="gone"/>
  <workflow-item name="item0" type="end"/>
</workflow>"#;
    let doc = parse_workflow_str(xml, None).unwrap();
    let graph = FlowGraph::build(&doc);

    let kinds: Vec<(Option<&str>, &str, &EdgeKind)> = graph
        .dangling_links()
        .iter()
        .map(|link| (link.from.as_deref(), link.target.as_str(), &link.kind))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (None, "missing", &EdgeKind::Next),
            (None, "gone", &EdgeKind::ErrorHandler),
        ]
    );
    assert_eq!(graph.unreachable_items(), vec!["item0".to_string()]);
}

#[test]
fn predecessors_exclude_the_virtual_start() {
    let doc = parse_workflow(&fixture("create_avi_lb.xml")).unwrap();
    let graph = FlowGraph::build(&doc);

    assert_eq!(
        graph.predecessors("item3"),
        vec![
            ("item1".to_string(), EdgeKind::Next),
            ("item2".to_string(), EdgeKind::Next),
        ]
    );
    assert_eq!(
        graph.predecessors("item5"),
        vec![("item0".to_string(), EdgeKind::OnError)]
    );
    assert!(graph.predecessors("item0").is_empty());
    assert!(graph.predecessors("nope").is_empty());
}

#[test]
fn mermaid_output_shapes_nodes_by_kind() {
    let doc = parse_workflow(&fixture("create_avi_lb.xml")).unwrap();
    let graph = FlowGraph::build(&doc);

    insta::assert_snapshot!(graph.to_mermaid(), @r#"
    flowchart TD
        __start((Start))
        item0["Login to AVI controller"]
        item1{"Pool exists?"}
        item2["Create pool"]
        item3["Create virtual service"]
        item6[["Register DNS record"]]
        item4(["item4"])
        item5(["Report failure"])
        __start --> item0
        __start -.->|"error handler"| item5
        item0 --> item1
        item0 -.->|"on error"| item5
        item1 --> item3
        item1 -->|"alternative"| item2
        item2 --> item3
        item3 --> item6
        item6 --> item4
    "#);
}

#[test]
fn mermaid_labels_are_sanitized_and_truncated() {
    let long = "x".repeat(70);
    let xml = format!(
        r#"<workflow root-name="step-1">
  <workflow-item name="step-1" type="task"><display-name>Say "hi"</display-name></workflow-item>
  <workflow-item name="step-2" type="task"><display-name>{}</display-name></workflow-item>
</workflow>"#,
        long
    );
    let doc = parse_workflow_str(&xml, None).unwrap();
    let mermaid = FlowGraph::build(&doc).to_mermaid();

    assert!(mermaid.contains("step_1[\"Say 'hi'\"]"), "{}", mermaid);
    assert!(mermaid.contains(&format!("step_2[\"{}...\"]", "x".repeat(60))));
}

#[test]
fn dot_output_is_a_digraph_with_labels() {
    let doc = parse_workflow(&fixture("create_avi_lb.xml")).unwrap();
    let dot = FlowGraph::build(&doc).to_dot();

    assert!(dot.starts_with("digraph {"));
    assert!(dot.contains("Login to AVI controller"));
    assert!(dot.contains("alternative"));
    assert!(dot.contains("on error"));
}

#[test]
fn duplicate_item_names_keep_only_the_first_node() {
    let xml = r#"<workflow root-name="item0">
  <workflow-item name="item0" type="task" out-name="item1"><display-name>Prepare</display-name></workflow-item>
  <workflow-item name="item1" type="end"><display-name>Done</display-name></workflow-item>
  <workflow-item name="item1" type="task" out-name="item0"><display-name>Shadow copy</display-name></workflow-item>
</workflow>"#;
    let doc = parse_workflow_str(xml, None).unwrap();
    let graph = FlowGraph::build(&doc);

    let dot = graph.to_dot();
    assert!(!dot.contains("Shadow copy"), "{}", dot);
    assert_eq!(graph.to_mermaid().matches("    item1(").count(), 1);
    assert!(graph.predecessors("item0").is_empty());
    assert!(graph.unreachable_items().is_empty());
    assert_eq!(graph.execution_order(), vec!["item0", "item1"]);
}
