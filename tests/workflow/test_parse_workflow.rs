use orchdoc::core::types::ErrorCategory;
use orchdoc::core::workflow::parser::is_workflow_file;
use orchdoc::core::workflow::{parse_workflow, parse_workflow_str};
use orchdoc_types::{EdgeKind, ItemKind};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn parses_workflow_header_and_parameters() {
    let doc = parse_workflow(&fixture("create_avi_lb.xml")).unwrap();

    assert_eq!(doc.title(), "Create AVI Load Balancer");
    assert_eq!(
        doc.id.as_deref(),
        Some("8a3c1e52-4b7d-4f0e-9c61-2d5e7f0a9b14")
    );
    assert_eq!(doc.version.as_deref(), Some("1.2.0"));
    assert_eq!(doc.api_version.as_deref(), Some("6.0.0"));
    assert_eq!(doc.root_item.as_deref(), Some("item0"));
    assert!(doc
        .description
        .as_deref()
        .unwrap()
        .starts_with("Creates a pool and a virtual service"));
    assert!(doc.source.as_deref().unwrap().ends_with("create_avi_lb.xml"));

    let inputs: Vec<(&str, &str)> = doc
        .inputs
        .iter()
        .map(|p| (p.name.as_str(), p.type_name.as_str()))
        .collect();
    assert_eq!(
        inputs,
        vec![
            ("lbName", "string"),
            ("vipAddress", "string"),
            ("port", "number"),
            ("poolMembers", "Array/string"),
        ]
    );
    assert_eq!(doc.outputs.len(), 1);
    assert_eq!(
        doc.outputs[0].description.as_deref(),
        Some("UUID of the created virtual service")
    );
}

#[test]
fn parses_attributes_and_error_handler() {
    let doc = parse_workflow(&fixture("create_avi_lb.xml")).unwrap();

    assert_eq!(doc.attributes.len(), 5);
    let password = doc
        .attributes
        .iter()
        .find(|a| a.name == "aviPassword")
        .unwrap();
    assert_eq!(password.type_name, "SecureString");
    assert!(!password.read_only);
    assert_eq!(password.value.as_deref(), Some("s3cr3t-Passw0rd"));

    let token = doc
        .attributes
        .iter()
        .find(|a| a.name == "sessionToken")
        .unwrap();
    assert_eq!(token.value, None);

    assert_eq!(doc.error_handlers.len(), 1);
    assert_eq!(doc.error_handlers[0].target, "item5");
    assert_eq!(
        doc.error_handlers[0].throw_bind_name.as_deref(),
        Some("errorMessage")
    );
    assert_eq!(doc.declared_variable("port"), Some("number"));
    assert_eq!(doc.declared_variable("aviPassword"), Some("SecureString"));
    assert_eq!(doc.declared_variable("nope"), None);
}

#[test]
fn parses_items_bindings_and_scripts() {
    let doc = parse_workflow(&fixture("create_avi_lb.xml")).unwrap();
    assert_eq!(doc.items.len(), 7);

    let login = doc.item("item0").unwrap();
    assert_eq!(login.kind, ItemKind::Task);
    assert_eq!(login.title(), "Login to AVI controller");
    assert_eq!(login.catch_name.as_deref(), Some("item5"));
    assert_eq!(login.in_bindings.len(), 3);
    assert_eq!(
        login.out_bindings[0].export_name.as_deref(),
        Some("sessionToken")
    );
    let script = login.script.as_ref().unwrap();
    assert!(!script.encoded);
    assert!(script
        .body
        .starts_with("var request = new RESTHostManager.createTransientHostFrom(controller);"));
    assert!(script.body.ends_with("token = JSON.parse(response.contentAsString).token;"));
    assert!(script.body.contains("\n    throw \"Login failed"));

    let decision = doc.item("item1").unwrap();
    assert_eq!(decision.kind, ItemKind::CustomCondition);
    assert_eq!(
        decision.successors(),
        vec![
            (EdgeKind::Next, "item3"),
            (EdgeKind::Alternative, "item2"),
        ]
    );

    let link = doc.item("item6").unwrap();
    assert_eq!(link.kind, ItemKind::Link);
    assert_eq!(
        link.linked_workflow_id.as_deref(),
        Some("5f1d9a0e-77c2-4c3b-b8a4-0e6d2c9f1a37")
    );

    let failure = doc.item("item5").unwrap();
    assert!(failure.is_error_end());
    assert!(!doc.item("item4").unwrap().is_error_end());
}

#[test]
fn parses_presentation_steps_and_groups() {
    let doc = parse_workflow(&fixture("create_avi_lb.xml")).unwrap();
    let presentation = &doc.presentation;

    assert_eq!(presentation.steps.len(), 1);
    let step = &presentation.steps[0];
    assert_eq!(step.title.as_deref(), Some("Load balancer"));
    assert_eq!(step.groups.len(), 2);
    assert_eq!(step.groups[0].title.as_deref(), Some("Virtual service"));

    let vip = &step.groups[0].params[1];
    assert_eq!(vip.name, "vipAddress");
    assert_eq!(vip.label.as_deref(), Some("Virtual IP"));
    assert_eq!(vip.qualifiers[0].name, "mandatory");
    assert_eq!(vip.qualifiers[0].value, "true");
    assert_eq!(vip.qualifiers[1].name, "regexp");
    assert_eq!(vip.qualifiers[1].value, r"^\d+\.\d+\.\d+\.\d+$");
    assert!(!step.groups[1].params[0]
        .qualifiers
        .iter()
        .any(|q| q.name == "mandatory" && q.value == "true"));
}

#[test]
fn parses_switch_conditions() {
    let xml = r#"<workflow root-name="item0">
  <attrib name="tier" type="string"/>
  <workflow-item name="item0" type="switch">
    <condition name="tier" type="string" comparator="equals" label="item1">gold</condition>
    <condition name="tier" type="string" comparator="equals" label="item2"><![CDATA[silver]]></condition>
  </workflow-item>
  <workflow-item name="item1" type="end"/>
  <workflow-item name="item2" type="end"/>
</workflow>"#;
    let doc = parse_workflow_str(xml, None).unwrap();
    let switch = doc.item("item0").unwrap();

    assert_eq!(switch.kind, ItemKind::Switch);
    assert_eq!(switch.conditions.len(), 2);
    assert_eq!(switch.conditions[1].value, "silver");
    assert_eq!(switch.conditions[1].target, "item2");
    assert_eq!(switch.successors().len(), 2);
    assert_eq!(doc.title(), "Untitled workflow");
}

#[test]
fn unknown_item_types_are_kept_verbatim() {
    let xml = r#"<workflow><workflow-item name="item0" type="nested-workflow"/></workflow>"#;
    let doc = parse_workflow_str(xml, Some("flows/nested.xml")).unwrap();
    assert_eq!(
        doc.items[0].kind,
        ItemKind::Other("nested-workflow".to_string())
    );
    assert_eq!(doc.title(), "nested");
}

#[test]
fn malformed_xml_reports_position() {
    let err = parse_workflow(&fixture("malformed.xml")).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ParseError);
    assert_eq!(err.code, "WORKFLOW_XML");
    assert!(err.message.contains("line 4"), "{}", err.message);
    assert!(err.context.get("file").unwrap().ends_with("malformed.xml"));
}

#[test]
fn wrong_root_element_is_rejected() {
    let err = parse_workflow_str("<action name=\"x\"/>", None).unwrap_err();
    assert_eq!(err.category, ErrorCategory::ValidationError);
    assert_eq!(err.code, "WORKFLOW_ROOT");
    assert!(err.message.contains("<action>"));
}

#[test]
fn item_without_name_is_rejected() {
    let xml = "<workflow>\n  <workflow-item type=\"task\"/>\n</workflow>";
    let err = parse_workflow_str(xml, None).unwrap_err();
    assert_eq!(err.code, "WORKFLOW_NAME");
    assert!(err.message.contains("line 2"), "{}", err.message);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = parse_workflow(&dir.path().join("absent.xml")).unwrap_err();
    assert_eq!(err.category, ErrorCategory::IoError);
}

#[test]
fn workflow_files_are_sniffed_by_extension_and_root() {
    let dir = TempDir::new().unwrap();
    let action = dir.path().join("action.xml");
    fs::write(&action, "<?xml version=\"1.0\"?>\n<dunes-script-module name=\"x\"/>").unwrap();
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "<workflow/>").unwrap();
    let prefixed = dir.path().join("prefixed.XML");
    fs::write(
        &prefixed,
        "<?xml version=\"1.0\"?>\n<!-- exported -->\n<ns2:workflow xmlns:ns2=\"urn:x\"/>",
    )
    .unwrap();

    assert!(is_workflow_file(&fixture("create_avi_lb.xml")));
    assert!(is_workflow_file(&prefixed));
    let commented = dir.path().join("commented.xml");
    fs::write(
        &commented,
        "<?xml version=\"1.0\"?>\n<!-- exported <b>by</b> tool -->\n<workflow root-name=\"item0\"/>",
    )
    .unwrap();
    assert!(is_workflow_file(&commented));
    assert!(!is_workflow_file(&action));
    assert!(!is_workflow_file(&notes));
}
