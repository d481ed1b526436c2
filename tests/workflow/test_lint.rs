use insta::assert_snapshot;
use orchdoc::core::config::LintConfig;
use orchdoc::core::workflow::lint::{tally, LintRegistry, LintResult, LintSeverity};
use orchdoc::core::workflow::{parse_workflow, parse_workflow_str};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn lint_fixture(name: &str, config: &LintConfig) -> Vec<LintResult> {
    let document = parse_workflow(&fixture(name)).expect("parse workflow");
    LintRegistry::new(config).expect("registry").run(&document)
}

fn summarize(results: &[LintResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "{} {} [{}] {}",
                r.severity,
                r.code,
                r.location.as_deref().unwrap_or("-"),
                r.message
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn clean_workflow_has_no_findings() {
    let results = lint_fixture("create_avi_lb.xml", &LintConfig::default());
    assert!(results.is_empty(), "{}", summarize(&results));
}

#[test]
fn broken_workflow_reports_every_rule_sorted() {
    let results = lint_fixture("broken_flow.xml", &LintConfig::default());

    assert_snapshot!(summarize(&results), @r###"
    Error ODL-004 [item0] item 'item0' links to unknown item 'item9' (next)
    Error ODL-006 [item0] item 'item0' binds 'payload' to undeclared variable 'missingVar'
    Error ODL-008 [item0] script in 'item0' calls eval() on line 1
    Error ODL-008 [item0] script in 'item0' hard-codes a credential on line 2
    Error ODL-011 [-] workflow has no end item
    Warning ODL-001 [LB_Name] input parameter 'LB_Name' does not match naming pattern ^[a-z][a-zA-Z0-9]*$
    Warning ODL-002 [unused_attr] attribute 'unused_attr' does not match naming pattern ^[a-z][a-zA-Z0-9]*$
    Warning ODL-005 [item1] item 'item1' is unreachable from the root item
    Warning ODL-007 [item1] Scriptable task 'item1' has an empty script
    Warning ODL-010 [unused_attr] attribute 'unused_attr' is never bound by any item
    Info ODL-003 [item0] item 'item0' keeps the default display name 'Scriptable task'
    Info ODL-009 [item0] script in 'item0' contains 1 TODO/FIXME marker(s)
    Info ODL-012 [-] workflow 'Broken flow' has no description
    "###);

    assert_eq!(tally(&results), (5, 5, 3));
}

#[test]
fn results_are_stably_sorted() {
    let results = lint_fixture("broken_flow.xml", &LintConfig::default());
    for pair in results.windows(2) {
        let (left, right) = (&pair[0], &pair[1]);
        let rank = |s: LintSeverity| match s {
            LintSeverity::Error => 3,
            LintSeverity::Warning => 2,
            LintSeverity::Info => 1,
        };
        assert!(rank(left.severity) >= rank(right.severity));
        if left.severity == right.severity {
            assert!(left.code <= right.code);
            if left.code == right.code {
                assert!(left.location <= right.location);
            }
        }
    }
}

#[test]
fn disabled_rules_are_skipped() {
    let config = LintConfig {
        disabled_rules: vec!["ODL-008".to_string(), "ODL-012".to_string()],
        ..LintConfig::default()
    };
    let registry = LintRegistry::new(&config).unwrap();
    assert!(!registry.codes().contains(&"ODL-008"));
    assert_eq!(registry.codes().len(), 12);

    let results = lint_fixture("broken_flow.xml", &config);
    assert!(results
        .iter()
        .all(|r| r.code != "ODL-008" && r.code != "ODL-012"));
}

#[test]
fn naming_patterns_are_configurable() {
    let config = LintConfig {
        parameter_pattern: "^[A-Za-z_]+$".to_string(),
        attribute_pattern: "^[a-z_]+$".to_string(),
        ..LintConfig::default()
    };
    let results = lint_fixture("broken_flow.xml", &config);
    assert!(results
        .iter()
        .all(|r| r.code != "ODL-001" && r.code != "ODL-002"));
}

#[test]
fn invalid_configured_pattern_is_a_config_error() {
    let config = LintConfig {
        forbidden_script_patterns: vec!["(unclosed".to_string()],
        ..LintConfig::default()
    };
    let err = LintRegistry::new(&config).err().expect("invalid pattern");
    assert!(err.message.contains("(unclosed"));
}

#[test]
fn forbidden_script_patterns_report_line_numbers() {
    let config = LintConfig {
        forbidden_script_patterns: vec![r"System\.getModule".to_string()],
        ..LintConfig::default()
    };
    let results = lint_fixture("create_avi_lb.xml", &config);

    assert_snapshot!(summarize(&results), @r###"
    Warning ODL-013 [item1] script in 'item1' matches forbidden pattern System\.getModule on line 1
    Warning ODL-013 [item2] script in 'item2' matches forbidden pattern System\.getModule on line 1
    Warning ODL-013 [item3] script in 'item3' matches forbidden pattern System\.getModule on line 1
    "###);
}

#[test]
fn duplicate_names_and_dangling_handlers_are_errors() {
    let xml = r#"<workflow root-name="item0">
  <description>dupes</description>
  <error-handler name="ghost"/>
  <workflow-item name="item0" out-name="item1" type="end"/>
  <workflow-item name="item0" type="end"/>
</workflow>"#;
    let document = parse_workflow_str(xml, None).unwrap();
    let results = LintRegistry::new(&LintConfig::default())
        .unwrap()
        .run(&document);

    assert_snapshot!(summarize(&results), @r###"
    Error ODL-004 [-] workflow error handler references unknown item 'ghost'
    Error ODL-004 [item0] item 'item0' links to unknown item 'item1' (next)
    Error ODL-014 [item0] duplicate item name 'item0' found 2 times
    "###);
}

#[test]
fn results_serialize_with_lowercase_severity() {
    let results = lint_fixture("broken_flow.xml", &LintConfig::default());
    let json = serde_json::to_value(&results[0]).unwrap();
    assert_eq!(json["severity"], "error");
    assert_eq!(json["code"], "ODL-004");
    assert_eq!(json["suggestion"], "point the link at an existing item");
}

#[test]
fn condition_items_with_default_names_are_reported() {
    let xml = r#"<workflow root-name="item0">
  <description>decides</description>
  <workflow-item name="item0" type="condition" out-name="item1" alt-out-name="item1">
    <display-name>Decision</display-name>
  </workflow-item>
  <workflow-item name="item1" type="end"/>
</workflow>"#;
    let document = parse_workflow_str(xml, None).unwrap();
    let results = LintRegistry::new(&LintConfig::default())
        .unwrap()
        .run(&document);

    assert_snapshot!(summarize(&results), @r###"
    Info ODL-003 [item0] item 'item0' keeps the default display name 'Decision'
    "###);
}
