use orchdoc::core::config::DocsConfig;
use orchdoc::core::workflow::docs::{Manifest, INDEX_FILE, MANIFEST_FILE};
use orchdoc::core::workflow::{DocsGenerator, RenderOptions};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Scratch folder holding copies of the given fixtures under `flows/`.
fn workspace(fixtures: &[&str]) -> (TempDir, PathBuf, PathBuf) {
    let dir = TempDir::new().unwrap();
    let flows = dir.path().join("flows");
    fs::create_dir_all(&flows).unwrap();
    for name in fixtures {
        fs::copy(fixture(name), flows.join(name)).unwrap();
    }
    let out = dir.path().join("docs");
    (dir, flows, out)
}

fn generator() -> DocsGenerator {
    DocsGenerator::new(DocsConfig::default())
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn writes_one_report_per_workflow_and_an_index() {
    let (_dir, flows, out) = workspace(&["create_avi_lb.xml", "broken_flow.xml"]);
    fs::write(flows.join("README.txt"), "not a workflow").unwrap();

    let summary = generator().generate(&[flows.clone()], &out, false).unwrap();

    assert_eq!(summary.written.len(), 2);
    assert!(summary.unchanged.is_empty());
    assert!(summary.failed.is_empty());
    assert_eq!(summary.index.as_deref(), Some(out.join(INDEX_FILE).as_path()));

    let report = read(&out.join("create-avi-load-balancer.md"));
    assert!(report.starts_with("# Create AVI Load Balancer\n"));
    assert!(read(&out.join("broken-flow.md")).starts_with("# Broken flow\n"));

    let index = read(&out.join(INDEX_FILE));
    let expected = format!(
        "# Workflow Documentation\n\n| Workflow | Description | Source |\n|---|---|---|\n| [Broken flow](broken-flow.md) | - | `{}` |\n| [Create AVI Load Balancer](create-avi-load-balancer.md) | Creates a pool and a virtual service on the AVI controller. | `{}` |\n",
        flows.join("broken_flow.xml").display(),
        flows.join("create_avi_lb.xml").display()
    );
    assert_eq!(index, expected);
}

#[test]
fn unchanged_sources_are_skipped_until_they_change() {
    let (_dir, flows, out) = workspace(&["create_avi_lb.xml", "broken_flow.xml"]);
    generator().generate(&[flows.clone()], &out, false).unwrap();

    let second = generator().generate(&[flows.clone()], &out, false).unwrap();
    assert!(second.written.is_empty());
    assert_eq!(second.unchanged.len(), 2);

    let source = flows.join("broken_flow.xml");
    let edited = read(&source).replace("Orphan step", "Orphaned step");
    fs::write(&source, edited).unwrap();

    let third = generator().generate(&[flows.clone()], &out, false).unwrap();
    assert_eq!(third.written, vec![out.join("broken-flow.md")]);
    assert_eq!(third.unchanged, vec![out.join("create-avi-load-balancer.md")]);
    assert!(read(&out.join("broken-flow.md")).contains("Orphaned step"));
}

#[test]
fn changed_render_options_rewrite_reports() {
    let (_dir, flows, out) = workspace(&["create_avi_lb.xml"]);
    let report = out.join("create-avi-load-balancer.md");
    generator().generate(&[flows.clone()], &out, false).unwrap();
    assert!(read(&report).contains("```javascript"));
    assert!(read(&report).contains("svc-orchestrator"));

    let no_scripts = RenderOptions {
        include_scripts: false,
        ..generator().options().clone()
    };
    let second = generator()
        .with_options(no_scripts.clone())
        .generate(&[flows.clone()], &out, false)
        .unwrap();
    assert_eq!(second.written, vec![report.clone()]);
    assert!(!read(&report).contains("```javascript"));

    let masked = RenderOptions {
        masked_types: vec!["SecureString".to_string(), "string".to_string()],
        ..no_scripts.clone()
    };
    let third = generator()
        .with_options(masked)
        .generate(&[flows.clone()], &out, false)
        .unwrap();
    assert_eq!(third.written, vec![report.clone()]);
    assert!(!read(&report).contains("svc-orchestrator"));
}

#[test]
fn mask_order_does_not_change_the_fingerprint() {
    let a = RenderOptions {
        masked_types: vec!["string".to_string(), "SecureString".to_string()],
        ..RenderOptions::default()
    };
    let b = RenderOptions {
        masked_types: vec!["SecureString".to_string(), "string".to_string()],
        ..RenderOptions::default()
    };
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_ne!(a.fingerprint(), RenderOptions::default().fingerprint());
}

#[test]
fn force_and_missing_outputs_trigger_regeneration() {
    let (_dir, flows, out) = workspace(&["create_avi_lb.xml"]);
    generator().generate(&[flows.clone()], &out, false).unwrap();

    let forced = generator().generate(&[flows.clone()], &out, true).unwrap();
    assert_eq!(forced.written.len(), 1);

    fs::remove_file(out.join("create-avi-load-balancer.md")).unwrap();
    let rebuilt = generator().generate(&[flows.clone()], &out, false).unwrap();
    assert_eq!(rebuilt.written.len(), 1);
    assert!(out.join("create-avi-load-balancer.md").exists());
}

#[test]
fn manifest_records_digest_and_output() {
    let (_dir, flows, out) = workspace(&["create_avi_lb.xml"]);
    generator().generate(&[flows.clone()], &out, false).unwrap();

    assert!(out.join(MANIFEST_FILE).exists());
    let manifest = Manifest::load(&out);
    let key = flows.join("create_avi_lb.xml").display().to_string();
    let entry = manifest.entries.get(&key).unwrap();
    assert_eq!(entry.output, "create-avi-load-balancer.md");
    assert_eq!(entry.title, "Create AVI Load Balancer");
    assert_eq!(entry.digest.len(), 64);
}

#[test]
fn parse_failures_are_reported_without_aborting() {
    let (_dir, flows, out) = workspace(&["create_avi_lb.xml", "malformed.xml"]);

    let summary = generator().generate(&[flows.clone()], &out, false).unwrap();

    assert_eq!(summary.written.len(), 1);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, flows.join("malformed.xml"));
    assert!(summary.failed[0].1.contains("malformed workflow XML"));
    assert_eq!(summary.total(), 2);
}

#[test]
fn every_input_failing_is_an_error() {
    let (_dir, flows, out) = workspace(&["malformed.xml"]);

    let err = generator().generate(&[flows], &out, false).unwrap_err();
    assert_eq!(err.code, "ALL_WORKFLOWS_FAILED");
    assert!(!out.join(INDEX_FILE).exists());
}

#[test]
fn empty_inputs_are_an_error() {
    let (_dir, flows, out) = workspace(&[]);

    let err = generator().generate(&[flows], &out, false).unwrap_err();
    assert_eq!(err.code, "NO_WORKFLOWS");

    let missing = generator()
        .generate(&[PathBuf::from("/definitely/not/here")], &out, false)
        .unwrap_err();
    assert_eq!(missing.code, "INPUT_NOT_FOUND");
}

#[test]
fn colliding_titles_get_numbered_slugs() {
    let (_dir, flows, out) = workspace(&["create_avi_lb.xml"]);
    let nested = flows.join("copy");
    fs::create_dir_all(&nested).unwrap();
    fs::copy(fixture("create_avi_lb.xml"), nested.join("create_avi_lb.xml")).unwrap();

    let summary = generator().generate(&[flows], &out, false).unwrap();

    assert_eq!(summary.written.len(), 2);
    assert!(out.join("create-avi-load-balancer.md").exists());
    assert!(out.join("create-avi-load-balancer-2.md").exists());
}

#[test]
fn configuration_controls_index_title_and_content() {
    let (_dir, flows, out) = workspace(&["create_avi_lb.xml"]);
    let config = DocsConfig {
        index_title: "AVI runbooks".to_string(),
        ..DocsConfig::default()
    };
    let options = RenderOptions {
        include_scripts: false,
        ..RenderOptions::default()
    };

    DocsGenerator::new(config)
        .with_options(options)
        .generate(&[flows], &out, false)
        .unwrap();

    assert!(read(&out.join(INDEX_FILE)).starts_with("# AVI runbooks\n"));
    assert!(!read(&out.join("create-avi-load-balancer.md")).contains("```javascript"));
}
