#![allow(clippy::result_large_err)] // Parser APIs return AppError to keep file/line context without boxing.

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use orchdoc_types::{
    Attribute, Binding, ErrorHandler, ItemKind, Parameter, Presentation, PresentationGroup,
    PresentationParam, PresentationStep, Qualifier, Script, SwitchCondition, WorkflowDocument,
    WorkflowItem,
};
use roxmltree::{Document, Node};
use std::fs;
use std::io::Read;
use std::path::Path;

const ROOT_ELEMENT: &str = "workflow";

/// Read and parse a workflow definition from disk.
pub fn parse_workflow(path: &Path) -> Result<WorkflowDocument, AppError> {
    let raw = fs::read_to_string(path).map_err(|err| {
        AppError::with_source(
            ErrorCategory::IoError,
            format!("failed to read workflow {}", path.display()),
            err,
        )
    })?;
    let source = path.display().to_string();
    parse_workflow_str(&raw, Some(&source)).map_err(|mut err| {
        err.add_context("file", &source);
        err
    })
}

/// Parse a workflow definition held in memory.
pub fn parse_workflow_str(xml: &str, source: Option<&str>) -> Result<WorkflowDocument, AppError> {
    let document = Document::parse(xml).map_err(|err| {
        let pos = err.pos();
        AppError::new(
            ErrorCategory::ParseError,
            format!(
                "malformed workflow XML at line {}, column {}: {}",
                pos.row, pos.col, err
            ),
        )
        .with_code("WORKFLOW_XML")
    })?;

    let root = document.root_element();
    if root.tag_name().name() != ROOT_ELEMENT {
        return Err(AppError::new(
            ErrorCategory::ValidationError,
            format!(
                "expected root element <{}>, found <{}>",
                ROOT_ELEMENT,
                root.tag_name().name()
            ),
        )
        .with_code("WORKFLOW_ROOT"));
    }

    let mut workflow = WorkflowDocument {
        id: attr(root, "id"),
        display_name: child_text(root, "display-name"),
        description: child_text(root, "description"),
        version: attr(root, "version"),
        api_version: attr(root, "api-version"),
        root_item: attr(root, "root-name"),
        source: source.map(str::to_string),
        ..WorkflowDocument::default()
    };

    for child in elements(root) {
        match child.tag_name().name() {
            "input" => workflow.inputs.extend(parse_params(child)),
            "output" => workflow.outputs.extend(parse_params(child)),
            "attrib" => workflow.attributes.push(parse_attribute(child)?),
            "workflow-item" => workflow.items.push(parse_item(child)?),
            "error-handler" => {
                if let Some(target) = attr(child, "name") {
                    workflow.error_handlers.push(ErrorHandler {
                        target,
                        throw_bind_name: attr(child, "throw-bind-name"),
                    });
                }
            }
            "presentation" => workflow.presentation = parse_presentation(child),
            _ => {}
        }
    }

    tracing::debug!(
        workflow = %workflow.title(),
        items = workflow.items.len(),
        inputs = workflow.inputs.len(),
        "parsed workflow definition"
    );
    Ok(workflow)
}

/// Cheap check that a file looks like a workflow definition, without building a tree.
pub fn is_workflow_file(path: &Path) -> bool {
    let is_xml = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("xml"))
        .unwrap_or(false);
    if !is_xml {
        return false;
    }
    let Ok(file) = fs::File::open(path) else {
        return false;
    };
    let mut head = Vec::with_capacity(4096);
    if file.take(4096).read_to_end(&mut head).is_err() {
        return false;
    }
    sniff_root(&String::from_utf8_lossy(&head)) == Some(ROOT_ELEMENT)
}

/// Return the local name of the first element in the text, skipping the prolog.
fn sniff_root(head: &str) -> Option<&str> {
    let mut rest = head;
    loop {
        let start = rest.find('<')?;
        rest = &rest[start + 1..];
        let terminator = if rest.starts_with("!--") {
            Some("-->")
        } else if rest.starts_with('?') {
            Some("?>")
        } else if rest.starts_with('!') {
            Some(">")
        } else {
            None
        };
        if let Some(terminator) = terminator {
            let close = rest.find(terminator)?;
            rest = &rest[close + terminator.len()..];
            continue;
        }
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..end];
        return Some(name.rsplit(':').next().unwrap_or(name));
    }
}

fn parse_params(node: Node) -> Vec<Parameter> {
    elements(node)
        .filter(|child| child.tag_name().name() == "param")
        .filter_map(|param| {
            Some(Parameter {
                name: attr(param, "name")?,
                type_name: attr(param, "type").unwrap_or_default(),
                description: child_text(param, "description"),
            })
        })
        .collect()
}

fn parse_attribute(node: Node) -> Result<Attribute, AppError> {
    let name = attr(node, "name").ok_or_else(|| missing_name("attrib", node))?;
    Ok(Attribute {
        name,
        type_name: attr(node, "type").unwrap_or_default(),
        read_only: attr(node, "read-only")
            .map(|raw| raw.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        value: child_text(node, "value"),
        description: child_text(node, "description"),
    })
}

fn parse_item(node: Node) -> Result<WorkflowItem, AppError> {
    let name = attr(node, "name").ok_or_else(|| missing_name("workflow-item", node))?;
    let kind = ItemKind::from_xml(&attr(node, "type").unwrap_or_default());
    let mut item = WorkflowItem::new(name, kind);
    item.out_name = attr(node, "out-name");
    item.alt_out_name = attr(node, "alt-out-name");
    item.catch_name = attr(node, "catch-name");
    item.throw_bind_name = attr(node, "throw-bind-name");
    item.linked_workflow_id = attr(node, "linked-workflow-id");
    item.end_mode = attr(node, "end-mode");

    for child in elements(node) {
        match child.tag_name().name() {
            "display-name" => item.display_name = text_of(child),
            "description" => item.description = text_of(child),
            "script" => {
                item.script = Some(Script {
                    body: script_body(child),
                    encoded: attr(child, "encoded")
                        .map(|raw| raw == "true")
                        .unwrap_or(false),
                })
            }
            "in-binding" => item.in_bindings = parse_bindings(child),
            "out-binding" => item.out_bindings = parse_bindings(child),
            "condition" => item.conditions.push(SwitchCondition {
                variable: attr(child, "name").unwrap_or_default(),
                type_name: attr(child, "type").unwrap_or_default(),
                comparator: attr(child, "comparator").unwrap_or_default(),
                target: attr(child, "label").unwrap_or_default(),
                value: text_of(child).unwrap_or_default(),
            }),
            _ => {}
        }
    }
    Ok(item)
}

fn parse_bindings(node: Node) -> Vec<Binding> {
    elements(node)
        .filter(|child| child.tag_name().name() == "bind")
        .filter_map(|bind| {
            Some(Binding {
                name: attr(bind, "name")?,
                type_name: attr(bind, "type").unwrap_or_default(),
                export_name: attr(bind, "export-name"),
            })
        })
        .collect()
}

fn parse_presentation(node: Node) -> Presentation {
    let mut presentation = Presentation::default();
    for child in elements(node) {
        match child.tag_name().name() {
            "p-step" => {
                let mut step = PresentationStep {
                    title: child_text(child, "title"),
                    ..PresentationStep::default()
                };
                for grandchild in elements(child) {
                    match grandchild.tag_name().name() {
                        "p-group" => step.groups.push(PresentationGroup {
                            title: child_text(grandchild, "title"),
                            params: presentation_params(grandchild),
                        }),
                        "p-param" => step.params.extend(presentation_param(grandchild)),
                        _ => {}
                    }
                }
                presentation.steps.push(step);
            }
            "p-param" => presentation.params.extend(presentation_param(child)),
            _ => {}
        }
    }
    presentation
}

fn presentation_params(node: Node) -> Vec<PresentationParam> {
    elements(node)
        .filter(|child| child.tag_name().name() == "p-param")
        .filter_map(presentation_param)
        .collect()
}

fn presentation_param(node: Node) -> Option<PresentationParam> {
    Some(PresentationParam {
        name: attr(node, "name")?,
        label: child_text(node, "desc"),
        qualifiers: elements(node)
            .filter(|child| child.tag_name().name() == "p-qual")
            .map(|qual| Qualifier {
                kind: attr(qual, "kind").unwrap_or_default(),
                name: attr(qual, "name").unwrap_or_default(),
                type_name: attr(qual, "type"),
                value: text_of(qual).unwrap_or_default(),
            })
            .collect(),
    })
}

fn missing_name(element: &str, node: Node) -> AppError {
    let pos = node.document().text_pos_at(node.range().start);
    AppError::new(
        ErrorCategory::ValidationError,
        format!(
            "<{}> at line {}, column {} has no name attribute",
            element, pos.row, pos.col
        ),
    )
    .with_code("WORKFLOW_NAME")
}

fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

fn attr(node: Node, name: &str) -> Option<String> {
    node.attribute(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn child_text(node: Node, name: &str) -> Option<String> {
    elements(node)
        .find(|child| child.tag_name().name() == name)
        .and_then(text_of)
}

/// Concatenated text and CDATA content, trimmed; `None` when blank.
fn text_of(node: Node) -> Option<String> {
    let raw = raw_text(node);
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn raw_text(node: Node) -> String {
    node.children()
        .filter(|child| child.is_text())
        .filter_map(|child| child.text())
        .collect()
}

/// Script text with surrounding blank lines removed and interior indentation preserved.
fn script_body(node: Node) -> String {
    let raw = raw_text(node);
    let lines: Vec<&str> = raw.lines().collect();
    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => lines[first..=last]
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}
