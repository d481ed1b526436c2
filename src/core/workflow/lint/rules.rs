#![allow(clippy::result_large_err)]

use super::{LintResult, LintSeverity, WorkflowLintRule};
use crate::core::config::LintConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::core::workflow::graph::FlowGraph;
use orchdoc_types::{EdgeKind, ItemKind, Parameter, WorkflowDocument, WorkflowItem};
use regex::Regex;
use std::collections::{HashMap, HashSet};

const DEFAULT_DISPLAY_NAMES: &str =
    r"(?i)^(scriptable task|decision|custom decision|switch|workflow element|action element)(\s*\d+)?$";
const EVAL_CALL: &str = r"\beval\s*\(";
const HARDCODED_CREDENTIAL: &str =
    r#"(?i)\b(password|passwd|pwd|secret|api_?key)\s*[:=]\s*["'][^"']+["']"#;
const TODO_MARKER: &str = r"\b(TODO|FIXME|XXX)\b";

/// Build every built-in rule, compiling configured patterns.
pub fn built_in_rules(config: &LintConfig) -> Result<Vec<Box<dyn WorkflowLintRule>>, AppError> {
    Ok(vec![
        Box::new(ParameterNamingRule {
            pattern: compile(&config.parameter_pattern)?,
        }),
        Box::new(AttributeNamingRule {
            pattern: compile(&config.attribute_pattern)?,
        }),
        Box::new(DefaultDisplayNameRule {
            pattern: compile(DEFAULT_DISPLAY_NAMES)?,
        }),
        Box::new(UnknownLinkTargetRule),
        Box::new(UnreachableItemRule),
        Box::new(UndeclaredBindingRule),
        Box::new(EmptyScriptRule),
        Box::new(UnsafeScriptRule {
            eval: compile(EVAL_CALL)?,
            credential: compile(HARDCODED_CREDENTIAL)?,
        }),
        Box::new(TodoMarkerRule {
            pattern: compile(TODO_MARKER)?,
        }),
        Box::new(UnusedAttributeRule),
        Box::new(MissingEndRule),
        Box::new(MissingDescriptionRule),
        Box::new(ForbiddenScriptPatternRule {
            patterns: config
                .forbidden_script_patterns
                .iter()
                .map(|pattern| compile(pattern))
                .collect::<Result<Vec<_>, AppError>>()?,
        }),
        Box::new(DuplicateItemNamesRule),
    ])
}

fn compile(pattern: &str) -> Result<Regex, AppError> {
    Regex::new(pattern).map_err(|err| {
        AppError::new(
            ErrorCategory::ConfigError,
            format!("invalid lint pattern '{}': {}", pattern, err),
        )
    })
}

struct ParameterNamingRule {
    pattern: Regex,
}

impl ParameterNamingRule {
    fn check(&self, direction: &str, params: &[Parameter], out: &mut Vec<LintResult>) {
        for param in params {
            if !self.pattern.is_match(&param.name) {
                out.push(LintResult::new(
                    self.code(),
                    LintSeverity::Warning,
                    format!(
                        "{} parameter '{}' does not match naming pattern {}",
                        direction,
                        param.name,
                        self.pattern.as_str()
                    ),
                    Some(param.name.clone()),
                    Some("rename the parameter to follow the naming convention".to_string()),
                ));
            }
        }
    }
}

impl WorkflowLintRule for ParameterNamingRule {
    fn code(&self) -> &'static str {
        "ODL-001"
    }

    fn validate(&self, workflow: &WorkflowDocument, _graph: &FlowGraph<'_>) -> Vec<LintResult> {
        let mut out = Vec::new();
        self.check("input", &workflow.inputs, &mut out);
        self.check("output", &workflow.outputs, &mut out);
        out
    }
}

struct AttributeNamingRule {
    pattern: Regex,
}

impl WorkflowLintRule for AttributeNamingRule {
    fn code(&self) -> &'static str {
        "ODL-002"
    }

    fn validate(&self, workflow: &WorkflowDocument, _graph: &FlowGraph<'_>) -> Vec<LintResult> {
        workflow
            .attributes
            .iter()
            .filter(|attr| !self.pattern.is_match(&attr.name))
            .map(|attr| {
                LintResult::new(
                    self.code(),
                    LintSeverity::Warning,
                    format!(
                        "attribute '{}' does not match naming pattern {}",
                        attr.name,
                        self.pattern.as_str()
                    ),
                    Some(attr.name.clone()),
                    Some("rename the attribute and update its bindings".to_string()),
                )
            })
            .collect()
    }
}

struct DefaultDisplayNameRule {
    pattern: Regex,
}

impl WorkflowLintRule for DefaultDisplayNameRule {
    fn code(&self) -> &'static str {
        "ODL-003"
    }

    fn validate(&self, workflow: &WorkflowDocument, _graph: &FlowGraph<'_>) -> Vec<LintResult> {
        let mut out = Vec::new();
        for item in &workflow.items {
            if !matches!(
                item.kind,
                ItemKind::Task
                    | ItemKind::CustomCondition
                    | ItemKind::Condition
                    | ItemKind::Switch
                    | ItemKind::Link
                    | ItemKind::Foreach
            ) {
                continue;
            }
            let message = match item.display_name.as_deref() {
                None => format!("item '{}' has no display name", item.name),
                Some(name) if self.pattern.is_match(name.trim()) => format!(
                    "item '{}' keeps the default display name '{}'",
                    item.name, name
                ),
                Some(_) => continue,
            };
            out.push(LintResult::new(
                self.code(),
                LintSeverity::Info,
                message,
                Some(item.name.clone()),
                Some("give the item a name describing what it does".to_string()),
            ));
        }
        out
    }
}

struct UnknownLinkTargetRule;

impl WorkflowLintRule for UnknownLinkTargetRule {
    fn code(&self) -> &'static str {
        "ODL-004"
    }

    fn validate(&self, _workflow: &WorkflowDocument, graph: &FlowGraph<'_>) -> Vec<LintResult> {
        graph
            .dangling_links()
            .iter()
            .map(|link| {
                let (message, location) = match &link.from {
                    Some(from) => (
                        format!(
                            "item '{}' links to unknown item '{}' ({})",
                            from, link.target, link.kind
                        ),
                        Some(from.clone()),
                    ),
                    None => (
                        format!(
                            "workflow {} references unknown item '{}'",
                            match link.kind {
                                EdgeKind::ErrorHandler => "error handler",
                                _ => "root-name",
                            },
                            link.target
                        ),
                        None,
                    ),
                };
                LintResult::new(
                    self.code(),
                    LintSeverity::Error,
                    message,
                    location,
                    Some("point the link at an existing item".to_string()),
                )
            })
            .collect()
    }
}

struct UnreachableItemRule;

impl WorkflowLintRule for UnreachableItemRule {
    fn code(&self) -> &'static str {
        "ODL-005"
    }

    fn validate(&self, _workflow: &WorkflowDocument, graph: &FlowGraph<'_>) -> Vec<LintResult> {
        graph
            .unreachable_items()
            .into_iter()
            .map(|name| {
                LintResult::new(
                    self.code(),
                    LintSeverity::Warning,
                    format!("item '{}' is unreachable from the root item", name),
                    Some(name),
                    Some("connect the item from a reachable link or remove it".to_string()),
                )
            })
            .collect()
    }
}

struct UndeclaredBindingRule;

impl WorkflowLintRule for UndeclaredBindingRule {
    fn code(&self) -> &'static str {
        "ODL-006"
    }

    fn validate(&self, workflow: &WorkflowDocument, _graph: &FlowGraph<'_>) -> Vec<LintResult> {
        let mut out = Vec::new();
        for item in &workflow.items {
            for binding in item.bindings() {
                let Some(export) = binding.export_name.as_deref() else {
                    continue;
                };
                if workflow.declared_variable(export).is_none() {
                    out.push(LintResult::new(
                        self.code(),
                        LintSeverity::Error,
                        format!(
                            "item '{}' binds '{}' to undeclared variable '{}'",
                            item.name, binding.name, export
                        ),
                        Some(item.name.clone()),
                        Some("declare the variable as an input, output or attribute".to_string()),
                    ));
                }
            }
        }
        out
    }
}

struct EmptyScriptRule;

impl WorkflowLintRule for EmptyScriptRule {
    fn code(&self) -> &'static str {
        "ODL-007"
    }

    fn validate(&self, workflow: &WorkflowDocument, _graph: &FlowGraph<'_>) -> Vec<LintResult> {
        workflow
            .items
            .iter()
            .filter(|item| item.kind.carries_script())
            .filter(|item| item.script.as_ref().map(|s| s.is_blank()).unwrap_or(true))
            .map(|item| {
                LintResult::new(
                    self.code(),
                    LintSeverity::Warning,
                    format!("{} '{}' has an empty script", item.kind.label(), item.name),
                    Some(item.name.clone()),
                    Some("implement the script or remove the item".to_string()),
                )
            })
            .collect()
    }
}

struct UnsafeScriptRule {
    eval: Regex,
    credential: Regex,
}

impl WorkflowLintRule for UnsafeScriptRule {
    fn code(&self) -> &'static str {
        "ODL-008"
    }

    fn validate(&self, workflow: &WorkflowDocument, _graph: &FlowGraph<'_>) -> Vec<LintResult> {
        let mut out = Vec::new();
        for (item, body) in scripts(workflow) {
            if let Some(line) = first_match_line(&self.eval, body) {
                out.push(LintResult::new(
                    self.code(),
                    LintSeverity::Error,
                    format!("script in '{}' calls eval() on line {}", item.name, line),
                    Some(item.name.clone()),
                    Some("replace eval() with explicit logic".to_string()),
                ));
            }
            if let Some(line) = first_match_line(&self.credential, body) {
                out.push(LintResult::new(
                    self.code(),
                    LintSeverity::Error,
                    format!(
                        "script in '{}' hard-codes a credential on line {}",
                        item.name, line
                    ),
                    Some(item.name.clone()),
                    Some("bind the secret from a SecureString input or attribute".to_string()),
                ));
            }
        }
        out
    }
}

struct TodoMarkerRule {
    pattern: Regex,
}

impl WorkflowLintRule for TodoMarkerRule {
    fn code(&self) -> &'static str {
        "ODL-009"
    }

    fn validate(&self, workflow: &WorkflowDocument, _graph: &FlowGraph<'_>) -> Vec<LintResult> {
        scripts(workflow)
            .into_iter()
            .filter_map(|(item, body)| {
                let count = self.pattern.find_iter(body).count();
                (count > 0).then(|| {
                    LintResult::new(
                        self.code(),
                        LintSeverity::Info,
                        format!(
                            "script in '{}' contains {} TODO/FIXME marker(s)",
                            item.name, count
                        ),
                        Some(item.name.clone()),
                        None,
                    )
                })
            })
            .collect()
    }
}

struct UnusedAttributeRule;

impl WorkflowLintRule for UnusedAttributeRule {
    fn code(&self) -> &'static str {
        "ODL-010"
    }

    fn validate(&self, workflow: &WorkflowDocument, _graph: &FlowGraph<'_>) -> Vec<LintResult> {
        let mut used: HashSet<&str> = HashSet::new();
        for item in &workflow.items {
            used.extend(item.bindings().filter_map(|b| b.export_name.as_deref()));
            used.extend(item.conditions.iter().map(|c| c.variable.as_str()));
            used.extend(item.throw_bind_name.as_deref());
        }
        used.extend(
            workflow
                .error_handlers
                .iter()
                .filter_map(|h| h.throw_bind_name.as_deref()),
        );

        workflow
            .attributes
            .iter()
            .filter(|attr| !used.contains(attr.name.as_str()))
            .map(|attr| {
                LintResult::new(
                    self.code(),
                    LintSeverity::Warning,
                    format!("attribute '{}' is never bound by any item", attr.name),
                    Some(attr.name.clone()),
                    Some("bind the attribute where it is needed or remove it".to_string()),
                )
            })
            .collect()
    }
}

struct MissingEndRule;

impl WorkflowLintRule for MissingEndRule {
    fn code(&self) -> &'static str {
        "ODL-011"
    }

    fn validate(&self, workflow: &WorkflowDocument, _graph: &FlowGraph<'_>) -> Vec<LintResult> {
        if workflow.items.iter().any(|item| item.kind == ItemKind::End) {
            return Vec::new();
        }
        vec![LintResult::new(
            self.code(),
            LintSeverity::Error,
            "workflow has no end item",
            None,
            Some("add an end item after the last step".to_string()),
        )]
    }
}

struct MissingDescriptionRule;

impl WorkflowLintRule for MissingDescriptionRule {
    fn code(&self) -> &'static str {
        "ODL-012"
    }

    fn validate(&self, workflow: &WorkflowDocument, _graph: &FlowGraph<'_>) -> Vec<LintResult> {
        if workflow.description.is_some() {
            return Vec::new();
        }
        vec![LintResult::new(
            self.code(),
            LintSeverity::Info,
            format!("workflow '{}' has no description", workflow.title()),
            None,
            Some("describe what the workflow does and who runs it".to_string()),
        )]
    }
}

struct ForbiddenScriptPatternRule {
    patterns: Vec<Regex>,
}

impl WorkflowLintRule for ForbiddenScriptPatternRule {
    fn code(&self) -> &'static str {
        "ODL-013"
    }

    fn validate(&self, workflow: &WorkflowDocument, _graph: &FlowGraph<'_>) -> Vec<LintResult> {
        let mut out = Vec::new();
        for (item, body) in scripts(workflow) {
            for pattern in &self.patterns {
                if let Some(line) = first_match_line(pattern, body) {
                    out.push(LintResult::new(
                        self.code(),
                        LintSeverity::Warning,
                        format!(
                            "script in '{}' matches forbidden pattern {} on line {}",
                            item.name,
                            pattern.as_str(),
                            line
                        ),
                        Some(item.name.clone()),
                        None,
                    ));
                }
            }
        }
        out
    }
}

struct DuplicateItemNamesRule;

impl WorkflowLintRule for DuplicateItemNamesRule {
    fn code(&self) -> &'static str {
        "ODL-014"
    }

    fn validate(&self, workflow: &WorkflowDocument, _graph: &FlowGraph<'_>) -> Vec<LintResult> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for item in &workflow.items {
            *counts.entry(item.name.as_str()).or_insert(0) += 1;
        }

        let mut out = Vec::new();
        for (name, count) in counts {
            if count > 1 {
                out.push(LintResult::new(
                    self.code(),
                    LintSeverity::Error,
                    format!("duplicate item name '{}' found {} times", name, count),
                    Some(name.to_string()),
                    Some("rename items so every item name is unique".to_string()),
                ));
            }
        }
        out
    }
}

/// Items with a non-empty script, paired with the script body.
fn scripts(workflow: &WorkflowDocument) -> Vec<(&WorkflowItem, &str)> {
    workflow
        .items
        .iter()
        .filter_map(|item| {
            item.script
                .as_ref()
                .filter(|script| !script.is_blank())
                .map(|script| (item, script.body.as_str()))
        })
        .collect()
}

/// 1-based line of the first match, if any.
fn first_match_line(pattern: &Regex, body: &str) -> Option<usize> {
    pattern
        .find(body)
        .map(|m| body[..m.start()].matches('\n').count() + 1)
}
