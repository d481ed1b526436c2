#![allow(clippy::result_large_err)]

use crate::core::config::LintConfig;
use crate::core::error::AppError;
use crate::core::workflow::graph::FlowGraph;
use orchdoc_types::WorkflowDocument;
use serde::Serialize;
use std::fmt;

pub mod rules;
pub use rules::built_in_rules;

/// Diagnostic severity levels emitted by workflow lint rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    Error,
    Warning,
    Info,
}

impl LintSeverity {
    fn rank(&self) -> u8 {
        match self {
            LintSeverity::Error => 3,
            LintSeverity::Warning => 2,
            LintSeverity::Info => 1,
        }
    }
}

impl fmt::Display for LintSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintSeverity::Error => write!(f, "Error"),
            LintSeverity::Warning => write!(f, "Warning"),
            LintSeverity::Info => write!(f, "Info"),
        }
    }
}

/// Individual lint/validation result emitted by a rule.
#[derive(Debug, Clone, Serialize)]
pub struct LintResult {
    pub code: String,
    pub severity: LintSeverity,
    pub message: String,
    pub location: Option<String>,
    pub suggestion: Option<String>,
}

impl LintResult {
    /// Create a new lint result with optional location and suggestion.
    pub fn new(
        code: impl Into<String>,
        severity: LintSeverity,
        message: impl Into<String>,
        location: Option<String>,
        suggestion: Option<String>,
    ) -> Self {
        Self {
            code: code.into(),
            severity,
            message: message.into(),
            location,
            suggestion,
        }
    }
}

/// Trait implemented by workflow lint rules.
pub trait WorkflowLintRule {
    /// Stable code reported with every result of this rule.
    fn code(&self) -> &'static str;

    fn validate(&self, workflow: &WorkflowDocument, graph: &FlowGraph<'_>) -> Vec<LintResult>;
}

/// Registry that runs all enabled workflow lint rules.
pub struct LintRegistry {
    rules: Vec<Box<dyn WorkflowLintRule>>,
}

impl LintRegistry {
    /// Construct a registry with the built-in rules minus those disabled in `config`.
    pub fn new(config: &LintConfig) -> Result<Self, AppError> {
        let rules = built_in_rules(config)?
            .into_iter()
            .filter(|rule| !config.disabled_rules.iter().any(|code| code == rule.code()))
            .collect();
        Ok(Self { rules })
    }

    /// Codes of the rules that will run.
    pub fn codes(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.code()).collect()
    }

    /// Run all registered lint rules against the workflow document.
    /// The results are already sorted by `(severity desc, code asc, location asc)`.
    pub fn run(&self, workflow: &WorkflowDocument) -> Vec<LintResult> {
        let graph = FlowGraph::build(workflow);
        let mut results = Vec::new();
        for rule in &self.rules {
            results.extend(rule.validate(workflow, &graph));
        }
        results.sort_by(|a, b| {
            let severity_cmp = b.severity.rank().cmp(&a.severity.rank());
            severity_cmp
                .then(a.code.cmp(&b.code))
                .then(a.location.cmp(&b.location))
        });
        results
    }
}

/// Count results per severity as `(errors, warnings, infos)`.
pub fn tally(results: &[LintResult]) -> (usize, usize, usize) {
    results
        .iter()
        .fold((0, 0, 0), |(e, w, i), result| match result.severity {
            LintSeverity::Error => (e + 1, w, i),
            LintSeverity::Warning => (e, w + 1, i),
            LintSeverity::Info => (e, w, i + 1),
        })
}
