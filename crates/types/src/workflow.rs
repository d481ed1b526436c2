use crate::presentation::Presentation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Root of a parsed workflow definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub version: Option<String>,
    pub api_version: Option<String>,
    /// Name of the first item executed.
    pub root_item: Option<String>,
    /// File the document was read from, when known.
    pub source: Option<String>,
    pub inputs: Vec<Parameter>,
    pub outputs: Vec<Parameter>,
    pub attributes: Vec<Attribute>,
    pub items: Vec<WorkflowItem>,
    pub error_handlers: Vec<ErrorHandler>,
    pub presentation: Presentation,
}

impl WorkflowDocument {
    /// Human title: display name, then id, then the source file stem.
    pub fn title(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if let Some(id) = self.id.as_deref().filter(|id| !id.is_empty()) {
            return id.to_string();
        }
        self.source
            .as_deref()
            .and_then(|source| {
                std::path::Path::new(source)
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "Untitled workflow".to_string())
    }

    pub fn item(&self, name: &str) -> Option<&WorkflowItem> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Look up a name across inputs, outputs and attributes.
    pub fn declared_variable(&self, name: &str) -> Option<&str> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .find(|param| param.name == name)
            .map(|param| param.type_name.as_str())
            .or_else(|| {
                self.attributes
                    .iter()
                    .find(|attr| attr.name == name)
                    .map(|attr| attr.type_name.as_str())
            })
    }
}

/// Workflow input or output parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    pub description: Option<String>,
}

/// Workflow-scoped variable (`attrib`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub type_name: String,
    pub read_only: bool,
    pub value: Option<String>,
    pub description: Option<String>,
}

/// Parameter binding on an item (`in-binding/bind` or `out-binding/bind`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Name local to the item.
    pub name: String,
    pub type_name: String,
    /// Workflow parameter or attribute the local name is bound to.
    pub export_name: Option<String>,
}

/// Script body embedded in a task or condition item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub body: String,
    pub encoded: bool,
}

impl Script {
    pub fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }
}

/// One case of a switch item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchCondition {
    pub variable: String,
    pub type_name: String,
    pub comparator: String,
    /// Item executed when the case matches.
    pub target: String,
    pub value: String,
}

/// Workflow-level default error handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHandler {
    /// Item that receives control when an unhandled error is raised.
    pub target: String,
    pub throw_bind_name: Option<String>,
}

/// Kind of a workflow item, as written in its `type` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Task,
    CustomCondition,
    Condition,
    Switch,
    Link,
    Foreach,
    WaitingEvent,
    Input,
    End,
    Other(String),
}

impl ItemKind {
    pub fn from_xml(raw: &str) -> Self {
        match raw.trim() {
            "task" => ItemKind::Task,
            "custom-condition" => ItemKind::CustomCondition,
            "condition" => ItemKind::Condition,
            "switch" => ItemKind::Switch,
            "link" => ItemKind::Link,
            "foreach" => ItemKind::Foreach,
            "waiting-event" => ItemKind::WaitingEvent,
            "input" => ItemKind::Input,
            "end" => ItemKind::End,
            other => ItemKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ItemKind::Task => "task",
            ItemKind::CustomCondition => "custom-condition",
            ItemKind::Condition => "condition",
            ItemKind::Switch => "switch",
            ItemKind::Link => "link",
            ItemKind::Foreach => "foreach",
            ItemKind::WaitingEvent => "waiting-event",
            ItemKind::Input => "input",
            ItemKind::End => "end",
            ItemKind::Other(raw) => raw.as_str(),
        }
    }

    /// Label shown in reports.
    pub fn label(&self) -> &str {
        match self {
            ItemKind::Task => "Scriptable task",
            ItemKind::CustomCondition => "Decision",
            ItemKind::Condition => "Condition",
            ItemKind::Switch => "Switch",
            ItemKind::Link => "Workflow element",
            ItemKind::Foreach => "Foreach",
            ItemKind::WaitingEvent => "Waiting event",
            ItemKind::Input => "User interaction",
            ItemKind::End => "End",
            ItemKind::Other(raw) => raw.as_str(),
        }
    }

    pub fn carries_script(&self) -> bool {
        matches!(self, ItemKind::Task | ItemKind::CustomCondition)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of control-flow edge leaving an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Next,
    Alternative,
    Case(String),
    OnError,
    ErrorHandler,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeKind::Next => write!(f, "next"),
            EdgeKind::Alternative => write!(f, "alternative"),
            EdgeKind::Case(label) => write!(f, "case {}", label),
            EdgeKind::OnError => write!(f, "on error"),
            EdgeKind::ErrorHandler => write!(f, "error handler"),
        }
    }
}

/// A single step of the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowItem {
    pub name: String,
    pub kind: ItemKind,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub script: Option<Script>,
    pub in_bindings: Vec<Binding>,
    pub out_bindings: Vec<Binding>,
    pub out_name: Option<String>,
    pub alt_out_name: Option<String>,
    pub catch_name: Option<String>,
    pub throw_bind_name: Option<String>,
    pub linked_workflow_id: Option<String>,
    pub end_mode: Option<String>,
    pub conditions: Vec<SwitchCondition>,
}

impl WorkflowItem {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            display_name: None,
            description: None,
            script: None,
            in_bindings: Vec::new(),
            out_bindings: Vec::new(),
            out_name: None,
            alt_out_name: None,
            catch_name: None,
            throw_bind_name: None,
            linked_workflow_id: None,
            end_mode: None,
            conditions: Vec::new(),
        }
    }

    /// Display name, or the item name when none is set.
    pub fn title(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.name)
    }

    /// End item that raises an error instead of completing the run.
    pub fn is_error_end(&self) -> bool {
        self.kind == ItemKind::End && self.end_mode.as_deref() == Some("1")
    }

    /// Outgoing edges in traversal order: next, alternative, switch cases, then catch.
    pub fn successors(&self) -> Vec<(EdgeKind, &str)> {
        let mut edges = Vec::new();
        if let Some(out) = self.out_name.as_deref() {
            edges.push((EdgeKind::Next, out));
        }
        if let Some(alt) = self.alt_out_name.as_deref() {
            edges.push((EdgeKind::Alternative, alt));
        }
        for condition in &self.conditions {
            let label = format!(
                "{} {} {}",
                condition.variable, condition.comparator, condition.value
            );
            edges.push((EdgeKind::Case(label.trim().to_string()), condition.target.as_str()));
        }
        if let Some(catch) = self.catch_name.as_deref() {
            edges.push((EdgeKind::OnError, catch));
        }
        edges
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.in_bindings.iter().chain(self.out_bindings.iter())
    }
}
