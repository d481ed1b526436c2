//! Shared data model for orchestrator workflow definitions.
//!
//! These types carry no parsing logic; the `orchdoc` crate fills them from XML and the
//! renderer, linter and CLI consume them.

mod presentation;
mod workflow;

pub use presentation::{
    Presentation, PresentationGroup, PresentationParam, PresentationStep, Qualifier,
};
pub use workflow::{
    Attribute, Binding, EdgeKind, ErrorHandler, ItemKind, Parameter, Script, SwitchCondition,
    WorkflowDocument, WorkflowItem,
};
