use serde::{Deserialize, Serialize};

/// Input form schema attached to a workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub steps: Vec<PresentationStep>,
    /// Parameters declared directly under the presentation, outside any step.
    pub params: Vec<PresentationParam>,
}

impl Presentation {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty() && self.params.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationStep {
    pub title: Option<String>,
    pub groups: Vec<PresentationGroup>,
    pub params: Vec<PresentationParam>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationGroup {
    pub title: Option<String>,
    pub params: Vec<PresentationParam>,
}

/// Form field bound to a workflow input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationParam {
    pub name: String,
    pub label: Option<String>,
    pub qualifiers: Vec<Qualifier>,
}

/// Field constraint such as `mandatory`, `defaultValue` or `genericEnumeration`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifier {
    pub kind: String,
    pub name: String,
    pub type_name: Option<String>,
    pub value: String,
}
