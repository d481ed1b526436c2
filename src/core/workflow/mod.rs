//! Workflow definition parsing, rendering and linting.

pub mod docs;
pub mod graph;
pub mod lint;
pub mod markdown;
pub mod parser;

pub use docs::{DocsGenerator, DocsSummary};
pub use graph::FlowGraph;
pub use markdown::{render_markdown, RenderOptions};
pub use parser::{parse_workflow, parse_workflow_str};
