use crate::core::workflow::graph::FlowGraph;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use orchdoc_types::{Binding, EdgeKind, Parameter, PresentationParam, WorkflowDocument, WorkflowItem};

const MASK: &str = "********";

/// Knobs controlling what goes into a rendered report.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub include_scripts: bool,
    pub include_diagram: bool,
    /// Stamp written into the summary table; `None` keeps output reproducible.
    pub timestamp: Option<DateTime<Utc>>,
    /// Attribute types whose values are never printed.
    pub masked_types: Vec<String>,
    pub max_value_len: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_scripts: true,
            include_diagram: true,
            timestamp: None,
            masked_types: vec!["SecureString".to_string()],
            max_value_len: 80,
        }
    }
}

impl RenderOptions {
    /// Hex SHA-256 over every option that changes report content.
    /// The timestamp only contributes whether it is enabled, not its value.
    pub fn fingerprint(&self) -> String {
        let mut masked = self.masked_types.clone();
        masked.sort();
        masked.dedup();
        let canonical = format!(
            "scripts={};diagram={};timestamp={};masked={};max_value_len={}",
            self.include_scripts,
            self.include_diagram,
            self.timestamp.is_some(),
            masked.join(","),
            self.max_value_len
        );
        hex::encode(Sha256::digest(canonical.as_bytes()))
    }
}

/// Render a workflow definition as a Markdown report.
pub fn render_markdown(document: &WorkflowDocument, options: &RenderOptions) -> String {
    let graph = FlowGraph::build(document);
    let mut md = MarkdownBuilder::default();

    md.heading(1, &document.title());
    if let Some(description) = &document.description {
        md.paragraph(description);
    }

    render_summary(&mut md, document, options);
    render_parameters(&mut md, "Inputs", &document.inputs);
    render_parameters(&mut md, "Outputs", &document.outputs);
    render_variables(&mut md, document, options);
    render_form(&mut md, document);

    if options.include_diagram && !document.items.is_empty() {
        md.heading(2, "Flow");
        md.fenced("mermaid", graph.to_mermaid().trim_end());
    }

    let order = graph.execution_order();
    render_item_table(&mut md, document, &order);
    render_item_details(&mut md, document, &order, options);
    render_error_handling(&mut md, document, &order);

    md.finish()
}

fn render_summary(md: &mut MarkdownBuilder, document: &WorkflowDocument, options: &RenderOptions) {
    md.heading(2, "Summary");
    let mut rows = vec![
        vec!["ID".to_string(), code_or_dash(document.id.as_deref())],
        vec!["Version".to_string(), text_or_dash(document.version.as_deref())],
        vec![
            "API version".to_string(),
            text_or_dash(document.api_version.as_deref()),
        ],
        vec![
            "Root item".to_string(),
            code_or_dash(document.root_item.as_deref()),
        ],
        vec!["Items".to_string(), document.items.len().to_string()],
    ];
    if let Some(source) = &document.source {
        rows.push(vec!["Source".to_string(), code_span(source)]);
    }
    if let Some(timestamp) = options.timestamp {
        rows.push(vec![
            "Generated".to_string(),
            timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ]);
    }
    md.table(&["Property", "Value"], rows);
}

fn render_parameters(md: &mut MarkdownBuilder, title: &str, params: &[Parameter]) {
    if params.is_empty() {
        return;
    }
    md.heading(2, title);
    let rows = params
        .iter()
        .map(|param| {
            vec![
                code_span(&param.name),
                param.type_name.clone(),
                param.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    md.table(&["Name", "Type", "Description"], rows);
}

fn render_variables(md: &mut MarkdownBuilder, document: &WorkflowDocument, options: &RenderOptions) {
    if document.attributes.is_empty() {
        return;
    }
    md.heading(2, "Variables");
    let rows = document
        .attributes
        .iter()
        .map(|attr| {
            let value = match &attr.value {
                Some(_) if options.masked_types.iter().any(|t| t == &attr.type_name) => {
                    MASK.to_string()
                }
                Some(value) => truncate(value, options.max_value_len),
                None => String::new(),
            };
            vec![
                code_span(&attr.name),
                attr.type_name.clone(),
                if attr.read_only { "yes" } else { "no" }.to_string(),
                value,
                attr.description.clone().unwrap_or_default(),
            ]
        })
        .collect();
    md.table(&["Name", "Type", "Read-only", "Value", "Description"], rows);
}

fn render_form(md: &mut MarkdownBuilder, document: &WorkflowDocument) {
    let presentation = &document.presentation;
    if presentation.is_empty() {
        return;
    }
    md.heading(2, "Input Form");
    if !presentation.params.is_empty() {
        form_table(md, &presentation.params);
    }
    for (index, step) in presentation.steps.iter().enumerate() {
        let title = step
            .title
            .clone()
            .unwrap_or_else(|| format!("Step {}", index + 1));
        md.heading(3, &format!("Step: {}", title));
        if !step.params.is_empty() {
            form_table(md, &step.params);
        }
        for group in &step.groups {
            if let Some(title) = &group.title {
                md.paragraph(&format!("**{}**", title));
            }
            if !group.params.is_empty() {
                form_table(md, &group.params);
            }
        }
    }
}

fn form_table(md: &mut MarkdownBuilder, params: &[PresentationParam]) {
    let rows = params
        .iter()
        .map(|param| {
            let constraints = param
                .qualifiers
                .iter()
                .map(|q| format!("{}={}", q.name, q.value))
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                code_span(&param.name),
                param.label.clone().unwrap_or_default(),
                constraints,
            ]
        })
        .collect();
    md.table(&["Parameter", "Label", "Constraints"], rows);
}

fn render_item_table(md: &mut MarkdownBuilder, document: &WorkflowDocument, order: &[&str]) {
    if order.is_empty() {
        return;
    }
    md.heading(2, "Items");
    let rows = order
        .iter()
        .filter_map(|name| document.item(name))
        .map(|item| {
            let next = item
                .successors()
                .into_iter()
                .filter(|(kind, _)| !matches!(kind, EdgeKind::OnError))
                .map(|(_, target)| code_span(target))
                .collect::<Vec<_>>()
                .join(", ");
            vec![
                code_span(&item.name),
                item.title().to_string(),
                item.kind.label().to_string(),
                next,
                item.catch_name
                    .as_deref()
                    .map(code_span)
                    .unwrap_or_default(),
            ]
        })
        .collect();
    md.table(&["Item", "Name", "Type", "Next", "On error"], rows);
}

fn render_item_details(
    md: &mut MarkdownBuilder,
    document: &WorkflowDocument,
    order: &[&str],
    options: &RenderOptions,
) {
    if order.is_empty() {
        return;
    }
    md.heading(2, "Item Details");
    for item in order.iter().filter_map(|name| document.item(name)) {
        render_item(md, item, options);
    }
}

fn render_item(md: &mut MarkdownBuilder, item: &WorkflowItem, options: &RenderOptions) {
    md.heading(3, &format!("{} (`{}`)", item.title(), item.name));
    if let Some(description) = &item.description {
        md.paragraph(description);
    }

    let mut facts = vec![format!("**Type:** {}", item.kind.label())];
    if let Some(out) = &item.out_name {
        facts.push(format!("**Next:** `{}`", out));
    }
    if let Some(alt) = &item.alt_out_name {
        facts.push(format!("**Alternative:** `{}`", alt));
    }
    if let Some(catch) = &item.catch_name {
        facts.push(format!("**On error:** `{}`", catch));
    }
    if let Some(throws) = &item.throw_bind_name {
        facts.push(format!("**Error variable:** `{}`", throws));
    }
    if let Some(linked) = &item.linked_workflow_id {
        facts.push(format!("**Linked workflow:** `{}`", linked));
    }
    md.bullets(&facts);

    if !item.conditions.is_empty() {
        md.paragraph("**Conditions**");
        let rows = item
            .conditions
            .iter()
            .map(|c| {
                vec![
                    code_span(&c.variable),
                    c.comparator.clone(),
                    c.value.clone(),
                    code_span(&c.target),
                ]
            })
            .collect();
        md.table(&["Variable", "Comparator", "Value", "Target"], rows);
    }

    binding_table(md, "Inputs", &item.in_bindings);
    binding_table(md, "Outputs", &item.out_bindings);

    if options.include_scripts {
        if let Some(script) = item.script.as_ref().filter(|s| !s.is_blank()) {
            md.paragraph("**Script**");
            md.fenced("javascript", &script.body);
        }
    }
}

fn binding_table(md: &mut MarkdownBuilder, title: &str, bindings: &[Binding]) {
    if bindings.is_empty() {
        return;
    }
    md.paragraph(&format!("**{}**", title));
    let rows = bindings
        .iter()
        .map(|binding| {
            vec![
                code_span(&binding.name),
                binding.type_name.clone(),
                binding
                    .export_name
                    .as_deref()
                    .map(code_span)
                    .unwrap_or_default(),
            ]
        })
        .collect();
    md.table(&["Parameter", "Type", "Bound to"], rows);
}

fn render_error_handling(md: &mut MarkdownBuilder, document: &WorkflowDocument, order: &[&str]) {
    let mut rows = Vec::new();
    for handler in &document.error_handlers {
        let mut handling = format!("unhandled errors go to `{}`", handler.target);
        if let Some(var) = &handler.throw_bind_name {
            handling.push_str(&format!(" with `{}`", var));
        }
        rows.push(vec![
            "-".to_string(),
            "Default error handler".to_string(),
            handling,
        ]);
    }
    for item in order.iter().filter_map(|name| document.item(name)) {
        if let Some(catch) = &item.catch_name {
            let mut handling = format!("errors go to `{}`", catch);
            if let Some(var) = &item.throw_bind_name {
                handling.push_str(&format!(" with `{}`", var));
            }
            rows.push(vec![
                code_span(&item.name),
                item.title().to_string(),
                handling,
            ]);
        } else if item.is_error_end() {
            let handling = match &item.throw_bind_name {
                Some(var) => format!("ends the run with error `{}`", var),
                None => "ends the run with an error".to_string(),
            };
            rows.push(vec![
                code_span(&item.name),
                item.title().to_string(),
                handling,
            ]);
        }
    }
    if rows.is_empty() {
        return;
    }
    md.heading(2, "Error Handling");
    md.table(&["Item", "Name", "Handling"], rows);
}

fn code_or_dash(value: Option<&str>) -> String {
    value
        .map(code_span)
        .unwrap_or_else(|| "-".to_string())
}

fn text_or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn truncate(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        value.to_string()
    } else {
        let head: String = value.chars().take(limit).collect();
        format!("{}...", head)
    }
}

/// Escape a value for use inside a table cell.
pub fn escape_cell(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "-".to_string();
    }
    trimmed
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

/// Append-only Markdown buffer that keeps exactly one blank line between blocks.
#[derive(Default)]
struct MarkdownBuilder {
    out: String,
}

impl MarkdownBuilder {
    fn block(&mut self, text: &str) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn heading(&mut self, level: usize, text: &str) {
        self.block(&format!("{} {}", "#".repeat(level), text.trim()));
    }

    fn paragraph(&mut self, text: &str) {
        self.block(text.trim());
    }

    fn bullets(&mut self, items: &[String]) {
        let lines: Vec<String> = items.iter().map(|item| format!("- {}", item)).collect();
        self.block(&lines.join("\n"));
    }

    fn fenced(&mut self, language: &str, body: &str) {
        let fence = fence_for(body);
        self.block(&format!("{fence}{language}\n{body}\n{fence}"));
    }

    fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) {
        let mut lines = Vec::with_capacity(rows.len() + 2);
        lines.push(format!("| {} |", headers.join(" | ")));
        lines.push(format!(
            "|{}|",
            headers.iter().map(|_| "---").collect::<Vec<_>>().join("|")
        ));
        for row in rows {
            let cells: Vec<String> = row.iter().map(|cell| escape_cell(cell)).collect();
            lines.push(format!("| {} |", cells.join(" | ")));
        }
        self.block(&lines.join("\n"));
    }

    fn finish(self) -> String {
        self.out
    }
}

/// Pick a backtick fence longer than any backtick run inside the body.
fn fence_for(body: &str) -> String {
    "`".repeat((longest_backtick_run(body) + 1).max(3))
}

/// Inline code span that survives backticks in the value.
fn code_span(value: &str) -> String {
    let ticks = "`".repeat(longest_backtick_run(value) + 1);
    let padded = value.starts_with(['`', ' ']) || value.ends_with(['`', ' ']);
    if padded && !value.trim().is_empty() {
        format!("{ticks} {value} {ticks}")
    } else {
        format!("{ticks}{value}{ticks}")
    }
}

fn longest_backtick_run(value: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in value.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}
