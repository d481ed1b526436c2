use orchdoc_types::{EdgeKind, WorkflowDocument};
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};
use std::collections::{HashMap, HashSet};
use std::fmt;

const START_NODE: &str = "__start";
const MAX_LABEL_LEN: usize = 60;

/// Node weight carrying item display information.
pub struct ItemNode {
    pub name: String,
    pub title: String,
    pub kind: String,
}

impl fmt::Display for ItemNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.title, self.kind)
    }
}

/// Edge weight: the kind of transition between two items.
pub struct FlowEdge {
    pub kind: EdgeKind,
}

impl fmt::Display for FlowEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate(&self.kind.to_string(), MAX_LABEL_LEN))
    }
}

/// Link whose target item does not exist in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingLink {
    /// Item holding the link; `None` for the workflow root or error handler.
    pub from: Option<String>,
    pub target: String,
    pub kind: EdgeKind,
}

/// Control-flow graph of a workflow's items.
pub struct FlowGraph<'a> {
    document: &'a WorkflowDocument,
    graph: DiGraph<ItemNode, FlowEdge>,
    nodes: HashMap<String, NodeIndex>,
    start: NodeIndex,
    dangling: Vec<DanglingLink>,
}

impl<'a> FlowGraph<'a> {
    pub fn build(document: &'a WorkflowDocument) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();

        let start = graph.add_node(ItemNode {
            name: START_NODE.to_string(),
            title: "Start".to_string(),
            kind: "start".to_string(),
        });

        // Later items reusing a name get no node and contribute no edges.
        let mut owned = Vec::with_capacity(document.items.len());
        for item in &document.items {
            if nodes.contains_key(&item.name) {
                owned.push(None);
                continue;
            }
            let idx = graph.add_node(ItemNode {
                name: item.name.clone(),
                title: item.title().to_string(),
                kind: item.kind.label().to_string(),
            });
            nodes.insert(item.name.clone(), idx);
            owned.push(Some(idx));
        }

        let mut dangling = Vec::new();
        let mut link = |graph: &mut DiGraph<ItemNode, FlowEdge>,
                        from_idx: NodeIndex,
                        from: Option<&str>,
                        target: &str,
                        kind: EdgeKind| {
            match nodes.get(target) {
                Some(&to) => {
                    graph.add_edge(from_idx, to, FlowEdge { kind });
                }
                None => dangling.push(DanglingLink {
                    from: from.map(str::to_string),
                    target: target.to_string(),
                    kind,
                }),
            }
        };

        if let Some(root) = document.root_item.as_deref() {
            link(&mut graph, start, None, root, EdgeKind::Next);
        }
        for handler in &document.error_handlers {
            link(
                &mut graph,
                start,
                None,
                &handler.target,
                EdgeKind::ErrorHandler,
            );
        }
        for (item, idx) in document.items.iter().zip(&owned) {
            let Some(from_idx) = *idx else {
                continue;
            };
            for (kind, target) in item.successors() {
                link(&mut graph, from_idx, Some(item.name.as_str()), target, kind);
            }
        }

        Self {
            document,
            graph,
            nodes,
            start,
            dangling,
        }
    }

    /// Items in the order a reader would follow them: depth-first from the root along
    /// next, alternative, case and catch edges, then error handlers, then anything
    /// unreachable in document order.
    pub fn execution_order(&self) -> Vec<&'a str> {
        let document: &'a WorkflowDocument = self.document;
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        for idx in self.ordered_successors(self.start) {
            self.visit(idx, &mut seen, &mut order);
        }
        for item in &document.items {
            if seen.insert(item.name.as_str()) {
                order.push(item.name.as_str());
            }
        }
        order
    }

    fn visit(&self, idx: NodeIndex, seen: &mut HashSet<&'a str>, order: &mut Vec<&'a str>) {
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            let Some(name) = self.item_name(current) else {
                continue;
            };
            if !seen.insert(name) {
                continue;
            }
            order.push(name);
            let mut next = self.ordered_successors(current);
            next.reverse();
            stack.extend(next);
        }
    }

    /// Successor nodes in the order the edges were declared.
    fn ordered_successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<_> = self.graph.edges(idx).collect();
        edges.sort_by_key(|edge| edge.id());
        edges.into_iter().map(|edge| edge.target()).collect()
    }

    fn item_name(&self, idx: NodeIndex) -> Option<&'a str> {
        let document: &'a WorkflowDocument = self.document;
        document
            .item(&self.graph[idx].name)
            .map(|item| item.name.as_str())
    }

    /// Names of items not reachable from the root or a declared error handler, sorted.
    pub fn unreachable_items(&self) -> Vec<String> {
        let mut reachable = HashSet::new();
        let mut bfs = Bfs::new(&self.graph, self.start);
        while let Some(nx) = bfs.next(&self.graph) {
            reachable.insert(nx);
        }

        let mut unreachable: Vec<String> = self
            .nodes
            .iter()
            .filter(|(_, nx)| !reachable.contains(*nx))
            .map(|(name, _)| name.clone())
            .collect();
        unreachable.sort();
        unreachable
    }

    pub fn dangling_links(&self) -> &[DanglingLink] {
        &self.dangling
    }

    /// Names of items that transfer control to `name`, with the edge kind.
    pub fn predecessors(&self, name: &str) -> Vec<(String, EdgeKind)> {
        let Some(&idx) = self.nodes.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<(String, EdgeKind)> = self
            .graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .filter(|edge| edge.source() != self.start)
            .map(|edge| {
                (
                    self.graph[edge.source()].name.clone(),
                    edge.weight().kind.clone(),
                )
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Render the graph as Graphviz DOT using petgraph.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::new(&self.graph))
    }

    /// Render the graph as a Mermaid flowchart.
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("flowchart TD\n");
        out.push_str(&format!("    {}((Start))\n", START_NODE));
        for idx in self.graph.node_indices() {
            if idx == self.start {
                continue;
            }
            let node = &self.graph[idx];
            let label = mermaid_label(&node.title);
            let id = mermaid_id(&node.name);
            let shape = match node.kind.as_str() {
                "Decision" | "Condition" | "Switch" => format!("{}{{\"{}\"}}", id, label),
                "End" => format!("{}([\"{}\"])", id, label),
                "Workflow element" => format!("{}[[\"{}\"]]", id, label),
                _ => format!("{}[\"{}\"]", id, label),
            };
            out.push_str(&format!("    {}\n", shape));
        }
        for edge in self.graph.edge_references() {
            let from = mermaid_id(&self.graph[edge.source()].name);
            let to = mermaid_id(&self.graph[edge.target()].name);
            let arrow = match edge.weight().kind {
                EdgeKind::OnError | EdgeKind::ErrorHandler => "-.->",
                _ => "-->",
            };
            match edge.weight().kind {
                EdgeKind::Next => out.push_str(&format!("    {} {} {}\n", from, arrow, to)),
                ref kind => out.push_str(&format!(
                    "    {} {}|\"{}\"| {}\n",
                    from,
                    arrow,
                    mermaid_label(&kind.to_string()),
                    to
                )),
            }
        }
        out
    }
}

fn mermaid_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn mermaid_label(value: &str) -> String {
    truncate(value, MAX_LABEL_LEN)
        .replace('"', "'")
        .replace(['\n', '\r'], " ")
}

fn truncate(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        value.to_string()
    } else {
        let head: String = value.chars().take(limit).collect();
        format!("{}...", head)
    }
}
