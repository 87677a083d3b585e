//! Offline inspection of dumped documents
//!
//! Reads a [`GraphDocument`] back from disk and renders it as Graphviz DOT.
//! The drawing follows the group tree: each group points at its sub nodes,
//! and a synthetic `super` node points at every node nothing else points
//! at, so the result is a single rooted tree whenever the dump is one.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{PhaseGraphError, Result};
use crate::export::{ExportedNode, GraphDocument, NodeColor};

/// Name of the synthetic node linked to every parentless node
pub const SUPER_NODE: &str = "super";

/// Rendering switches for [`to_dot`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DotOptions {
    /// Also draw declared ordering as dashed edges (earlier -> later)
    pub ordering_edges: bool,
}

/// Load and validate a dumped document
pub fn load_document(path: impl AsRef<Path>) -> Result<GraphDocument> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let document = GraphDocument::from_json_str(&content)?;
    validate_document(&document)?;
    Ok(document)
}

/// Check that every structural reference names a node of the document
///
/// Declared before/after names are not checked; they may legitimately
/// refer to units that were never instantiated.
pub fn validate_document(document: &GraphDocument) -> Result<()> {
    let mut names = HashSet::new();
    for node in &document.nodes {
        if !names.insert(node.node_name.as_str()) {
            return Err(PhaseGraphError::invalid_document(format!(
                "duplicate node '{}'",
                node.node_name
            )));
        }
    }
    for node in &document.nodes {
        for reference in node
            .original_dependencies
            .iter()
            .chain(&node.sub_node_indices)
        {
            if !names.contains(reference.as_str()) {
                return Err(PhaseGraphError::invalid_document(format!(
                    "node '{}' references unknown node '{}'",
                    node.node_name, reference
                )));
            }
        }
    }
    Ok(())
}

/// Nodes no group lists as a sub node, in document order
pub fn root_nodes(document: &GraphDocument) -> Vec<&str> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    for node in document.nodes.iter().filter(|n| n.color == NodeColor::Group) {
        for sub in &node.sub_node_indices {
            *in_degree.entry(sub.as_str()).or_insert(0) += 1;
        }
    }
    document
        .nodes
        .iter()
        .map(|n| n.node_name.as_str())
        .filter(|name| in_degree.get(name).copied().unwrap_or(0) == 0)
        .collect()
}

fn fill_color(node: &ExportedNode) -> &'static str {
    match node.color {
        NodeColor::Unit => "red",
        NodeColor::Group if node.original_dependencies.is_empty() => "yellow",
        NodeColor::Group => "blue",
    }
}

fn quoted(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

fn label(name: &str) -> String {
    if name.is_empty() {
        quoted("(root)")
    } else {
        quoted(name)
    }
}

/// Render a document as a DOT digraph
pub fn to_dot(document: &GraphDocument, options: &DotOptions) -> String {
    let mut lines = vec![
        format!("digraph {} {{", quoted(document.print_mode.as_str())),
        "    node [style=filled];".to_string(),
        format!(
            "    {} [label={}, fillcolor=black, fontcolor=white];",
            quoted(SUPER_NODE),
            quoted(SUPER_NODE)
        ),
    ];

    lines.extend(document.nodes.iter().map(|node| {
        format!(
            "    {} [label={}, fillcolor={}];",
            quoted(&node.node_name),
            label(&node.node_name),
            fill_color(node)
        )
    }));

    for node in document.nodes.iter().filter(|n| n.color == NodeColor::Group) {
        lines.extend(
            node.sub_node_indices
                .iter()
                .map(|sub| edge(&node.node_name, sub, "")),
        );
    }

    lines.extend(
        root_nodes(document)
            .into_iter()
            .map(|root| edge(SUPER_NODE, root, "")),
    );

    if options.ordering_edges {
        for node in &document.nodes {
            lines.extend(
                node.execute_after_nodes
                    .iter()
                    .map(|after| edge(after, &node.node_name, " [style=dashed]")),
            );
            lines.extend(
                node.execute_before_nodes
                    .iter()
                    .map(|before| edge(&node.node_name, before, " [style=dashed]")),
            );
        }
    }

    lines.push("}".to_string());
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn edge(from: &str, to: &str, attributes: &str) -> String {
    format!("    {} -> {}{};", quoted(from), quoted(to), attributes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NullDiagnosticSink;
    use crate::export::export_registry;
    use crate::groups::build_group_tree;
    use crate::types::PrintMode;
    use crate::unit::{ProcessingUnit, UnitDescriptor};

    fn scenario_document() -> GraphDocument {
        let units = [
            UnitDescriptor::new("Move").in_group("Sim"),
            UnitDescriptor::new("Render").in_group("Sim.Render").after("Move"),
            UnitDescriptor::new("Cleanup").after("Render"),
        ];
        let slots: Vec<Option<&dyn ProcessingUnit>> =
            units.iter().map(|u| Some(u as &dyn ProcessingUnit)).collect();
        let tree = build_group_tree(&slots, &NullDiagnosticSink);
        export_registry(&tree.registry, PrintMode::ExecutesGroupTree)
    }

    #[test]
    fn test_root_nodes() {
        let document = scenario_document();
        assert_eq!(root_nodes(&document), vec![""]);
    }

    #[test]
    fn test_dot_output() {
        let document = scenario_document();

        let dot = to_dot(&document, &DotOptions::default());

        assert!(dot.starts_with("digraph \"ExecutesGroupTree\" {"));
        assert!(dot.contains("\"\" [label=\"(root)\", fillcolor=yellow];"));
        assert!(dot.contains("\"Sim\" [label=\"Sim\", fillcolor=yellow];"));
        assert!(dot.contains("\"Sim.Render\" [label=\"Sim.Render\", fillcolor=blue];"));
        assert!(dot.contains("\"Move\" [label=\"Move\", fillcolor=red];"));
        assert!(dot.contains("\"Sim\" -> \"Sim.Render\";"));
        assert!(dot.contains("\"super\" -> \"\";"));
        assert!(!dot.contains("style=dashed"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_dot_ordering_edges() {
        let document = scenario_document();

        let dot = to_dot(&document, &DotOptions { ordering_edges: true });

        assert!(dot.contains("\"Move\" -> \"Render\" [style=dashed];"));
        assert!(dot.contains("\"Render\" -> \"Cleanup\" [style=dashed];"));
    }

    #[test]
    fn test_validate_rejects_dangling_reference() {
        let mut document = scenario_document();
        assert!(validate_document(&document).is_ok());

        document.nodes[1].sub_node_indices.push("Nowhere".to_string());

        let err = validate_document(&document).unwrap_err();
        assert!(matches!(err, PhaseGraphError::InvalidDocument(_)));
    }

    #[test]
    fn test_load_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dump.json");
        let document = scenario_document();
        std::fs::write(&path, document.to_json_pretty().unwrap()).unwrap();

        assert_eq!(load_document(&path).unwrap(), document);
    }

    #[test]
    fn test_dot_single_unit_document() {
        let unit = UnitDescriptor::new("Tick");
        let slots: Vec<Option<&dyn ProcessingUnit>> = vec![Some(&unit)];
        let tree = build_group_tree(&slots, &NullDiagnosticSink);
        let document = export_registry(&tree.registry, PrintMode::ExecutesGroupTree);

        let dot = to_dot(&document, &DotOptions::default());

        assert_eq!(
            dot,
            concat!(
                "digraph \"ExecutesGroupTree\" {\n",
                "    node [style=filled];\n",
                "    \"super\" [label=\"super\", fillcolor=black, fontcolor=white];\n",
                "    \"\" [label=\"(root)\", fillcolor=yellow];\n",
                "    \"Tick\" [label=\"Tick\", fillcolor=red];\n",
                "    \"\" -> \"Tick\";\n",
                "    \"super\" -> \"\";\n",
                "}\n",
            )
        );
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quoted("a\"b"), "\"a\\\"b\"");
    }
}
