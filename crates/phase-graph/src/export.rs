//! JSON export of a phase graph
//!
//! Both print modes share one node-to-JSON mapping. What differs is the
//! sequence of [`NodeView`]s fed into [`render_document`]:
//!
//! - [`tree_view`] yields each node with its direct parent and children.
//! - [`flat_view`] yields each node with its complete ancestor chain and
//!   every descendant.
//!
//! Node order is registry order in both cases, and indices are always
//! resolved to names: they mean nothing outside the run that produced them.
//! Declared before/after names are exported as written, even when they name
//! a pruned or unknown node.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::registry::NodeRegistry;
use crate::types::{GraphNode, PrintMode};

/// Categorical tag separating synthetic nodes from real work items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeColor {
    Group,
    Unit,
}

/// One node of an exported document
///
/// Field order is fixed; serde writes struct fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportedNode {
    pub node_name: String,
    pub color: NodeColor,
    pub original_dependencies: Vec<String>,
    pub sub_node_indices: Vec<String>,
    pub execute_before_nodes: Vec<String>,
    pub execute_after_nodes: Vec<String>,
}

/// An exported graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GraphDocument {
    pub print_mode: PrintMode,
    pub nodes: Vec<ExportedNode>,
}

impl GraphDocument {
    /// Compact JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Indented JSON, as written to dump files
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn node(&self, name: &str) -> Option<&ExportedNode> {
        self.nodes.iter().find(|node| node.node_name == name)
    }

    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.node_name.as_str()).collect()
    }
}

/// What the exporter needs to know about a node
pub trait NodeView {
    fn node_name(&self) -> &str;
    fn is_group(&self) -> bool;
    fn original_dependencies(&self) -> Vec<String>;
    fn sub_nodes(&self) -> Vec<String>;
    fn execute_before(&self) -> &[String];
    fn execute_after(&self) -> &[String];
}

/// A node with its direct structural links
pub struct TreeNodeView<'r, 'a> {
    registry: &'r NodeRegistry<'a>,
    node: &'r GraphNode<'a>,
}

impl NodeView for TreeNodeView<'_, '_> {
    fn node_name(&self) -> &str {
        &self.node.name
    }

    fn is_group(&self) -> bool {
        self.node.is_group()
    }

    fn original_dependencies(&self) -> Vec<String> {
        self.registry.names_of(&self.node.original_dependencies)
    }

    fn sub_nodes(&self) -> Vec<String> {
        self.registry.names_of(&self.node.sub_nodes)
    }

    fn execute_before(&self) -> &[String] {
        &self.node.execute_before
    }

    fn execute_after(&self) -> &[String] {
        &self.node.execute_after
    }
}

/// A node with its structure flattened to complete ancestor/descendant sets
pub struct FlatNodeView<'r, 'a> {
    registry: &'r NodeRegistry<'a>,
    node: &'r GraphNode<'a>,
}

impl NodeView for FlatNodeView<'_, '_> {
    fn node_name(&self) -> &str {
        &self.node.name
    }

    fn is_group(&self) -> bool {
        self.node.is_group()
    }

    fn original_dependencies(&self) -> Vec<String> {
        self.registry
            .names_of(&self.registry.ancestors(self.node.index))
    }

    fn sub_nodes(&self) -> Vec<String> {
        self.registry
            .names_of(&self.registry.descendants(self.node.index))
    }

    fn execute_before(&self) -> &[String] {
        &self.node.execute_before
    }

    fn execute_after(&self) -> &[String] {
        &self.node.execute_after
    }
}

pub fn tree_view<'r, 'a>(
    registry: &'r NodeRegistry<'a>,
) -> impl Iterator<Item = TreeNodeView<'r, 'a>> {
    registry
        .nodes()
        .iter()
        .map(move |node| TreeNodeView { registry, node })
}

pub fn flat_view<'r, 'a>(
    registry: &'r NodeRegistry<'a>,
) -> impl Iterator<Item = FlatNodeView<'r, 'a>> {
    registry
        .nodes()
        .iter()
        .map(move |node| FlatNodeView { registry, node })
}

/// Map one node view to its exported form
pub fn export_node(view: &impl NodeView) -> ExportedNode {
    ExportedNode {
        node_name: view.node_name().to_string(),
        color: if view.is_group() {
            NodeColor::Group
        } else {
            NodeColor::Unit
        },
        original_dependencies: view.original_dependencies(),
        sub_node_indices: view.sub_nodes(),
        execute_before_nodes: view.execute_before().to_vec(),
        execute_after_nodes: view.execute_after().to_vec(),
    }
}

/// Render a document from any sequence of node views, preserving order
pub fn render_document<I, V>(print_mode: PrintMode, views: I) -> GraphDocument
where
    I: IntoIterator<Item = V>,
    V: NodeView,
{
    GraphDocument {
        print_mode,
        nodes: views.into_iter().map(|view| export_node(&view)).collect(),
    }
}

/// Render the registry in the requested mode
pub fn export_registry(registry: &NodeRegistry<'_>, print_mode: PrintMode) -> GraphDocument {
    match print_mode {
        PrintMode::ExecutesGroupTree => render_document(print_mode, tree_view(registry)),
        PrintMode::CompletelyDependency => render_document(print_mode, flat_view(registry)),
    }
}
