//! Node registry for one phase graph
//!
//! Nodes are stored in creation order and looked up by name. The synthetic
//! root group always sits at index 0 under the empty name, so units that
//! declare no group need no special casing.

use std::collections::HashMap;

use crate::types::{GraphNode, NodeIndex, ROOT_INDEX};

/// Insertion-ordered container of graph nodes with a name index
#[derive(Debug, Clone)]
pub struct NodeRegistry<'a> {
    nodes: Vec<GraphNode<'a>>,
    index_by_name: HashMap<String, NodeIndex>,
}

impl Default for NodeRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> NodeRegistry<'a> {
    /// Create a registry holding only the root group
    pub fn new() -> Self {
        let mut index_by_name = HashMap::new();
        index_by_name.insert(String::new(), ROOT_INDEX);
        Self {
            nodes: vec![GraphNode::group("", ROOT_INDEX)],
            index_by_name,
        }
    }

    /// Append a node, assigning it the next index
    ///
    /// The node's `index` field is overwritten with its position.
    pub fn insert(&mut self, mut node: GraphNode<'a>) -> NodeIndex {
        let index = self.nodes.len();
        node.index = index;
        self.index_by_name.insert(node.name.clone(), index);
        self.nodes.push(node);
        index
    }

    /// Record `child` as a direct child of `parent`
    ///
    /// The root never appears in a child's `original_dependencies`.
    pub fn link_child(&mut self, parent: NodeIndex, child: NodeIndex) {
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            if !parent_node.sub_nodes.contains(&child) {
                parent_node.sub_nodes.push(child);
            }
        }
        if parent != ROOT_INDEX {
            if let Some(child_node) = self.nodes.get_mut(child) {
                if !child_node.original_dependencies.contains(&parent) {
                    child_node.original_dependencies.push(parent);
                }
            }
        }
    }

    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.index_by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_by_name.contains_key(name)
    }

    pub fn get(&self, index: NodeIndex) -> Option<&GraphNode<'a>> {
        self.nodes.get(index)
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut GraphNode<'a>> {
        self.nodes.get_mut(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&GraphNode<'a>> {
        self.find(name).and_then(|index| self.nodes.get(index))
    }

    pub fn root(&self) -> &GraphNode<'a> {
        &self.nodes[ROOT_INDEX]
    }

    pub fn nodes(&self) -> &[GraphNode<'a>] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode<'a>> {
        self.nodes.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root is present from construction
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes that were created from a unit, including pass-through ones
    pub fn unit_nodes(&self) -> impl Iterator<Item = &GraphNode<'a>> {
        self.nodes.iter().filter(|node| node.is_unit_origin())
    }

    /// Resolve indices to names, skipping indices that do not exist
    pub fn names_of(&self, indices: &[NodeIndex]) -> Vec<String> {
        indices
            .iter()
            .filter_map(|&index| self.nodes.get(index))
            .map(|node| node.name.clone())
            .collect()
    }

    /// Ancestors of a node, nearest first, excluding the root
    pub fn ancestors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut ancestors = Vec::new();
        let mut current = index;
        // Parent links point at strictly earlier nodes, so this terminates
        while let Some(&parent) = self
            .nodes
            .get(current)
            .and_then(|node| node.original_dependencies.first())
        {
            if parent >= current {
                break;
            }
            ancestors.push(parent);
            current = parent;
        }
        ancestors
    }

    /// All descendants of a node in pre-order
    pub fn descendants(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut descendants = Vec::new();
        let mut stack: Vec<NodeIndex> = match self.nodes.get(index) {
            Some(node) => node.sub_nodes.iter().rev().copied().collect(),
            None => return descendants,
        };
        while let Some(current) = stack.pop() {
            descendants.push(current);
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.sub_nodes.iter().rev().copied());
            }
        }
        descendants
    }
}
