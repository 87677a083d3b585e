//! Core types for phase graphs
//!
//! A phase graph holds one node per registered processing unit plus one
//! synthetic node per group named in the units' group paths.

use serde::{Deserialize, Serialize};

use crate::unit::{DataRequirements, ProcessingUnit};

/// Position of a node in the registry, stable for the lifetime of one dump
pub type NodeIndex = usize;

/// Identifier of a data shape within a data model
pub type ShapeId = usize;

/// Index of the synthetic root group
pub const ROOT_INDEX: NodeIndex = 0;

/// Whether applicability is checked against live data or synthesized shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisMode {
    /// No live data model; every unit is checked against shapes built from
    /// the units' own requirements
    Static,
    /// Applicability is checked against a live data model
    Runtime,
}

impl AnalysisMode {
    /// Label used in dump file names
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisMode::Static => "Static",
            AnalysisMode::Runtime => "Runtime",
        }
    }
}

/// Which representation of the graph is exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrintMode {
    /// Group hierarchy with direct parent/child links
    ExecutesGroupTree,
    /// Every node with its complete ancestor and descendant sets
    CompletelyDependency,
}

impl PrintMode {
    /// Name written to the `PrintMode` field of a document
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintMode::ExecutesGroupTree => "ExecutesGroupTree",
            PrintMode::CompletelyDependency => "CompletelyDependency",
        }
    }
}

/// What a node stands for
#[derive(Clone, Copy)]
pub enum NodeKind<'a> {
    /// Synthetic group, the root, or a pruned unit
    Group,
    /// A registered processing unit, borrowed from its provider
    Unit(&'a dyn ProcessingUnit),
}

impl std::fmt::Debug for NodeKind<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Group => write!(f, "Group"),
            NodeKind::Unit(unit) => write!(f, "Unit({})", unit.name()),
        }
    }
}

/// A vertex of the phase graph
#[derive(Debug, Clone)]
pub struct GraphNode<'a> {
    /// Unique name within the registry (empty for the root)
    pub name: String,
    pub kind: NodeKind<'a>,
    pub index: NodeIndex,
    /// Structural dependencies: the parent group, if it is not the root
    pub original_dependencies: Vec<NodeIndex>,
    /// Direct children (groups and the root only)
    pub sub_nodes: Vec<NodeIndex>,
    /// Names this node must run before, as declared
    pub execute_before: Vec<String>,
    /// Names this node must run after, as declared
    pub execute_after: Vec<String>,
    pub requirements: DataRequirements,
    /// Shapes the node matched during pruning
    pub matched_shapes: Vec<ShapeId>,
    /// Set when a unit was demoted to a pass-through group
    pub pruned: bool,
}

impl<'a> GraphNode<'a> {
    /// Create a synthetic group node
    pub fn group(name: impl Into<String>, index: NodeIndex) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Group,
            index,
            original_dependencies: Vec::new(),
            sub_nodes: Vec::new(),
            execute_before: Vec::new(),
            execute_after: Vec::new(),
            requirements: DataRequirements::default(),
            matched_shapes: Vec::new(),
            pruned: false,
        }
    }

    /// Create a unit node, copying the unit's declared ordering and requirements
    pub fn unit(name: impl Into<String>, unit: &'a dyn ProcessingUnit, index: NodeIndex) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Unit(unit),
            index,
            original_dependencies: Vec::new(),
            sub_nodes: Vec::new(),
            execute_before: unit.execute_before().to_vec(),
            execute_after: unit.execute_after().to_vec(),
            requirements: unit.requirements().clone(),
            matched_shapes: Vec::new(),
            pruned: false,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group)
    }

    /// The unit this node stands for, unless it is a group or was pruned
    pub fn unit_ref(&self) -> Option<&'a dyn ProcessingUnit> {
        match self.kind {
            NodeKind::Unit(unit) => Some(unit),
            NodeKind::Group => None,
        }
    }

    /// True for nodes created from a unit, pruned or not
    pub fn is_unit_origin(&self) -> bool {
        !self.is_group() || self.pruned
    }

    /// Demote a unit to a pass-through group
    ///
    /// Declared `execute_before`/`execute_after` stay in place.
    pub fn make_pass_through(&mut self) {
        self.kind = NodeKind::Group;
        self.pruned = true;
    }
}
