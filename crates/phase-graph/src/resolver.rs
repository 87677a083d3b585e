//! Dependency resolution contract
//!
//! Turning before/after constraints into a linear execution order is the
//! job of a [`DependencyResolver`]. The dump only consumes its output: the
//! ordered unit names tell which registered units were left out.
//!
//! [`PetgraphResolver`] is the default adapter. It maps the registry onto a
//! petgraph `DiGraph` and delegates ordering and cycle detection to
//! `petgraph::algo::toposort`.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex as VertexIndex};

use crate::registry::NodeRegistry;
use crate::types::NodeIndex;

/// Output of a resolver run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Active units in execution order
    pub ordered: Vec<String>,
    /// Node involved in a cycle, when one was found
    pub cycle: Option<String>,
    /// Units the resolver considers pruned
    pub pruned_classes: Vec<String>,
}

/// Produces an execution order for the units of a registry
///
/// Implementations see every unit node, pass-through nodes included, along
/// with their matched shapes.
pub trait DependencyResolver {
    fn resolve(&self, registry: &NodeRegistry<'_>) -> Resolution;
}

/// Resolver backed by petgraph's topological sort
///
/// A constraint naming a group applies to every unit inside that group.
/// Pass-through nodes take part in the graph so chains through them hold,
/// but are never part of the ordered output. On a cycle the active units
/// are returned in registry order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PetgraphResolver;

impl PetgraphResolver {
    /// Unit nodes a constraint target stands for
    fn expand_target(registry: &NodeRegistry<'_>, target: &str) -> Vec<NodeIndex> {
        let Some(node) = registry.get_by_name(target) else {
            return Vec::new();
        };
        if node.is_unit_origin() {
            return vec![node.index];
        }
        registry
            .descendants(node.index)
            .into_iter()
            .filter(|&index| {
                registry
                    .get(index)
                    .map(|n| n.is_unit_origin())
                    .unwrap_or(false)
            })
            .collect()
    }
}

impl DependencyResolver for PetgraphResolver {
    fn resolve(&self, registry: &NodeRegistry<'_>) -> Resolution {
        // Edge A -> B means A runs before B
        let mut graph: DiGraph<NodeIndex, ()> = DiGraph::new();
        let mut vertices: HashMap<NodeIndex, VertexIndex> = HashMap::new();

        for node in registry.unit_nodes() {
            vertices.insert(node.index, graph.add_node(node.index));
        }

        for node in registry.unit_nodes() {
            let this = vertices[&node.index];
            for target in &node.execute_before {
                for other in Self::expand_target(registry, target) {
                    if other != node.index {
                        graph.update_edge(this, vertices[&other], ());
                    }
                }
            }
            for target in &node.execute_after {
                for other in Self::expand_target(registry, target) {
                    if other != node.index {
                        graph.update_edge(vertices[&other], this, ());
                    }
                }
            }
        }

        let is_active = |index: &NodeIndex| {
            registry
                .get(*index)
                .map(|n| n.unit_ref().is_some())
                .unwrap_or(false)
        };
        let name_of = |index: NodeIndex| {
            registry
                .get(index)
                .map(|n| n.name.clone())
                .unwrap_or_default()
        };

        let (ordered_indices, cycle): (Vec<NodeIndex>, Option<String>) =
            match toposort(&graph, None) {
                Ok(order) => (order.into_iter().map(|vertex| graph[vertex]).collect(), None),
                Err(cycle) => {
                    let culprit = name_of(graph[cycle.node_id()]);
                    let fallback = registry.unit_nodes().map(|n| n.index).collect();
                    (fallback, Some(culprit))
                }
            };

        Resolution {
            ordered: ordered_indices
                .into_iter()
                .filter(is_active)
                .map(name_of)
                .collect(),
            cycle,
            pruned_classes: registry
                .unit_nodes()
                .filter(|n| n.pruned)
                .map(|n| n.name.clone())
                .collect(),
        }
    }
}

/// Unit nodes the resolution left out, in registry order
pub fn discarded_units(registry: &NodeRegistry<'_>, resolution: &Resolution) -> Vec<String> {
    let ordered: HashSet<&str> = resolution.ordered.iter().map(String::as_str).collect();
    registry
        .unit_nodes()
        .filter(|node| !ordered.contains(node.name.as_str()))
        .map(|node| node.name.clone())
        .collect()
}
