//! Applicability checks and pruning
//!
//! A unit applies to a run when at least one data shape in the data model
//! satisfies its requirements. Units that match nothing (and whose type
//! allows it) are pruned: their node stays in the registry, the unit
//! reference is cleared, and the node keeps its declared ordering so the
//! relationships it implies for its neighbours survive.
//!
//! In static mode there is no live data model. [`ShapeCatalog::synthetic`]
//! builds one shape per unit from the fragments the unit itself asks for,
//! so every unit matches at least its own shape unless its requirements
//! contradict each other.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::events::{DiagnosticEvent, DiagnosticSink};
use crate::registry::NodeRegistry;
use crate::types::{AnalysisMode, ShapeId};
use crate::unit::DataRequirements;

/// A concrete composition of data fragments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataShape {
    pub name: String,
    #[serde(default)]
    pub fragments: BTreeSet<String>,
}

impl DataShape {
    pub fn new<I, S>(name: impl Into<String>, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            fragments: fragments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Source of truth for which data shapes exist
pub trait DataModel {
    /// Shapes that satisfy the given requirements
    fn matching_shapes(&self, requirements: &DataRequirements) -> Vec<ShapeId>;
}

/// A fixed list of data shapes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeCatalog {
    shapes: Vec<DataShape>,
}

impl ShapeCatalog {
    pub fn new(shapes: Vec<DataShape>) -> Self {
        Self { shapes }
    }

    /// Build the static-mode model from the units of a registry
    ///
    /// One shape per unit holding its `all` and `any` fragments; identical
    /// compositions collapse into one shape. Units without requirements
    /// contribute nothing.
    pub fn synthetic(registry: &NodeRegistry<'_>) -> Self {
        let mut catalog = Self::default();
        for node in registry.unit_nodes() {
            let requirements = &node.requirements;
            if requirements.is_empty() {
                continue;
            }
            let fragments: BTreeSet<String> = requirements
                .all
                .union(&requirements.any)
                .cloned()
                .collect();
            if !catalog.shapes.iter().any(|shape| shape.fragments == fragments) {
                catalog.shapes.push(DataShape {
                    name: node.name.clone(),
                    fragments,
                });
            }
        }
        catalog
    }

    pub fn shapes(&self) -> &[DataShape] {
        &self.shapes
    }

    pub fn shape(&self, id: ShapeId) -> Option<&DataShape> {
        self.shapes.get(id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl DataModel for ShapeCatalog {
    fn matching_shapes(&self, requirements: &DataRequirements) -> Vec<ShapeId> {
        self.shapes
            .iter()
            .enumerate()
            .filter(|(_, shape)| requirements.matches(&shape.fragments))
            .map(|(id, _)| id)
            .collect()
    }
}

/// What the pruning pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Names of the units demoted to pass-through nodes, in registry order
    pub pruned: Vec<String>,
}

impl PruneReport {
    pub fn pruned_count(&self) -> usize {
        self.pruned.len()
    }
}

/// Query the data model for every active unit and prune the inapplicable ones
///
/// A unit is pruned iff it has requirements, matches no shape, and its
/// type allows pruning in `mode`. Pruned nodes are never removed.
pub fn prune_inapplicable(
    registry: &mut NodeRegistry<'_>,
    model: &dyn DataModel,
    mode: AnalysisMode,
    sink: &dyn DiagnosticSink,
) -> PruneReport {
    let mut report = PruneReport::default();

    for node in registry.nodes_mut() {
        let Some(unit) = node.unit_ref() else {
            continue;
        };
        // Requiring nothing matches trivially
        if node.requirements.is_empty() {
            continue;
        }

        node.matched_shapes = model.matching_shapes(&node.requirements);

        if node.matched_shapes.is_empty() && unit.allows_pruning(mode) {
            sink.emit(DiagnosticEvent::UnitPruned {
                name: node.name.clone(),
            });
            report.pruned.push(node.name.clone());
            node.make_pass_through();
        }
    }

    sink.emit(DiagnosticEvent::PruningFinished {
        pruned: report.pruned_count(),
    });
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NullDiagnosticSink, VecDiagnosticSink};
    use crate::groups::build_group_tree;
    use crate::unit::{ProcessingUnit, PruningPolicy, UnitDescriptor};

    struct EmptyModel;

    impl DataModel for EmptyModel {
        fn matching_shapes(&self, _requirements: &DataRequirements) -> Vec<ShapeId> {
            Vec::new()
        }
    }

    #[test]
    fn test_synthetic_catalog_dedups_compositions() {
        let a = UnitDescriptor::new("A").requires("Transform");
        let b = UnitDescriptor::new("B").requires("Transform");
        let c = UnitDescriptor::new("C").requires("Transform").requires("Mesh");
        let d = UnitDescriptor::new("D");
        let units: Vec<Option<&dyn ProcessingUnit>> = vec![Some(&a), Some(&b), Some(&c), Some(&d)];
        let tree = build_group_tree(&units, &NullDiagnosticSink);

        let catalog = ShapeCatalog::synthetic(&tree.registry);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.shape(0).map(|s| s.name.as_str()), Some("A"));
        assert_eq!(catalog.shape(1).map(|s| s.name.as_str()), Some("C"));
    }

    #[test]
    fn test_static_mode_prunes_nothing_self_consistent() {
        let a = UnitDescriptor::new("A").requires("Transform");
        let b = UnitDescriptor::new("B").requires("Transform").excludes("Mesh");
        let units: Vec<Option<&dyn ProcessingUnit>> = vec![Some(&a), Some(&b)];
        let mut tree = build_group_tree(&units, &NullDiagnosticSink);
        let catalog = ShapeCatalog::synthetic(&tree.registry);

        let report = prune_inapplicable(
            &mut tree.registry,
            &catalog,
            AnalysisMode::Static,
            &NullDiagnosticSink,
        );

        assert_eq!(report.pruned_count(), 0);
        let b_node = tree.registry.get_by_name("B").unwrap();
        assert_eq!(b_node.matched_shapes, vec![0]);
    }

    #[test]
    fn test_runtime_prunes_unmatched_units() {
        let steer = UnitDescriptor::new("Steer").requires("Velocity").before("Move");
        let move_unit = UnitDescriptor::new("Move").requires("Transform");
        let units: Vec<Option<&dyn ProcessingUnit>> = vec![Some(&steer), Some(&move_unit)];
        let mut tree = build_group_tree(&units, &NullDiagnosticSink);
        let live = ShapeCatalog::new(vec![DataShape::new("Props", ["Transform"])]);
        let sink = VecDiagnosticSink::new();

        let report = prune_inapplicable(&mut tree.registry, &live, AnalysisMode::Runtime, &sink);

        assert_eq!(report.pruned, vec!["Steer".to_string()]);
        assert_eq!(tree.registry.len(), 3);
        let steer_node = tree.registry.get_by_name("Steer").unwrap();
        assert!(steer_node.is_group());
        assert!(steer_node.pruned);
        assert_eq!(steer_node.execute_before, vec!["Move".to_string()]);
        assert!(!tree.registry.get_by_name("Move").unwrap().is_group());
        assert_eq!(
            sink.events(),
            vec![
                DiagnosticEvent::UnitPruned {
                    name: "Steer".to_string()
                },
                DiagnosticEvent::PruningFinished { pruned: 1 },
            ]
        );
    }

    #[test]
    fn test_empty_requirements_never_pruned() {
        let tick = UnitDescriptor::new("Tick");
        let units: Vec<Option<&dyn ProcessingUnit>> = vec![Some(&tick)];
        let mut tree = build_group_tree(&units, &NullDiagnosticSink);

        for mode in [AnalysisMode::Static, AnalysisMode::Runtime] {
            let report = prune_inapplicable(&mut tree.registry, &EmptyModel, mode, &NullDiagnosticSink);
            assert_eq!(report.pruned_count(), 0);
        }
        assert!(tree.registry.get_by_name("Tick").unwrap().unit_ref().is_some());
    }

    #[test]
    fn test_pruning_respects_unit_policy() {
        let keep = UnitDescriptor::new("Keep")
            .requires("Missing")
            .with_pruning(PruningPolicy::StaticOnly);
        let drop = UnitDescriptor::new("Drop").requires("Missing");
        let units: Vec<Option<&dyn ProcessingUnit>> = vec![Some(&keep), Some(&drop)];
        let mut tree = build_group_tree(&units, &NullDiagnosticSink);

        let report = prune_inapplicable(
            &mut tree.registry,
            &EmptyModel,
            AnalysisMode::Runtime,
            &NullDiagnosticSink,
        );

        assert_eq!(report.pruned, vec!["Drop".to_string()]);
        let keep_node = tree.registry.get_by_name("Keep").unwrap();
        assert!(keep_node.unit_ref().is_some());
        assert!(keep_node.matched_shapes.is_empty());
    }

    #[test]
    fn test_static_mode_keeps_any_only_units() {
        let draw = UnitDescriptor::new("Draw").requires_any("Mesh").requires_any("Sprite");
        let hide = UnitDescriptor::new("Hide").excludes("Visible");
        let units: Vec<Option<&dyn ProcessingUnit>> = vec![Some(&draw), Some(&hide)];
        let mut tree = build_group_tree(&units, &NullDiagnosticSink);
        let catalog = ShapeCatalog::synthetic(&tree.registry);

        let report = prune_inapplicable(
            &mut tree.registry,
            &catalog,
            AnalysisMode::Static,
            &NullDiagnosticSink,
        );

        assert_eq!(catalog.len(), 2);
        assert!(catalog.shape(1).unwrap().fragments.is_empty());
        assert_eq!(report.pruned_count(), 0);
        assert_eq!(tree.registry.get_by_name("Draw").unwrap().matched_shapes, vec![0]);
        assert_eq!(tree.registry.get_by_name("Hide").unwrap().matched_shapes, vec![0, 1]);
    }

    #[test]
    fn test_contradictory_requirements_pruned_in_static_mode() {
        let odd = UnitDescriptor::new("Odd").requires("Tag").excludes("Tag");
        let units: Vec<Option<&dyn ProcessingUnit>> = vec![Some(&odd)];
        let mut tree = build_group_tree(&units, &NullDiagnosticSink);
        let catalog = ShapeCatalog::synthetic(&tree.registry);

        let report = prune_inapplicable(
            &mut tree.registry,
            &catalog,
            AnalysisMode::Static,
            &NullDiagnosticSink,
        );

        assert_eq!(report.pruned_count(), 1);
    }
}
