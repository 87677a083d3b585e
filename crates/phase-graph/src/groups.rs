//! Group tree construction
//!
//! Turns a flat list of processing units into a [`NodeRegistry`]: one node
//! per unit, plus one synthetic group node per level of every dotted group
//! path. `"Sim.Render"` yields the groups `Sim` and `Sim.Render`, the latter
//! a child of the former.
//!
//! Building happens in two passes. The first pass resolves every unit's
//! registry name and creates all group chains; the second creates the unit
//! nodes in input order. Groups therefore always precede the units that
//! reference them (and units of descendant groups), so later phases can rely
//! on a node's ancestors having lower indices.
//!
//! # Example
//!
//! ```ignore
//! let units: Vec<Option<&dyn ProcessingUnit>> = vec![Some(&move_unit), Some(&render_unit)];
//! let tree = build_group_tree(&units, &LogSink);
//! assert_eq!(tree.registry.nodes()[0].name, "");
//! ```

use std::collections::HashSet;

use crate::events::{DiagnosticEvent, DiagnosticSink};
use crate::registry::NodeRegistry;
use crate::types::{GraphNode, NodeIndex, ROOT_INDEX};
use crate::unit::{group_path_segments, ProcessingUnit};

/// A unit that was refused because its name is already taken
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateUnit {
    /// Name the unit tried to register under
    pub name: String,
    /// Node already registered under that name
    pub existing: Option<NodeIndex>,
}

/// A unit refused because its group path names an earlier unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConflict {
    pub unit: String,
    /// Path segment already claimed by a unit
    pub group: String,
}

/// Anomalies found while building the tree
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub duplicates: Vec<DuplicateUnit>,
    pub group_conflicts: Vec<GroupConflict>,
    /// Number of null entries skipped
    pub null_entries: usize,
    /// Instance names used for second and later instances of a unit type
    pub rekeyed: Vec<String>,
}

/// Outcome of offering one unit to the builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    /// Registered under its class name
    Accepted(String),
    /// Registered under its instance name
    Rekeyed(String),
    /// Skipped, the name is already taken
    Duplicate(String),
    /// Skipped, a segment of its group path is already a unit
    GroupConflict(String),
}

/// Populated registry plus the anomalies seen while building it
#[derive(Debug, Clone)]
pub struct GroupTree<'a> {
    pub registry: NodeRegistry<'a>,
    pub report: BuildReport,
}

struct PendingUnit<'a> {
    name: String,
    unit: &'a dyn ProcessingUnit,
    parent: NodeIndex,
}

/// Incremental group tree builder
pub struct GroupTreeBuilder<'a, 's> {
    registry: NodeRegistry<'a>,
    pending: Vec<PendingUnit<'a>>,
    claimed: HashSet<String>,
    report: BuildReport,
    sink: &'s dyn DiagnosticSink,
}

impl<'a, 's> GroupTreeBuilder<'a, 's> {
    pub fn new(sink: &'s dyn DiagnosticSink) -> Self {
        Self {
            registry: NodeRegistry::new(),
            pending: Vec::new(),
            claimed: HashSet::new(),
            report: BuildReport::default(),
            sink,
        }
    }

    /// Offer a list of units, skipping null entries
    pub fn add_units<I>(&mut self, units: I) -> &mut Self
    where
        I: IntoIterator<Item = Option<&'a dyn ProcessingUnit>>,
    {
        for (position, unit) in units.into_iter().enumerate() {
            match unit {
                Some(unit) => {
                    self.add_unit(unit);
                }
                None => {
                    self.report.null_entries += 1;
                    self.sink.emit(DiagnosticEvent::NullUnitSkipped { position });
                }
            }
        }
        self
    }

    /// Offer a single unit
    ///
    /// Resolves the unit's registry name and creates its group chain. The
    /// unit node itself is created by [`finish`](Self::finish).
    pub fn add_unit(&mut self, unit: &'a dyn ProcessingUnit) -> Registration {
        let class_name = unit.name().to_string();
        let registration = if !self.is_taken(&class_name) {
            Registration::Accepted(class_name.clone())
        } else if unit.allows_multiple_instances() && !self.is_taken(unit.instance_name()) {
            // The first instance keeps the class name so other units can keep
            // ordering against the class as a whole
            Registration::Rekeyed(unit.instance_name().to_string())
        } else {
            Registration::Duplicate(class_name.clone())
        };

        let name = match &registration {
            Registration::Duplicate(name) => {
                self.sink
                    .emit(DiagnosticEvent::DuplicateUnit { name: name.clone() });
                self.report.duplicates.push(DuplicateUnit {
                    name: name.clone(),
                    existing: None,
                });
                None
            }
            Registration::Rekeyed(name) => {
                self.sink.emit(DiagnosticEvent::InstanceRekeyed {
                    class_name,
                    instance_name: name.clone(),
                });
                self.report.rekeyed.push(name.clone());
                Some(name.clone())
            }
            Registration::Accepted(name) => Some(name.clone()),
            Registration::GroupConflict(_) => None,
        };
        let Some(name) = name else {
            return registration;
        };

        let parent = match unit.group_path() {
            Some(path) => match self.resolve_group_chain(path) {
                Ok(parent) => parent,
                Err(group) => {
                    self.sink.emit(DiagnosticEvent::GroupNameConflict {
                        unit: name.clone(),
                        group: group.clone(),
                    });
                    self.report.group_conflicts.push(GroupConflict {
                        unit: name.clone(),
                        group,
                    });
                    return Registration::GroupConflict(name);
                }
            },
            None => ROOT_INDEX,
        };

        self.claimed.insert(name.clone());
        self.pending.push(PendingUnit { name, unit, parent });
        registration
    }

    /// Create the unit nodes and hand back the finished tree
    pub fn finish(mut self) -> GroupTree<'a> {
        // Group chains never reuse a claimed name, so unit names are free here
        for pending in std::mem::take(&mut self.pending) {
            let index = self
                .registry
                .insert(GraphNode::unit(pending.name, pending.unit, 0));
            self.registry.link_child(pending.parent, index);
        }

        for duplicate in &mut self.report.duplicates {
            duplicate.existing = self.registry.find(&duplicate.name);
        }

        GroupTree {
            registry: self.registry,
            report: self.report,
        }
    }

    fn is_taken(&self, name: &str) -> bool {
        self.claimed.contains(name) || self.registry.contains(name)
    }

    /// Find or create every group along `path`, returning the innermost one
    ///
    /// Fails with the offending segment when it is a name already claimed by
    /// a unit. Nothing is created in that case.
    fn resolve_group_chain(&mut self, path: &str) -> Result<NodeIndex, String> {
        let segments = group_path_segments(path);
        if let Some(taken) = segments.iter().find(|s| self.claimed.contains(s.as_str())) {
            return Err(taken.clone());
        }

        let mut parent = ROOT_INDEX;
        for segment in segments {
            parent = match self.registry.find(&segment) {
                Some(existing) => existing,
                None => {
                    let index = self.registry.insert(GraphNode::group(segment, 0));
                    self.registry.link_child(parent, index);
                    index
                }
            };
        }
        Ok(parent)
    }
}

/// Build the group tree for a list of units in one call
pub fn build_group_tree<'a>(
    units: &[Option<&'a dyn ProcessingUnit>],
    sink: &dyn DiagnosticSink,
) -> GroupTree<'a> {
    let mut builder = GroupTreeBuilder::new(sink);
    builder.add_units(units.iter().copied());
    builder.finish()
}
