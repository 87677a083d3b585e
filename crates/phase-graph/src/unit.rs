//! Processing unit contract and the serializable unit descriptor
//!
//! A processing unit is one schedulable work item. The graph only needs to
//! read its declarations, so units are seen through the [`ProcessingUnit`]
//! trait and borrowed from whoever owns them for the duration of a dump.
//!
//! # Example
//!
//! ```ignore
//! let unit = UnitDescriptor::new("Render")
//!     .in_group("Sim.Render")
//!     .after("Move")
//!     .requires("Mesh");
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::AnalysisMode;

/// Read-only view of a processing unit
pub trait ProcessingUnit {
    /// Class name, shared by every instance of the unit type
    fn name(&self) -> &str;

    /// Name unique to this instance
    ///
    /// Used as the registry key for second and later instances of a
    /// multi-instance unit type.
    fn instance_name(&self) -> &str;

    /// Dotted group path, e.g. `"Sim.Render"`
    fn group_path(&self) -> Option<&str>;

    fn execute_before(&self) -> &[String];

    fn execute_after(&self) -> &[String];

    /// Data the unit needs to have anything to do
    fn requirements(&self) -> &DataRequirements;

    fn allows_multiple_instances(&self) -> bool;

    /// Whether the unit may be pruned when it matches no data in `mode`
    fn allows_pruning(&self, mode: AnalysisMode) -> bool;

    /// Phase the unit belongs to when it is supplied dynamically
    fn processing_phase(&self) -> Option<usize> {
        None
    }
}

/// Fragment-level description of the data a unit operates on
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRequirements {
    /// Fragments that must all be present
    #[serde(default)]
    pub all: BTreeSet<String>,
    /// At least one of these must be present (ignored when empty)
    #[serde(default)]
    pub any: BTreeSet<String>,
    /// Fragments that must be absent
    #[serde(default)]
    pub none: BTreeSet<String>,
}

impl DataRequirements {
    /// A unit with empty requirements operates on no data and always applies
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.any.is_empty() && self.none.is_empty()
    }

    /// Check whether a shape with the given fragments satisfies these requirements
    pub fn matches(&self, fragments: &BTreeSet<String>) -> bool {
        self.all.is_subset(fragments)
            && (self.any.is_empty() || !self.any.is_disjoint(fragments))
            && self.none.is_disjoint(fragments)
    }
}

/// When a unit may be pruned for lack of matching data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PruningPolicy {
    #[default]
    Always,
    Never,
    StaticOnly,
    RuntimeOnly,
}

impl PruningPolicy {
    pub fn allows(&self, mode: AnalysisMode) -> bool {
        match self {
            PruningPolicy::Always => true,
            PruningPolicy::Never => false,
            PruningPolicy::StaticOnly => mode == AnalysisMode::Static,
            PruningPolicy::RuntimeOnly => mode == AnalysisMode::Runtime,
        }
    }
}

/// Declarative processing unit, as read from a phase configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDescriptor {
    pub name: String,
    #[serde(default)]
    pub instance_name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub execute_before: Vec<String>,
    #[serde(default)]
    pub execute_after: Vec<String>,
    #[serde(default)]
    pub requirements: DataRequirements,
    #[serde(default)]
    pub allow_multiple_instances: bool,
    #[serde(default)]
    pub pruning: PruningPolicy,
    #[serde(default)]
    pub phase: Option<usize>,
}

impl UnitDescriptor {
    /// Create a unit with no group, no ordering and no requirements
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance_name: None,
            group: None,
            execute_before: Vec::new(),
            execute_after: Vec::new(),
            requirements: DataRequirements::default(),
            allow_multiple_instances: false,
            pruning: PruningPolicy::default(),
            phase: None,
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn before(mut self, name: impl Into<String>) -> Self {
        self.execute_before.push(name.into());
        self
    }

    pub fn after(mut self, name: impl Into<String>) -> Self {
        self.execute_after.push(name.into());
        self
    }

    pub fn requires(mut self, fragment: impl Into<String>) -> Self {
        self.requirements.all.insert(fragment.into());
        self
    }

    pub fn requires_any(mut self, fragment: impl Into<String>) -> Self {
        self.requirements.any.insert(fragment.into());
        self
    }

    pub fn excludes(mut self, fragment: impl Into<String>) -> Self {
        self.requirements.none.insert(fragment.into());
        self
    }

    /// Allow several instances, naming this one `instance_name`
    pub fn multi_instance(mut self, instance_name: impl Into<String>) -> Self {
        self.allow_multiple_instances = true;
        self.instance_name = Some(instance_name.into());
        self
    }

    pub fn with_pruning(mut self, pruning: PruningPolicy) -> Self {
        self.pruning = pruning;
        self
    }

    pub fn in_phase(mut self, phase: usize) -> Self {
        self.phase = Some(phase);
        self
    }
}

impl ProcessingUnit for UnitDescriptor {
    fn name(&self) -> &str {
        &self.name
    }

    fn instance_name(&self) -> &str {
        self.instance_name.as_deref().unwrap_or(&self.name)
    }

    fn group_path(&self) -> Option<&str> {
        self.group.as_deref()
    }

    fn execute_before(&self) -> &[String] {
        &self.execute_before
    }

    fn execute_after(&self) -> &[String] {
        &self.execute_after
    }

    fn requirements(&self) -> &DataRequirements {
        &self.requirements
    }

    fn allows_multiple_instances(&self) -> bool {
        self.allow_multiple_instances
    }

    fn allows_pruning(&self, mode: AnalysisMode) -> bool {
        self.pruning.allows(mode)
    }

    fn processing_phase(&self) -> Option<usize> {
        self.phase
    }
}

/// Expand a dotted group path into one name per nesting level
///
/// `"A.B.C"` becomes `["A", "A.B", "A.B.C"]`. Empty segments are skipped,
/// so an empty path yields no groups.
pub fn group_path_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    for part in path.split('.').filter(|part| !part.is_empty()) {
        if !current.is_empty() {
            current.push('.');
        }
        current.push_str(part);
        segments.push(current.clone());
    }
    segments
}
