//! Diagnostic events emitted while building and pruning a phase graph
//!
//! The builder, pruner and printer never log directly. They report what
//! they observe to a [`DiagnosticSink`] supplied by the caller, so the
//! same code can write to the `log` facade, collect events in a test,
//! or stay silent.

use serde::{Deserialize, Serialize};

/// Trait for receiving diagnostic events
pub trait DiagnosticSink {
    /// Receive an event
    fn emit(&self, event: DiagnosticEvent);
}

/// Events emitted during one dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DiagnosticEvent {
    /// A null entry was found in the unit list and skipped
    #[serde(rename_all = "camelCase")]
    NullUnitSkipped { position: usize },

    /// A single-instance unit was registered twice; the later one was skipped
    #[serde(rename_all = "camelCase")]
    DuplicateUnit { name: String },

    /// A unit's group path runs through a name another unit already holds;
    /// the later unit was skipped
    #[serde(rename_all = "camelCase")]
    GroupNameConflict { unit: String, group: String },

    /// A further instance of a multi-instance unit was keyed by its instance name
    #[serde(rename_all = "camelCase")]
    InstanceRekeyed {
        class_name: String,
        instance_name: String,
    },

    /// A unit matched no data shape and became a pass-through node
    #[serde(rename_all = "camelCase")]
    UnitPruned { name: String },

    /// Pruning pass finished
    #[serde(rename_all = "camelCase")]
    PruningFinished { pruned: usize },

    /// Units the resolver left out of the execution order
    #[serde(rename_all = "camelCase")]
    UnitsDiscarded { names: Vec<String> },

    /// The resolver found a cycle in the ordering constraints
    #[serde(rename_all = "camelCase")]
    CycleReported { node: String },
}

/// Sink that forwards events to the `log` facade
///
/// Anomalies are warnings, progress is debug output.
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::NullUnitSkipped { position } => {
                log::warn!("Null unit found at position {} of the unit list, skipping", position);
            }
            DiagnosticEvent::DuplicateUnit { name } => {
                log::warn!("Unit {} already registered. Duplicates are not supported.", name);
            }
            DiagnosticEvent::GroupNameConflict { unit, group } => {
                log::warn!(
                    "Unit {} is grouped under {}, which is already a unit name. Skipping {}.",
                    unit,
                    group,
                    unit
                );
            }
            DiagnosticEvent::InstanceRekeyed {
                class_name,
                instance_name,
            } => {
                log::debug!("Registering another instance of {} as {}", class_name, instance_name);
            }
            DiagnosticEvent::UnitPruned { name } => {
                log::debug!("\t{}", name);
            }
            DiagnosticEvent::PruningFinished { pruned } => {
                log::debug!("Number of units pruned: {}", pruned);
            }
            DiagnosticEvent::UnitsDiscarded { names } => {
                log::debug!("Discarding units due to not having anything to do (no matching data shapes):");
                for name in names {
                    log::debug!("\t{}", name);
                }
            }
            DiagnosticEvent::CycleReported { node } => {
                log::warn!("Cycle detected in ordering constraints involving {}", node);
            }
        }
    }
}

/// A no-op sink that discards all events
pub struct NullDiagnosticSink;

impl DiagnosticSink for NullDiagnosticSink {
    fn emit(&self, _event: DiagnosticEvent) {}
}

/// A vector-based sink that collects events
///
/// Useful for testing to verify events were emitted correctly.
pub struct VecDiagnosticSink {
    events: std::sync::Mutex<Vec<DiagnosticEvent>>,
}

impl VecDiagnosticSink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Get all collected events
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Clear all collected events
    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl Default for VecDiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for VecDiagnosticSink {
    fn emit(&self, event: DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_collects_in_order() {
        let sink = VecDiagnosticSink::new();

        sink.emit(DiagnosticEvent::DuplicateUnit {
            name: "Move".to_string(),
        });
        sink.emit(DiagnosticEvent::PruningFinished { pruned: 2 });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        match &events[0] {
            DiagnosticEvent::DuplicateUnit { name } => assert_eq!(name, "Move"),
            other => panic!("Expected DuplicateUnit event, got {:?}", other),
        }

        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_null_sink() {
        let sink = NullDiagnosticSink;
        // Should not panic
        sink.emit(DiagnosticEvent::NullUnitSkipped { position: 0 });
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = DiagnosticEvent::InstanceRekeyed {
            class_name: "Spawn".to_string(),
            instance_name: "Spawn_1".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "instanceRekeyed");
        assert_eq!(json["className"], "Spawn");
        assert_eq!(json["instanceName"], "Spawn_1");
    }
}
