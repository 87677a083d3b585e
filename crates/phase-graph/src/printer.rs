//! Phase dependency printer
//!
//! Runs one dump end to end: gather the phase's units, build the group
//! tree, prune inapplicable units, optionally resolve the execution order,
//! and export the graph. Every call starts from an empty registry; nothing
//! is kept between calls.
//!
//! # Example
//!
//! ```ignore
//! let catalog = PhaseCatalog::from_path("phases.json")?;
//! let printer = PhaseDependencyPrinter::new(&catalog);
//! let outcome = printer.print(&PrintRequest::tree(0, AnalysisMode::Static), &[])?;
//! println!("{}", outcome.document.to_json_pretty()?);
//! ```

use serde::{Deserialize, Serialize};

use crate::applicability::{prune_inapplicable, DataModel, ShapeCatalog};
use crate::error::{PhaseGraphError, Result};
use crate::events::{DiagnosticEvent, DiagnosticSink, LogSink};
use crate::export::{export_registry, GraphDocument};
use crate::groups::{GroupTree, GroupTreeBuilder};
use crate::resolver::{discarded_units, DependencyResolver, PetgraphResolver};
use crate::types::{AnalysisMode, PrintMode};
use crate::unit::ProcessingUnit;

/// Supplies the processing units configured for each phase
pub trait UnitProvider {
    fn phase_count(&self) -> usize;

    fn phase_name(&self, phase: usize) -> Option<&str>;

    /// Units of a phase in configured order; `None` when the phase does not exist
    ///
    /// Entries may be null; they are skipped with a warning.
    fn units(&self, phase: usize) -> Option<Vec<Option<&dyn ProcessingUnit>>>;
}

/// Parameters of one dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintRequest {
    pub phase: usize,
    pub print_mode: PrintMode,
    pub analysis_mode: AnalysisMode,
}

impl PrintRequest {
    pub fn tree(phase: usize, analysis_mode: AnalysisMode) -> Self {
        Self {
            phase,
            print_mode: PrintMode::ExecutesGroupTree,
            analysis_mode,
        }
    }

    pub fn flat(phase: usize, analysis_mode: AnalysisMode) -> Self {
        Self {
            phase,
            print_mode: PrintMode::CompletelyDependency,
            analysis_mode,
        }
    }
}

/// Anomalies and counts accumulated during one dump
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub node_count: usize,
    /// Units demoted to pass-through nodes
    pub pruned: Vec<String>,
    /// Units left out of the resolved execution order (flat mode only)
    pub discarded: Vec<String>,
    /// Names of refused duplicate registrations
    pub duplicates: Vec<String>,
    /// Units refused because their group path runs through a unit
    pub group_conflicts: Vec<String>,
    pub null_entries: usize,
    /// Node named by the resolver's cycle report
    pub cycle: Option<String>,
}

/// A rendered document and what happened while producing it
#[derive(Debug, Clone)]
pub struct PrintOutcome {
    pub document: GraphDocument,
    pub summary: ExportSummary,
}

/// Builds and exports the dependency graph of one phase
pub struct PhaseDependencyPrinter<'p> {
    provider: &'p dyn UnitProvider,
    data_model: Option<&'p dyn DataModel>,
    resolver: &'p dyn DependencyResolver,
    sink: &'p dyn DiagnosticSink,
}

impl<'p> PhaseDependencyPrinter<'p> {
    /// Printer with the petgraph resolver, logging to the `log` facade
    pub fn new(provider: &'p dyn UnitProvider) -> Self {
        Self {
            provider,
            data_model: None,
            resolver: &PetgraphResolver,
            sink: &LogSink,
        }
    }

    /// Live data model used in runtime mode
    pub fn with_data_model(mut self, data_model: &'p dyn DataModel) -> Self {
        self.data_model = Some(data_model);
        self
    }

    pub fn with_resolver(mut self, resolver: &'p dyn DependencyResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_sink(mut self, sink: &'p dyn DiagnosticSink) -> Self {
        self.sink = sink;
        self
    }

    /// Dump one phase
    ///
    /// `dynamic_units` are appended after the configured units when their
    /// processing phase matches the requested one.
    ///
    /// # Errors
    ///
    /// Fails when the phase is out of range, or when runtime mode is
    /// requested without a live data model.
    pub fn print(
        &self,
        request: &PrintRequest,
        dynamic_units: &[Option<&dyn ProcessingUnit>],
    ) -> Result<PrintOutcome> {
        let configured =
            self.provider
                .units(request.phase)
                .ok_or(PhaseGraphError::PhaseOutOfRange {
                    phase: request.phase,
                    available: self.provider.phase_count(),
                })?;

        let live_model = match request.analysis_mode {
            AnalysisMode::Runtime => Some(self.data_model.ok_or(PhaseGraphError::MissingDataModel)?),
            AnalysisMode::Static => None,
        };

        let mut units: Vec<Option<&dyn ProcessingUnit>> = configured;
        units.extend(dynamic_units.iter().copied().filter(|slot| {
            slot.map_or(true, |unit| unit.processing_phase() == Some(request.phase))
        }));

        log::info!(
            "Gathering dependencies data for phase {} ({} units)",
            self.provider.phase_name(request.phase).unwrap_or_default(),
            units.len()
        );

        let mut builder = GroupTreeBuilder::new(self.sink);
        builder.add_units(units);
        let GroupTree {
            mut registry,
            report,
        } = builder.finish();

        let synthetic;
        let model: &dyn DataModel = match live_model {
            Some(model) => model,
            None => {
                synthetic = ShapeCatalog::synthetic(&registry);
                &synthetic
            }
        };
        let pruning = prune_inapplicable(&mut registry, model, request.analysis_mode, self.sink);

        let mut summary = ExportSummary {
            node_count: registry.len(),
            pruned: pruning.pruned,
            discarded: Vec::new(),
            duplicates: report.duplicates.into_iter().map(|d| d.name).collect(),
            group_conflicts: report
                .group_conflicts
                .into_iter()
                .map(|c| c.unit)
                .collect(),
            null_entries: report.null_entries,
            cycle: None,
        };

        if request.print_mode == PrintMode::CompletelyDependency {
            let resolution = self.resolver.resolve(&registry);
            if let Some(node) = &resolution.cycle {
                self.sink
                    .emit(DiagnosticEvent::CycleReported { node: node.clone() });
            }
            for class in &resolution.pruned_classes {
                if !summary.pruned.contains(class) {
                    summary.pruned.push(class.clone());
                }
            }
            summary.discarded = discarded_units(&registry, &resolution);
            if !summary.discarded.is_empty() {
                self.sink.emit(DiagnosticEvent::UnitsDiscarded {
                    names: summary.discarded.clone(),
                });
            }
            summary.cycle = resolution.cycle;
        }

        Ok(PrintOutcome {
            document: export_registry(&registry, request.print_mode),
            summary,
        })
    }
}
