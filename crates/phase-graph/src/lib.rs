//! Phase Graph - Execution-order diagnostics for phased processing units
//!
//! Processing units run in a deterministic order each tick, constrained by
//! their declared "execute before" / "execute after" names and organized
//! into dotted groups. This crate builds a diagnostic view of that
//! ordering graph for one phase and exports it as JSON:
//!
//! - Synthesizes group nodes so units and groups form a single tree
//! - Prunes units that match no data, keeping them as pass-through nodes
//! - Reports duplicate registrations and null entries instead of failing
//! - Exports either the group tree or the complete flattened dependencies
//!
//! # Architecture
//!
//! - `GroupTreeBuilder`: flat unit list to `NodeRegistry`
//! - `prune_inapplicable`: applicability check against a `DataModel`
//! - `DependencyResolver`: execution order, used for discard reporting
//! - `render_document`: one JSON mapping over tree or flat node views
//! - `PhaseDependencyPrinter`: runs the whole pipeline for one phase
//!
//! # Example
//!
//! ```ignore
//! use phase_graph::{AnalysisMode, PhaseCatalog, PhaseDependencyPrinter, PrintRequest};
//!
//! let catalog = PhaseCatalog::from_path("phases.json")?;
//! let outcome = PhaseDependencyPrinter::new(&catalog)
//!     .print(&PrintRequest::tree(0, AnalysisMode::Static), &[])?;
//! ```

pub mod applicability;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod groups;
pub mod inspect;
pub mod printer;
pub mod registry;
pub mod resolver;
pub mod types;
pub mod unit;

// Re-export key types
pub use applicability::{prune_inapplicable, DataModel, DataShape, PruneReport, ShapeCatalog};
pub use config::{dump_file_name, DumpConfig, PhaseCatalog, PhaseConfig};
pub use error::{PhaseGraphError, Result};
pub use events::{DiagnosticEvent, DiagnosticSink, LogSink, NullDiagnosticSink, VecDiagnosticSink};
pub use export::{
    export_registry, flat_view, render_document, tree_view, ExportedNode, GraphDocument,
    NodeColor, NodeView,
};
pub use groups::{
    build_group_tree, BuildReport, GroupConflict, GroupTree, GroupTreeBuilder, Registration,
};
pub use inspect::{load_document, to_dot, DotOptions};
pub use printer::{ExportSummary, PhaseDependencyPrinter, PrintOutcome, PrintRequest, UnitProvider};
pub use registry::NodeRegistry;
pub use resolver::{discarded_units, DependencyResolver, PetgraphResolver, Resolution};
pub use types::{AnalysisMode, GraphNode, NodeIndex, NodeKind, PrintMode, ShapeId};
pub use unit::{DataRequirements, ProcessingUnit, PruningPolicy, UnitDescriptor};
