//! Phase configuration and dump output settings
//!
//! A phase catalog is a JSON file listing the processing units of every
//! phase, optionally with a snapshot of the data shapes present at runtime:
//!
//! ```json
//! {
//!   "phases": [
//!     { "name": "PrePhysics", "units": [ { "name": "Move", "group": "Sim" }, null ] }
//!   ],
//!   "runtimeShapes": [ { "name": "Crowd", "fragments": ["Transform"] } ]
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::applicability::{DataShape, ShapeCatalog};
use crate::error::Result;
use crate::export::GraphDocument;
use crate::printer::{PrintRequest, UnitProvider};
use crate::types::{AnalysisMode, PrintMode};
use crate::unit::{ProcessingUnit, UnitDescriptor};

/// Default directory for dump files
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Units configured for one phase
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseConfig {
    pub name: String,
    #[serde(default)]
    pub units: Vec<Option<UnitDescriptor>>,
}

/// File-backed unit provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseCatalog {
    #[serde(default)]
    pub phases: Vec<PhaseConfig>,
    /// Data shapes observed at runtime; required for runtime dumps
    #[serde(default)]
    pub runtime_shapes: Option<Vec<DataShape>>,
}

impl PhaseCatalog {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Live data model built from `runtimeShapes`, if present
    pub fn runtime_model(&self) -> Option<ShapeCatalog> {
        self.runtime_shapes
            .as_ref()
            .map(|shapes| ShapeCatalog::new(shapes.clone()))
    }
}

impl UnitProvider for PhaseCatalog {
    fn phase_count(&self) -> usize {
        self.phases.len()
    }

    fn phase_name(&self, phase: usize) -> Option<&str> {
        self.phases.get(phase).map(|p| p.name.as_str())
    }

    fn units(&self, phase: usize) -> Option<Vec<Option<&dyn ProcessingUnit>>> {
        self.phases.get(phase).map(|config| {
            config
                .units
                .iter()
                .map(|slot| slot.as_ref().map(|unit| unit as &dyn ProcessingUnit))
                .collect()
        })
    }
}

/// Where dumps are written
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpConfig {
    pub output_dir: PathBuf,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl DumpConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Path a dump of `phase_name` is written to
    pub fn dump_path(&self, phase_name: &str, request: &PrintRequest) -> PathBuf {
        self.output_dir.join(dump_file_name(
            phase_name,
            request.analysis_mode,
            request.print_mode,
        ))
    }

    /// Write a document as indented JSON, creating the output directory
    pub fn write(
        &self,
        phase_name: &str,
        request: &PrintRequest,
        document: &GraphDocument,
    ) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.dump_path(phase_name, request);
        std::fs::write(&path, document.to_json_pretty()?)?;
        Ok(path)
    }
}

/// `<phase>_<Static|Runtime>_<PrintMode>.json`
///
/// Characters that are unsafe in file names are replaced with `_`.
pub fn dump_file_name(phase_name: &str, analysis_mode: AnalysisMode, print_mode: PrintMode) -> String {
    let phase: String = phase_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}_{}.json", phase, analysis_mode.label(), print_mode.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{ExportedNode, NodeColor};

    const CATALOG: &str = r#"{
        "phases": [
            {
                "name": "PrePhysics",
                "units": [
                    { "name": "Move", "group": "Sim", "requirements": { "all": ["Transform"] } },
                    null,
                    { "name": "Render", "group": "Sim.Render", "executeAfter": ["Move"] }
                ]
            },
            { "name": "PostPhysics" }
        ],
        "runtimeShapes": [ { "name": "Crowd", "fragments": ["Transform", "Velocity"] } ]
    }"#;

    #[test]
    fn test_catalog_parsing() {
        let catalog = PhaseCatalog::from_json_str(CATALOG).unwrap();

        assert_eq!(catalog.phase_count(), 2);
        assert_eq!(catalog.phase_name(0), Some("PrePhysics"));
        assert_eq!(catalog.phase_name(5), None);

        let units = catalog.units(0).unwrap();
        assert_eq!(units.len(), 3);
        assert!(units[1].is_none());
        assert_eq!(units[2].map(|u| u.name()), Some("Render"));
        assert!(catalog.units(1).unwrap().is_empty());
        assert!(catalog.units(2).is_none());

        let model = catalog.runtime_model().unwrap();
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn test_catalog_without_runtime_shapes() {
        let catalog = PhaseCatalog::from_json_str(r#"{ "phases": [] }"#).unwrap();
        assert!(catalog.runtime_model().is_none());
    }

    #[test]
    fn test_catalog_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("phases.json");
        std::fs::write(&path, CATALOG).unwrap();

        let catalog = PhaseCatalog::from_path(&path).unwrap();
        assert_eq!(catalog.phases.len(), 2);

        assert!(PhaseCatalog::from_path(dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_dump_file_name() {
        assert_eq!(
            dump_file_name("PrePhysics", AnalysisMode::Static, PrintMode::ExecutesGroupTree),
            "PrePhysics_Static_ExecutesGroupTree.json"
        );
        assert_eq!(
            dump_file_name("Post Physics/1", AnalysisMode::Runtime, PrintMode::CompletelyDependency),
            "Post_Physics_1_Runtime_CompletelyDependency.json"
        );
    }

    #[test]
    fn test_write_dump() {
        let dir = tempfile::tempdir().unwrap();
        let config = DumpConfig::new(dir.path().join("out"));
        let request = PrintRequest::tree(0, AnalysisMode::Static);
        let document = GraphDocument {
            print_mode: PrintMode::ExecutesGroupTree,
            nodes: vec![ExportedNode {
                node_name: String::new(),
                color: NodeColor::Group,
                original_dependencies: vec![],
                sub_node_indices: vec![],
                execute_before_nodes: vec![],
                execute_after_nodes: vec![],
            }],
        };

        let path = config.write("PrePhysics", &request, &document).unwrap();

        assert!(path.ends_with("PrePhysics_Static_ExecutesGroupTree.json"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(GraphDocument::from_json_str(&written).unwrap(), document);
    }

    #[test]
    fn test_default_output_dir() {
        assert_eq!(DumpConfig::default().output_dir, PathBuf::from("data"));
    }
}
