//! Command implementations

use std::path::{Path, PathBuf};

use phase_graph::{
    load_document, to_dot, AnalysisMode, DotOptions, DumpConfig, PhaseCatalog,
    PhaseDependencyPrinter, PrintMode, PrintRequest, UnitProvider,
};

use crate::error::Result;

/// Everything a static or runtime dump needs
#[derive(Debug, Clone)]
pub struct DumpOptions {
    pub config: PathBuf,
    pub phase: usize,
    pub print_mode: PrintMode,
    pub analysis_mode: AnalysisMode,
    pub out_dir: PathBuf,
    pub stdout: bool,
}

pub fn dump(options: &DumpOptions) -> Result<()> {
    dump_to(options).map(|_| ())
}

/// Dump one phase; returns the written file, if any
pub fn dump_to(options: &DumpOptions) -> Result<Option<PathBuf>> {
    let catalog = PhaseCatalog::from_path(&options.config)?;
    let live_model = catalog.runtime_model();

    let mut printer = PhaseDependencyPrinter::new(&catalog);
    if options.analysis_mode == AnalysisMode::Runtime {
        if let Some(model) = &live_model {
            printer = printer.with_data_model(model);
        }
    }

    let request = PrintRequest {
        phase: options.phase,
        print_mode: options.print_mode,
        analysis_mode: options.analysis_mode,
    };
    let outcome = printer.print(&request, &[])?;

    log::info!(
        "Dump summary: {}",
        serde_json::to_string(&outcome.summary).unwrap_or_default()
    );

    if options.stdout {
        println!("{}", outcome.document.to_json_pretty()?);
        return Ok(None);
    }

    let phase_name = catalog.phase_name(options.phase).unwrap_or_default();
    let path = DumpConfig::new(&options.out_dir).write(phase_name, &request, &outcome.document)?;
    log::info!("Wrote {}", path.display());
    Ok(Some(path))
}

/// Convert a dumped document to DOT
pub fn dot(document: &Path, output: Option<&Path>, ordering_edges: bool) -> Result<()> {
    dot_to(document, output, ordering_edges).map(|_| ())
}

pub fn dot_to(document: &Path, output: Option<&Path>, ordering_edges: bool) -> Result<PathBuf> {
    let parsed = load_document(document)?;
    let rendered = to_dot(&parsed, &DotOptions { ordering_edges });
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| document.with_extension("dot"));
    std::fs::write(&path, rendered)?;
    log::info!("Wrote {}", path.display());
    Ok(path)
}
