//! phase-graph entry point
//!
//! Dumps the execution-order graph of one configured phase, either
//! statically (shapes synthesized from the units themselves) or against the
//! runtime shapes recorded in the phase catalog.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use phase_graph::config::DEFAULT_OUTPUT_DIR;
use phase_graph::{AnalysisMode, PrintMode};

mod commands;
mod error;

/// Execution-order graph dumper
#[derive(Debug, Parser)]
#[command(name = "phase-graph", about = "Dump execution-order graphs of processing phases")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Dump a phase without live data
    Static(DumpArgs),

    /// Dump a phase against the catalog's runtime shapes
    Runtime(DumpArgs),

    /// Convert a dumped document to Graphviz DOT
    Dot {
        /// Dumped JSON document
        document: PathBuf,

        /// Also draw declared before/after ordering
        #[arg(long)]
        ordering_edges: bool,

        /// Output file (defaults to the document path with a .dot extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct DumpArgs {
    /// Phase catalog (JSON)
    #[arg(short, long)]
    config: PathBuf,

    /// Index of the phase to dump
    #[arg(short, long)]
    phase: usize,

    /// Which view of the graph to export
    #[arg(short, long, value_enum, default_value_t = ModeArg::Tree)]
    mode: ModeArg,

    /// Directory dump files are written to
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    out_dir: PathBuf,

    /// Print the document instead of writing a file
    #[arg(long)]
    stdout: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Group tree with direct links
    Tree,
    /// Complete flattened dependencies
    Flat,
}

impl From<ModeArg> for PrintMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Tree => PrintMode::ExecutesGroupTree,
            ModeArg::Flat => PrintMode::CompletelyDependency,
        }
    }
}

fn run(cli: Cli) -> error::Result<()> {
    match cli.command {
        Command::Static(args) => commands::dump(&args.into_options(AnalysisMode::Static)),
        Command::Runtime(args) => commands::dump(&args.into_options(AnalysisMode::Runtime)),
        Command::Dot {
            document,
            ordering_edges,
            output,
        } => commands::dot(&document, output.as_deref(), ordering_edges),
    }
}

impl DumpArgs {
    fn into_options(self, analysis_mode: AnalysisMode) -> commands::DumpOptions {
        commands::DumpOptions {
            config: self.config,
            phase: self.phase,
            print_mode: self.mode.into(),
            analysis_mode,
            out_dir: self.out_dir,
            stdout: self.stdout,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        log::error!("{}", err);
        process::exit(err.exit_code());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_static_dump() {
        let cli = Cli::try_parse_from([
            "phase-graph",
            "static",
            "--config",
            "phases.json",
            "--phase",
            "2",
            "--mode",
            "flat",
        ])
        .unwrap();

        match cli.command {
            Command::Static(args) => {
                assert_eq!(args.phase, 2);
                assert_eq!(args.mode, ModeArg::Flat);
                assert_eq!(args.out_dir, PathBuf::from("data"));
                assert!(!args.stdout);
            }
            other => panic!("Expected static command, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_dot() {
        let cli = Cli::try_parse_from(["phase-graph", "dot", "dump.json", "--ordering-edges"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Dot {
                ordering_edges: true,
                output: None,
                ..
            }
        ));
    }

    #[test]
    fn test_phase_is_required() {
        assert!(Cli::try_parse_from(["phase-graph", "runtime", "--config", "phases.json"]).is_err());
    }
}
