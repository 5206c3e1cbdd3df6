//! cmixgen - CMix-NN mixed-precision kernel generator
//!
//! # Usage
//!
//! ```bash
//! # Regenerate every kernel source and both public headers under the current directory
//! cmixgen
//!
//! # Same, into another install root
//! cmixgen generate --root ../..
//!
//! # Render everything without writing, and show what would be written
//! cmixgen generate --dry-run -v
//!
//! # List the variant names, optionally as JSON
//! cmixgen list --kind convolve --format json
//! ```

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use generator::config::GeneratorConfig;
use generator::enumerate;
use generator::logging;
use generator::{GenError, GenerationReport, VariantKind};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "cmixgen")]
#[command(version = "0.1.0")]
#[command(about = "Generates the CMix-NN kernel variants and public headers", long_about = None)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate all kernel sources and headers (the default)
    Generate {
        /// Install root (defaults to the current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Directory of template overrides
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Path to cmixgen.toml (defaults to ./cmixgen.toml if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Render everything but write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// List the variants a generation pass produces
    List {
        /// Only list one kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Convolve,
    Depthwise,
    MatMul,
    ConvertReorder,
}

impl From<KindArg> for VariantKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Convolve => VariantKind::Convolve,
            KindArg::Depthwise => VariantKind::Depthwise,
            KindArg::MatMul => VariantKind::MatMul,
            KindArg::ConvertReorder => VariantKind::ConvertReorder,
        }
    }
}

#[derive(ValueEnum, Clone, Debug)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    logging::init_with_level(logging::level_for_verbosity(cli.verbose));

    let result = match cli.command {
        None => run_generate(None, None, None, false),
        Some(Commands::Generate { root, templates, config, dry_run }) => {
            run_generate(root, templates, config, dry_run)
        }
        Some(Commands::List { kind, format }) => list_variants(kind.map(VariantKind::from), format),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn resolve_config(
    root: Option<PathBuf>,
    templates: Option<PathBuf>,
    config: Option<PathBuf>,
    dry_run: bool,
) -> Result<GeneratorConfig, GenError> {
    let mut resolved = match config {
        Some(path) => GeneratorConfig::load(&path)?,
        None => GeneratorConfig::discover(Path::new("."))?,
    };
    if let Some(root) = root {
        resolved.root = root;
    }
    if let Some(templates) = templates {
        resolved.template_dir = Some(templates);
    }
    resolved.dry_run = dry_run;
    Ok(resolved)
}

fn run_generate(
    root: Option<PathBuf>,
    templates: Option<PathBuf>,
    config: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), GenError> {
    let config = resolve_config(root, templates, config, dry_run)?;
    let report = generator::generate(&config)?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &GenerationReport) {
    if report.dry_run {
        println!("Dry run: nothing was written");
    }
    for kind in &report.kinds {
        println!(
            "  {:<16} {:>3} generated, {:>3} filtered",
            kind.kind.as_str(),
            kind.generated,
            kind.filtered
        );
    }
    println!(
        "  {} files, {} general declarations, {} support declarations",
        report.files.len(),
        report.general_declarations,
        report.support_declarations
    );
    for path in &report.overwritten {
        println!("  overwritten during this run: {}", path.display());
    }
}

fn list_variants(kind: Option<VariantKind>, format: OutputFormat) -> Result<(), GenError> {
    let plan: Vec<_> = enumerate::plan()
        .into_iter()
        .filter(|e| kind.map_or(true, |k| e.kind == k))
        .collect();

    match format {
        OutputFormat::Text => {
            for enumeration in &plan {
                println!(
                    "{} ({} variants, {} filtered)",
                    enumeration.kind,
                    enumeration.variants.len(),
                    enumeration.filtered
                );
                for descriptor in enumeration.descriptors() {
                    println!("  {}", descriptor.filename);
                }
            }
        }
        OutputFormat::Json => {
            let entries: Vec<serde_json::Value> = plan
                .iter()
                .flat_map(|e| e.descriptors())
                .map(|d| {
                    serde_json::json!({
                        "fn_name": d.fn_name,
                        "filename": d.filename,
                        "variant": d.variant,
                    })
                })
                .collect();
            let text = serde_json::to_string_pretty(&entries)
                .map_err(|e| GenError::Config(format!("failed to serialize variants: {}", e)))?;
            println!("{}", text);
        }
    }
    Ok(())
}
