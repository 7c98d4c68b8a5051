//! Command-line interface for the Reinterop binding generator

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};
use reinterop_core::{Diagnostic, DiagnosticLevel};
use reinterop_generator::{GenerationContext, GenerationPipeline, ReinteropConfig};
use std::fs;
use std::path::{Path, PathBuf};

mod inspect_command;
use inspect_command::InspectArgs;

/// Configuration file read from the working directory when `--config` is not given
const DEFAULT_CONFIG_FILE: &str = "reinterop.toml";

#[derive(Parser)]
#[command(name = "reinterop")]
#[command(about = "Managed/native binding generator")]
#[command(version)]
#[command(long_about = "Generates the native wrappers, managed trampolines and startup function table that let native code call into a managed runtime, for exactly the members an application uses")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable quiet mode (suppress non-error output)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Set log level
    #[arg(long, global = true, value_enum)]
    log_level: Option<LogLevel>,

    /// Configuration file (TOML, or YAML by extension)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate native and managed interop code
    Generate {
        /// Metadata files or directories, replacing the configured ones
        #[arg(long)]
        metadata: Vec<PathBuf>,
        /// Build every file in memory without writing
        #[arg(long)]
        dry_run: bool,
        /// Fail when generation reports warnings
        #[arg(long)]
        deny_warnings: bool,
    },
    /// Print the classified type graph
    Inspect {
        /// Metadata files or directories, replacing the configured ones
        #[arg(long)]
        metadata: Vec<PathBuf>,
        #[command(flatten)]
        args: InspectArgs,
    },
    /// Validate configuration and metadata without writing anything
    Check {
        /// Metadata files or directories, replacing the configured ones
        #[arg(long)]
        metadata: Vec<PathBuf>,
    },
    /// Write a default configuration file
    Init {
        /// Directory to write `reinterop.toml` into
        path: Option<PathBuf>,
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    match &cli.command {
        Commands::Generate { metadata, dry_run, deny_warnings } => {
            handle_generate_command(cli.config.as_deref(), metadata, *dry_run, *deny_warnings)
        }
        Commands::Inspect { metadata, args } => handle_inspect_command(cli.config.as_deref(), metadata, args),
        Commands::Check { metadata } => handle_check_command(cli.config.as_deref(), metadata),
        Commands::Init { path, force } => handle_init_command(path.as_deref(), *force),
    }
}

fn init_logging(cli: &Cli) {
    let log_level = if cli.quiet {
        log::LevelFilter::Error
    } else if cli.verbose {
        log::LevelFilter::Debug
    } else {
        match &cli.log_level {
            Some(LogLevel::Error) => log::LevelFilter::Error,
            Some(LogLevel::Warn) => log::LevelFilter::Warn,
            Some(LogLevel::Info) => log::LevelFilter::Info,
            Some(LogLevel::Debug) => log::LevelFilter::Debug,
            Some(LogLevel::Trace) => log::LevelFilter::Trace,
            None => log::LevelFilter::Info,
        }
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp_secs()
        .init();
}

/// Load configuration, then apply `REINTEROP_*` overrides and command-line metadata paths
fn load_config(path: Option<&Path>, metadata: &[PathBuf]) -> Result<ReinteropConfig> {
    let mut config = match path {
        Some(path) => ReinteropConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => ReinteropConfig::from_file(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_FILE))?,
        None => {
            info!("No {} found, using default configuration", DEFAULT_CONFIG_FILE);
            ReinteropConfig::default()
        }
    };
    config
        .apply_overrides(|name| std::env::var(name).ok())
        .context("Invalid REINTEROP_* environment override")?;
    if !metadata.is_empty() {
        config.metadata_paths = metadata.to_vec();
    }
    config.validate().context("Invalid configuration")?;
    if config.metadata_paths.is_empty() {
        warn!("No metadata paths configured; only the core library will be loaded");
    }
    Ok(config)
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        if diagnostic.level <= DiagnosticLevel::Warning {
            eprintln!("{}", diagnostic);
        }
    }
}

fn handle_generate_command(config: Option<&Path>, metadata: &[PathBuf], dry_run: bool, deny_warnings: bool) -> Result<()> {
    let config = load_config(config, metadata)?;
    let pipeline = GenerationPipeline::new(config).with_dry_run(dry_run);
    let report = pipeline.run()?;
    print_diagnostics(&report.diagnostics);

    if report.has_errors() {
        bail!("Generation failed with errors");
    }
    if deny_warnings && report.warning_count() > 0 {
        bail!("Generation reported {} warnings", report.warning_count());
    }

    if dry_run {
        for file in &report.files.files {
            println!("{}", file.path(pipeline.config()).display());
        }
    }
    for path in &report.removed {
        println!("🗑️  {}", path.display());
    }
    println!("✅ {}", report.summary());
    Ok(())
}

fn handle_inspect_command(config: Option<&Path>, metadata: &[PathBuf], args: &InspectArgs) -> Result<()> {
    let config = load_config(config, metadata)?;
    let pipeline = GenerationPipeline::new(config);
    let model = pipeline.load_model()?;
    let (graph, diagnostics) = pipeline.analyze(&model)?;
    print_diagnostics(&diagnostics);

    let context = GenerationContext::new(pipeline.config(), &model);
    let summaries = inspect_command::summarize(&context, &graph, args.type_filter.as_deref());
    print!("{}", inspect_command::render(&summaries, args.format)?);
    Ok(())
}

fn handle_check_command(config: Option<&Path>, metadata: &[PathBuf]) -> Result<()> {
    let config = load_config(config, metadata)?;
    let report = GenerationPipeline::new(config).with_dry_run(true).run()?;
    print_diagnostics(&report.diagnostics);

    if report.has_errors() {
        bail!("Check failed with errors");
    }
    println!(
        "✅ {} types, {} table entries, {} warnings",
        report.type_count,
        report.function_count,
        report.warning_count()
    );
    Ok(())
}

fn handle_init_command(path: Option<&Path>, force: bool) -> Result<()> {
    let directory = path.unwrap_or_else(|| Path::new("."));
    let target = directory.join(DEFAULT_CONFIG_FILE);
    if target.exists() && !force {
        bail!("{} already exists; use --force to overwrite it", target.display());
    }

    fs::create_dir_all(directory).with_context(|| format!("Failed to create directory {}", directory.display()))?;
    let content = ReinteropConfig::default()
        .to_toml_string()
        .context("Failed to serialize default configuration")?;
    fs::write(&target, content).with_context(|| format!("Failed to write {}", target.display()))?;
    println!("✅ Wrote {}", target.display());
    Ok(())
}
