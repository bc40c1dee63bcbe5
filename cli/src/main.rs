use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use script_manifest_core::sanitize_identifier;
use script_manifest_discovery::config::InspectConfig;
use script_manifest_discovery::inspect::{
    ScriptReport, build_catalog, collect_script_paths, identifier_seed, inspect_file,
};
use script_manifest_discovery::output::{
    OutputFormat, format_catalog, format_commands, format_metadata_output, format_report,
};
use script_manifest_discovery::{CommandExtractor, MetadataParser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
    Markdown,
}

impl From<CliOutputFormat> for OutputFormat {
    fn from(fmt: CliOutputFormat) -> Self {
        match fmt {
            CliOutputFormat::Json => Self::Json,
            CliOutputFormat::Yaml => Self::Yaml,
            CliOutputFormat::Markdown => Self::Markdown,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "script-inspect")]
#[command(about = "Extract embedded manifests and command signatures from scripts")]
#[command(version)]
struct Cli {
    /// YAML configuration file (base URL, extractor markers, catalog name).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse the manifest block of one script.
    Metadata(SourceArgs),
    /// Extract command signatures from one script.
    Commands(CommandsArgs),
    /// Run both extractors over one script.
    Inspect(InspectArgs),
    /// Inspect scripts in files and directories and bundle them into a catalog.
    Catalog(CatalogArgs),
}

#[derive(Debug, Args)]
struct SourceArgs {
    /// Script to read; reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct CommandsArgs {
    #[command(flatten)]
    source: SourceArgs,
    /// Script identifier used for wrapper names in markdown output
    /// (default: derived from the input path).
    #[arg(long)]
    identifier: Option<String>,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Script to inspect.
    #[arg(long)]
    input: PathBuf,
    /// Collection root the script path is reported relative to
    /// (default: the script's grandparent directory).
    #[arg(long)]
    root: Option<PathBuf>,
    /// Base URL for synthesized script sources (overrides the config file).
    #[arg(long)]
    base_url: Option<String>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct CatalogArgs {
    /// Script files and/or directories containing scripts.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Collection root script paths are reported relative to
    /// (default: the first input directory, else the first script's root).
    #[arg(long)]
    root: Option<PathBuf>,
    /// Output file; prints to stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Optional catalog name metadata (overrides the config file).
    #[arg(long)]
    name: Option<String>,
    /// Base URL for synthesized script sources (overrides the config file).
    #[arg(long)]
    base_url: Option<String>,
    /// Number of parallel inspection jobs (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Output format.
    #[arg(long, default_value = "json")]
    format: CliOutputFormat,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Command::Metadata(args) => run_metadata(args),
        Command::Commands(args) => run_commands(args, &config),
        Command::Inspect(args) => run_inspect(args, config),
        Command::Catalog(args) => run_catalog(args, config),
    });

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("script_manifest_discovery=debug,script_inspect=debug")
    } else {
        EnvFilter::new("script_manifest_discovery=warn,script_inspect=warn")
    };

    // Only fails when a global subscriber is already set.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    debug!("Logging initialized (verbose={verbose})");
}

fn load_config(path: Option<&Path>) -> Result<InspectConfig, String> {
    match path {
        Some(path) => InspectConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display())),
        None => Ok(InspectConfig::default()),
    }
}

fn run_metadata(args: SourceArgs) -> Result<(), String> {
    let source = read_source(args.input.as_deref())?;
    let mut parser = MetadataParser::new(&source);
    let metadata = parser.parse();
    for warning in parser.warnings() {
        eprintln!("warning: {warning}");
    }
    print_output(format_metadata_output(&metadata, args.format.into())?)
}

fn run_commands(args: CommandsArgs, config: &InspectConfig) -> Result<(), String> {
    let source = read_source(args.source.input.as_deref())?;
    let commands = CommandExtractor::new(&config.extractor)
        .extract_source(&source)
        .map_err(|e| e.to_string())?;

    let identifier = match (&args.identifier, &args.source.input) {
        (Some(identifier), _) => sanitize_identifier(identifier),
        (None, Some(path)) => sanitize_identifier(&identifier_seed(&path.to_string_lossy())),
        (None, None) => "script".to_string(),
    };
    print_output(format_commands(
        &commands,
        &identifier,
        args.source.format.into(),
    )?)
}

fn run_inspect(args: InspectArgs, mut config: InspectConfig) -> Result<(), String> {
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }

    let report = match &args.root {
        Some(root) => inspect_file(root, &args.input, &config),
        None => {
            let root = default_root(&args.input);
            inspect_file(&root, &args.input, &config)
        }
    }
    .map_err(|err| format!("Failed to inspect '{}': {err}", args.input.display()))?;

    for warning in &report.warnings {
        eprintln!("warning: {}: {warning}", report.path);
    }
    print_output(format_report(&report, args.format.into())?)
}

fn run_catalog(args: CatalogArgs, mut config: InspectConfig) -> Result<(), String> {
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if args.name.is_some() {
        config.catalog.name = args.name;
    }

    let paths = collect_script_paths(&args.inputs).map_err(|e| e.to_string())?;
    let root = args
        .root
        .clone()
        .or_else(|| args.inputs.iter().find(|input| input.is_dir()).cloned())
        .or_else(|| args.inputs.first().map(|input| default_root(input)))
        .unwrap_or_default();

    let jobs = args.jobs.unwrap_or_else(num_cpus_fallback);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| format!("Failed to build thread pool: {e}"))?;

    let results: Vec<Result<ScriptReport, String>> = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                inspect_file(&root, path, &config)
                    .map_err(|err| format!("{}: {err}", path.display()))
            })
            .collect()
    });

    let mut reports = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(err) => failures.push(err),
        }
    }

    let generated_at = chrono::Utc::now().to_rfc3339();
    let catalog = build_catalog(reports, PACKAGE_VERSION, &generated_at, &config);
    let rendered = format_catalog(&catalog, args.format.into())?;

    match &args.output {
        Some(output) => {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).map_err(|err| {
                        format!(
                            "Failed to create output directory '{}': {err}",
                            parent.display()
                        )
                    })?;
                }
            }
            fs::write(output, rendered)
                .map_err(|err| format!("Failed to write '{}': {err}", output.display()))?;
            println!(
                "Cataloged {} script(s) into '{}'.",
                catalog.script_count(),
                output.display()
            );
        }
        None => print!("{rendered}"),
    }

    if !failures.is_empty() {
        eprintln!("\nFailures:");
        for failure in &failures {
            eprintln!("  {failure}");
        }
        return Err(format!("{} script(s) could not be inspected", failures.len()));
    }

    Ok(())
}

/// Root for a single script: its grandparent for `<name>/<version>.py`
/// layouts, else its parent.
fn default_root(input: &Path) -> PathBuf {
    let parent = input.parent().unwrap_or(Path::new(""));
    let versioned = identifier_seed(&input.to_string_lossy())
        != input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
    if versioned {
        parent.parent().unwrap_or(Path::new("")).to_path_buf()
    } else {
        parent.to_path_buf()
    }
}

fn num_cpus_fallback() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn read_source(input: Option<&Path>) -> Result<String, String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read '{}': {err}", path.display())),
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .map_err(|err| format!("Failed to read stdin: {err}"))?;
            Ok(source)
        }
    }
}

fn print_output(rendered: String) -> Result<(), String> {
    if rendered.ends_with('\n') {
        print!("{rendered}");
    } else {
        println!("{rendered}");
    }
    Ok(())
}
