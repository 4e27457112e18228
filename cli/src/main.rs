use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use databean_core::{
    ConsolidatedProperty, Consolidator, EmissionPlanner, GenerationError, GenerationPlan,
    OverrideKind, SchemaGraph, TypeSystem,
};
use databean_loader::{
    GeneratorConfig, PlanEntry, PlanFormat, PlanManifest, SchemaLibrary,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const PACKAGE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for consolidated property lists.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
    Table,
}

/// Output format for plan files.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliPlanFormat {
    Json,
    Yaml,
}

impl From<CliPlanFormat> for PlanFormat {
    fn from(fmt: CliPlanFormat) -> Self {
        match fmt {
            CliPlanFormat::Json => Self::Json,
            CliPlanFormat::Yaml => Self::Yaml,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "databean")]
#[command(about = "Consolidate data-class schemas and write generation plans")]
#[command(version)]
struct Cli {
    /// Log consolidation and planning steps (overrides RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate and consolidate every schema, reporting failures.
    Check(CheckArgs),
    /// Print the consolidated property list of one schema.
    Consolidate(ConsolidateArgs),
    /// Write one generation plan file per top-level schema.
    Plan(PlanArgs),
}

#[derive(Debug, Args)]
struct CheckArgs {
    /// Schema documents and/or directories containing them.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Consolidation workers (0 = sequential).
    #[arg(long, default_value_t = 0)]
    jobs: usize,
}

#[derive(Debug, Args)]
struct ConsolidateArgs {
    /// Schema documents and/or directories containing them.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Schema to consolidate.
    #[arg(long)]
    schema: String,
    /// Output format.
    #[arg(long, default_value = "table")]
    format: CliOutputFormat,
}

#[derive(Debug, Args)]
struct PlanArgs {
    /// Schema documents and/or directories containing them.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Output directory for plan files.
    #[arg(long)]
    output: PathBuf,
    /// Path to databean.yml.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Path to the plan manifest; unchanged plans are not rewritten.
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Plan file format (default: from config, else json).
    #[arg(long)]
    format: Option<CliPlanFormat>,
    /// Consolidation workers (default: from config).
    #[arg(long)]
    jobs: Option<usize>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Command::Check(args) => run_check(args),
        Command::Consolidate(args) => run_consolidate(args),
        Command::Plan(args) => run_plan(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber installed by a test harness is fine to keep.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_library(inputs: &[PathBuf]) -> Result<SchemaLibrary, String> {
    let builder = inputs
        .iter()
        .fold(SchemaLibrary::builder(), |builder, input| {
            builder.from_path(input)
        });
    builder
        .build()
        .map_err(|err| format!("Failed to load schemas: {err}"))
}

fn build_graph(library: &SchemaLibrary) -> Result<SchemaGraph, String> {
    library.build_graph().map_err(|err| describe_load_error(&err))
}

fn describe_load_error(err: &databean_loader::LoaderError) -> String {
    match err {
        databean_loader::LoaderError::Generation(err) => describe(err),
        other => other.to_string(),
    }
}

fn describe(err: &GenerationError) -> String {
    format!("{}: {err}", err.kind())
}

// ---------------------------------------------------------------------------
// check command
// ---------------------------------------------------------------------------

fn run_check(args: CheckArgs) -> Result<(), String> {
    let library = load_library(&args.inputs)?;
    let graph = build_graph(&library)?;
    let consolidator = Consolidator::new(&graph, library.type_registry());
    let planner = EmissionPlanner::new(&consolidator, GeneratorConfig::default().naming());

    let mut failures = Vec::new();
    for (id, result) in consolidator.consolidate_all(args.jobs) {
        let name = graph.qualified_name(id);
        let outcome = result.and_then(|_| planner.plan(id).map(|_| ()));
        if let Err(err) = outcome {
            failures.push(format!("{name}: {}", describe(&err)));
        }
    }

    if failures.is_empty() {
        println!("Checked {} schema(s): no errors.", graph.len());
        return Ok(());
    }

    for failure in &failures {
        eprintln!("{failure}");
    }
    Err(format!(
        "{} of {} schema(s) failed",
        failures.len(),
        graph.len()
    ))
}

// ---------------------------------------------------------------------------
// consolidate command
// ---------------------------------------------------------------------------

fn run_consolidate(args: ConsolidateArgs) -> Result<(), String> {
    let library = load_library(&args.inputs)?;
    let graph = build_graph(&library)?;
    let consolidator = Consolidator::new(&graph, library.type_registry());

    let properties = consolidator
        .consolidate_by_name(&args.schema)
        .map_err(|err| describe(&err))?;

    let output = match args.format {
        CliOutputFormat::Json => serde_json::to_string_pretty(&*properties)
            .map_err(|e| format!("JSON serialization failed: {e}"))?,
        CliOutputFormat::Yaml => serde_yaml::to_string(&*properties)
            .map_err(|e| format!("YAML serialization failed: {e}"))?,
        CliOutputFormat::Table => format_table(&properties, library.type_registry()),
    };
    println!("{}", output.trim_end());
    Ok(())
}

/// Renders a consolidated list as an aligned text table.
fn format_table(properties: &[ConsolidatedProperty], types: &dyn TypeSystem) -> String {
    let header = ["PROPERTY", "TYPE", "ATTRIBUTES", "DECLARED IN", "OVERRIDE"];
    let rows: Vec<[String; 5]> = properties
        .iter()
        .map(|p| {
            [
                p.name().to_string(),
                p.declaration.ty.to_string(),
                attributes(p),
                p.declared_in.clone(),
                override_label(OverrideKind::classify(p, types)).to_string(),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: &[&str]| {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    };
    push_row(&header);
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        push_row(&cells);
    }
    out
}

fn attributes(property: &ConsolidatedProperty) -> String {
    let d = &property.declaration;
    let flags = [
        (d.is_initial, "initial"),
        (d.is_read_only, "read-only"),
        (d.is_fixed, "fixed"),
        (d.is_computed, "computed"),
        (d.is_not_null, "not-null"),
        (d.has_default_value(), "default"),
        (property.read_only_overrides_mutable, "overrides-mutable"),
    ];
    let set: Vec<&str> = flags
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, label)| *label)
        .collect();
    if set.is_empty() {
        "-".to_string()
    } else {
        set.join(",")
    }
}

fn override_label(kind: OverrideKind) -> &'static str {
    match kind {
        OverrideKind::Fresh => "fresh",
        OverrideKind::IdenticalType => "identical",
        OverrideKind::Redefined => "redefined",
    }
}

// ---------------------------------------------------------------------------
// plan command
// ---------------------------------------------------------------------------

fn run_plan(args: PlanArgs) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => GeneratorConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?,
        None => GeneratorConfig::default(),
    };
    let format: PlanFormat = args
        .format
        .map(Into::into)
        .unwrap_or(config.generation.format);
    let jobs = args.jobs.unwrap_or(config.generation.jobs);

    let library = load_library(&args.inputs)?;
    let graph = build_graph(&library)?;
    let consolidator = Consolidator::new(&graph, library.type_registry());

    // Fill the cache up front so planning only reads consolidated lists.
    for (id, result) in consolidator.consolidate_all(jobs) {
        result.map_err(|err| format!("{}: {}", graph.qualified_name(id), describe(&err)))?;
    }

    let naming = config.naming();
    let planner = EmissionPlanner::new(&consolidator, naming.clone());

    fs::create_dir_all(&args.output).map_err(|err| {
        format!(
            "Failed to create output directory '{}': {err}",
            args.output.display()
        )
    })?;

    let previous = match &args.manifest {
        Some(path) if path.exists() => Some(
            PlanManifest::load(path)
                .map_err(|e| format!("Failed to load manifest '{}': {e}", path.display()))?,
        ),
        _ => None,
    };
    // A manifest written under other naming or another tool version is void.
    let previous = previous.filter(|m| m.naming == naming && m.tool_version == PACKAGE_VERSION);
    let mut manifest = PlanManifest::new(PACKAGE_VERSION.to_string(), naming.clone());

    let mut written = 0usize;
    let mut unchanged = 0usize;
    for (id, result) in planner.plan_all() {
        let name = graph.qualified_name(id);
        if !config.is_selected(graph.node(id).name()) {
            debug!(schema = %name, "schema not selected");
            continue;
        }
        let plan = result.map_err(|err| format!("{name}: {}", describe(&err)))?;
        let rendered = render_plan(&plan, format)?;
        let file = format!("{}.{}", sanitize_filename_segment(name), format.extension());
        let path = args.output.join(&file);

        if let Some(entry) = reusable_entry(previous.as_ref(), name, &file, &path, &rendered) {
            unchanged += 1;
            manifest.update_entry(name.to_string(), entry.clone());
            continue;
        }

        fs::write(&path, &rendered)
            .map_err(|err| format!("Failed to write '{}': {err}", path.display()))?;
        manifest.update_entry(name.to_string(), PlanEntry::new(&file, &rendered));
        written += 1;
    }

    if let Some(path) = &args.manifest {
        write_manifest(&manifest, path)?;
    }

    let baseline =
        previous.unwrap_or_else(|| PlanManifest::new(PACKAGE_VERSION.to_string(), naming));
    let changed = baseline.diff(&manifest);

    println!("Wrote {written} plan file(s), {unchanged} unchanged.");
    if !changed.is_empty() {
        println!("Changed: {}", changed.join(", "));
    }
    Ok(())
}

/// Returns the previous manifest entry when the rendered plan matches it and
/// the file on disk still holds that content.
fn reusable_entry<'m>(
    previous: Option<&'m PlanManifest>,
    schema: &str,
    file: &str,
    path: &Path,
    rendered: &[u8],
) -> Option<&'m PlanEntry> {
    let manifest = previous?;
    if manifest.is_stale(schema, rendered) {
        return None;
    }
    let entry = manifest.get(schema)?;
    let on_disk = PlanManifest::calculate_checksum(path).ok()?;
    (entry.file == file && on_disk == entry.checksum).then_some(entry)
}

fn render_plan(plan: &GenerationPlan, format: PlanFormat) -> Result<Vec<u8>, String> {
    match format {
        PlanFormat::Json => serde_json::to_vec_pretty(plan)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        PlanFormat::Yaml => serde_yaml::to_string(plan)
            .map(String::into_bytes)
            .map_err(|e| format!("YAML serialization failed: {e}")),
    }
}

fn write_manifest(manifest: &PlanManifest, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| {
                format!(
                    "Failed to create manifest directory '{}': {err}",
                    parent.display()
                )
            })?;
        }
    }
    manifest
        .save(path)
        .map_err(|e| format!("Failed to write manifest '{}': {e}", path.display()))
}

fn sanitize_filename_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if ch.is_alphanumeric() || matches!(ch, '-' | '_' | '.' | '$') {
            out.push(ch);
        } else {
            out.push('-');
        }
    }
    let cleaned = out.trim_matches('-');
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned.to_string()
    }
}
