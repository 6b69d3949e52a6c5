use anyhow::{Context as AnyhowContext, Result};
use asset_graph::{asset_summaries, AssetGraph, GraphBuilder, Manifest, SearchFilter};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::Value;
use std::io;
use std::path::PathBuf;

mod report;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "asset-graph")]
#[command(about = "Tag/category graph builder and search for asset manifests", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a graph snapshot from an asset manifest
    Build(BuildArgs),

    /// Search a graph snapshot by tag, category and subcategory
    Query(QueryArgs),

    /// Show node and edge counts of a graph snapshot
    Stats(StatsArgs),

    /// Give every manifest record a default value for a missing field
    #[command(name = "fill-defaults")]
    FillDefaults(FillDefaultsArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Asset manifest (JSON object or array)
    manifest: PathBuf,

    /// Where to write the graph snapshot
    snapshot: PathBuf,
}

#[derive(Args)]
struct QueryArgs {
    /// Graph snapshot written by `build`
    snapshot: PathBuf,

    /// Required tag, taken verbatim (repeatable; all must match)
    #[arg(long = "tag", action = ArgAction::Append)]
    tag: Vec<String>,

    /// Required tags as a comma-separated list
    #[arg(long, value_delimiter = ',')]
    tags: Vec<String>,

    /// Required category (subtype)
    #[arg(long, short = 'c')]
    category: Option<String>,

    /// Required subcategory (subsubtype)
    #[arg(long, short = 's')]
    subcategory: Option<String>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct StatsArgs {
    /// Graph snapshot written by `build`
    snapshot: PathBuf,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct FillDefaultsArgs {
    /// Asset manifest to patch
    manifest: PathBuf,

    /// Write the patched manifest here instead of in place
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Field that every record must carry
    #[arg(long, default_value = "usd_path")]
    field: String,

    /// Value used for missing or empty fields
    #[arg(long, default_value = "")]
    default: String,
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Build(args) => run_build(args),
        Commands::Query(args) => run_query(args),
        Commands::Stats(args) => run_stats(args),
        Commands::FillDefaults(args) => run_fill_defaults(args),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn run_build(args: BuildArgs) -> Result<()> {
    GraphBuilder::new()
        .build_from_path(&args.manifest, &args.snapshot)
        .with_context(|| format!("Failed to build graph from {}", args.manifest.display()))?;
    print_stdout(&format!("Graph saved to {}", args.snapshot.display()))
}

fn run_query(args: QueryArgs) -> Result<()> {
    let graph = load_snapshot(&args.snapshot)?;
    let filter = SearchFilter {
        tags: args.tag.into_iter().chain(args.tags).collect(),
        category: args.category,
        subcategory: args.subcategory,
    };
    let ids = graph.search_assets(&filter);
    log::info!("{} matching assets", ids.len());

    if args.json {
        let summaries = asset_summaries(&graph, &ids);
        return print_stdout(&serde_json::to_string_pretty(&summaries)?);
    }
    print_stdout(&report::render_assets(&graph, &ids)?)
}

fn run_stats(args: StatsArgs) -> Result<()> {
    let graph = load_snapshot(&args.snapshot)?;
    let stats = graph.stats();
    if args.json {
        return print_stdout(&serde_json::to_string_pretty(&stats)?);
    }
    print_stdout(&report::render_stats(&stats))
}

fn run_fill_defaults(args: FillDefaultsArgs) -> Result<()> {
    let mut manifest = Manifest::from_path(&args.manifest)
        .with_context(|| format!("Failed to load manifest {}", args.manifest.display()))?;
    let patched = manifest.ensure_field(&args.field, &Value::String(args.default));

    let output = args.output.unwrap_or_else(|| args.manifest.clone());
    manifest
        .write_to(&output)
        .with_context(|| format!("Failed to write manifest {}", output.display()))?;

    print_stdout(&format!(
        "Updated {} ({} of {} records patched with {})",
        output.display(),
        patched,
        manifest.len(),
        args.field
    ))
}

fn load_snapshot(path: &std::path::Path) -> Result<AssetGraph> {
    AssetGraph::load(path).with_context(|| format!("Failed to load graph {}", path.display()))
}
