use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use osc_cli::{
    build_catalog, convert, validate_dir, BuildOverrides, ConvertInput, OscConfig,
};

const LOG_ENV: &str = "OSC_LOG";

#[derive(Parser)]
#[command(
    name = "osc",
    version,
    about = "Open Science Catalog builder: convert tables, build and validate catalogs"
)]
struct Cli {
    /// Configuration file (default: $OSC_CONFIG, then ./osc.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the CSV source tables into one JSON record per row
    Convert(ConvertArgs),
    /// Assemble a linked catalog from converted records
    Build(BuildArgs),
    /// Check references and link symmetry in a data directory or a built catalog
    Validate(ValidateArgs),
}

#[derive(Parser)]
struct ConvertArgs {
    #[arg(long, value_name = "CSV")]
    themes: PathBuf,

    #[arg(long, value_name = "CSV")]
    variables: PathBuf,

    #[arg(long = "eo-missions", value_name = "CSV")]
    eo_missions: PathBuf,

    #[arg(long, value_name = "CSV")]
    projects: PathBuf,

    #[arg(long, value_name = "CSV")]
    products: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "data")]
    out: PathBuf,

    /// Output JSON instead of key=value lines
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct BuildArgs {
    /// Directory written by `osc convert`
    #[arg(value_name = "DATA_DIR")]
    data: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "dist")]
    out: PathBuf,

    /// Publish root; rewrites every href to an absolute URL below it
    #[arg(long, value_name = "URL")]
    root_href: Option<String>,

    /// Skip ISO 19139 metadata records
    #[arg(long)]
    no_iso: bool,

    /// Write single-line JSON documents
    #[arg(long)]
    compact: bool,

    /// Output JSON instead of key=value lines
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct ValidateArgs {
    #[arg(value_name = "DIR")]
    dir: PathBuf,

    /// Output JSON instead of key=value lines
    #[arg(long)]
    json: bool,

    /// Exit with status 1 when any issue is found
    #[arg(long)]
    strict: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Convert(args) => run_convert(args),
        Commands::Build(args) => run_build(args, config),
        Commands::Validate(args) => run_validate(args, config),
    };

    if let Err(err) = result {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), String> {
    let summary = convert(&ConvertInput {
        themes: args.themes,
        variables: args.variables,
        eo_missions: args.eo_missions,
        projects: args.projects,
        products: args.products,
        out_dir: args.out,
    })?;

    if args.json {
        let json =
            serde_json::to_string(&summary).map_err(|err| format!("json encode: {}", err))?;
        println!("{}", json);
        return Ok(());
    }
    println!("out_dir={}", summary.out_dir.display());
    println!("themes={}", summary.themes);
    println!("variables={}", summary.variables);
    println!("eo_missions={}", summary.eo_missions);
    println!("projects={}", summary.projects);
    println!("products={}", summary.products);
    println!("files_written={}", summary.files_written);
    if summary.stale_removed > 0 {
        println!("stale_removed={}", summary.stale_removed);
    }
    Ok(())
}

fn run_build(args: BuildArgs, config: Option<PathBuf>) -> Result<(), String> {
    let overrides = BuildOverrides {
        root_href: args.root_href,
        no_iso: args.no_iso,
        compact: args.compact,
    };
    let (config, source) = OscConfig::from_file_and_cli(config.as_deref(), &overrides)?;
    let summary = build_catalog(&args.data, &args.out, &config)?;

    if args.json {
        let json =
            serde_json::to_string(&summary).map_err(|err| format!("json encode: {}", err))?;
        println!("{}", json);
        return Ok(());
    }
    for diagnostic in &summary.diagnostics {
        eprintln!("warning: {}", diagnostic);
    }
    if let Some(source) = source {
        println!("config={}", source.display());
    }
    println!("out_dir={}", summary.out_dir.display());
    println!("nodes={}", summary.nodes);
    println!("projects={}", summary.projects);
    println!("products={}", summary.products);
    println!("themes={}", summary.themes);
    println!("variables={}", summary.variables);
    println!("eo_missions={}", summary.eo_missions);
    println!("metadata_records={}", summary.metadata_records);
    println!("images_copied={}", summary.images_copied);
    println!("updated={}", summary.updated.to_rfc3339());
    if let Some(root) = &summary.publish_root {
        println!("publish_root={}", root);
    }
    println!("diagnostics={}", summary.diagnostics.len());
    Ok(())
}

fn run_validate(args: ValidateArgs, config: Option<PathBuf>) -> Result<(), String> {
    let (config, _) = OscConfig::resolve(config.as_deref())?;
    let strict = args.strict || config.validate.strict;
    let report = validate_dir(&args.dir)?;

    if args.json {
        let json = serde_json::to_string(&report.issues)
            .map_err(|err| format!("json encode: {}", err))?;
        println!("{}", json);
    } else {
        println!("dir={}", report.dir.display());
        println!("mode={}", report.mode);
        println!("issues={}", report.issues.len());
        for issue in &report.issues {
            println!("issue rule={} message={}", issue.rule_id(), issue);
        }
    }

    if strict && !report.is_clean() {
        Err(format!(
            "validation found {} issue(s)",
            report.issues.len()
        ))
    } else {
        Ok(())
    }
}
