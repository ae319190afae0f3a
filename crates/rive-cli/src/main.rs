use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use rive_core::{Artboard, BoneHierarchy, ContourPath, ContourStroke, StrokeOptions};
use rive_data::model::RiveDocument;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the bone hierarchy of an artboard and check bone names
    Bones(Source),
    /// Tessellate every stroke of an artboard and print a JSON report
    Stroke(StrokeArgs),
}

#[derive(Args, Debug)]
struct Source {
    /// Path to the document JSON
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Artboard name (defaults to the first artboard)
    #[arg(long)]
    artboard: Option<String>,
}

#[derive(Args, Debug)]
struct StrokeArgs {
    #[command(flatten)]
    source: Source,

    /// JSON file with stroke options; flags below override it
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    #[arg(long)]
    miter_limit: Option<f32>,

    #[arg(long)]
    round_tolerance: Option<f32>,

    #[arg(long)]
    contour_threshold: Option<f32>,

    /// Include every strip vertex in the report
    #[arg(long)]
    vertices: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Directive {
    fn from(level: LogLevel) -> Self {
        let level = match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        };
        level.into()
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Serialize)]
struct StrokeReport {
    artboard: String,
    strokes: Vec<StrokeEntry>,
}

#[derive(Serialize)]
struct StrokeEntry {
    name: String,
    shape: Option<String>,
    paths: usize,
    vertices: usize,
    runs: Vec<[usize; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    points: Option<Vec<[f32; 2]>>,
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(cli.log_level.into())
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match cli.log_format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }

    let result = match cli.command {
        Command::Bones(source) => run_bones(&source).map(|clean| if clean { 0 } else { 2 }),
        Command::Stroke(args) => run_stroke(&args).map(|_| 0),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

fn load_artboard(source: &Source) -> anyhow::Result<Artboard> {
    let text = fs::read_to_string(&source.file)
        .with_context(|| format!("reading {}", source.file.display()))?;
    let doc: RiveDocument = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", source.file.display()))?;
    let artboard = Artboard::from_document(&doc, source.artboard.as_deref())?;
    info!("Loaded artboard '{}' ({} components)", artboard.name, artboard.components().len());
    Ok(artboard)
}

/// Prints the tree to stdout. Returns false when bone names collide.
fn run_bones(source: &Source) -> anyhow::Result<bool> {
    let artboard = load_artboard(source)?;
    let hierarchy = BoneHierarchy::from_artboard(&artboard);
    print!("{}", hierarchy);

    let validation = hierarchy.validate_names();
    for collision in &validation.collisions {
        eprintln!("duplicate bone name: {} ({} bones)", collision.name, collision.nodes.len());
    }
    Ok(validation.is_ok())
}

fn read_options(path: Option<&Path>) -> anyhow::Result<StrokeOptions> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Ok(serde_json::from_str(&text)?)
        }
        None => Ok(StrokeOptions::default()),
    }
}

fn run_stroke(args: &StrokeArgs) -> anyhow::Result<()> {
    let mut options = read_options(args.options.as_deref())?;
    if let Some(v) = args.miter_limit {
        options.miter_limit = v;
    }
    if let Some(v) = args.round_tolerance {
        options.round_tolerance = v;
    }
    if let Some(v) = args.contour_threshold {
        options.contour_threshold = v;
    }

    let artboard = load_artboard(&args.source)?;
    let mut strokes = Vec::new();
    for binding in artboard.strokes() {
        let mut stroke = ContourStroke::with_options(options);
        for &path_id in &binding.paths {
            let (Some(geometry), Some(transform)) =
                (artboard.path(path_id), artboard.world_transform(path_id))
            else {
                continue;
            };
            let contours = ContourPath::from_bez_path(&geometry.to_bez_path(), options.contour_threshold);
            stroke.extrude(
                &contours,
                geometry.closed,
                binding.style.join,
                binding.style.cap,
                binding.style.thickness,
                transform,
            );
        }

        let name = artboard
            .component(binding.stroke)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        let shape = binding
            .shape
            .and_then(|id| artboard.component(id))
            .map(|c| c.name.clone());
        info!(
            "Stroke '{}': {} vertices in {} runs",
            name,
            stroke.triangle_strip().len(),
            stroke.offsets().len()
        );
        let points = args
            .vertices
            .then(|| stroke.triangle_strip().iter().map(|v| v.to_array()).collect());
        strokes.push(StrokeEntry {
            name,
            shape,
            paths: binding.paths.len(),
            vertices: stroke.triangle_strip().len(),
            runs: stroke.render_ranges().map(|r| [r.start, r.end]).collect(),
            points,
        });
    }

    let report = StrokeReport {
        artboard: artboard.name.clone(),
        strokes,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
