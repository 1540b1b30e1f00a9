//! Logmask: dense label masks from CT log cross-section annotations.
//!
//! Logmask turns per-image annotations (pith points, polygons and embedded
//! compressed bitmaps) into one single-channel label mask for training a
//! segmentation model. Each object is rasterized into a per-class layer;
//! overlapping classes are then resolved by a fixed class priority.
//!
//! # Modules
//!
//! - [`annotation`]: Annotation records, class table, priority and config
//! - [`raster`]: Geometry decoding, bitmap codec and layer compositing
//! - [`pipeline`]: The per-image entry point and its report
//! - [`validation`]: Document validation and error reporting
//! - [`error`]: Error types for logmask operations

pub mod annotation;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod raster;
pub mod validation;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

pub use error::{BitmapError, LogmaskError};

/// The logmask CLI application.
#[derive(Parser)]
#[command(name = "logmask")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Rasterize an annotation file into an 8-bit label mask PNG.
    Rasterize(RasterizeArgs),
    /// Validate an annotation file against the class table.
    Validate(ValidateArgs),
    /// Print the class table and priority order.
    Classes(ClassesArgs),
}

/// Arguments for the rasterize subcommand.
#[derive(clap::Args)]
struct RasterizeArgs {
    /// Supervisely annotation JSON for one image.
    input: PathBuf,

    /// Where to write the label mask PNG.
    #[arg(short, long)]
    output: PathBuf,

    /// Class config (YAML or JSON). Defaults to the built-in CT log classes.
    #[arg(long, env = "LOGMASK_CONFIG")]
    config: Option<PathBuf>,

    /// Override the image height recorded in the annotation.
    #[arg(long)]
    height: Option<u32>,

    /// Override the image width recorded in the annotation.
    #[arg(long)]
    width: Option<u32>,

    /// Radius in pixels of the disc drawn for point annotations.
    #[arg(long)]
    point_radius: Option<u32>,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

/// Arguments for the validate subcommand.
#[derive(clap::Args)]
struct ValidateArgs {
    /// Supervisely annotation JSON for one image.
    input: PathBuf,

    /// Class config (YAML or JSON). Defaults to the built-in CT log classes.
    #[arg(long, env = "LOGMASK_CONFIG")]
    config: Option<PathBuf>,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the classes subcommand.
#[derive(clap::Args)]
struct ClassesArgs {
    /// Class config (YAML or JSON). Defaults to the built-in CT log classes.
    #[arg(long, env = "LOGMASK_CONFIG")]
    config: Option<PathBuf>,

    /// Output format ('text' or 'yaml').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the logmask CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), LogmaskError> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Rasterize(args)) => run_rasterize(args),
        Some(Commands::Validate(args)) => run_validate(args),
        Some(Commands::Classes(args)) => run_classes(args),
        None => {
            println!("logmask {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Dense label masks from CT log cross-section annotations.");
            println!();
            println!("Run 'logmask --help' for usage information.");
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<annotation::ClassConfig, LogmaskError> {
    match path {
        Some(path) => {
            log::info!("loading class config from {}", path.display());
            annotation::read_class_config(path)
        }
        None => Ok(annotation::ClassConfig::default()),
    }
}

/// Execute the rasterize subcommand.
fn run_rasterize(args: RasterizeArgs) -> Result<(), LogmaskError> {
    if !matches!(args.report.as_str(), "text" | "json") {
        return Err(LogmaskError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            args.report
        )));
    }

    let mut config = load_config(args.config.as_deref())?;
    if let Some(radius) = args.point_radius {
        config = config.with_point_radius(radius)?;
    }

    let document = annotation::io_supervisely::read_annotation_json(&args.input)?;
    let height = args.height.unwrap_or(document.size.height);
    let width = args.width.unwrap_or(document.size.width);

    let result = pipeline::rasterize_objects(height, width, &document.objects, &config)?;
    if result.pith.is_none() {
        log::warn!(
            "pith is absent for {}; the annotation may be missing or incomplete",
            args.input.display()
        );
    }

    result.mask.write_png(&args.output)?;
    log::info!("wrote mask to {}", args.output.display());

    match args.report.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&result.report).map_err(|e| {
                LogmaskError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
            })?;
            println!("{}", json);
        }
        _ => {
            print!("{}", result.report);
            println!("Mask written to {}", args.output.display());
        }
    }

    Ok(())
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), LogmaskError> {
    let config = load_config(args.config.as_deref())?;
    let document = annotation::io_supervisely::read_annotation_json(&args.input)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_document(&document, &config, &opts);

    match args.output.as_str() {
        "json" => {
            let json = serde_json::json!({
                "error_count": report.error_count(),
                "warning_count": report.warning_count(),
                "issues": &report.issues,
            });
            let text = serde_json::to_string_pretty(&json).map_err(|e| {
                LogmaskError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
            })?;
            println!("{}", text);
        }
        "text" => print!("{}", report),
        other => {
            return Err(LogmaskError::UnsupportedFormat(format!(
                "'{}' (supported: text, json)",
                other
            )));
        }
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(LogmaskError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Execute the classes subcommand.
fn run_classes(args: ClassesArgs) -> Result<(), LogmaskError> {
    let config = load_config(args.config.as_deref())?;

    match args.output.as_str() {
        "yaml" => {
            let yaml = serde_yaml::to_string(&config.to_file_repr())
                .map_err(|e| LogmaskError::InvalidConfig(e.to_string()))?;
            print!("{}", yaml);
        }
        "text" => {
            println!("Classes:");
            for (name, id) in config.table().iter() {
                println!("  {:>3}  {}", id, name);
            }
            println!();
            println!("Priority (best first):");
            for (rank, name) in config.priority_names().iter().enumerate() {
                println!("  {:>3}  {}", rank, name);
            }
            println!(
                "  {:>3}  (any class not listed)",
                config.priority().unlisted_rank()
            );
            println!();
            println!("Point radius: {} px", config.point_radius());
        }
        other => {
            return Err(LogmaskError::UnsupportedFormat(format!(
                "'{}' (supported: text, yaml)",
                other
            )));
        }
    }

    Ok(())
}
