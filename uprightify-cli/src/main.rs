use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uprightify_core::codec::OutputFormat;
use uprightify_core::pipeline::{analyze, process_file, OrientParams, OrientReport};

#[derive(Parser)]
#[command(
    name = "uprightify-cli",
    about = "Rotate and flip images upright using brightness and edge-density gradients"
)]
struct Cli {
    /// Log per-image scores and decisions
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every processing command.
#[derive(clap::Args, Clone)]
struct ParamArgs {
    /// Named preset: standard, fast, full_resolution
    #[arg(long)]
    preset: Option<String>,

    /// Downscale inputs whose width or height exceeds this before scoring
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Ignore the EXIF orientation tag
    #[arg(long)]
    no_exif: bool,

    /// Output format: jpeg, png
    #[arg(long)]
    format: Option<String>,

    /// JPEG quality (1-100)
    #[arg(long)]
    quality: Option<u8>,
}

#[derive(Subcommand)]
enum Commands {
    /// Orient a single image
    Single {
        /// Input image path
        input: PathBuf,

        /// Output image path (default: input_upright.<ext>)
        output: Option<PathBuf>,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Orient all images in a directory
    Batch {
        /// Input directory
        input_dir: PathBuf,

        /// Output directory (default: input_dir/upright)
        output_dir: Option<PathBuf>,

        /// Number of parallel jobs (default: num_cpus)
        #[arg(long, short)]
        jobs: Option<usize>,

        /// Reprocess even if output is up-to-date
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Print grid profiles, scores and the decision without writing anything
    Inspect {
        /// Input image path
        input: PathBuf,

        #[command(flatten)]
        params: ParamArgs,
    },
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif", "tif", "tiff"];
const OUTPUT_SUFFIX: &str = "upright";

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_generated_file(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|stem| stem.ends_with(&format!("_{}", OUTPUT_SUFFIX)))
        .unwrap_or(false)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

fn default_output_path(input: &Path, format: OutputFormat) -> PathBuf {
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        "{}_{}.{}",
        file_stem(input),
        OUTPUT_SUFFIX,
        format.extension()
    ))
}

fn resolve_params(args: &ParamArgs) -> Result<OrientParams, Box<dyn std::error::Error>> {
    let mut params = match args.preset {
        Some(ref name) => OrientParams::from_preset(name).ok_or_else(|| {
            let names: Vec<&str> = OrientParams::all_presets()
                .into_iter()
                .map(|(n, _)| n)
                .collect();
            format!("Unknown preset '{}'. Available: {}", name, names.join(", "))
        })?,
        None => OrientParams::standard(),
    };

    if let Some(max) = args.max_dimension {
        if max == 0 {
            return Err("--max-dimension must be greater than 0".into());
        }
        params.max_dimension = max;
    }
    if args.no_exif {
        params.apply_exif = false;
    }
    if let Some(ref name) = args.format {
        params.output = OutputFormat::from_name(name)
            .ok_or_else(|| format!("Unknown format '{}'. Available: jpeg, png", name))?;
    }
    if let Some(q) = args.quality {
        match params.output {
            OutputFormat::Jpeg { .. } => {
                params.output = OutputFormat::Jpeg {
                    quality: q.clamp(1, 100),
                }
            }
            OutputFormat::Png => warn!("--quality has no effect on PNG output"),
        }
    }

    Ok(params)
}

fn describe(report: &OrientReport) -> String {
    let mut actions = Vec::new();
    if let Some(o) = report.exif_orientation.filter(|&o| o != 1) {
        actions.push(format!("exif {}", o));
    }
    if report.decision.rotated {
        actions.push("rotate 90".to_string());
    }
    if report.decision.flipped {
        actions.push("flip vertical".to_string());
    }
    if actions.is_empty() {
        actions.push("unchanged".to_string());
    }
    format!(
        "{} ({}x{} -> {}x{})",
        actions.join(", "),
        report.source_dimensions.0,
        report.source_dimensions.1,
        report.output_dimensions.0,
        report.output_dimensions.1
    )
}

fn cmd_single(
    input: &Path,
    output: Option<&Path>,
    params: &OrientParams,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_path = output
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output_path(input, params.output));

    info!("Processing: {} -> {}", input.display(), output_path.display());
    let report = process_file(input, &output_path, params)?;
    eprintln!("Done: {}: {}", output_path.display(), describe(&report));
    Ok(())
}

/// Pair every input with its output path in `output_dir`.
///
/// Inputs sharing a stem (`photo.jpg`, `photo.png`) keep their source
/// extension in the name (`photo_jpg_upright.jpg`) so no two writes land on
/// the same file.
fn batch_outputs(
    images: &[PathBuf],
    output_dir: &Path,
    format: OutputFormat,
) -> Vec<(PathBuf, PathBuf)> {
    let mut stem_counts: HashMap<String, usize> = HashMap::new();
    for image in images {
        *stem_counts.entry(file_stem(image)).or_default() += 1;
    }

    images
        .iter()
        .map(|image| {
            let stem = file_stem(image);
            let base = match image.extension().and_then(|e| e.to_str()) {
                Some(ext) if stem_counts[&stem] > 1 => format!("{}_{}", stem, ext.to_lowercase()),
                _ => stem,
            };
            let output = output_dir.join(format!(
                "{}_{}.{}",
                base,
                OUTPUT_SUFFIX,
                format.extension()
            ));
            (image.clone(), output)
        })
        .collect()
}

fn is_up_to_date(input: &Path, output: &Path) -> bool {
    let (Ok(in_meta), Ok(out_meta)) = (input.metadata(), output.metadata()) else {
        return false;
    };
    match (in_meta.modified(), out_meta.modified()) {
        (Ok(in_time), Ok(out_time)) => out_time > in_time,
        _ => false,
    }
}

fn cmd_batch(
    input_dir: &Path,
    output_dir: &Path,
    params: &OrientParams,
    jobs: Option<usize>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut images: Vec<PathBuf> = std::fs::read_dir(input_dir)?
        .filter_map(|entry| entry.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_image_file(p) && !is_generated_file(p))
        .collect();
    images.sort();

    if images.is_empty() {
        eprintln!("No source images found in {}", input_dir.display());
        return Ok(());
    }

    std::fs::create_dir_all(output_dir)?;

    if let Some(n) = jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .ok();
    }

    let mut skipped = 0usize;
    let mut pending: Vec<(PathBuf, PathBuf)> = Vec::new();
    for (image_path, output_path) in batch_outputs(&images, output_dir, params.output) {
        if !force && is_up_to_date(&image_path, &output_path) {
            skipped += 1;
            continue;
        }
        pending.push((image_path, output_path));
    }

    eprintln!(
        "Found {} source images: {} to process, skipping {} up-to-date",
        images.len(),
        pending.len(),
        skipped
    );

    // Each image owns its own pipeline; parallelism is across files only.
    let results: Vec<Result<OrientReport, String>> = pending
        .par_iter()
        .map(|(input, output)| {
            process_file(input, output, params)
                .map(|report| {
                    eprintln!("  Done: {}: {}", output.display(), describe(&report));
                    report
                })
                .map_err(|e| {
                    let msg = format!("{}: {}", input.display(), e);
                    eprintln!("  Error: {}", msg);
                    msg
                })
        })
        .collect();

    let mut rotated = 0usize;
    let mut flipped = 0usize;
    let mut errors: Vec<String> = Vec::new();
    for result in results {
        match result {
            Ok(report) => {
                rotated += report.decision.rotated as usize;
                flipped += report.decision.flipped as usize;
            }
            Err(e) => errors.push(e),
        }
    }

    eprintln!(
        "\nDone! Processed: {}, Rotated: {}, Flipped: {}, Skipped: {}, Errors: {}",
        pending.len() - errors.len(),
        rotated,
        flipped,
        skipped,
        errors.len()
    );
    for e in &errors {
        eprintln!("  {}", e);
    }

    Ok(())
}

fn format_profile(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format!("{:.3}", v))
        .collect::<Vec<_>>()
        .join(" ")
}

fn cmd_inspect(input: &Path, params: &OrientParams) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(input)?;
    let (_, report) = analyze(&bytes, params)?;
    debug!(?report, "Inspection report");

    let p = &report.profiles;
    println!("Image: {}", input.display());
    println!(
        "Source: {}x{}, analyzed: {}x{}, output: {}x{}",
        report.source_dimensions.0,
        report.source_dimensions.1,
        report.analyzed_dimensions.0,
        report.analyzed_dimensions.1,
        report.output_dimensions.0,
        report.output_dimensions.1
    );
    match report.exif_orientation {
        Some(o) => println!("EXIF orientation: {}", o),
        None => println!("EXIF orientation: none"),
    }

    let s = &report.initial_score;
    println!(
        "Initial scores: rotate none {:.3}, rotate 90 {:.3}, flip none {:.3}, flip vertical {:.3}",
        s.rotate_none, s.rotate_90, s.flip_none, s.flip_vertical
    );
    println!("Decision: {}", describe(&report));

    println!("Final profiles:");
    for (label, grid) in [("brightness", &p.brightness), ("noise", &p.noise)] {
        println!("  {} grid:", label);
        for row in grid.chunks(3) {
            println!("    {}", format_profile(row));
        }
    }
    println!("  brightness rows:    {}", format_profile(&p.brightness_rows));
    println!("  brightness columns: {}", format_profile(&p.brightness_columns));
    println!("  noise rows:         {}", format_profile(&p.noise_rows));
    println!("  noise columns:      {}", format_profile(&p.noise_columns));

    let s = &report.score;
    println!(
        "Final scores: rotate none {:.3}, rotate 90 {:.3}, flip none {:.3}, flip vertical {:.3}",
        s.rotate_none, s.rotate_90, s.flip_none, s.flip_vertical
    );
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Single {
            input,
            output,
            params,
        } => {
            let params = resolve_params(&params)?;
            cmd_single(&input, output.as_deref(), &params)?;
        }

        Commands::Batch {
            input_dir,
            output_dir,
            jobs,
            force,
            params,
        } => {
            let params = resolve_params(&params)?;
            let output = output_dir.unwrap_or_else(|| input_dir.join(OUTPUT_SUFFIX));
            cmd_batch(&input_dir, &output, &params, jobs, force)?;
        }

        Commands::Inspect { input, params } => {
            let params = resolve_params(&params)?;
            cmd_inspect(&input, &params)?;
        }
    }

    Ok(())
}
