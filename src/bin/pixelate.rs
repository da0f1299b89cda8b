use clap::Parser;
use std::fs;
use std::path::PathBuf;
use bead_mosaic::{mosaic_bytes, MatchStrategy, MosaicOptions, ReductionMode};
use anyhow::Context;
use anyhow::Result;

/// Turn images into bead mosaics.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Board width in beads
    #[arg(short = 'W', long, default_value_t = 29)]
    width: u32,

    /// Board height in beads
    #[arg(short = 'H', long, default_value_t = 29)]
    height: u32,

    /// Color reduction: minimal, basic, standard, detailed or bw
    #[arg(short, long)]
    mode: Option<String>,

    /// Matching strategy: clustering or threshold
    #[arg(short = 't', long)]
    strategy: Option<MatchStrategy>,

    /// Skip contrast stretching and posterization
    #[arg(long)]
    no_preprocess: bool,

    /// JSON options file; command-line flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Optional upscale size (longest side). If omitted, the board size is used.
    #[arg(short, long)]
    output_size: Option<u32>,

    /// Print bead counts as JSON
    #[arg(long)]
    counts: bool,

    /// Output directory
    #[arg(short = 'd', long)]
    out_dir: Option<PathBuf>,

    /// Output filename prefix (ignored when --out-dir supplied)
    #[arg(short = 'p', long, default_value = "beads_")]
    prefix: String,
}

fn load_options(args: &Args) -> Result<MosaicOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading options from {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => MosaicOptions::default(),
    };

    if let Some(mode) = &args.mode {
        options.mode = ReductionMode::parse(mode);
    }
    if let Some(strategy) = args.strategy {
        options.strategy = strategy;
    }
    if args.no_preprocess {
        options.preprocess = false;
    }
    Ok(options)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let options = load_options(&args)?;
    log::debug!("options: {options:?}");

    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let (png, result) = mosaic_bytes(&bytes, args.width, args.height, args.output_size, &options)
            .context("mosaic processing failed")?;

        let out_path = if let Some(dir) = &args.out_dir {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            dir.join(format!("{stem}.png"))
        } else {
            let stem = input.file_stem().unwrap_or_default().to_string_lossy();
            PathBuf::from(format!("{}{}.png", args.prefix, stem))
        };

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&out_path, png)?;
        println!("Saved → {}", out_path.display());

        if args.counts {
            println!("{}", serde_json::to_string_pretty(&result.color_counts)?);
        }
    }

    Ok(())
}
