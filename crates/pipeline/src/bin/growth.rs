use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use treescan_pipeline::{detect_growth, pair_scans, run_growth_batch, GrowthParams};

/// Detect new growth between two scans of the same tree.
#[derive(Parser, Debug)]
#[command(name = "treescan-growth", version)]
struct Args {
    /// Earlier scan, or a directory of earlier scans in batch mode.
    before: PathBuf,

    /// Later scan, or a directory of later scans in batch mode.
    after: PathBuf,

    /// Output file, or output directory in batch mode.
    #[arg(short, long)]
    output: PathBuf,

    /// Registration RMSE of the scan pair.
    #[arg(long, default_value_t = 0.009)]
    rmse: f32,

    /// Growth threshold as a multiple of the RMSE.
    #[arg(long, default_value_t = 2.0)]
    rmse_multiple: f32,

    /// Minimum cluster size kept by the clustering stage.
    #[arg(long, default_value_t = 40)]
    min_cluster_size: usize,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let params = GrowthParams {
        registration_rmse: args.rmse,
        rmse_multiple: args.rmse_multiple,
        min_cluster_size: args.min_cluster_size,
        ..GrowthParams::default()
    };

    if args.before.is_dir() != args.after.is_dir() {
        bail!("before and after must both be files or both be directories");
    }

    if args.before.is_dir() {
        let pairs = pair_scans(&args.before, &args.after)?;
        if pairs.is_empty() {
            bail!("no matching scan pairs found");
        }
        let summary = run_growth_batch(&pairs, &args.output, &params)?;
        println!(
            "{} pairs processed, {} failed",
            summary.processed.len(),
            summary.failed.len()
        );
        return Ok(());
    }

    let before = treescan_io::read_cloud(&args.before)
        .with_context(|| format!("reading {}", args.before.display()))?;
    let after = treescan_io::read_cloud(&args.after)
        .with_context(|| format!("reading {}", args.after.display()))?;

    let growth = detect_growth(&before, &after, &params)?;
    treescan_io::write_text(&args.output, &growth)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "{} growth points in {} clusters -> {}",
        growth.len(),
        growth.cluster_labels().len(),
        args.output.display()
    );
    Ok(())
}
