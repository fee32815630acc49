use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use treescan_pipeline::{align_scans, AlignParams};
use treescan_registration::IcpParams;

/// Align a later scan onto an earlier one using the trunks as anchors.
#[derive(Parser, Debug)]
#[command(name = "treescan-align", version)]
struct Args {
    /// Scan to align against.
    fixed: PathBuf,

    /// Scan that gets transformed.
    moving: PathBuf,

    /// Where to write the aligned moving scan.
    #[arg(short, long)]
    output: PathBuf,

    /// ICP iteration limit.
    #[arg(long, default_value_t = 100)]
    max_iterations: usize,

    /// ICP convergence tolerance on the change in RMSE.
    #[arg(long, default_value_t = 1e-3)]
    tolerance: f32,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let fixed = treescan_io::read_cloud(&args.fixed)
        .with_context(|| format!("reading {}", args.fixed.display()))?;
    let moving = treescan_io::read_cloud(&args.moving)
        .with_context(|| format!("reading {}", args.moving.display()))?;

    let params = AlignParams {
        icp: IcpParams {
            max_iterations: args.max_iterations,
            tolerance: args.tolerance,
            ..IcpParams::default()
        },
        ..AlignParams::default()
    };

    let result = align_scans(&fixed, &moving, &params)?;
    treescan_io::write_text(&args.output, &result.aligned)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let t = result.transform.translation;
    println!(
        "aligned {} points (translation [{:.4} {:.4} {:.4}], icp rmse {:.6}) -> {}",
        result.aligned.len(),
        t[0],
        t[1],
        t[2],
        result.icp.rmse,
        args.output.display()
    );
    Ok(())
}
