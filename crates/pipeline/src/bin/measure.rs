use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use treescan_pipeline::{format_report, measure_scan, MeasureParams};

/// Measure branch clusters in a labeled growth cloud.
#[derive(Parser, Debug)]
#[command(name = "treescan-measure", version)]
struct Args {
    /// Labeled cloud, typically the output of treescan-growth.
    input: PathBuf,

    /// Where to write the report table; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Minimum points for a cluster to be measured.
    #[arg(long, default_value_t = 5)]
    min_points: usize,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let cloud = treescan_io::read_cloud(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let params = MeasureParams {
        min_cluster_points: args.min_points,
        ..MeasureParams::default()
    };
    let report = measure_scan(&cloud, &params);
    let table = format_report(&report);

    match &args.output {
        Some(path) => {
            fs::write(path, &table).with_context(|| format!("writing {}", path.display()))?
        }
        None => print!("{}", table),
    }
    Ok(())
}
