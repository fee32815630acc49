use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::config::GrowthParams;
use crate::error::PipelineError;
use crate::growth::detect_growth;

/// Two scans of the same tree taken at different times, matched by file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPair {
    pub name: String,
    pub before: PathBuf,
    pub after: PathBuf,
}

const SUPPORTED_EXTENSIONS: [&str; 4] = ["txt", "xyz", "pcd", "ply"];

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Pair up scans from two directories by identical file name.
///
/// Files in `before_dir` without a counterpart in `after_dir` are logged and
/// skipped, as are files in unsupported formats. The result is sorted by
/// name so batch runs are reproducible.
pub fn pair_scans(before_dir: &Path, after_dir: &Path) -> io::Result<Vec<ScanPair>> {
    let mut pairs = Vec::new();

    for entry in fs::read_dir(before_dir)? {
        let entry = entry?;
        let before = entry.path();
        if !before.is_file() || !is_supported(&before) {
            continue;
        }
        let name = match before.file_name().and_then(|n| n.to_str()) {
            Some(n) => n.to_string(),
            None => continue,
        };

        let after = after_dir.join(&name);
        if !after.is_file() {
            warn!("no counterpart for {} in {}, skipping", name, after_dir.display());
            continue;
        }

        pairs.push(ScanPair {
            name,
            before,
            after,
        });
    }

    pairs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(pairs)
}

/// Names of the pairs that succeeded and failed in a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: Vec<String>,
    pub failed: Vec<(String, PipelineError)>,
}

/// Run growth detection over every pair, writing one labeled text table per
/// pair into `out_dir`.
///
/// A failing pair is logged and skipped; the batch always runs to the end.
pub fn run_growth_batch(
    pairs: &[ScanPair],
    out_dir: &Path,
    params: &GrowthParams,
) -> io::Result<BatchSummary> {
    fs::create_dir_all(out_dir)?;

    let mut summary = BatchSummary::default();
    for pair in pairs {
        info!("processing pair {}", pair.name);
        match process_pair(pair, out_dir, params) {
            Ok(()) => summary.processed.push(pair.name.clone()),
            Err(e) => {
                error!("pair {} failed: {}", pair.name, e);
                summary.failed.push((pair.name.clone(), e));
            }
        }
    }

    info!(
        "batch done: {} processed, {} failed",
        summary.processed.len(),
        summary.failed.len()
    );
    Ok(summary)
}

fn process_pair(pair: &ScanPair, out_dir: &Path, params: &GrowthParams) -> Result<(), PipelineError> {
    let before = treescan_io::read_cloud(&pair.before)?;
    let after = treescan_io::read_cloud(&pair.after)?;
    let growth = detect_growth(&before, &after, params)?;

    let out_path = out_dir.join(&pair.name).with_extension("txt");
    treescan_io::write_text(out_path, &growth)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use treescan_core::PointCloud;

    fn write_grid(path: &Path, nx: usize, ny: usize, z: f32) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut zs = Vec::new();
        for i in 0..nx {
            for j in 0..ny {
                x.push(i as f32 * 0.01);
                y.push(j as f32 * 0.01);
                zs.push(z);
            }
        }
        treescan_io::write_text(path, &PointCloud::from_xyz(x, y, zs)).unwrap();
    }

    #[test]
    fn pairing_skips_files_without_counterpart() {
        let before = tempfile::tempdir().unwrap();
        let after = tempfile::tempdir().unwrap();
        write_grid(&before.path().join("oak.txt"), 3, 3, 0.0);
        write_grid(&before.path().join("birch.txt"), 3, 3, 0.0);
        write_grid(&after.path().join("oak.txt"), 3, 3, 0.0);

        let pairs = pair_scans(before.path(), after.path()).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name, "oak.txt");
    }

    #[test]
    fn pairing_ignores_unsupported_formats() {
        let before = tempfile::tempdir().unwrap();
        let after = tempfile::tempdir().unwrap();
        fs::write(before.path().join("notes.md"), "not a scan").unwrap();
        fs::write(after.path().join("notes.md"), "not a scan").unwrap();

        let pairs = pair_scans(before.path(), after.path()).unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn pairs_are_sorted_by_name() {
        let before = tempfile::tempdir().unwrap();
        let after = tempfile::tempdir().unwrap();
        for name in ["c.txt", "a.txt", "b.txt"] {
            write_grid(&before.path().join(name), 2, 2, 0.0);
            write_grid(&after.path().join(name), 2, 2, 0.0);
        }

        let pairs = pair_scans(before.path(), after.path()).unwrap();
        let names: Vec<&str> = pairs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
    }

    #[test]
    fn batch_continues_past_a_corrupt_pair() {
        let before = tempfile::tempdir().unwrap();
        let after = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();

        // Valid pair with clear growth.
        write_grid(&before.path().join("good.txt"), 20, 20, 0.0);
        let mut grown = PointCloud::new();
        for i in 0..20 {
            for j in 0..20 {
                grown.x.push(i as f32 * 0.01);
                grown.y.push(j as f32 * 0.01);
                grown.z.push(0.0);
            }
        }
        for i in 0..8 {
            for j in 0..8 {
                grown.x.push(i as f32 * 0.01);
                grown.y.push(j as f32 * 0.01);
                grown.z.push(1.0);
            }
        }
        treescan_io::write_text(after.path().join("good.txt"), &grown).unwrap();

        // Corrupt pair.
        fs::write(before.path().join("bad.txt"), "this is not numeric\n").unwrap();
        fs::write(after.path().join("bad.txt"), "this is not numeric\n").unwrap();

        let pairs = pair_scans(before.path(), after.path()).unwrap();
        assert_eq!(pairs.len(), 2);

        let params = GrowthParams {
            voxel_size: 0.005,
            sor_neighbors: 4,
            sor_std_multiplier: 10.0,
            neighbor_k: 4,
            min_cluster_size: 5,
            ..GrowthParams::default()
        };
        let summary = run_growth_batch(&pairs, out.path(), &params).unwrap();

        assert_eq!(summary.processed, vec!["good.txt".to_string()]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, "bad.txt");
        assert!(out.path().join("good.txt").exists());
        assert!(!out.path().join("bad.txt").exists());
    }
}
