use std::fs;
use std::io::{self, BufWriter, Write as _};
use std::path::Path;
use treescan_core::PointCloud;

/// Read a whitespace-separated numeric table of `x y z` rows, with an
/// optional fourth cluster-label column.
///
/// Blank lines and lines starting with `#` are skipped. Every data row must
/// have the same column count; label values are parsed as floats and
/// truncated to `i32`, matching tables written by [`write_text`].
pub fn read_text(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let content = fs::read_to_string(&path)?;

    let mut x = Vec::new();
    let mut y = Vec::new();
    let mut z = Vec::new();
    let mut labels: Vec<i32> = Vec::new();
    let mut columns: Option<usize> = None;

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        match columns {
            None => {
                if parts.len() != 3 && parts.len() != 4 {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "line {}: expected 3 or 4 columns, got {}",
                            line_no + 1,
                            parts.len()
                        ),
                    ));
                }
                columns = Some(parts.len());
            }
            Some(n) if parts.len() != n => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "line {}: inconsistent column count ({} after {})",
                        line_no + 1,
                        parts.len(),
                        n
                    ),
                ));
            }
            Some(_) => {}
        }

        let parse = |field: &str| -> io::Result<f32> {
            field.parse::<f32>().map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("line {}: failed to parse float: {}", line_no + 1, e),
                )
            })
        };

        x.push(parse(parts[0])?);
        y.push(parse(parts[1])?);
        z.push(parse(parts[2])?);
        if parts.len() == 4 {
            labels.push(parse(parts[3])? as i32);
        }
    }

    let cloud = PointCloud::from_xyz(x, y, z);
    Ok(match columns {
        Some(4) => cloud.with_labels(labels),
        _ => cloud,
    })
}

/// Write a cloud as a whitespace-separated text table with 8 decimal digits
/// per value. The label column, when present, is written as a float too so
/// the table stays homogeneous.
pub fn write_text(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);

    for i in 0..cloud.len() {
        match &cloud.labels {
            Some(labels) => writeln!(
                w,
                "{:.8} {:.8} {:.8} {:.8}",
                cloud.x[i], cloud.y[i], cloud.z[i], labels[i] as f32
            )?,
            None => writeln!(w, "{:.8} {:.8} {:.8}", cloud.x[i], cloud.y[i], cloud.z[i])?,
        }
    }

    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::NamedTempFile;

    #[test]
    fn roundtrip_plain_cloud() {
        let cloud = PointCloud::from_xyz(
            vec![1.5, -2.25, 0.0],
            vec![0.125, 3.0, -4.5],
            vec![10.0, 11.0, 12.0],
        );
        let tmp = NamedTempFile::new().unwrap();
        write_text(tmp.path(), &cloud).unwrap();
        let loaded = read_text(tmp.path()).unwrap();
        assert_eq!(loaded, cloud);
    }

    #[test]
    fn roundtrip_labeled_cloud() {
        let cloud = PointCloud::from_xyz(vec![0.0, 1.0, 2.0], vec![0.0; 3], vec![0.0; 3])
            .with_labels(vec![0, -1, 7]);
        let tmp = NamedTempFile::new().unwrap();
        write_text(tmp.path(), &cloud).unwrap();
        let loaded = read_text(tmp.path()).unwrap();
        assert_eq!(loaded.labels, Some(vec![0, -1, 7]));
    }

    #[test]
    fn empty_file_is_empty_cloud() {
        let tmp = NamedTempFile::new().unwrap();
        fs::write(tmp.path(), "").unwrap();
        let loaded = read_text(tmp.path()).unwrap();
        assert!(loaded.is_empty());
        assert!(loaded.labels.is_none());
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let tmp = NamedTempFile::new().unwrap();
        fs::write(
            tmp.path(),
            "# header comment\n\n1.0 2.0 3.0\n\n# trailing\n4.0 5.0 6.0\n",
        )
        .unwrap();
        let loaded = read_text(tmp.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.point(1), [4.0, 5.0, 6.0]);
    }

    #[test]
    fn inconsistent_columns_are_rejected() {
        let tmp = NamedTempFile::new().unwrap();
        fs::write(tmp.path(), "1 2 3\n4 5 6 0\n").unwrap();
        let err = read_text(tmp.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn garbage_field_is_rejected() {
        let tmp = NamedTempFile::new().unwrap();
        fs::write(tmp.path(), "1 2 oak\n").unwrap();
        let err = read_text(tmp.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    fn signed(magnitude: f32, negative: bool) -> f32 {
        if negative {
            -magnitude
        } else {
            magnitude
        }
    }

    proptest! {
        // For magnitudes of 0.25 and above the f32 ulp exceeds 1e-8, so
        // eight fixed decimals pin down the exact bit pattern.
        #[test]
        fn eight_digit_roundtrip_is_exact(
            pts in prop::collection::vec(
                (
                    (0.25f32..100.0f32, any::<bool>()),
                    (0.25f32..100.0f32, any::<bool>()),
                    (0.25f32..100.0f32, any::<bool>()),
                ),
                0..100
            )
        ) {
            let cloud = PointCloud::from_xyz(
                pts.iter().map(|p| signed(p.0 .0, p.0 .1)).collect(),
                pts.iter().map(|p| signed(p.1 .0, p.1 .1)).collect(),
                pts.iter().map(|p| signed(p.2 .0, p.2 .1)).collect(),
            );
            let tmp = NamedTempFile::new().unwrap();
            write_text(tmp.path(), &cloud).unwrap();
            let loaded = read_text(tmp.path()).unwrap();

            prop_assert_eq!(loaded.len(), cloud.len());
            for i in 0..cloud.len() {
                prop_assert_eq!(loaded.x[i].to_bits(), cloud.x[i].to_bits());
                prop_assert_eq!(loaded.y[i].to_bits(), cloud.y[i].to_bits());
                prop_assert_eq!(loaded.z[i].to_bits(), cloud.z[i].to_bits());
            }
        }

        // Near zero the decimal grid is coarser than the float grid; the
        // round-trip error is still bounded by half a decimal step.
        #[test]
        fn roundtrip_error_is_within_half_a_decimal_step(
            pts in prop::collection::vec(
                (-1.0f32..1.0f32, -1.0f32..1.0f32, -1.0f32..1.0f32),
                1..50
            )
        ) {
            let cloud = PointCloud::from_xyz(
                pts.iter().map(|p| p.0).collect(),
                pts.iter().map(|p| p.1).collect(),
                pts.iter().map(|p| p.2).collect(),
            );
            let tmp = NamedTempFile::new().unwrap();
            write_text(tmp.path(), &cloud).unwrap();
            let loaded = read_text(tmp.path()).unwrap();

            for i in 0..cloud.len() {
                prop_assert!((loaded.x[i] - cloud.x[i]).abs() <= 1e-8);
                prop_assert!((loaded.y[i] - cloud.y[i]).abs() <= 1e-8);
                prop_assert!((loaded.z[i] - cloud.z[i]).abs() <= 1e-8);
            }
        }
    }
}
