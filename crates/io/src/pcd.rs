use std::fs;
use std::io::{self, BufWriter, Write as _};
use std::path::Path;
use treescan_core::PointCloud;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PcdData {
    Ascii,
    Binary,
}

/// Parsed PCD header: field layout plus the byte offset of the body.
struct PcdHeader {
    data: PcdData,
    points: usize,
    fields: Vec<String>,
    sizes: Vec<usize>,
    header_end_offset: usize,
}

fn parse_pcd_header(data: &[u8]) -> io::Result<PcdHeader> {
    let mut fields: Vec<String> = Vec::new();
    let mut sizes: Vec<usize> = Vec::new();
    let mut points: Option<usize> = None;
    let mut width: Option<usize> = None;
    let mut height: usize = 1;
    let mut format: Option<PcdData> = None;
    let mut offset = 0usize;

    // The header is line-oriented ASCII; DATA is its last line and the body
    // begins on the next byte.
    while offset < data.len() {
        let line_end = data[offset..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| offset + p)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "PCD header truncated"))?;
        let line = std::str::from_utf8(&data[offset..line_end])
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "PCD header not UTF-8"))?
            .trim();
        offset = line_end + 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let keyword = parts.next().unwrap_or_default();
        match keyword {
            "FIELDS" => fields = parts.map(str::to_string).collect(),
            "SIZE" => {
                sizes = parts
                    .map(|p| {
                        p.parse::<usize>().map_err(|e| {
                            io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!("invalid SIZE entry: {}", e),
                            )
                        })
                    })
                    .collect::<io::Result<_>>()?;
            }
            "WIDTH" => {
                width = Some(parse_count(parts.next(), "WIDTH")?);
            }
            "HEIGHT" => {
                height = parse_count(parts.next(), "HEIGHT")?;
            }
            "POINTS" => {
                points = Some(parse_count(parts.next(), "POINTS")?);
            }
            "DATA" => {
                format = Some(match parts.next() {
                    Some("ascii") => PcdData::Ascii,
                    Some("binary") => PcdData::Binary,
                    other => {
                        return Err(io::Error::new(
                            io::ErrorKind::Unsupported,
                            format!("unsupported PCD data format: {:?}", other),
                        ));
                    }
                });
                break;
            }
            // VERSION, TYPE, COUNT, VIEWPOINT carry nothing we need.
            _ => {}
        }
    }

    let data_format = format
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "PCD DATA line missing"))?;
    let points = match (points, width) {
        (Some(p), _) => p,
        (None, Some(w)) => w * height,
        (None, None) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "PCD header missing POINTS and WIDTH",
            ));
        }
    };

    if sizes.is_empty() {
        sizes = vec![4; fields.len()];
    }
    if sizes.len() != fields.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "PCD SIZE entry count does not match FIELDS",
        ));
    }

    Ok(PcdHeader {
        data: data_format,
        points,
        fields,
        sizes,
        header_end_offset: offset,
    })
}

fn parse_count(field: Option<&str>, keyword: &str) -> io::Result<usize> {
    field
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("PCD {} line missing value", keyword),
            )
        })?
        .parse::<usize>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid PCD {}: {}", keyword, e),
            )
        })
}

pub fn read_pcd(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let data = fs::read(&path)?;
    let header = parse_pcd_header(&data)?;

    let field_index = |name: &str| header.fields.iter().position(|f| f == name);
    let (idx_x, idx_y, idx_z) = match (field_index("x"), field_index("y"), field_index("z")) {
        (Some(ix), Some(iy), Some(iz)) => (ix, iy, iz),
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "PCD file missing required x, y, z fields",
            ));
        }
    };

    let mut x = Vec::with_capacity(header.points);
    let mut y = Vec::with_capacity(header.points);
    let mut z = Vec::with_capacity(header.points);

    match header.data {
        PcdData::Ascii => {
            let body = std::str::from_utf8(&data[header.header_end_offset..]).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidData, "PCD body not valid UTF-8")
            })?;
            let mut rows = 0usize;
            for line in body.lines().take(header.points) {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < header.fields.len() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "point line has {} fields, expected {}",
                            parts.len(),
                            header.fields.len()
                        ),
                    ));
                }
                let parse = |idx: usize| -> io::Result<f32> {
                    parts[idx].parse::<f32>().map_err(|e| {
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("failed to parse float: {}", e),
                        )
                    })
                };
                x.push(parse(idx_x)?);
                y.push(parse(idx_y)?);
                z.push(parse(idx_z)?);
                rows += 1;
            }
            if rows < header.points {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "PCD ascii body too short: need {} rows, got {}",
                        header.points, rows
                    ),
                ));
            }
        }
        PcdData::Binary => {
            let body = &data[header.header_end_offset..];
            let stride: usize = header.sizes.iter().sum();
            let needed = header.points * stride;
            if body.len() < needed {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "PCD binary body too short: need {} bytes, got {}",
                        needed,
                        body.len()
                    ),
                ));
            }
            let offset_of = |idx: usize| -> usize { header.sizes[..idx].iter().sum() };
            let offsets = [offset_of(idx_x), offset_of(idx_y), offset_of(idx_z)];
            let sizes = [header.sizes[idx_x], header.sizes[idx_y], header.sizes[idx_z]];
            for &size in &sizes {
                if size != 4 && size != 8 {
                    return Err(io::Error::new(
                        io::ErrorKind::Unsupported,
                        format!("unsupported PCD coordinate size: {} bytes", size),
                    ));
                }
            }
            for pi in 0..header.points {
                let row = &body[pi * stride..(pi + 1) * stride];
                let mut coords = [0.0f32; 3];
                for axis in 0..3 {
                    let off = offsets[axis];
                    // 8-byte coordinates are narrowed, like double PLY
                    // vertices.
                    coords[axis] = if sizes[axis] == 8 {
                        let mut bytes = [0u8; 8];
                        bytes.copy_from_slice(&row[off..off + 8]);
                        f64::from_le_bytes(bytes) as f32
                    } else {
                        f32::from_le_bytes([row[off], row[off + 1], row[off + 2], row[off + 3]])
                    };
                }
                x.push(coords[0]);
                y.push(coords[1]);
                z.push(coords[2]);
            }
        }
    }

    Ok(PointCloud::from_xyz(x, y, z))
}

fn write_pcd_header(w: &mut impl io::Write, count: usize, data: &str) -> io::Result<()> {
    writeln!(w, "VERSION .7")?;
    writeln!(w, "FIELDS x y z")?;
    writeln!(w, "SIZE 4 4 4")?;
    writeln!(w, "TYPE F F F")?;
    writeln!(w, "COUNT 1 1 1")?;
    writeln!(w, "WIDTH {}", count)?;
    writeln!(w, "HEIGHT 1")?;
    writeln!(w, "VIEWPOINT 0 0 0 1 0 0 0")?;
    writeln!(w, "POINTS {}", count)?;
    writeln!(w, "DATA {}", data)
}

/// Write an ASCII PCD file.
pub fn write_pcd(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);
    write_pcd_header(&mut w, cloud.len(), "ascii")?;
    for i in 0..cloud.len() {
        writeln!(w, "{} {} {}", cloud.x[i], cloud.y[i], cloud.z[i])?;
    }
    w.flush()
}

/// Write a binary PCD file. Bit-exact, unlike the ASCII form.
pub fn write_pcd_binary(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);
    write_pcd_header(&mut w, cloud.len(), "binary")?;
    for i in 0..cloud.len() {
        w.write_all(&cloud.x[i].to_le_bytes())?;
        w.write_all(&cloud.y[i].to_le_bytes())?;
        w.write_all(&cloud.z[i].to_le_bytes())?;
    }
    w.flush()
}
