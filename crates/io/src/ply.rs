use std::fs;
use std::io::{self, BufWriter, Write as _};
use std::path::Path;
use treescan_core::PointCloud;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
}

/// Vertex property type as declared in the header. Doubles are narrowed to
/// f32 on read; scans never carry more precision than that anyway.
#[derive(Debug, Clone, Copy)]
enum PropType {
    Float,
    Double,
    Uchar,
}

impl PropType {
    fn byte_size(self) -> usize {
        match self {
            PropType::Float => 4,
            PropType::Double => 8,
            PropType::Uchar => 1,
        }
    }
}

struct PlyHeader {
    format: PlyFormat,
    vertex_count: usize,
    property_names: Vec<String>,
    property_types: Vec<PropType>,
    // Byte offset just past the end_header line.
    header_end_offset: usize,
}

fn parse_ply_header(data: &[u8]) -> io::Result<PlyHeader> {
    let end_marker = b"end_header\n";
    let header_end = data
        .windows(end_marker.len())
        .position(|w| w == end_marker)
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "missing end_header in PLY file")
        })?;
    let header_end_offset = header_end + end_marker.len();

    let header_text = std::str::from_utf8(&data[..header_end])
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "PLY header not valid UTF-8"))?;

    let mut format = None;
    let mut vertex_count = 0usize;
    let mut property_names: Vec<String> = Vec::new();
    let mut property_types: Vec<PropType> = Vec::new();
    let mut in_vertex_element = false;
    let mut seen_magic = false;

    for line in header_text.lines() {
        let line = line.trim();

        if !seen_magic {
            if line == "ply" {
                seen_magic = true;
                continue;
            }
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "file does not start with 'ply'",
            ));
        }

        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("format") => {
                format = Some(match parts.next() {
                    Some("ascii") => PlyFormat::Ascii,
                    Some("binary_little_endian") => PlyFormat::BinaryLittleEndian,
                    other => {
                        return Err(io::Error::new(
                            io::ErrorKind::Unsupported,
                            format!("unsupported PLY format: {:?}", other),
                        ));
                    }
                });
            }
            Some("element") => match parts.next() {
                Some("vertex") => {
                    in_vertex_element = true;
                    vertex_count = parts
                        .next()
                        .ok_or_else(|| {
                            io::Error::new(
                                io::ErrorKind::InvalidData,
                                "element vertex line missing count",
                            )
                        })?
                        .parse::<usize>()
                        .map_err(|e| {
                            io::Error::new(
                                io::ErrorKind::InvalidData,
                                format!("invalid vertex count: {}", e),
                            )
                        })?;
                }
                _ => in_vertex_element = false,
            },
            Some("property") if in_vertex_element => {
                let (ptype, pname) = (parts.next(), parts.next());
                let ptype = match ptype {
                    Some("float" | "float32") => PropType::Float,
                    Some("double" | "float64") => PropType::Double,
                    Some("uchar" | "uint8") => PropType::Uchar,
                    other => {
                        return Err(io::Error::new(
                            io::ErrorKind::Unsupported,
                            format!("unsupported property type: {:?}", other),
                        ));
                    }
                };
                let pname = pname.ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidData, "property line missing name")
                })?;
                property_types.push(ptype);
                property_names.push(pname.to_string());
            }
            _ => {}
        }
    }

    let format = format
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "PLY format line missing"))?;

    Ok(PlyHeader {
        format,
        vertex_count,
        property_names,
        property_types,
        header_end_offset,
    })
}

pub fn read_ply(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let data = fs::read(&path)?;
    let header = parse_ply_header(&data)?;

    let prop_index = |name: &str| header.property_names.iter().position(|n| n == name);
    let (idx_x, idx_y, idx_z) = match (prop_index("x"), prop_index("y"), prop_index("z")) {
        (Some(ix), Some(iy), Some(iz)) => (ix, iy, iz),
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "PLY file missing required x, y, z properties",
            ));
        }
    };

    let n = header.vertex_count;
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut z = Vec::with_capacity(n);

    match header.format {
        PlyFormat::Ascii => {
            let body = std::str::from_utf8(&data[header.header_end_offset..]).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidData, "PLY body not valid UTF-8")
            })?;
            let mut count = 0usize;
            for line in body.lines() {
                if count >= n {
                    break;
                }
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() < header.property_names.len() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!(
                            "vertex line has {} fields, expected {}",
                            parts.len(),
                            header.property_names.len()
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
                count += 1;
            }
        }
        PlyFormat::BinaryLittleEndian => {
            let body = &data[header.header_end_offset..];
            let stride: usize = header.property_types.iter().map(|t| t.byte_size()).sum();
            let needed = n * stride;
            if body.len() < needed {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!(
                        "PLY binary body too short: need {} bytes, got {}",
                        needed,
                        body.len()
                    ),
                ));
            }
            let offset_of = |idx: usize| -> usize {
                header.property_types[..idx]
                    .iter()
                    .map(|t| t.byte_size())
                    .sum()
            };
            let offsets = [offset_of(idx_x), offset_of(idx_y), offset_of(idx_z)];
            let types = [
                header.property_types[idx_x],
                header.property_types[idx_y],
                header.property_types[idx_z],
            ];
            for vi in 0..n {
                let row = &body[vi * stride..(vi + 1) * stride];
                let mut coords = [0.0f32; 3];
                for axis in 0..3 {
                    let off = offsets[axis];
                    coords[axis] = match types[axis] {
                        PropType::Float => f32::from_le_bytes([
                            row[off],
                            row[off + 1],
                            row[off + 2],
                            row[off + 3],
                        ]),
                        PropType::Double => {
                            let mut bytes = [0u8; 8];
                            bytes.copy_from_slice(&row[off..off + 8]);
                            f64::from_le_bytes(bytes) as f32
                        }
                        PropType::Uchar => row[off] as f32,
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

fn write_ply_header(w: &mut impl io::Write, count: usize, format: &str) -> io::Result<()> {
    writeln!(w, "ply")?;
    writeln!(w, "format {} 1.0", format)?;
    writeln!(w, "element vertex {}", count)?;
    writeln!(w, "property float x")?;
    writeln!(w, "property float y")?;
    writeln!(w, "property float z")?;
    writeln!(w, "end_header")
}

/// Write an ASCII PLY file.
pub fn write_ply(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);
    write_ply_header(&mut w, cloud.len(), "ascii")?;
    for i in 0..cloud.len() {
        writeln!(w, "{} {} {}", cloud.x[i], cloud.y[i], cloud.z[i])?;
    }
    w.flush()
}

/// Write a binary_little_endian PLY file.
pub fn write_ply_binary(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let file = fs::File::create(path)?;
    let mut w = BufWriter::new(file);
    write_ply_header(&mut w, cloud.len(), "binary_little_endian")?;
    for i in 0..cloud.len() {
        w.write_all(&cloud.x[i].to_le_bytes())?;
        w.write_all(&cloud.y[i].to_le_bytes())?;
        w.write_all(&cloud.z[i].to_le_bytes())?;
    }
    w.flush()
}
