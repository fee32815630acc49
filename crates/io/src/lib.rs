#![forbid(unsafe_code)]

pub mod pcd;
pub mod ply;
pub mod text;

pub use pcd::{read_pcd, write_pcd, write_pcd_binary};
pub use ply::{read_ply, write_ply, write_ply_binary};
pub use text::{read_text, write_text};

use std::io;
use std::path::Path;
use treescan_core::PointCloud;

/// Load a cloud, dispatching on the file extension.
///
/// `.txt` and `.xyz` are flat numeric tables, `.pcd` and `.ply` their
/// respective formats. Anything else fails with
/// [`io::ErrorKind::Unsupported`].
pub fn read_cloud(path: impl AsRef<Path>) -> io::Result<PointCloud> {
    let path = path.as_ref();
    match extension_of(path)?.as_str() {
        "txt" | "xyz" => text::read_text(path),
        "pcd" => pcd::read_pcd(path),
        "ply" => ply::read_ply(path),
        other => Err(unsupported_extension(other)),
    }
}

/// Write a cloud, dispatching on the file extension the same way as
/// [`read_cloud`]. PCD and PLY are written in ASCII and drop any label
/// column; use the text formats when labels must survive.
pub fn write_cloud(path: impl AsRef<Path>, cloud: &PointCloud) -> io::Result<()> {
    let path = path.as_ref();
    match extension_of(path)?.as_str() {
        "txt" | "xyz" => text::write_text(path, cloud),
        "pcd" => pcd::write_pcd(path, cloud),
        "ply" => ply::write_ply(path, cloud),
        other => Err(unsupported_extension(other)),
    }
}

fn extension_of(path: &Path) -> io::Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::Unsupported,
                format!("file has no extension: {}", path.display()),
            )
        })
}

fn unsupported_extension(ext: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("unsupported point cloud format: .{}", ext),
    )
}
