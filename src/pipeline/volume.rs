//! Helpers around precomputed volumes and tool outputs on disk

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// `file://` URI for a local path, as the registration and warping tools
/// expect their `--url` arguments.
pub fn file_uri(path: &str) -> String {
    format!("file://{path}")
}

/// Path of the blockfs file backing one decimation level of a precomputed
/// volume, e.g. `<dir>/1_1_1/precomputed.blockfs`.
pub fn volume_level_file(precomputed_dir: &str, level: u32) -> PathBuf {
    Path::new(precomputed_dir)
        .join(format!("{level}_{level}_{level}"))
        .join("precomputed.blockfs")
}

/// A precomputed volume is usable once its first decimated level has been
/// written out.
pub fn volume_is_valid(precomputed_dir: &str) -> bool {
    !precomputed_dir.is_empty() && volume_level_file(precomputed_dir, 2).exists()
}

/// Number of TIFF files (`.tif` or `.tiff`, any case handled by the tools
/// downstream) directly inside `dir`. Returns 0 when the directory cannot
/// be read.
pub fn count_tif_files(dir: &str) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().contains(".tif"))
        .count()
}

/// Number of blobs in a detection output file (a JSON array of coordinates)
pub fn count_blobs(path: &str) -> Result<usize> {
    let text = fs::read_to_string(path)?;
    let document: serde_json::Value = serde_json::from_str(&text)?;
    Ok(document.as_array().map(|points| points.len()).unwrap_or(0))
}
