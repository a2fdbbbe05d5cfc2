use crate::index::YearIndex;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Write each year's snapshot to `<dir>/<year>.geojson`. Returns the written paths.
pub fn write_snapshots(index: &YearIndex, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut written = Vec::with_capacity(index.range().len());
    for (year, payload) in index.iter() {
        let path = dir.join(format!("{}.geojson", year));
        fs::write(&path, payload).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    log::info!("wrote {} snapshots to {}", written.len(), dir.display());
    Ok(written)
}
