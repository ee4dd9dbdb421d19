//! Disk-pressure cleanup of cache directories

use crate::platform::DiskUsage;
use crate::Result;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Delete old files under `dir` if the disk is short on space
///
/// Cleanup only starts when free space is below `min_free_percent` AND
/// below `min_free_disk` bytes. Returns the number of bytes deleted.
pub fn curate_cache(dir: &Path, min_free_percent: f64, min_free_disk: u64) -> Result<u64> {
    let usage = DiskUsage::of(dir)?;
    curate_with_usage(dir, usage, min_free_percent, min_free_disk)
}

/// [`curate_cache`] against an already measured [`DiskUsage`]
///
/// Regular files are removed oldest modification time first until the
/// deficit `(min_free_percent - percent_free) / 100 * total`, rounded up,
/// has been reclaimed or there is nothing left to delete.
pub fn curate_with_usage(
    dir: &Path,
    usage: DiskUsage,
    min_free_percent: f64,
    min_free_disk: u64,
) -> Result<u64> {
    let percent_free = usage.percent_free();
    if percent_free >= min_free_percent || usage.free >= min_free_disk {
        debug!(
            "Cache curation not needed: {:.1}% / {} bytes free",
            percent_free, usage.free
        );
        return Ok(0);
    }

    let needed = ((min_free_percent - percent_free) / 100.0 * usage.total as f64).ceil() as u64;
    info!(
        "Low disk space detected, cleaning cache {} ({} bytes needed)",
        dir.display(),
        needed
    );

    let mut files = Vec::new();
    collect_files(dir, &mut files);
    files.sort();

    let mut freed = 0;
    for (_, size, path) in files {
        if freed >= needed {
            break;
        }
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed {}", path.display());
                freed += size;
            }
            Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
        }
    }

    info!("Cache curation freed {} bytes", freed);
    Ok(freed)
}

fn collect_files(dir: &Path, files: &mut Vec<(SystemTime, u64, PathBuf)>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Can't read {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(metadata) = fs::symlink_metadata(&path) else {
            continue;
        };
        if metadata.is_dir() {
            collect_files(&path, files);
        } else if metadata.is_file() {
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            files.push((modified, metadata.len(), path));
        }
    }
}
