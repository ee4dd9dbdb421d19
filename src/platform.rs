//! Platform utilities: executable discovery and disk usage

use crate::{Result, TtsError};
use log::debug;
use nix::sys::statvfs::statvfs;
use std::path::Path;
use std::process::{Command, Stdio};

/// Find the first candidate executable that runs successfully with `probe_arg`
///
/// Mirrors how the backends verify their binaries at startup: each
/// candidate is spawned once with a harmless flag (`--version`, `-h`)
/// and the first one that exits successfully wins.
pub fn find_executable(candidates: &[&str], probe_arg: &str) -> Option<String> {
    for path in candidates {
        let status = Command::new(path)
            .arg(probe_arg)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match status {
            Ok(status) if status.success() => {
                debug!("Found executable: {}", path);
                return Some(path.to_string());
            }
            Ok(status) => debug!("{} {} exited with {}", path, probe_arg, status),
            Err(e) => debug!("{} not runnable: {}", path, e),
        }
    }
    None
}

/// Disk space snapshot for the filesystem holding a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskUsage {
    /// Total size of the filesystem in bytes
    pub total: u64,
    /// Bytes available to unprivileged users
    pub free: u64,
}

impl DiskUsage {
    /// Query the filesystem containing `path`
    pub fn of(path: &Path) -> Result<Self> {
        let stat = statvfs(path)
            .map_err(|e| TtsError::Cache(format!("statvfs({}) failed: {}", path.display(), e)))?;
        let fragment = stat.fragment_size() as u64;
        Ok(Self {
            total: stat.blocks() as u64 * fragment,
            free: stat.blocks_available() as u64 * fragment,
        })
    }

    /// Free space as a percentage (0.0-100.0) of the total
    pub fn percent_free(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.free as f64 / self.total as f64 * 100.0
    }
}
