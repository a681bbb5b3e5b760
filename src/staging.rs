use std::fs;
use std::path::{Path, PathBuf};

/// A staged media file, removed when the guard goes out of scope. Keeps disk
/// usage bounded to one staged file across invocations no matter how the
/// attempt ends.
pub struct StagedMedia {
    path: PathBuf,
}

impl StagedMedia {
    pub fn new(dir: &Path, item_id: i64) -> Self {
        Self {
            path: dir.join(format!("{item_id}.mp4")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedMedia {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::warn!("Failed to remove staged file {}: {e}", self.path.display());
            }
        }
    }
}

/// Remove anything left in the staging directory by an unclean earlier run.
pub fn sweep(dir: &Path) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to read staging dir {}: {e}", dir.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() {
            if let Err(e) = fs::remove_file(&path) {
                tracing::warn!("Failed to remove orphaned file {}: {e}", path.display());
            }
        }
    }
}
