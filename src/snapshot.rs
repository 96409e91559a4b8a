//! Periodic JSON checkpoints of the world state.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::world::World;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Writes a world snapshot every `interval_days` days. Interval 0 disables
/// writing entirely.
pub struct SnapshotWriter {
    dir: PathBuf,
    interval_days: u64,
}

impl SnapshotWriter {
    pub fn new(dir: impl AsRef<Path>, interval_days: u64) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            interval_days,
        }
    }

    pub fn maybe_write(
        &self,
        world: &World,
        scenario: &str,
        day: u64,
    ) -> Result<Option<PathBuf>, SnapshotError> {
        if self.interval_days == 0 || day % self.interval_days != 0 {
            return Ok(None);
        }
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("day_{day:06}.json"));
        let snapshot = world.snapshot(scenario, day);
        let encoded = serde_json::to_string_pretty(&snapshot)?;
        fs::write(&path, encoded)?;
        Ok(Some(path))
    }
}
