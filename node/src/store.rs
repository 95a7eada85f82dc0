//! File-backed snapshot store

use async_trait::async_trait;
use ballotbox_core::BallotResult;
use ballotbox_ledger::{RegistrySnapshot, SnapshotStore};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stores the registry snapshot as a single bincode file
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, snapshot: &RegistrySnapshot) -> BallotResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = snapshot.to_bytes()?;
        let temp = self.temp_path();

        // Write aside, then rename over the old file
        tokio::fs::write(&temp, &bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        info!(
            "Saved snapshot with {} proposals to {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(())
    }

    async fn load(&self) -> BallotResult<Option<RegistrySnapshot>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No snapshot at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let snapshot = RegistrySnapshot::from_bytes(&bytes)?;
        info!(
            "Loaded snapshot with {} proposals from {}",
            snapshot.len(),
            self.path.display()
        );
        Ok(Some(snapshot))
    }
}
