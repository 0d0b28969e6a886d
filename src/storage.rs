//! On-disk artifact locations for the single transient job.
//!
//! Exactly one input and one output file exist, at fixed names under one
//! directory, overwritten per job. No job history is retained: the store is
//! cleaned before each admission and after a completed download.

use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

const INPUT_NAME: &str = "input.pdf";
const OUTPUT_NAME: &str = "output.pdf";

/// The fixed input/output locations of the current job.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Create the store, making sure the directory exists.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn input_path(&self) -> PathBuf {
        self.dir.join(INPUT_NAME)
    }

    pub fn output_path(&self) -> PathBuf {
        self.dir.join(OUTPUT_NAME)
    }

    /// Persist uploaded bytes as the job's input artifact.
    pub async fn write_input(&self, bytes: &[u8]) -> io::Result<()> {
        tokio::fs::write(self.input_path(), bytes).await
    }

    /// Remove both artifacts. Best-effort: a vanished file is fine, anything
    /// else is logged and ignored so cleanup never blocks the job lifecycle.
    pub async fn clean(&self) {
        for path in [self.input_path(), self.output_path()] {
            remove_quietly(&path).await;
        }
    }

    /// Remove just the output artifact (used when a job ends without one).
    pub async fn discard_output(&self) {
        remove_quietly(&self.output_path()).await;
    }
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("failed to remove '{}': {e}", path.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_clean_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        store.write_input(b"%PDF-1.4 test").await.unwrap();
        tokio::fs::write(store.output_path(), b"%PDF-1.4 out")
            .await
            .unwrap();
        assert!(store.input_path().exists());

        store.clean().await;
        assert!(!store.input_path().exists());
        assert!(!store.output_path().exists());
    }

    #[tokio::test]
    async fn clean_is_idempotent_on_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        store.clean().await;
        store.clean().await;
    }

    #[test]
    fn paths_are_fixed_and_distinct() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        assert_ne!(store.input_path(), store.output_path());
        assert!(store.input_path().ends_with("input.pdf"));
        assert!(store.output_path().ends_with("output.pdf"));
    }
}
