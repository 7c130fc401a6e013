//! Per-request temp workspace
//!
//! Every request gets its own uuid-named directory for extracted frames
//! and audio. The directory is removed when the workspace drops, so every
//! exit path - early rejection included - cleans up after itself.

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Scoped temp directory for one moderation request.
#[derive(Debug)]
pub struct RequestWorkspace {
    root: PathBuf,
}

impl RequestWorkspace {
    pub fn new() -> std::io::Result<Self> {
        let root = std::env::temp_dir().join(format!("moderation-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root)?;
        log::debug!("created request workspace at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory the candidate frames are extracted into.
    pub fn frames_dir(&self) -> PathBuf {
        self.root.join("frames")
    }

    /// Target path for the extracted audio track.
    pub fn audio_path(&self) -> PathBuf {
        self.root.join("audio.wav")
    }
}

impl Drop for RequestWorkspace {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!(
                    "failed to remove workspace {}: {}",
                    self.root.display(),
                    e
                );
            }
        }
    }
}
