use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tokio::task;
use tracing::{debug, warn};
use uuid::Uuid;

/// Uniquely named working directory of a single import.
///
/// The directory is removed by [`ImportWorkspace::cleanup`], or when the guard
/// is dropped without having been cleaned up (for example when the request
/// future is cancelled).
#[derive(Debug)]
pub struct ImportWorkspace {
    path: PathBuf,
    released: bool,
}

impl ImportWorkspace {
    /// Create `{work_root}/{uuid}`
    pub fn create(work_root: &Path) -> io::Result<Self> {
        let path = work_root.join(Uuid::new_v4().to_string());
        fs::create_dir_all(&path)?;
        debug!("Created import working directory {}", path.display());
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the directory tree. Failures are logged, never returned.
    ///
    /// Returns whether the directory is gone.
    pub async fn cleanup(mut self) -> bool {
        self.released = true;
        let path = self.path.clone();
        match task::spawn_blocking(move || remove_tree(&path)).await {
            Ok(removed) => removed,
            Err(e) => {
                warn!(
                    "Cleanup task for {} did not complete: {}",
                    self.path.display(),
                    e
                );
                false
            }
        }
    }
}

impl Drop for ImportWorkspace {
    fn drop(&mut self) {
        if !self.released {
            remove_tree(&self.path);
        }
    }
}

fn remove_tree(path: &Path) -> bool {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("Removed import working directory {}", path.display());
            true
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            warn!(
                "Failed to remove import working directory {}: {}",
                path.display(),
                e
            );
            false
        }
    }
}
