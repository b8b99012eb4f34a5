//! Sandboxed home directories
//!
//! Every environment gets a fresh temporary directory that is removed when
//! the environment is torn down.

use bevy::log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::constants::SANDBOX_PREFIX;

/// A temporary home directory
#[derive(Debug)]
pub struct Sandbox {
    root: PathBuf,
    dir: Option<TempDir>,
}

impl Sandbox {
    pub fn new(dir: TempDir) -> Self {
        Self {
            root: dir.path().to_path_buf(),
            dir: Some(dir),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_closed(&self) -> bool {
        self.dir.is_none()
    }

    /// Remove the directory. Safe to call more than once; failures are
    /// logged.
    pub fn close(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => debug!("Removed sandbox {}", self.root.display()),
                Err(e) => warn!("Failed to remove sandbox {}: {}", self.root.display(), e),
            }
        }
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        self.close();
    }
}

/// Source of fresh sandboxes
pub trait FileSystemFactory: Send + Sync {
    fn new_file_system(&self) -> io::Result<Sandbox>;
}

/// Sandboxes under the system temp directory (or a chosen parent)
#[derive(Debug, Default, Clone)]
pub struct TempDirFactory {
    parent: Option<PathBuf>,
}

impl TempDirFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create sandboxes inside `parent` instead of the system temp dir
    pub fn in_dir(parent: &Path) -> Self {
        Self {
            parent: Some(parent.to_path_buf()),
        }
    }
}

impl FileSystemFactory for TempDirFactory {
    fn new_file_system(&self) -> io::Result<Sandbox> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(SANDBOX_PREFIX);
        let dir = match &self.parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        debug!("Created sandbox {}", dir.path().display());
        Ok(Sandbox::new(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sandboxes_are_distinct_and_removed() {
        let factory = TempDirFactory::new();
        let mut a = factory.new_file_system().unwrap();
        let b = factory.new_file_system().unwrap();
        assert_ne!(a.root(), b.root());
        assert!(a.root().exists());

        a.close();
        a.close();
        assert!(a.is_closed());
        assert!(!a.root().exists());
        assert!(b.root().exists());
    }

    #[test]
    fn test_missing_parent_fails() {
        let parent = tempfile::tempdir().unwrap();
        let factory = TempDirFactory::in_dir(&parent.path().join("missing"));
        assert!(factory.new_file_system().is_err());
    }
}
