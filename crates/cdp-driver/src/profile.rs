use std::path::{Path, PathBuf};

use crate::Result;

/// Chrome creates this in the user-data dir while an instance owns it.
pub const SINGLETON_LOCK: &str = "SingletonLock";

/// A dedicated Chrome user-data directory that keeps a site's login session.
#[derive(Debug, Clone)]
pub struct BrowserProfile {
    dir: PathBuf,
}

impl BrowserProfile {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if needed. Warns when another Chrome appears to
    /// be using it; concurrent use is not prevented.
    pub fn prepare(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        if self.is_locked() {
            tracing::warn!(
                profile = %self.dir.display(),
                "profile appears to be in use by another Chrome instance; close it if the launch fails"
            );
        }
        Ok(())
    }

    pub fn is_locked(&self) -> bool {
        // SingletonLock is a dangling symlink on Linux/macOS, so check the
        // link itself rather than following it.
        std::fs::symlink_metadata(self.dir.join(SINGLETON_LOCK)).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn prepare_creates_dir() {
        let tmp = TempDir::new().unwrap();
        let p = BrowserProfile::new(tmp.path().join("browser-profiles").join("zenn"));
        p.prepare().unwrap();
        assert!(p.dir().is_dir());
        assert!(!p.is_locked());
    }

    #[test]
    fn lock_file_is_detected() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(SINGLETON_LOCK), "host-123").unwrap();
        let p = BrowserProfile::new(tmp.path());
        assert!(p.is_locked());
        // Still usable.
        p.prepare().unwrap();
    }
}
