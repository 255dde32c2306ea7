//! Filesystem existence checks.

use std::io;
use std::path::Path;
use std::sync::Arc;

/// Answers whether a candidate path exists. Nothing else about the
/// filesystem is ever asked.
pub trait PathProbe: Send + Sync {
    /// `Ok(false)` for a path that is simply absent; `Err` for anything that
    /// prevented the check.
    fn exists(&self, path: &Path) -> io::Result<bool>;
}

/// Probe backed by the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFilesystem;

impl PathProbe for LocalFilesystem {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        path.try_exists()
    }
}

impl<T: PathProbe + ?Sized> PathProbe for Arc<T> {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        self.as_ref().exists(path)
    }
}

impl<T: PathProbe + ?Sized> PathProbe for &T {
    fn exists(&self, path: &Path) -> io::Result<bool> {
        (*self).exists(path)
    }
}
