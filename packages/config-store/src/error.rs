//! Error types for configuration store access.
//!
//! "No more items" is not an error at this level: backends report the end of
//! an enumeration as `Ok(None)`. Everything here is a real failure to reach or
//! read a key.

use std::io;

use crate::KeyPath;

/// Errors raised while opening or reading a configuration key.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The key does not exist in the store.
    #[error("configuration key not found: {path}")]
    NotFound { path: KeyPath },

    /// The key exists but cannot be opened with the requested access.
    #[error("access denied to configuration key: {path}")]
    AccessDenied { path: KeyPath },

    /// An OS-level failure reported by the backend.
    #[error("configuration store I/O error at {path}: {source}")]
    Io {
        path: KeyPath,
        #[source]
        source: io::Error,
    },

    /// Backend-specific failure with no OS error behind it.
    #[error("configuration store error at {path}: {message}")]
    Backend { path: KeyPath, message: String },
}

impl Error {
    /// Classify an OS error for `path`, keeping "not found" and "permission
    /// denied" distinguishable.
    pub fn from_io(path: &KeyPath, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound { path: path.clone() },
            io::ErrorKind::PermissionDenied => Error::AccessDenied { path: path.clone() },
            _ => Error::Io {
                path: path.clone(),
                source,
            },
        }
    }

    /// Whether this error means the key is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// The key path this error refers to.
    pub fn path(&self) -> &KeyPath {
        match self {
            Error::NotFound { path }
            | Error::AccessDenied { path }
            | Error::Io { path, .. }
            | Error::Backend { path, .. } => path,
        }
    }
}
