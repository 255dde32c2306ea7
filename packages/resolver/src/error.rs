use std::io;
use std::path::PathBuf;

use syncpath_config_store::{Error as StoreError, KeyPath};

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("the URL is not present in the configuration store: {url}")]
    UrlNotRegistered { url: String },

    #[error("mount point {mount_point} was found, but not the path within it: {url}")]
    PathMissing { url: String, mount_point: String },

    #[error("provider key {key} has no text value named {name}")]
    MissingValue { key: KeyPath, name: String },

    #[error("failed to check whether {} exists: {source}", .path.display())]
    Probe {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ResolveError {
    /// True for every way a URL can fail to map to something on disk: no
    /// provider claims it, the path under the mount point is missing, or the
    /// provider list itself does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            ResolveError::UrlNotRegistered { .. } | ResolveError::PathMissing { .. } => true,
            ResolveError::Store(e) => e.is_not_found(),
            _ => false,
        }
    }
}
