//! # syncpath-resolver
//!
//! Translate a cloud-sync share URL (OneDrive) into the local path it is
//! synced to.
//!
//! Sync clients register each account or library as a subkey of a provider
//! list, with a URL namespace and a local mount point. [`PathResolver`] finds
//! the registration whose namespace occurs in the URL, then reconciles the
//! rest of the URL with what actually exists under the mount point.
//!
//! The provider list is read through `syncpath-config-store`, so any
//! [`ConfigBackend`](syncpath_config_store::ConfigBackend) works: the real
//! registry on Windows, or a `MemoryStore` anywhere.

mod config;
mod error;
mod probe;
mod provider;
mod resolver;

pub use config::{ResolverConfig, MOUNT_POINT_VALUE, ONEDRIVE_PROVIDERS_ROOT, URL_NAMESPACE_VALUE};
pub use error::ResolveError;
pub use probe::{LocalFilesystem, PathProbe};
pub use provider::ProviderEntry;
pub use resolver::PathResolver;

/// Resolve `url` against the current user's OneDrive registrations.
#[cfg(windows)]
pub fn resolve_url(url: &str) -> Result<String, ResolveError> {
    use std::sync::Arc;
    use syncpath_config_store::RegistryStore;

    PathResolver::new(Arc::new(RegistryStore::new()), ResolverConfig::default()).resolve(url)
}
