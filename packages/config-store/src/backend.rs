//! Backend traits: the narrow seam between `ConfigKey` and a concrete store.
//!
//! A backend only knows how to open a key and enumerate it by index. Handle
//! lifetime, laziness and the truncate-on-fault policy all live in
//! [`ConfigKey`](crate::ConfigKey), so every backend gets them for free.

use std::sync::Arc;

use crate::{AccessFlags, Error, KeyPath, RootDomain, Value};

/// An open handle to one key.
///
/// The native handle is released when this value is dropped. Implementations
/// must not hold any other resources between calls.
pub trait KeyHandle {
    /// Name of the direct child key at `index`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(name))` - the child at that position.
    /// * `Ok(None)` - the native "no more items" signal.
    /// * `Err(Error)` - any other failure.
    fn subkey_name(&self, index: u32) -> Result<Option<String>, Error>;

    /// Name and data of the value at `index`, with the same conventions as
    /// [`subkey_name`](KeyHandle::subkey_name).
    fn value(&self, index: u32) -> Result<Option<(String, Value)>, Error>;
}

/// A hierarchical, read-only configuration store.
///
/// # Object Safety
///
/// This trait is object-safe: keys share their backend as
/// `Arc<dyn ConfigBackend>`.
pub trait ConfigBackend: Send + Sync {
    /// Open `path` under `domain` for reading, with `flags` OR-ed into the
    /// access mask.
    ///
    /// Returns [`Error::NotFound`] if the key does not exist.
    fn open(
        &self,
        domain: RootDomain,
        path: &KeyPath,
        flags: AccessFlags,
    ) -> Result<Box<dyn KeyHandle>, Error>;
}

impl<T: ConfigBackend + ?Sized> ConfigBackend for Arc<T> {
    fn open(
        &self,
        domain: RootDomain,
        path: &KeyPath,
        flags: AccessFlags,
    ) -> Result<Box<dyn KeyHandle>, Error> {
        self.as_ref().open(domain, path, flags)
    }
}

impl<T: ConfigBackend + ?Sized> ConfigBackend for Box<T> {
    fn open(
        &self,
        domain: RootDomain,
        path: &KeyPath,
        flags: AccessFlags,
    ) -> Result<Box<dyn KeyHandle>, Error> {
        self.as_ref().open(domain, path, flags)
    }
}
