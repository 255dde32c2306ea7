//! `ConfigKey`: a read-only view of one node in a configuration store.

use std::fmt;
use std::iter::FusedIterator;
use std::sync::Arc;

use crate::{AccessFlags, ConfigBackend, Error, KeyHandle, KeyPath, RootDomain, Value, ValueMap};

/// Observer for enumeration faults that were swallowed.
pub type FaultHook = Arc<dyn Fn(&EnumerationFault) + Send + Sync>;

/// Which enumeration a fault interrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnumerationKind {
    Subkeys,
    Values,
}

impl fmt::Display for EnumerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnumerationKind::Subkeys => f.write_str("subkeys"),
            EnumerationKind::Values => f.write_str("values"),
        }
    }
}

/// A failure that ended an enumeration early.
#[derive(Debug)]
pub struct EnumerationFault {
    pub domain: RootDomain,
    pub key: KeyPath,
    pub kind: EnumerationKind,
    /// Position at which the enumeration stopped.
    pub index: u32,
    pub error: Error,
}

/// A read-only handle to one key of a hierarchical configuration store.
///
/// A `ConfigKey` only records its identity: backend, root domain, path and
/// access flags. Every operation opens a fresh native handle and releases it
/// when the operation (or the iterator it returned) is done, whichever way it
/// ends.
///
/// Enumerations are lazy and truncate on failure: the native "no more items"
/// signal ends the sequence, and so does any other error. Such faults are
/// never returned to the caller mid-walk; they are logged at `debug` level and
/// passed to the fault hook, if one is set.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use syncpath_config_store::{AccessFlags, ConfigKey, KeyPath, MemoryStore, RootDomain};
///
/// let store = MemoryStore::new();
/// store.set_value(RootDomain::CurrentUser, r"Software\App\Profile1", "Name", "first");
/// store.set_value(RootDomain::CurrentUser, r"Software\App\Profile2", "Name", "second");
///
/// let root = ConfigKey::open(
///     Arc::new(store),
///     RootDomain::CurrentUser,
///     KeyPath::parse(r"Software\App"),
///     AccessFlags::NONE,
/// )
/// .unwrap();
///
/// let names: Vec<String> = root
///     .subkeys()
///     .unwrap()
///     .map(|key| key.value_map().unwrap()["Name"].to_string())
///     .collect();
/// assert_eq!(names, vec!["first", "second"]);
/// ```
#[derive(Clone)]
pub struct ConfigKey {
    backend: Arc<dyn ConfigBackend>,
    domain: RootDomain,
    path: KeyPath,
    flags: AccessFlags,
    fault_hook: Option<FaultHook>,
}

impl ConfigKey {
    /// Create a key after checking that it can be opened.
    ///
    /// The handle used for the check is released before returning.
    pub fn open(
        backend: Arc<dyn ConfigBackend>,
        domain: RootDomain,
        path: KeyPath,
        flags: AccessFlags,
    ) -> Result<Self, Error> {
        let key = Self::unchecked(backend, domain, path, flags);
        key.acquire()?;
        Ok(key)
    }

    /// Create a key without touching the store.
    ///
    /// Errors such as a missing key surface on first use instead.
    pub fn unchecked(
        backend: Arc<dyn ConfigBackend>,
        domain: RootDomain,
        path: KeyPath,
        flags: AccessFlags,
    ) -> Self {
        Self {
            backend,
            domain,
            path,
            flags,
            fault_hook: None,
        }
    }

    /// Observe enumeration faults on this key and every key derived from it.
    #[must_use]
    pub fn with_fault_hook(mut self, hook: FaultHook) -> Self {
        self.fault_hook = Some(hook);
        self
    }

    pub fn domain(&self) -> RootDomain {
        self.domain
    }

    pub fn path(&self) -> &KeyPath {
        &self.path
    }

    pub fn flags(&self) -> AccessFlags {
        self.flags
    }

    /// The last path component.
    pub fn name(&self) -> Option<&str> {
        self.path.name()
    }

    /// Open the direct child named `name`.
    pub fn subkey(&self, name: &str) -> Result<ConfigKey, Error> {
        let child = self.child(name);
        child.acquire()?;
        Ok(child)
    }

    /// Lazily enumerate the direct children of this key, in the store's
    /// native order.
    ///
    /// Fails only if this key cannot be opened. A child that cannot be opened
    /// ends the sequence like any other enumeration fault.
    pub fn subkeys(&self) -> Result<SubKeys, Error> {
        let handle = self.acquire()?;
        Ok(SubKeys {
            parent: self.clone(),
            handle: Some(handle),
            index: 0,
        })
    }

    /// Lazily enumerate the `(name, value)` pairs directly under this key.
    pub fn values(&self) -> Result<Values, Error> {
        let handle = self.acquire()?;
        Ok(Values {
            key: self.clone(),
            handle: Some(handle),
            index: 0,
        })
    }

    /// All values under this key, by name.
    ///
    /// Built fresh on every call. A repeated name keeps the last value.
    pub fn value_map(&self) -> Result<ValueMap, Error> {
        Ok(self.values()?.collect())
    }

    /// The value named `name`, if present.
    pub fn value(&self, name: &str) -> Result<Option<Value>, Error> {
        Ok(self
            .values()?
            .filter(|(value_name, _)| value_name == name)
            .last()
            .map(|(_, value)| value))
    }

    fn acquire(&self) -> Result<Box<dyn KeyHandle>, Error> {
        self.backend.open(self.domain, &self.path, self.flags)
    }

    fn child(&self, name: &str) -> ConfigKey {
        ConfigKey {
            backend: Arc::clone(&self.backend),
            domain: self.domain,
            path: self.path.join(name),
            flags: self.flags,
            fault_hook: self.fault_hook.clone(),
        }
    }

    fn report(&self, kind: EnumerationKind, index: u32, error: Error) {
        log::debug!(
            "{} enumeration of {}\\{} stopped at index {}: {}",
            kind,
            self.domain,
            self.path,
            index,
            error
        );
        if let Some(hook) = &self.fault_hook {
            hook(&EnumerationFault {
                domain: self.domain,
                key: self.path.clone(),
                kind,
                index,
                error,
            });
        }
    }
}

impl fmt::Debug for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigKey")
            .field("domain", &self.domain)
            .field("path", &self.path)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// Lazy sequence of child keys, returned by [`ConfigKey::subkeys`].
///
/// Holds the parent's native handle until the sequence ends or is dropped.
pub struct SubKeys {
    parent: ConfigKey,
    handle: Option<Box<dyn KeyHandle>>,
    index: u32,
}

impl Iterator for SubKeys {
    type Item = ConfigKey;

    fn next(&mut self) -> Option<ConfigKey> {
        let handle = self.handle.as_ref()?;
        let index = self.index;
        let outcome = match handle.subkey_name(index) {
            Ok(Some(name)) => self.parent.subkey(&name).map(Some),
            Ok(None) => Ok(None),
            Err(error) => Err(error),
        };

        match outcome {
            Ok(Some(child)) => {
                self.index += 1;
                Some(child)
            }
            Ok(None) => {
                self.handle = None;
                None
            }
            Err(error) => {
                self.handle = None;
                self.parent.report(EnumerationKind::Subkeys, index, error);
                None
            }
        }
    }
}

impl FusedIterator for SubKeys {}

impl fmt::Debug for SubKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubKeys")
            .field("parent", &self.parent)
            .field("index", &self.index)
            .field("open", &self.handle.is_some())
            .finish()
    }
}

/// Lazy sequence of `(name, value)` pairs, returned by [`ConfigKey::values`].
pub struct Values {
    key: ConfigKey,
    handle: Option<Box<dyn KeyHandle>>,
    index: u32,
}

impl Iterator for Values {
    type Item = (String, Value);

    fn next(&mut self) -> Option<(String, Value)> {
        let handle = self.handle.as_ref()?;
        let index = self.index;

        match handle.value(index) {
            Ok(Some(entry)) => {
                self.index += 1;
                Some(entry)
            }
            Ok(None) => {
                self.handle = None;
                None
            }
            Err(error) => {
                self.handle = None;
                self.key.report(EnumerationKind::Values, index, error);
                None
            }
        }
    }
}

impl FusedIterator for Values {}

impl fmt::Debug for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Values")
            .field("key", &self.key)
            .field("index", &self.index)
            .field("open", &self.handle.is_some())
            .finish()
    }
}
