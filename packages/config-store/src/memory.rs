//! In-memory configuration store.
//!
//! Keys keep their children and values in insertion order, which stands in
//! for the native enumeration order of a real registry. Faults can be
//! injected at a given enumeration index, and keys can be marked as denied,
//! to model a partially unreadable store.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{AccessFlags, ConfigBackend, Error, KeyHandle, KeyPath, RootDomain, Value};

#[derive(Default)]
struct Node {
    children: Vec<String>,
    values: Vec<(String, Value)>,
    denied: bool,
    subkey_fault: Option<u32>,
    value_fault: Option<u32>,
}

type NodeId = (RootDomain, Vec<String>);

#[derive(Default)]
struct Shared {
    nodes: Mutex<HashMap<NodeId, Node>>,
    open_handles: AtomicUsize,
}

impl Shared {
    fn nodes(&self) -> MutexGuard<'_, HashMap<NodeId, Node>> {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A registry-shaped store held in memory.
///
/// Clones share the same tree, so a test can keep one clone for setup and
/// assertions while a resolver owns another.
///
/// # Example
///
/// ```rust
/// use syncpath_config_store::{MemoryStore, RootDomain};
///
/// let store = MemoryStore::new();
/// store.set_value(RootDomain::CurrentUser, r"Software\App", "Version", 3u32);
/// assert!(store.contains(RootDomain::CurrentUser, "Software"));
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a key and any missing ancestors.
    pub fn create_key(&self, domain: RootDomain, path: &str) {
        let path = KeyPath::parse(path);
        let mut nodes = self.shared.nodes();
        Self::ensure(&mut nodes, domain, &path.components);
    }

    /// Set a value, creating the key if needed. An existing value with the
    /// same name is replaced in place.
    pub fn set_value(&self, domain: RootDomain, path: &str, name: &str, value: impl Into<Value>) {
        let path = KeyPath::parse(path);
        let value = value.into();
        let mut nodes = self.shared.nodes();
        let node = Self::ensure(&mut nodes, domain, &path.components);
        match node.values.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => node.values.push((name.to_string(), value)),
        }
    }

    /// Delete a key and everything below it.
    pub fn remove_key(&self, domain: RootDomain, path: &str) {
        let path = KeyPath::parse(path);
        let Some(name) = path.name().map(str::to_string) else {
            return;
        };
        let mut nodes = self.shared.nodes();
        nodes.retain(|(d, components), _| {
            !(*d == domain && components.starts_with(&path.components))
        });
        if let Some(parent) = path.parent() {
            if let Some(node) = nodes.get_mut(&(domain, parent.components)) {
                node.children.retain(|child| *child != name);
            }
        }
    }

    /// Make every open of this key fail with access denied.
    pub fn deny(&self, domain: RootDomain, path: &str) {
        let path = KeyPath::parse(path);
        let mut nodes = self.shared.nodes();
        Self::ensure(&mut nodes, domain, &path.components).denied = true;
    }

    /// Fail subkey enumeration of this key at `index` with an I/O error.
    pub fn inject_subkey_fault(&self, domain: RootDomain, path: &str, index: u32) {
        let path = KeyPath::parse(path);
        let mut nodes = self.shared.nodes();
        Self::ensure(&mut nodes, domain, &path.components).subkey_fault = Some(index);
    }

    /// Fail value enumeration of this key at `index` with an I/O error.
    pub fn inject_value_fault(&self, domain: RootDomain, path: &str, index: u32) {
        let path = KeyPath::parse(path);
        let mut nodes = self.shared.nodes();
        Self::ensure(&mut nodes, domain, &path.components).value_fault = Some(index);
    }

    pub fn contains(&self, domain: RootDomain, path: &str) -> bool {
        let path = KeyPath::parse(path);
        path.is_empty() || self.shared.nodes().contains_key(&(domain, path.components))
    }

    /// Number of handles currently open against this store.
    pub fn open_handles(&self) -> usize {
        self.shared.open_handles.load(Ordering::SeqCst)
    }

    fn ensure<'a>(
        nodes: &'a mut HashMap<NodeId, Node>,
        domain: RootDomain,
        components: &[String],
    ) -> &'a mut Node {
        for depth in 1..=components.len() {
            let id = (domain, components[..depth].to_vec());
            if nodes.contains_key(&id) {
                continue;
            }
            nodes.insert(id, Node::default());
            let parent = nodes
                .entry((domain, components[..depth - 1].to_vec()))
                .or_default();
            parent.children.push(components[depth - 1].clone());
        }
        nodes.entry((domain, components.to_vec())).or_default()
    }
}

impl ConfigBackend for MemoryStore {
    fn open(
        &self,
        domain: RootDomain,
        path: &KeyPath,
        _flags: AccessFlags,
    ) -> Result<Box<dyn KeyHandle>, Error> {
        {
            let nodes = self.shared.nodes();
            match nodes.get(&(domain, path.components.clone())) {
                Some(node) if node.denied => {
                    return Err(Error::AccessDenied { path: path.clone() })
                }
                Some(_) => {}
                None if path.is_empty() => {}
                None => return Err(Error::NotFound { path: path.clone() }),
            }
        }

        self.shared.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryHandle {
            shared: Arc::clone(&self.shared),
            domain,
            path: path.clone(),
        }))
    }
}

struct MemoryHandle {
    shared: Arc<Shared>,
    domain: RootDomain,
    path: KeyPath,
}

impl MemoryHandle {
    fn with_node<T>(&self, f: impl FnOnce(&Node) -> Result<T, Error>) -> Result<T, Error> {
        let nodes = self.shared.nodes();
        match nodes.get(&(self.domain, self.path.components.clone())) {
            Some(node) => f(node),
            None if self.path.is_empty() => f(&Node::default()),
            None => Err(Error::Backend {
                path: self.path.clone(),
                message: "key was deleted while open".to_string(),
            }),
        }
    }

    fn injected(&self) -> Error {
        Error::Io {
            path: self.path.clone(),
            source: io::Error::other("injected enumeration fault"),
        }
    }
}

impl KeyHandle for MemoryHandle {
    fn subkey_name(&self, index: u32) -> Result<Option<String>, Error> {
        self.with_node(|node| {
            if node.subkey_fault == Some(index) {
                return Err(self.injected());
            }
            Ok(node.children.get(index as usize).cloned())
        })
    }

    fn value(&self, index: u32) -> Result<Option<(String, Value)>, Error> {
        self.with_node(|node| {
            if node.value_fault == Some(index) {
                return Err(self.injected());
            }
            Ok(node.values.get(index as usize).cloned())
        })
    }
}

impl Drop for MemoryHandle {
    fn drop(&mut self) {
        self.shared.open_handles.fetch_sub(1, Ordering::SeqCst);
    }
}
