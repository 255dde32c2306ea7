//! # syncpath-config-store
//!
//! Read-only access to a hierarchical key/value configuration store, such as
//! the Windows registry.
//!
//! The layering mirrors the store itself:
//! - [`ConfigBackend`] / [`KeyHandle`]: the narrow seam a concrete store
//!   implements. Open a key, enumerate it by index, release on drop.
//! - [`ConfigKey`]: a handle-free view of one key. Opens a fresh native handle
//!   per operation and exposes child keys and values as lazy sequences that
//!   stop, rather than fail, when the store misbehaves mid-walk.
//!
//! Backends:
//! - [`MemoryStore`]: in-memory tree with fault injection, for tests and for
//!   callers that carry their own configuration.
//! - `RegistryStore` (Windows only): the real registry.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use syncpath_config_store::{AccessFlags, ConfigKey, KeyPath, MemoryStore, RootDomain};
//!
//! let store = MemoryStore::new();
//! store.set_value(RootDomain::CurrentUser, r"Software\App", "Theme", "dark");
//!
//! let key = ConfigKey::open(
//!     Arc::new(store),
//!     RootDomain::CurrentUser,
//!     KeyPath::parse(r"Software\App"),
//!     AccessFlags::NONE,
//! )
//! .unwrap();
//! assert_eq!(key.value_map().unwrap()["Theme"].as_str(), Some("dark"));
//! ```

mod backend;
mod error;
mod key;
mod memory;
mod path;
mod value;

#[cfg(windows)]
mod registry;

pub use backend::{ConfigBackend, KeyHandle};
pub use error::Error;
pub use key::{ConfigKey, EnumerationFault, EnumerationKind, FaultHook, SubKeys, Values};
pub use memory::MemoryStore;
pub use path::{AccessFlags, KeyPath, RootDomain};
pub use value::{Value, ValueMap};

#[cfg(windows)]
pub use registry::RegistryStore;
