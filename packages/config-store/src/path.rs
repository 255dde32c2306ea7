//! Key paths, root domains and access flags.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A path to a key below a root domain.
///
/// Registry paths are written with `\` separators. Parsing also accepts `/`
/// and ignores empty components, so `Software\\Foo\` and `Software/Foo`
/// name the same key. Components are otherwise opaque: key names may contain
/// spaces, dots and other punctuation.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct KeyPath {
    pub components: Vec<String>,
}

impl KeyPath {
    /// Parse a path string into components.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use syncpath_config_store::KeyPath;
    ///
    /// let path = KeyPath::parse(r"Software\SyncEngines\Providers");
    /// assert_eq!(path.len(), 3);
    /// assert_eq!(KeyPath::parse("a/b/"), KeyPath::parse(r"a\b"));
    /// ```
    pub fn parse(s: &str) -> Self {
        KeyPath {
            components: s
                .split(['\\', '/'])
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// The root path (no components).
    pub fn root() -> Self {
        KeyPath::default()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.components.iter()
    }

    /// Path of the direct child named `segment`.
    #[must_use]
    pub fn join(&self, segment: &str) -> KeyPath {
        let mut components = self.components.clone();
        components.push(segment.to_string());
        KeyPath { components }
    }

    /// The last component, if any.
    pub fn name(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// Parent path, or `None` for the root.
    pub fn parent(&self) -> Option<KeyPath> {
        if self.is_empty() {
            return None;
        }
        Some(KeyPath {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    /// Render with native `\` separators, as the registry API expects.
    pub fn to_native(&self) -> String {
        self.components.join("\\")
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_native())
    }
}

impl From<&str> for KeyPath {
    fn from(s: &str) -> Self {
        KeyPath::parse(s)
    }
}

impl Serialize for KeyPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_native())
    }
}

impl<'de> Deserialize<'de> for KeyPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(KeyPath::parse(&s))
    }
}

/// The top-level hive a key path is resolved against.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootDomain {
    ClassesRoot,
    #[default]
    CurrentUser,
    LocalMachine,
    Users,
    CurrentConfig,
}

impl fmt::Display for RootDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RootDomain::ClassesRoot => "HKEY_CLASSES_ROOT",
            RootDomain::CurrentUser => "HKEY_CURRENT_USER",
            RootDomain::LocalMachine => "HKEY_LOCAL_MACHINE",
            RootDomain::Users => "HKEY_USERS",
            RootDomain::CurrentConfig => "HKEY_CURRENT_CONFIG",
        };
        f.write_str(name)
    }
}

/// Extra access bits OR-ed into the read access mask when a key is opened.
///
/// Keys are only ever opened for reading; these flags select things like the
/// 32/64-bit registry view.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessFlags(pub u32);

impl AccessFlags {
    pub const NONE: AccessFlags = AccessFlags(0);
    /// `KEY_WOW64_64KEY`
    pub const WOW64_64KEY: AccessFlags = AccessFlags(0x0100);
    /// `KEY_WOW64_32KEY`
    pub const WOW64_32KEY: AccessFlags = AccessFlags(0x0200);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: AccessFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for AccessFlags {
    type Output = AccessFlags;

    fn bitor(self, rhs: AccessFlags) -> AccessFlags {
        AccessFlags(self.0 | rhs.0)
    }
}
