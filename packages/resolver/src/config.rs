//! Where to find provider registrations, and what their values are called.

use serde::{Deserialize, Serialize};
use syncpath_config_store::{AccessFlags, KeyPath, RootDomain};

/// Key holding one subkey per OneDrive account or synced library.
pub const ONEDRIVE_PROVIDERS_ROOT: &str = r"Software\SyncEngines\Providers\OneDrive";

/// Value naming the URL prefix a provider owns.
pub const URL_NAMESPACE_VALUE: &str = "UrlNamespace";

/// Value naming the local directory a provider syncs to.
pub const MOUNT_POINT_VALUE: &str = "MountPoint";

/// Location and shape of the provider list.
///
/// `Default` is the OneDrive registration under the current user. Every field
/// may be omitted when deserializing:
///
/// ```rust
/// use syncpath_resolver::ResolverConfig;
///
/// let config = ResolverConfig::from_json(r#"{"providers_root": "Software\\Test"}"#).unwrap();
/// assert_eq!(config.providers_root.to_string(), r"Software\Test");
/// assert_eq!(config.namespace_value, "UrlNamespace");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub domain: RootDomain,
    pub providers_root: KeyPath,
    pub flags: AccessFlags,
    pub namespace_value: String,
    pub mount_point_value: String,
}

impl ResolverConfig {
    pub fn onedrive() -> Self {
        Self {
            domain: RootDomain::CurrentUser,
            providers_root: KeyPath::parse(ONEDRIVE_PROVIDERS_ROOT),
            flags: AccessFlags::NONE,
            namespace_value: URL_NAMESPACE_VALUE.to_string(),
            mount_point_value: MOUNT_POINT_VALUE.to_string(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Same layout, rooted somewhere else.
    #[must_use]
    pub fn with_root(mut self, domain: RootDomain, providers_root: &str) -> Self {
        self.domain = domain;
        self.providers_root = KeyPath::parse(providers_root);
        self
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self::onedrive()
    }
}
