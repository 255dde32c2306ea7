//! Provider entries: one registered account or library per subkey.

use syncpath_config_store::{KeyPath, ValueMap};

use crate::{ResolveError, ResolverConfig};

/// A provider registration read from the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEntry {
    /// Key the registration was read from.
    pub key: KeyPath,
    /// URL prefix the provider owns.
    pub url_namespace: String,
    /// Local directory the namespace root is synced to.
    pub mount_point: String,
}

impl ProviderEntry {
    /// Build an entry from a provider key's values.
    pub fn from_values(
        key: &KeyPath,
        values: &ValueMap,
        config: &ResolverConfig,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            key: key.clone(),
            url_namespace: text_value(key, values, &config.namespace_value)?.to_string(),
            mount_point: text_value(key, values, &config.mount_point_value)?.to_string(),
        })
    }

    /// Path segments of `url` once the namespace is cut out, in order.
    ///
    /// Every occurrence of the namespace is removed. Empty segments from
    /// leading, trailing or doubled `/` are dropped.
    pub fn suffix_segments(&self, url: &str) -> Vec<String> {
        url.replace(&self.url_namespace, "")
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// The text value `name` of `key`, or `MissingValue`.
fn text_value<'a>(
    key: &KeyPath,
    values: &'a ValueMap,
    name: &str,
) -> Result<&'a str, ResolveError> {
    values
        .get(name)
        .and_then(|value| value.as_str())
        .ok_or_else(|| ResolveError::MissingValue {
            key: key.clone(),
            name: name.to_string(),
        })
}
