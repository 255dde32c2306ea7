//! URL to local path resolution.

use std::path::Path;
use std::sync::Arc;

use syncpath_config_store::{ConfigBackend, ConfigKey, FaultHook, Value, ValueMap};

use crate::{LocalFilesystem, PathProbe, ProviderEntry, ResolveError, ResolverConfig};

/// Maps share URLs to paths under a provider's local mount point.
///
/// Each call walks the provider list afresh; nothing is cached between calls.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use syncpath_config_store::{MemoryStore, RootDomain};
/// use syncpath_resolver::{PathResolver, ResolverConfig, ONEDRIVE_PROVIDERS_ROOT};
///
/// let dir = std::env::temp_dir();
/// let store = MemoryStore::new();
/// let key = format!(r"{}\Personal", ONEDRIVE_PROVIDERS_ROOT);
/// store.set_value(RootDomain::CurrentUser, &key, "UrlNamespace", "https://d.docs.live.net/abc/");
/// store.set_value(RootDomain::CurrentUser, &key, "MountPoint", dir.to_str().unwrap());
///
/// let resolver = PathResolver::new(Arc::new(store), ResolverConfig::default());
/// let err = resolver.resolve("https://elsewhere.example/file.txt").unwrap_err();
/// assert!(err.is_not_found());
/// ```
#[derive(Clone)]
pub struct PathResolver {
    backend: Arc<dyn ConfigBackend>,
    config: ResolverConfig,
    probe: Arc<dyn PathProbe>,
    fault_hook: Option<FaultHook>,
}

impl PathResolver {
    /// Resolver over `backend`, probing the local filesystem.
    pub fn new(backend: Arc<dyn ConfigBackend>, config: ResolverConfig) -> Self {
        Self {
            backend,
            config,
            probe: Arc::new(LocalFilesystem),
            fault_hook: None,
        }
    }

    #[must_use]
    pub fn with_probe(mut self, probe: Arc<dyn PathProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Observe provider-list enumeration faults. They still truncate the walk.
    #[must_use]
    pub fn with_fault_hook(mut self, hook: FaultHook) -> Self {
        self.fault_hook = Some(hook);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Local path for `url`, with `/` separators.
    ///
    /// The first provider whose namespace occurs in `url` is used. Below the
    /// mount point, leading URL segments that do not exist on disk are
    /// skipped: a share mounted directly often sits higher than its URL
    /// suggests. Only the first kept segment is checked; deeper ones are
    /// returned as-is.
    pub fn resolve(&self, url: &str) -> Result<String, ResolveError> {
        match self.find_provider(url)? {
            Some(provider) => self.locate(url, &provider),
            None => Err(ResolveError::UrlNotRegistered {
                url: url.to_string(),
            }),
        }
    }

    /// The first provider, in enumeration order, whose namespace occurs in
    /// `url`.
    ///
    /// If several match, which one wins depends on the store's enumeration
    /// order. Entries without a readable namespace are skipped; a matched
    /// entry without a mount point is an error.
    pub fn find_provider(&self, url: &str) -> Result<Option<ProviderEntry>, ResolveError> {
        for key in self.root()?.subkeys()? {
            let values = key.value_map()?;
            let Some(namespace) = self.namespace(&key, &values) else {
                continue;
            };
            if url.contains(namespace) {
                log::debug!("{} claims {} via {}", key.path(), url, namespace);
                return ProviderEntry::from_values(key.path(), &values, &self.config).map(Some);
            }
        }
        Ok(None)
    }

    /// Every registered provider with a readable namespace, in enumeration
    /// order.
    pub fn providers(&self) -> Result<Vec<ProviderEntry>, ResolveError> {
        let mut providers = Vec::new();
        for key in self.root()?.subkeys()? {
            let values = key.value_map()?;
            if self.namespace(&key, &values).is_some() {
                providers.push(ProviderEntry::from_values(key.path(), &values, &self.config)?);
            }
        }
        Ok(providers)
    }

    /// The namespace text of a provider entry. A truncated or corrupt value
    /// set has none, and the entry is passed over.
    fn namespace<'a>(&self, key: &ConfigKey, values: &'a ValueMap) -> Option<&'a str> {
        let namespace = values
            .get(&self.config.namespace_value)
            .and_then(Value::as_str);
        if namespace.is_none() {
            log::debug!(
                "{} has no text {} value, skipping it",
                key.path(),
                self.config.namespace_value
            );
        }
        namespace
    }

    fn root(&self) -> Result<ConfigKey, ResolveError> {
        let root = ConfigKey::open(
            Arc::clone(&self.backend),
            self.config.domain,
            self.config.providers_root.clone(),
            self.config.flags,
        )?;
        Ok(match &self.fault_hook {
            Some(hook) => root.with_fault_hook(Arc::clone(hook)),
            None => root,
        })
    }

    fn locate(&self, url: &str, provider: &ProviderEntry) -> Result<String, ResolveError> {
        let mount_point = Path::new(&provider.mount_point);
        let missing = || ResolveError::PathMissing {
            url: url.to_string(),
            mount_point: provider.mount_point.clone(),
        };

        if !self.exists(mount_point)? {
            return Err(missing());
        }

        let segments = provider.suffix_segments(url);
        if segments.is_empty() {
            return Ok(render(&provider.mount_point, &[]));
        }

        let mut remaining = &segments[..];
        while let Some((first, rest)) = remaining.split_first() {
            if self.exists(&mount_point.join(first))? {
                return Ok(render(&provider.mount_point, remaining));
            }
            log::debug!(
                "{} is not under {}, dropping it",
                first,
                provider.mount_point
            );
            remaining = rest;
        }

        Err(missing())
    }

    fn exists(&self, path: &Path) -> Result<bool, ResolveError> {
        let found = self
            .probe
            .exists(path)
            .map_err(|source| ResolveError::Probe {
                path: path.to_path_buf(),
                source,
            })?;
        log::trace!("probe {}: {}", path.display(), found);
        Ok(found)
    }
}

/// `mount_point` and `segments` joined with `\`, then written with `/`.
fn render(mount_point: &str, segments: &[String]) -> String {
    let trimmed = mount_point.trim_end_matches(['\\', '/']);
    if trimmed.is_empty() && segments.is_empty() {
        return to_forward_slashes(mount_point);
    }
    let mut native = trimmed.to_string();
    for segment in segments {
        native.push('\\');
        native.push_str(segment);
    }
    to_forward_slashes(&native)
}

fn to_forward_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::io;
    use std::sync::Mutex;

    use syncpath_config_store::{EnumerationFault, MemoryStore, RootDomain};

    use crate::ONEDRIVE_PROVIDERS_ROOT;

    const MOUNT: &str = r"C:\Users\u\OneDrive";

    /// Probe over a fixed set of paths that records every check.
    ///
    /// Paths are compared component-wise with `/` separators so Windows-style
    /// mount points work on any host.
    #[derive(Default)]
    struct FakeFs {
        existing: HashSet<String>,
        checks: Mutex<Vec<String>>,
        fail_on: Option<String>,
    }

    impl FakeFs {
        fn with(paths: &[&str]) -> Self {
            Self {
                existing: paths.iter().map(|p| normalize(Path::new(p))).collect(),
                ..Self::default()
            }
        }

        fn checks(&self) -> Vec<String> {
            self.checks.lock().unwrap().clone()
        }
    }

    impl PathProbe for FakeFs {
        fn exists(&self, path: &Path) -> io::Result<bool> {
            let path = normalize(path);
            self.checks.lock().unwrap().push(path.clone());
            if self.fail_on.as_deref() == Some(path.as_str()) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            Ok(self.existing.contains(&path))
        }
    }

    fn normalize(path: &Path) -> String {
        path.to_string_lossy()
            .split(['\\', '/'])
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn register(store: &MemoryStore, name: &str, namespace: &str, mount_point: &str) {
        let key = format!(r"{}\{}", ONEDRIVE_PROVIDERS_ROOT, name);
        store.set_value(RootDomain::CurrentUser, &key, "UrlNamespace", namespace);
        store.set_value(RootDomain::CurrentUser, &key, "MountPoint", mount_point);
    }

    fn resolver(store: &MemoryStore, fs: &Arc<FakeFs>) -> PathResolver {
        PathResolver::new(Arc::new(store.clone()), ResolverConfig::default())
            .with_probe(Arc::clone(fs) as Arc<dyn PathProbe>)
    }

    #[test]
    fn resolves_existing_first_segment() {
        let store = MemoryStore::new();
        register(&store, "Personal", "https://x.com/p/123/Documents", MOUNT);
        let fs = Arc::new(FakeFs::with(&[MOUNT, r"C:\Users\u\OneDrive\Shared"]));

        let path = resolver(&store, &fs)
            .resolve("https://x.com/p/123/Documents/Shared/Report.xlsx")
            .unwrap();
        assert_eq!(path, "C:/Users/u/OneDrive/Shared/Report.xlsx");
    }

    #[test]
    fn trims_segments_missing_under_mount_point() {
        let store = MemoryStore::new();
        register(&store, "Personal", "https://x.com/p/123/Documents", MOUNT);
        let fs = Arc::new(FakeFs::with(&[MOUNT, r"C:\Users\u\OneDrive\Docs"]));

        let path = resolver(&store, &fs)
            .resolve("https://x.com/p/123/Documents/TeamA/Docs/file.txt")
            .unwrap();
        assert_eq!(path, "C:/Users/u/OneDrive/Docs/file.txt");
        assert_eq!(
            fs.checks(),
            vec![
                "C:/Users/u/OneDrive",
                "C:/Users/u/OneDrive/TeamA",
                "C:/Users/u/OneDrive/Docs",
            ]
        );
    }

    #[test]
    fn full_length_path_needs_no_trimming() {
        let store = MemoryStore::new();
        register(&store, "Personal", "https://x.com/ns/", MOUNT);
        let fs = Arc::new(FakeFs::with(&[
            MOUNT,
            r"C:\Users\u\OneDrive\a",
            r"C:\Users\u\OneDrive\a\b",
            r"C:\Users\u\OneDrive\a\b\c",
        ]));

        let path = resolver(&store, &fs)
            .resolve("https://x.com/ns/a/b/c")
            .unwrap();
        assert_eq!(path, "C:/Users/u/OneDrive/a/b/c");
        assert!(fs.checks().len() <= 4);
        assert_eq!(fs.checks().len(), 2);
    }

    #[test]
    fn trimming_reaches_last_segment() {
        let store = MemoryStore::new();
        register(&store, "Personal", "https://x.com/ns/", MOUNT);
        let fs = Arc::new(FakeFs::with(&[MOUNT, r"C:\Users\u\OneDrive\c"]));

        let path = resolver(&store, &fs)
            .resolve("https://x.com/ns/a/b/c")
            .unwrap();
        assert_eq!(path, "C:/Users/u/OneDrive/c");
        assert_eq!(fs.checks().len(), 4);
    }

    #[test]
    fn exhausted_segments_fail_after_k_plus_one_checks() {
        let store = MemoryStore::new();
        register(&store, "Personal", "https://x.com/ns/", MOUNT);
        let fs = Arc::new(FakeFs::with(&[MOUNT]));

        let err = resolver(&store, &fs)
            .resolve("https://x.com/ns/a/b/c")
            .unwrap_err();
        assert!(matches!(err, ResolveError::PathMissing { .. }));
        assert!(err.is_not_found());
        assert_eq!(fs.checks().len(), 4);
    }

    #[test]
    fn missing_mount_point_fails_after_one_check() {
        let store = MemoryStore::new();
        register(&store, "Personal", "https://x.com/ns/", MOUNT);
        let fs = Arc::new(FakeFs::default());

        let err = resolver(&store, &fs)
            .resolve("https://x.com/ns/a/b")
            .unwrap_err();
        assert!(matches!(err, ResolveError::PathMissing { .. }));
        assert_eq!(fs.checks(), vec!["C:/Users/u/OneDrive"]);
    }

    #[test]
    fn namespace_itself_resolves_to_mount_point() {
        let store = MemoryStore::new();
        register(&store, "Personal", "https://x.com/ns/", MOUNT);
        let fs = Arc::new(FakeFs::with(&[MOUNT]));

        let path = resolver(&store, &fs).resolve("https://x.com/ns/").unwrap();
        assert_eq!(path, "C:/Users/u/OneDrive");
    }

    #[test]
    fn unregistered_url_checks_nothing() {
        let store = MemoryStore::new();
        register(&store, "Personal", "https://x.com/p/123/", MOUNT);
        register(&store, "Business1", "https://corp.example/personal/u/", r"D:\Corp");
        let fs = Arc::new(FakeFs::with(&[MOUNT]));

        let err = resolver(&store, &fs)
            .resolve("https://other.example/file.txt")
            .unwrap_err();
        assert!(matches!(err, ResolveError::UrlNotRegistered { .. }));
        assert!(fs.checks().is_empty());
    }

    #[test]
    fn match_is_independent_of_position() {
        for position in 0..3 {
            let store = MemoryStore::new();
            for i in 0..3 {
                let (namespace, mount) = if i == position {
                    ("https://x.com/mine/".to_string(), MOUNT.to_string())
                } else {
                    (format!("https://x.com/other{}/", i), format!(r"E:\Other{}", i))
                };
                register(&store, &format!("Provider{}", i), &namespace, &mount);
            }
            let fs = Arc::new(FakeFs::with(&[MOUNT, r"C:\Users\u\OneDrive\a"]));

            let path = resolver(&store, &fs)
                .resolve("https://x.com/mine/a/b.txt")
                .unwrap();
            assert_eq!(path, "C:/Users/u/OneDrive/a/b.txt", "position {}", position);
        }
    }

    #[test]
    fn first_enumerated_match_wins() {
        let store = MemoryStore::new();
        register(&store, "Broad", "https://x.com/", r"D:\Broad");
        register(&store, "Narrow", "https://x.com/p/123/", MOUNT);
        let fs = Arc::new(FakeFs::with(&[
            r"D:\Broad",
            r"D:\Broad\p",
            MOUNT,
            r"C:\Users\u\OneDrive\a",
        ]));

        let path = resolver(&store, &fs)
            .resolve("https://x.com/p/123/a")
            .unwrap();
        assert_eq!(path, "D:/Broad/p/123/a");
    }

    #[test]
    fn enumeration_fault_truncates_provider_walk() {
        let store = MemoryStore::new();
        register(&store, "First", "https://x.com/first/", r"D:\First");
        register(&store, "Second", "https://x.com/second/", MOUNT);
        store.inject_subkey_fault(RootDomain::CurrentUser, ONEDRIVE_PROVIDERS_ROOT, 1);
        let fs = Arc::new(FakeFs::with(&[MOUNT, r"C:\Users\u\OneDrive\a"]));

        let faults = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&faults);
        let resolver = resolver(&store, &fs).with_fault_hook(Arc::new(
            move |_: &EnumerationFault| {
                *counter.lock().unwrap() += 1;
            },
        ));

        let err = resolver.resolve("https://x.com/second/a").unwrap_err();
        assert!(matches!(err, ResolveError::UrlNotRegistered { .. }));
        assert_eq!(*faults.lock().unwrap(), 1);
        assert!(fs.checks().is_empty());
        assert_eq!(store.open_handles(), 0);
    }

    #[test]
    fn mount_point_with_trailing_separator() {
        let store = MemoryStore::new();
        register(&store, "Personal", "https://x.com/ns/", r"C:\Users\u\OneDrive\");
        let fs = Arc::new(FakeFs::with(&[MOUNT, r"C:\Users\u\OneDrive\a"]));

        let path = resolver(&store, &fs)
            .resolve("https://x.com/ns/a/b")
            .unwrap();
        assert_eq!(path, "C:/Users/u/OneDrive/a/b");
    }

    #[test]
    fn probe_errors_propagate() {
        let store = MemoryStore::new();
        register(&store, "Personal", "https://x.com/ns/", MOUNT);
        let fs = Arc::new(FakeFs {
            fail_on: Some("C:/Users/u/OneDrive/a".to_string()),
            ..FakeFs::with(&[MOUNT])
        });

        let err = resolver(&store, &fs)
            .resolve("https://x.com/ns/a/b")
            .unwrap_err();
        match err {
            ResolveError::Probe { path, source } => {
                assert_eq!(normalize(&path), "C:/Users/u/OneDrive/a");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn missing_provider_list_is_a_store_error() {
        let fs = Arc::new(FakeFs::default());
        let err = resolver(&MemoryStore::new(), &fs)
            .resolve("https://x.com/a")
            .unwrap_err();
        assert!(matches!(err, ResolveError::Store(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn provider_without_namespace_is_skipped() {
        let store = MemoryStore::new();
        store.set_value(
            RootDomain::CurrentUser,
            &format!(r"{}\Broken", ONEDRIVE_PROVIDERS_ROOT),
            "MountPoint",
            MOUNT,
        );
        let fs = Arc::new(FakeFs::with(&[MOUNT, r"C:\Users\u\OneDrive\a"]));

        let err = resolver(&store, &fs)
            .resolve("https://x.com/ns/a")
            .unwrap_err();
        assert!(matches!(err, ResolveError::UrlNotRegistered { .. }));

        register(&store, "Personal", "https://x.com/ns/", MOUNT);
        let path = resolver(&store, &fs).resolve("https://x.com/ns/a").unwrap();
        assert_eq!(path, "C:/Users/u/OneDrive/a");
        assert_eq!(resolver(&store, &fs).providers().unwrap().len(), 1);
    }

    #[test]
    fn value_fault_skips_only_the_affected_provider() {
        let store = MemoryStore::new();
        register(&store, "Other", "https://x.com/other/", r"D:\Other");
        register(&store, "Mine", "https://x.com/ns/", MOUNT);
        store.inject_value_fault(
            RootDomain::CurrentUser,
            &format!(r"{}\Other", ONEDRIVE_PROVIDERS_ROOT),
            0,
        );
        let fs = Arc::new(FakeFs::with(&[MOUNT, r"C:\Users\u\OneDrive\a"]));

        let faults = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&faults);
        let resolver = resolver(&store, &fs).with_fault_hook(Arc::new(
            move |fault: &EnumerationFault| {
                sink.lock().unwrap().push(fault.key.name().map(str::to_string));
            },
        ));

        let path = resolver.resolve("https://x.com/ns/a/f.txt").unwrap();
        assert_eq!(path, "C:/Users/u/OneDrive/a/f.txt");
        assert_eq!(*faults.lock().unwrap(), vec![Some("Other".to_string())]);
        assert_eq!(store.open_handles(), 0);
    }

    #[test]
    fn matched_provider_without_mount_point_is_an_error() {
        let store = MemoryStore::new();
        store.set_value(
            RootDomain::CurrentUser,
            &format!(r"{}\Personal", ONEDRIVE_PROVIDERS_ROOT),
            "UrlNamespace",
            "https://x.com/ns/",
        );
        let fs = Arc::new(FakeFs::default());

        let err = resolver(&store, &fs)
            .resolve("https://x.com/ns/a")
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingValue { ref name, .. } if name == "MountPoint"));
        assert!(fs.checks().is_empty());
    }

    #[test]
    fn namespace_with_trailing_separator_mount_point() {
        let store = MemoryStore::new();
        register(&store, "Personal", "https://x.com/ns/", r"C:\Users\u\OneDrive\");
        let fs = Arc::new(FakeFs::with(&[MOUNT]));

        let path = resolver(&store, &fs).resolve("https://x.com/ns/").unwrap();
        assert_eq!(path, "C:/Users/u/OneDrive");
    }

    #[test]
    fn unmatched_provider_may_lack_mount_point() {
        let store = MemoryStore::new();
        store.set_value(
            RootDomain::CurrentUser,
            &format!(r"{}\Partial", ONEDRIVE_PROVIDERS_ROOT),
            "UrlNamespace",
            "https://elsewhere.example/",
        );
        register(&store, "Personal", "https://x.com/ns/", MOUNT);
        let fs = Arc::new(FakeFs::with(&[MOUNT, r"C:\Users\u\OneDrive\a"]));

        let path = resolver(&store, &fs).resolve("https://x.com/ns/a").unwrap();
        assert_eq!(path, "C:/Users/u/OneDrive/a");
    }

    #[test]
    fn providers_lists_in_enumeration_order() {
        let store = MemoryStore::new();
        register(&store, "Personal", "https://x.com/p/", MOUNT);
        register(&store, "Business1", "https://corp.example/u/", r"D:\Corp");

        let fs = Arc::new(FakeFs::default());
        let providers = resolver(&store, &fs).providers().unwrap();
        let names: Vec<_> = providers.iter().map(|p| p.key.name().unwrap()).collect();
        assert_eq!(names, vec!["Personal", "Business1"]);
        assert_eq!(providers[1].mount_point, r"D:\Corp");
    }

    #[test]
    fn custom_config_root_is_used() {
        let store = MemoryStore::new();
        store.set_value(RootDomain::LocalMachine, r"Test\Providers\One", "Prefix", "https://t/");
        store.set_value(RootDomain::LocalMachine, r"Test\Providers\One", "Root", MOUNT);
        let config = ResolverConfig {
            namespace_value: "Prefix".to_string(),
            mount_point_value: "Root".to_string(),
            ..ResolverConfig::default().with_root(RootDomain::LocalMachine, r"Test\Providers")
        };
        let fs = Arc::new(FakeFs::with(&[MOUNT, r"C:\Users\u\OneDrive\x"]));

        let path = PathResolver::new(Arc::new(store), config)
            .with_probe(Arc::clone(&fs) as Arc<dyn PathProbe>)
            .resolve("https://t/x/y")
            .unwrap();
        assert_eq!(path, "C:/Users/u/OneDrive/x/y");
    }

    #[test]
    fn render_joins_and_normalizes() {
        assert_eq!(
            render(r"C:\Mount", &["a".to_string(), "b".to_string()]),
            "C:/Mount/a/b"
        );
        assert_eq!(render("/home/u/OneDrive/", &["a".to_string()]), "/home/u/OneDrive/a");
        assert_eq!(render("/home/u/OneDrive/", &[]), "/home/u/OneDrive");
        assert_eq!(render("/", &[]), "/");
        assert_eq!(render("/", &["a".to_string()]), "/a");
    }
}
