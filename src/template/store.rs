//! Template and group loading
//!
//! Ad-hoc templates are read from the source on every call. Group
//! definitions are parsed once per operation type and shared afterwards.

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::TemplatePaths;
use crate::error::{EngineError, Result};

use super::group::TemplateGroup;
use super::source::{ResourceSource, SourceError};

/// Process-wide cache of parsed template groups, keyed by operation type
///
/// Entries are never evicted or refreshed; a changed group file is only
/// picked up by a new cache.
#[derive(Debug, Default)]
pub struct GroupCache {
    groups: DashMap<String, Arc<TemplateGroup>>,
}

impl GroupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, operation_type: &str) -> Option<Arc<TemplateGroup>> {
        self.groups.get(operation_type).map(|g| Arc::clone(g.value()))
    }

    pub fn contains(&self, operation_type: &str) -> bool {
        self.groups.contains_key(operation_type)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Cached operation types, in no particular order
    pub fn keys(&self) -> Vec<String> {
        self.groups.iter().map(|e| e.key().clone()).collect()
    }

    /// Return the cached group, running `load` if there is none
    ///
    /// `load` runs while the key's shard is locked, so concurrent callers for
    /// the same operation type wait for one load instead of racing. A failed
    /// load leaves the cache untouched.
    pub fn get_or_load<F>(&self, operation_type: &str, load: F) -> Result<Arc<TemplateGroup>>
    where
        F: FnOnce() -> Result<TemplateGroup>,
    {
        if let Some(group) = self.get(operation_type) {
            tracing::debug!(operation_type = operation_type, "Template group cache hit");
            return Ok(group);
        }

        let entry = self
            .groups
            .entry(operation_type.to_string())
            .or_try_insert_with(|| {
                tracing::info!(operation_type = operation_type, "Loading template group");
                load().map(Arc::new)
            });

        match entry {
            Ok(group) => Ok(Arc::clone(group.value())),
            Err(err) => {
                tracing::warn!(
                    operation_type = operation_type,
                    error = %err,
                    "Failed to load template group"
                );
                Err(err)
            }
        }
    }
}

/// Reads ad-hoc templates and group definitions from a [`ResourceSource`]
#[derive(Clone)]
pub struct TemplateStore {
    source: Arc<dyn ResourceSource>,
    paths: TemplatePaths,
    cache: Arc<GroupCache>,
}

impl std::fmt::Debug for TemplateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateStore")
            .field("paths", &self.paths)
            .field("cached_groups", &self.cache.len())
            .finish()
    }
}

impl TemplateStore {
    pub fn new(source: impl ResourceSource + 'static, paths: TemplatePaths) -> Self {
        Self::with_cache(Arc::new(source), paths, Arc::new(GroupCache::new()))
    }

    /// Build a store sharing an existing cache
    pub fn with_cache(
        source: Arc<dyn ResourceSource>,
        paths: TemplatePaths,
        cache: Arc<GroupCache>,
    ) -> Self {
        Self {
            source,
            paths,
            cache,
        }
    }

    pub fn paths(&self) -> &TemplatePaths {
        &self.paths
    }

    pub fn cache(&self) -> &Arc<GroupCache> {
        &self.cache
    }

    /// Raw text of an ad-hoc template, read fresh every time
    pub fn load_template(&self, schema_name: &str, template_name: &str) -> Result<String> {
        let path = self.paths.template(schema_name, template_name);
        self.source.read(&path).map_err(|e| match e {
            SourceError::NotFound(path) => EngineError::not_found("template resource", path),
            SourceError::Io { path, source } => EngineError::Io { path, source },
        })
    }

    /// Parsed group for an operation type, loaded at most once
    pub fn load_group(&self, operation_type: &str) -> Result<Arc<TemplateGroup>> {
        self.cache.get_or_load(operation_type, || {
            let path = self.paths.group(operation_type);
            let content = self.source.read(&path).map_err(|e| match e {
                SourceError::NotFound(_) => EngineError::not_found("template group", operation_type),
                SourceError::Io { path, source } => EngineError::Io { path, source },
            })?;
            TemplateGroup::from_yaml(operation_type, &content)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::MemorySource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const USER_GROUP: &str = r#"
operationType: USER_OPERATIONS
templates:
  - name: searchByUserId
    baseQuery:
      query:
        term:
          userId: "{{userId}}"
"#;

    struct Counting {
        inner: MemorySource,
        reads: AtomicUsize,
    }

    impl Counting {
        fn new(inner: MemorySource) -> Self {
            Self {
                inner,
                reads: AtomicUsize::new(0),
            }
        }
    }

    impl ResourceSource for Counting {
        fn read(&self, path: &str) -> std::result::Result<String, SourceError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.read(path)
        }
    }

    fn store_with(source: Arc<Counting>) -> TemplateStore {
        TemplateStore::with_cache(source, TemplatePaths::default(), Arc::new(GroupCache::new()))
    }

    #[test]
    fn test_load_template_reads_every_time() {
        let source = Arc::new(Counting::new(
            MemorySource::new().with("es-templates/user/simple.json", r#"{"size": {{size}}}"#),
        ));
        let store = store_with(Arc::clone(&source));

        assert_eq!(
            store.load_template("user", "simple.json").unwrap(),
            r#"{"size": {{size}}}"#
        );
        store.load_template("user", "simple.json").unwrap();
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_template_is_not_found() {
        let store = TemplateStore::new(MemorySource::new(), TemplatePaths::default());
        let err = store.load_template("user", "nope.json").expect_err("Should fail");
        match err {
            EngineError::NotFound { kind, name } => {
                assert_eq!(kind, "template resource");
                assert_eq!(name, "es-templates/user/nope.json");
            }
            other => panic!("Expected not found, got {:?}", other),
        }
    }

    #[test]
    fn test_group_loaded_once() {
        let source = Arc::new(Counting::new(
            MemorySource::new().with("query-templates/user_operations.yml", USER_GROUP),
        ));
        let store = store_with(Arc::clone(&source));

        let first = store.load_group("USER_OPERATIONS").expect("Should load");
        let second = store.load_group("USER_OPERATIONS").expect("Should load");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.reads.load(Ordering::SeqCst), 1);
        assert_eq!(store.cache().keys(), vec!["USER_OPERATIONS".to_string()]);
    }

    #[test]
    fn test_missing_group_is_not_cached() {
        let source = Arc::new(Counting::new(MemorySource::new()));
        let store = store_with(Arc::clone(&source));

        for _ in 0..2 {
            let err = store.load_group("GHOST_OPS").expect_err("Should fail");
            assert!(matches!(
                err,
                EngineError::NotFound { kind: "template group", .. }
            ));
        }
        assert!(store.cache().is_empty());
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalid_group_is_not_cached() {
        let store = TemplateStore::new(
            MemorySource::new().with("query-templates/bad_ops.yml", "templates: 3\n"),
            TemplatePaths::default(),
        );
        let err = store.load_group("BAD_OPS").expect_err("Should fail");
        assert!(matches!(err, EngineError::Config { .. }));
        assert!(!store.cache().contains("BAD_OPS"));
    }

    #[test]
    fn test_unsupported_query_kind_is_not_cached() {
        let source = Arc::new(Counting::new(MemorySource::new().with(
            "query-templates/count_ops.yml",
            "templates:\n  - name: countAll\n    queryType: count\n    baseQuery: {}\n",
        )));
        let store = store_with(Arc::clone(&source));

        for _ in 0..2 {
            let err = store.load_group("COUNT_OPS").expect_err("Should fail");
            assert!(matches!(err, EngineError::UnsupportedQueryKind { .. }));
            assert!(!store.cache().contains("COUNT_OPS"));
        }
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cache_is_keyed_by_exact_operation_type() {
        let source = Arc::new(Counting::new(
            MemorySource::new().with("query-templates/user_operations.yml", USER_GROUP),
        ));
        let store = store_with(Arc::clone(&source));

        store.load_group("USER_OPERATIONS").unwrap();
        store.load_group("user_operations").unwrap();
        assert_eq!(store.cache().len(), 2);
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }
}
