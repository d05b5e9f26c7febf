//! Name → backend registry owned by a proxy.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::backend::DocumentBackend;
use crate::error::{ProxyError, ProxyResult};

/// Registry of named backend handles.
///
/// Handles are shared, not owned: removing an entry drops only the
/// registry's reference. Mutation takes `&mut self`, so callers that share
/// a registry across tasks serialize changes themselves.
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn DocumentBackend>>,
}

impl BackendRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a backend name.
    ///
    /// Names must be non-empty; anything else is accepted as given.
    pub(crate) fn validate_name(name: &str) -> ProxyResult<()> {
        if name.is_empty() {
            return Err(ProxyError::validation("backend name must not be empty"));
        }
        Ok(())
    }

    /// Register a backend, replacing any previous entry with the same name.
    ///
    /// Returns the replaced backend, if any.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        backend: Arc<dyn DocumentBackend>,
    ) -> ProxyResult<Option<Arc<dyn DocumentBackend>>> {
        let name = name.into();
        Self::validate_name(&name)?;
        Ok(self.backends.insert(name, backend))
    }

    /// Find a backend by name.
    pub fn find(&self, name: &str) -> Option<&Arc<dyn DocumentBackend>> {
        self.backends.get(name)
    }

    /// Get a backend by name, returning an error if not found.
    pub fn get(&self, name: &str) -> ProxyResult<Arc<dyn DocumentBackend>> {
        self.find(name)
            .cloned()
            .ok_or_else(|| ProxyError::not_found(format!("backend '{}'", name)))
    }

    /// Remove a backend by name.
    ///
    /// Returns the removed backend, or an error if not found.
    pub fn remove(&mut self, name: &str) -> ProxyResult<Arc<dyn DocumentBackend>> {
        self.backends
            .remove(name)
            .ok_or_else(|| ProxyError::not_found(format!("backend '{}'", name)))
    }

    /// Check if a backend with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.backends.contains_key(name)
    }

    /// List all backend names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get the number of registered backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Clear all backends from the registry.
    pub fn clear(&mut self) {
        self.backends.clear();
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for name in self.names() {
            if let Some(backend) = self.backends.get(&name) {
                map.entry(&name, &backend.backend_type());
            }
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn memory() -> Arc<dyn DocumentBackend> {
        Arc::new(MemoryBackend::new())
    }

    #[test]
    fn test_register_and_contains() {
        let mut registry = BackendRegistry::new();

        registry.register("customer_1", memory()).unwrap();
        registry.register("customer_2", memory()).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("customer_1"));
        assert!(registry.contains("customer_2"));
        assert!(!registry.contains("customer_3"));
    }

    #[test]
    fn test_register_overwrites() {
        let mut registry = BackendRegistry::new();
        let first = memory();
        let second = memory();

        assert!(registry.register("a", first.clone()).unwrap().is_none());
        let replaced = registry.register("a", second.clone()).unwrap().unwrap();

        assert!(Arc::ptr_eq(&replaced, &first));
        assert!(Arc::ptr_eq(&registry.get("a").unwrap(), &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invalid_name() {
        let mut registry = BackendRegistry::new();
        let err = registry.register("", memory()).err().unwrap();
        assert!(err.is_type_validation());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_find_and_get() {
        let mut registry = BackendRegistry::new();
        registry.register("findme", memory()).unwrap();

        assert!(registry.find("findme").is_some());
        assert!(registry.find("notfound").is_none());

        assert!(registry.get("findme").is_ok());
        assert!(matches!(registry.get("notfound"), Err(ProxyError::NotFound(_))));
    }

    #[test]
    fn test_remove() {
        let mut registry = BackendRegistry::new();
        registry.register("a", memory()).unwrap();
        registry.register("b", memory()).unwrap();

        registry.remove("a").unwrap();
        assert!(!registry.contains("a"));
        assert!(registry.contains("b"));

        assert!(registry.remove("a").err().unwrap().is_not_found());
    }

    #[test]
    fn test_names_sorted_and_clear() {
        let mut registry = BackendRegistry::new();
        registry.register("zeta", memory()).unwrap();
        registry.register("alpha", memory()).unwrap();

        assert_eq!(registry.names(), vec!["alpha".to_string(), "zeta".to_string()]);
        assert_eq!(format!("{:?}", registry), r#"{"alpha": "memory", "zeta": "memory"}"#);

        registry.clear();
        assert!(registry.is_empty());
    }
}
