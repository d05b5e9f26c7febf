//! Construct backends from a kind name and options.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::traits::DocumentBackend;
use super::MemoryBackend;
use crate::error::{ProxyError, ProxyResult};

/// Serializable description of a backend (as found in configuration)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSpec {
    /// Backend kind: `memory`, `file` / `filesystem`
    #[serde(rename = "type")]
    pub kind: String,
    /// Base directory for file backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Additional backend-specific options
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub options: HashMap<String, String>,
}

impl BackendSpec {
    /// Spec for an in-memory backend
    pub fn memory() -> Self {
        Self {
            kind: "memory".to_string(),
            path: None,
            options: HashMap::new(),
        }
    }

    /// Spec for a file backend rooted at `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: "file".to_string(),
            path: Some(path.into()),
            options: HashMap::new(),
        }
    }
}

/// Builder for creating document backends from configuration
pub struct BackendBuilder {
    backend_type: String,
    config: HashMap<String, String>,
}

impl BackendBuilder {
    /// Create a new builder
    pub fn new(backend_type: &str) -> Self {
        Self {
            backend_type: backend_type.to_string(),
            config: HashMap::new(),
        }
    }

    /// Create a builder from a serialized spec
    pub fn from_spec(spec: &BackendSpec) -> Self {
        let mut builder = Self::new(&spec.kind);
        for (key, value) in &spec.options {
            builder = builder.with_option(key, value);
        }
        if let Some(path) = &spec.path {
            builder = builder.with_base_path(path.clone());
        }
        builder
    }

    /// Add a configuration option
    pub fn with_option(mut self, key: &str, value: &str) -> Self {
        self.config.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the base path (for file backend)
    pub fn with_base_path(self, path: impl Into<PathBuf>) -> Self {
        self.with_option("base_path", &path.into().to_string_lossy())
    }

    /// Build the backend
    ///
    /// Unknown kinds fail with a type validation error.
    pub fn build(self) -> ProxyResult<Arc<dyn DocumentBackend>> {
        match self.backend_type.as_str() {
            "memory" => Ok(Arc::new(MemoryBackend::new())),
            #[cfg(feature = "file")]
            "file" | "filesystem" => {
                let base_path = self.config.get("base_path").ok_or_else(|| {
                    ProxyError::Configuration("base_path is required for file backends".into())
                })?;
                let backend = super::FileBackend::new(base_path)?;
                Ok(Arc::new(backend))
            }
            #[cfg(not(feature = "file"))]
            "file" | "filesystem" => Err(ProxyError::validation(
                "file backends require the `file` feature",
            )),
            unknown => Err(ProxyError::validation(format!(
                "Unknown backend type: {}",
                unknown
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_memory_backend() {
        let backend = BackendBuilder::new("memory").build().unwrap();
        assert_eq!(backend.backend_type(), "memory");
    }

    #[cfg(feature = "file")]
    #[test]
    fn test_builder_file_backend() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let backend = BackendBuilder::from_spec(&BackendSpec::file(temp_dir.path()))
            .build()
            .unwrap();
        assert_eq!(backend.backend_type(), "file");

        let result = BackendBuilder::new("file").build();
        assert!(matches!(result, Err(ProxyError::Configuration(_))));
    }

    #[test]
    fn test_builder_unknown_backend() {
        for kind in ["unknown", "blah", "123", ""] {
            let result = BackendBuilder::new(kind).build();
            match result {
                Err(ProxyError::TypeValidation(msg)) => {
                    assert!(msg.contains("Unknown backend type"))
                }
                other => panic!("expected type validation error, got {:?}", other.err()),
            }
        }
    }

    #[test]
    fn test_spec_deserialize() {
        let spec: BackendSpec =
            serde_json::from_str(r#"{"type": "file", "path": "/tmp/x"}"#).unwrap();
        assert_eq!(spec, BackendSpec::file("/tmp/x"));

        let spec: BackendSpec = serde_json::from_str(r#"{"type": "memory"}"#).unwrap();
        assert_eq!(spec, BackendSpec::memory());
    }
}
