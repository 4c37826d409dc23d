//! In-memory context.

use super::{Context, ResourceError, ResourceStream};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::PathBuf;

/// Context serving resources from an in-memory name -> bytes table.
///
/// Paths are synthesized under a virtual root and are never opened.
#[derive(Debug, Clone, Default)]
pub struct MemoryContext {
    resources: BTreeMap<String, Vec<u8>>,
}

const VIRTUAL_ROOT: &str = "/memory";

impl MemoryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one resource.
    pub fn insert(&mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.resources.insert(name.into(), bytes.into());
    }

    /// Builder form of `insert`.
    pub fn with_resource(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(name, bytes);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name.trim())
    }
}

impl Context for MemoryContext {
    fn resolve_stream(&self, name: &str) -> Result<ResourceStream, ResourceError> {
        match self.resources.get(name.trim()) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(ResourceError::NotFound(name.to_string())),
        }
    }

    fn resolve_path(&self, name: &str) -> PathBuf {
        PathBuf::from(VIRTUAL_ROOT).join(name.trim().trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryContext;
    use crate::context::{Context, ResourceError};
    use std::path::PathBuf;

    #[test]
    fn serves_inserted_resources() {
        let context = MemoryContext::new().with_resource("conf/a.json", b"{}".to_vec());
        let bytes = context.read_resource("conf/a.json").expect("resource exists");
        assert_eq!(bytes, b"{}");
        assert!(context.contains("conf/a.json"));
    }

    #[test]
    fn reports_missing_resources_as_not_found() {
        let context = MemoryContext::new();
        let err = context
            .read_resource("conf/missing.json")
            .err()
            .expect("missing resource must fail");
        assert!(matches!(err, ResourceError::NotFound(name) if name == "conf/missing.json"));
    }

    #[test]
    fn synthesizes_virtual_paths() {
        let context = MemoryContext::new();
        assert_eq!(
            context.resolve_path("/conf/a.json"),
            PathBuf::from("/memory/conf/a.json")
        );
    }
}
