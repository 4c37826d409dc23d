//! Per-plugin configuration handle.

use super::{Context, ResourceError};
use std::io::Cursor;
use std::sync::Arc;

/// Configuration bytes pre-bound to the one resource a plugin declared.
///
/// Bytes are read once when the registry wires the plugin, so `as_stream()`
/// can be called any number of times and never touches the context again.
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    resource: String,
    bytes: Arc<[u8]>,
}

impl Configuration {
    pub fn from_bytes(resource: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            resource: resource.into(),
            bytes: Arc::from(bytes.into()),
        }
    }

    /// Reads `resource` through `context` and binds the result.
    pub fn resolve(context: &dyn Context, resource: &str) -> Result<Self, ResourceError> {
        let bytes = context.read_resource(resource)?;
        Ok(Self::from_bytes(resource, bytes))
    }

    /// Logical resource name this configuration was read from.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns a fresh reader positioned at the start of the bytes.
    pub fn as_stream(&self) -> Cursor<Arc<[u8]>> {
        Cursor::new(Arc::clone(&self.bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("resource", &self.resource)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Configuration;
    use std::io::Read;

    #[test]
    fn as_stream_is_repeatable() {
        let configuration = Configuration::from_bytes("conf/labels.json", b"{\"a\":1}".to_vec());

        for _ in 0..2 {
            let mut text = String::new();
            configuration
                .as_stream()
                .read_to_string(&mut text)
                .expect("in-memory read");
            assert_eq!(text, "{\"a\":1}");
        }
        assert_eq!(configuration.resource(), "conf/labels.json");
        assert_eq!(configuration.len(), 7);
    }

    #[test]
    fn debug_shows_resource_and_length_only() {
        let configuration =
            Configuration::from_bytes("conf/secret.json", b"{\"token\":\"abc\"}".to_vec());
        let rendered = format!("{configuration:?}");
        assert_eq!(rendered, "Configuration { resource: \"conf/secret.json\", len: 15 }");
        assert!(!rendered.contains("abc"));
    }
}
