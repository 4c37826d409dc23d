//! Resource resolution collaborators consumed by the plugin registry.
//!
//! # Responsibility
//! - Define the `Context` contract: logical resource name -> byte stream or path.
//! - Provide the per-plugin `Configuration` handle bound to one resource.
//! - Ship a file-system context and an in-memory context for hosts/tests.
//!
//! # Invariants
//! - A missing resource is reported as `ResourceError::NotFound`, never as an
//!   empty stream.
//! - Any other I/O failure keeps the underlying `std::io::Error` as source.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, Read};
use std::path::PathBuf;

mod configuration;
mod local;
mod memory;

pub use configuration::Configuration;
pub use local::LocalContext;
pub use memory::MemoryContext;

/// Readable stream handed out by a `Context`.
pub type ResourceStream = Box<dyn Read + Send>;

/// Resource-resolution capability shared with the registry and plugins.
///
/// Implementations must be shareable across threads because the registry
/// hands the same `Arc<dyn Context>` to every context-aware plugin.
pub trait Context: Send + Sync {
    /// Opens a readable stream for one logical resource name.
    fn resolve_stream(&self, name: &str) -> Result<ResourceStream, ResourceError>;

    /// Resolves one logical resource name into an absolute path.
    fn resolve_path(&self, name: &str) -> PathBuf;

    /// Reads one logical resource fully into memory.
    fn read_resource(&self, name: &str) -> Result<Vec<u8>, ResourceError> {
        let mut stream = self.resolve_stream(name)?;
        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .map_err(|err| ResourceError::io(name, err))?;
        Ok(bytes)
    }
}

/// Resource resolution/read failures.
#[derive(Debug)]
pub enum ResourceError {
    NotFound(String),
    Io { name: String, source: io::Error },
}

impl ResourceError {
    /// Classifies one I/O error for `name`, folding `NotFound` into its own variant.
    pub fn io(name: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound(name.to_string())
        } else {
            Self::Io {
                name: name.to_string(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Logical resource name the failure refers to.
    pub fn resource_name(&self) -> &str {
        match self {
            Self::NotFound(name) => name,
            Self::Io { name, .. } => name,
        }
    }
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "resource not found: {name}"),
            Self::Io { name, source } => write!(f, "failed to read resource `{name}`: {source}"),
        }
    }
}

impl Error for ResourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}
