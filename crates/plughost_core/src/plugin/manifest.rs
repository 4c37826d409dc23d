//! Plugin manifest parsing and export.
//!
//! # Responsibility
//! - Turn a manifest byte stream into an ordered list of `PluginDescriptor`.
//! - Export descriptors back into the same document shape.
//!
//! # Invariants
//! - Descriptor order equals document order.
//! - A malformed document yields no descriptors at all.
//! - Implementation ids are not resolved here; the catalog does that later.
//!
//! Document shape:
//!
//! ```json
//! {
//!   "plugins": [
//!     { "name": "labels", "implementation": "app.labels", "config": "conf/labels.json" },
//!     { "name": "audit", "implementation": "app.audit" }
//!   ]
//! }
//! ```

use crate::context::ResourceError;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{Read, Write};

/// One parsed manifest entry. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    name: String,
    implementation_id: String,
    config_resource: Option<String>,
}

impl PluginDescriptor {
    /// Builds a descriptor, normalizing surrounding whitespace.
    ///
    /// A blank config resource is treated as absent.
    pub fn new(
        name: impl Into<String>,
        implementation_id: impl Into<String>,
        config_resource: Option<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            implementation_id: implementation_id.into().trim().to_string(),
            config_resource: config_resource
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
        }
    }

    /// Display label used in logs and errors. Not required to be unique.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Catalog key selecting which implementation to instantiate.
    pub fn implementation_id(&self) -> &str {
        &self.implementation_id
    }

    /// Logical resource name of this plugin's configuration, if declared.
    pub fn config_resource(&self) -> Option<&str> {
        self.config_resource.as_deref()
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestDocument {
    plugins: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    name: String,
    implementation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config: Option<String>,
}

/// Parses a manifest from a reader.
///
/// # Errors
/// - `ManifestReadError::Resource` when the stream cannot be read.
/// - `ManifestReadError::Format` when the document is malformed.
pub fn read_manifest(mut reader: impl Read) -> Result<Vec<PluginDescriptor>, ManifestReadError> {
    let mut bytes = Vec::new();
    if let Err(err) = reader.read_to_end(&mut bytes) {
        error!(
            "event=manifest_parse module=manifest status=error error_code=manifest_read_failed error={}",
            err
        );
        return Err(ManifestReadError::Resource(ResourceError::io(
            MANIFEST_STREAM_NAME,
            err,
        )));
    }
    parse_manifest(&bytes).map_err(ManifestReadError::Format)
}

const MANIFEST_STREAM_NAME: &str = "<manifest stream>";

/// Parses a manifest from in-memory bytes.
pub fn parse_manifest(bytes: &[u8]) -> Result<Vec<PluginDescriptor>, ManifestError> {
    let document: ManifestDocument = match serde_json::from_slice(bytes) {
        Ok(document) => document,
        Err(err) => {
            error!(
                "event=manifest_parse module=manifest status=error error_code=manifest_malformed line={} column={}",
                err.line(),
                err.column()
            );
            return Err(ManifestError::Syntax(err));
        }
    };

    let mut descriptors = Vec::with_capacity(document.plugins.len());
    for (index, entry) in document.plugins.into_iter().enumerate() {
        if entry.name.trim().is_empty() {
            return Err(ManifestError::EmptyName { index });
        }
        if entry.implementation.trim().is_empty() {
            return Err(ManifestError::EmptyImplementation {
                index,
                name: entry.name.trim().to_string(),
            });
        }
        descriptors.push(PluginDescriptor::new(
            entry.name,
            entry.implementation,
            entry.config,
        ));
    }

    info!(
        "event=manifest_parse module=manifest status=ok entries={}",
        descriptors.len()
    );
    Ok(descriptors)
}

/// Serializes descriptors into the manifest document shape.
pub fn write_manifest(
    descriptors: &[PluginDescriptor],
    writer: impl Write,
) -> Result<(), ManifestError> {
    serde_json::to_writer_pretty(writer, &to_document(descriptors)).map_err(ManifestError::Export)
}

/// Serializes descriptors into a pretty-printed manifest string.
pub fn manifest_to_string(descriptors: &[PluginDescriptor]) -> Result<String, ManifestError> {
    serde_json::to_string_pretty(&to_document(descriptors)).map_err(ManifestError::Export)
}

fn to_document(descriptors: &[PluginDescriptor]) -> ManifestDocument {
    ManifestDocument {
        plugins: descriptors
            .iter()
            .map(|descriptor| ManifestEntry {
                name: descriptor.name.clone(),
                implementation: descriptor.implementation_id.clone(),
                config: descriptor.config_resource.clone(),
            })
            .collect(),
    }
}

/// Manifest structure errors.
#[derive(Debug)]
pub enum ManifestError {
    Syntax(serde_json::Error),
    EmptyName { index: usize },
    EmptyImplementation { index: usize, name: String },
    Export(serde_json::Error),
}

impl Display for ManifestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax(err) => write!(f, "manifest is malformed: {err}"),
            Self::EmptyName { index } => {
                write!(f, "manifest entry #{} has an empty name", index + 1)
            }
            Self::EmptyImplementation { index, name } => write!(
                f,
                "manifest entry #{} ({name}) has an empty implementation id",
                index + 1
            ),
            Self::Export(err) => write!(f, "failed to export manifest: {err}"),
        }
    }
}

impl Error for ManifestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Syntax(err) | Self::Export(err) => Some(err),
            Self::EmptyName { .. } | Self::EmptyImplementation { .. } => None,
        }
    }
}

/// Failure reading a manifest from a stream.
#[derive(Debug)]
pub enum ManifestReadError {
    Resource(ResourceError),
    Format(ManifestError),
}

impl Display for ManifestReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resource(err) => write!(f, "{err}"),
            Self::Format(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ManifestReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Resource(err) => Some(err),
            Self::Format(err) => Some(err),
        }
    }
}
