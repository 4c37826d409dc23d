//! Plugin lifecycle contract implemented by every extension unit.
//!
//! # Responsibility
//! - Define the ordered call-ins `initialize -> load -> destroy`.
//! - Define the passive `support` hook used to decorate host objects.
//! - Expose optional capability probes used by the registry for injection.
//!
//! # Invariants
//! - `load()` is only called after `initialize()` returned `Ok` for every
//!   plugin in the same registry.
//! - `destroy()` may be called even when `load()` never ran or failed.

use crate::plugin::capability::{ConfigurationAware, ContextAware};
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Boxed error carried as the source of a `PluginError`.
pub type BoxError = Box<dyn Error + Send + Sync + 'static>;

pub type PluginResult<T = ()> = Result<T, PluginError>;

/// Lifecycle contract every plugin honors.
///
/// Capability probes default to `None`; a plugin opts into context or
/// configuration injection by overriding the matching probe to return itself.
pub trait Plugin: Send {
    /// Cheap setup. Must not depend on sibling plugins.
    fn initialize(&mut self) -> PluginResult;

    /// Heavier setup. Siblings are initialized but may not be loaded yet.
    fn load(&mut self) -> PluginResult;

    /// Best-effort cleanup. Routine conditions should not return an error.
    fn destroy(&mut self) -> PluginResult;

    /// Offers the plugin a chance to decorate or register a host object.
    fn support(&mut self, _target: &mut dyn SupportTarget) -> PluginResult {
        Ok(())
    }

    fn as_context_aware(&mut self) -> Option<&mut dyn ContextAware> {
        None
    }

    fn as_configuration_aware(&mut self) -> Option<&mut dyn ConfigurationAware> {
        None
    }
}

/// Host object passed through `PluginRegistry::support`.
pub trait SupportTarget: Any {
    /// Downcast access for plugins that recognize the concrete host type.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn as_context_aware(&mut self) -> Option<&mut dyn ContextAware> {
        None
    }
}

/// Lifecycle call-in that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Instantiate,
    Initialize,
    Load,
    Support,
    Destroy,
}

impl LifecyclePhase {
    /// Stable lowercase name used in log lines and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instantiate => "instantiate",
            Self::Initialize => "initialize",
            Self::Load => "load",
            Self::Support => "support",
            Self::Destroy => "destroy",
        }
    }
}

impl Display for LifecyclePhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by plugin code from any lifecycle call-in.
#[derive(Debug)]
pub struct PluginError {
    message: String,
    source: Option<BoxError>,
}

impl PluginError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an underlying failure with plugin-level context.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for PluginError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for PluginError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn Error + 'static))
    }
}

impl From<std::io::Error> for PluginError {
    fn from(value: std::io::Error) -> Self {
        Self::with_source("plugin i/o failed", value)
    }
}

impl From<serde_json::Error> for PluginError {
    fn from(value: serde_json::Error) -> Self {
        Self::with_source("plugin configuration is malformed", value)
    }
}
