//! Optional injection capabilities a plugin may expose.

use crate::context::{Configuration, Context};
use crate::plugin::lifecycle::{PluginError, PluginResult};
use std::sync::Arc;

/// Accepts the registry's `Context`.
pub trait ContextAware {
    fn set_context(&mut self, context: Arc<dyn Context>);
}

/// Accepts the configuration declared for this plugin in the manifest.
pub trait ConfigurationAware {
    fn set_configuration(&mut self, configuration: Configuration);

    /// When `true`, a missing or unresolvable configuration aborts the load
    /// instead of producing a warning.
    fn requires_configuration(&self) -> bool {
        false
    }
}

/// Storage for injected capabilities, embeddable by plugin authors.
///
/// ```
/// use plughost_core::{CapabilitySlots, ContextAware, Plugin, PluginResult};
///
/// #[derive(Default)]
/// struct Audit {
///     slots: CapabilitySlots,
/// }
///
/// impl Plugin for Audit {
///     fn initialize(&mut self) -> PluginResult {
///         self.slots.require_context().map(|_| ())
///     }
///     fn load(&mut self) -> PluginResult {
///         Ok(())
///     }
///     fn destroy(&mut self) -> PluginResult {
///         Ok(())
///     }
///     fn as_context_aware(&mut self) -> Option<&mut dyn ContextAware> {
///         Some(&mut self.slots)
///     }
/// }
/// ```
#[derive(Clone, Default)]
pub struct CapabilitySlots {
    context: Option<Arc<dyn Context>>,
    configuration: Option<Configuration>,
}

impl CapabilitySlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> Option<&Arc<dyn Context>> {
        self.context.as_ref()
    }

    pub fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }

    /// Returns the injected context or a plugin error naming the gap.
    pub fn require_context(&self) -> PluginResult<&Arc<dyn Context>> {
        self.context
            .as_ref()
            .ok_or_else(|| PluginError::new("context was not injected"))
    }

    /// Returns the injected configuration or a plugin error naming the gap.
    pub fn require_configuration(&self) -> PluginResult<&Configuration> {
        self.configuration
            .as_ref()
            .ok_or_else(|| PluginError::new("configuration was not injected"))
    }

    /// Drops both injected handles.
    pub fn clear(&mut self) {
        self.context = None;
        self.configuration = None;
    }
}

impl std::fmt::Debug for CapabilitySlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilitySlots")
            .field("context", &self.context.is_some())
            .field("configuration", &self.configuration)
            .finish()
    }
}

impl ContextAware for CapabilitySlots {
    fn set_context(&mut self, context: Arc<dyn Context>) {
        self.context = Some(context);
    }
}

impl ConfigurationAware for CapabilitySlots {
    fn set_configuration(&mut self, configuration: Configuration) {
        self.configuration = Some(configuration);
    }
}
