//! Built-in probe plugin shipped with the CLI host.
//!
//! # Responsibility
//! - Give `plughost run` one implementation that exercises every capability.
//! - Report configuration size and tag supported host objects.

use log::info;
use plughost_core::{
    CapabilitySlots, CatalogError, ConfigurationAware, ContextAware, Plugin, PluginCatalog,
    PluginResult, SupportTarget,
};

pub const PROBE_IMPLEMENTATION_ID: &str = "builtin.probe";

/// Registers every built-in implementation.
pub fn register(catalog: &mut PluginCatalog) -> Result<(), CatalogError> {
    catalog.register_default::<ProbePlugin>(PROBE_IMPLEMENTATION_ID)
}

/// Host object that records which plugins supported it.
#[derive(Debug, Default)]
pub struct SupportLedger {
    pub tags: Vec<String>,
}

impl SupportTarget for SupportLedger {
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct ProbePlugin {
    slots: CapabilitySlots,
    config_bytes: Option<usize>,
}

impl Plugin for ProbePlugin {
    fn initialize(&mut self) -> PluginResult {
        self.slots.require_context()?;
        Ok(())
    }

    fn load(&mut self) -> PluginResult {
        self.config_bytes = self.slots.configuration().map(|configuration| configuration.len());
        info!(
            "event=probe_load module=cli status=ok config_bytes={}",
            self.config_bytes
                .map(|len| len.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        Ok(())
    }

    fn destroy(&mut self) -> PluginResult {
        self.slots.clear();
        self.config_bytes = None;
        Ok(())
    }

    fn support(&mut self, target: &mut dyn SupportTarget) -> PluginResult {
        if let Some(ledger) = target.as_any_mut().downcast_mut::<SupportLedger>() {
            ledger.tags.push(format!(
                "{PROBE_IMPLEMENTATION_ID}:{}",
                self.config_bytes.unwrap_or(0)
            ));
        }
        Ok(())
    }

    fn as_context_aware(&mut self) -> Option<&mut dyn ContextAware> {
        Some(&mut self.slots)
    }

    fn as_configuration_aware(&mut self) -> Option<&mut dyn ConfigurationAware> {
        Some(&mut self.slots)
    }
}

#[cfg(test)]
mod tests {
    use super::{register, ProbePlugin, SupportLedger, PROBE_IMPLEMENTATION_ID};
    use plughost_core::{
        Configuration, ConfigurationAware, ContextAware, MemoryContext, Plugin, PluginCatalog,
    };
    use std::sync::Arc;

    #[test]
    fn registers_probe_implementation() {
        let mut catalog = PluginCatalog::new();
        register(&mut catalog).expect("builtin registration");
        assert!(catalog.contains(PROBE_IMPLEMENTATION_ID));
    }

    #[test]
    fn probe_requires_context_to_initialize() {
        let mut probe = ProbePlugin::default();
        assert!(probe.initialize().is_err());

        probe.slots.set_context(Arc::new(MemoryContext::new()));
        probe.initialize().expect("initialize with context");
    }

    #[test]
    fn probe_tags_ledger_with_config_size() {
        let mut probe = ProbePlugin::default();
        probe
            .slots
            .set_configuration(Configuration::from_bytes("probe.json", b"12345".to_vec()));
        probe.load().expect("probe load");

        let mut ledger = SupportLedger::default();
        probe.support(&mut ledger).expect("probe support");
        assert_eq!(ledger.tags, vec!["builtin.probe:5"]);

        probe.destroy().expect("probe destroy");
        assert!(probe.slots.configuration().is_none());
    }
}
