//! Core of the plughost extension registry.
//! Discovers, instantiates, wires, and lifecycle-manages plugins declared in a
//! manifest, without the host knowing the implementations at compile time.

pub mod context;
pub mod logging;
pub mod plugin;

pub use context::{Configuration, Context, LocalContext, MemoryContext, ResourceError};
pub use logging::{default_log_level, init_logging, logging_status, LogDestination};
pub use plugin::capability::{CapabilitySlots, ConfigurationAware, ContextAware};
pub use plugin::catalog::{CatalogError, PluginCatalog, PluginFactory};
pub use plugin::lifecycle::{
    LifecyclePhase, Plugin, PluginError, PluginResult, SupportTarget,
};
pub use plugin::manifest::{
    manifest_to_string, parse_manifest, read_manifest, write_manifest, ManifestError,
    ManifestReadError, PluginDescriptor,
};
pub use plugin::registry::{
    DestroyFailure, DestroyReport, InstanceId, LoadWarning, PluginInstance, PluginList,
    PluginRegistry, RegistryError, RegistryPhase,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
