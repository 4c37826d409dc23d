//! Plugin registry: sole owner of live plugin instances and their lifecycle.
//!
//! # Responsibility
//! - Resolve manifest descriptors to instances through the `PluginCatalog`.
//! - Inject context/configuration capabilities before any lifecycle call.
//! - Drive `initialize` over every instance, then `load` over every instance.
//! - Tear down every instance with per-plugin failure isolation.
//!
//! # Invariants
//! - Instance order equals manifest order, which is also execution order.
//! - Resolution/wiring is all-or-nothing: on failure no instance is kept.
//! - `initialize`/`load` failures are fail-fast and are not rolled back.
//! - `destroy()` always drains the full instance list.
//! - Every operation holds the state mutex for its whole duration.
//! - A registry call made from plugin code on the thread that is running
//!   that plugin fails with `RegistryError::Reentrant` instead of blocking.

use crate::context::{Configuration, Context, ResourceError};
use crate::plugin::catalog::PluginCatalog;
use crate::plugin::lifecycle::{LifecyclePhase, Plugin, PluginError, PluginResult, SupportTarget};
use crate::plugin::manifest::{read_manifest, ManifestError, ManifestReadError, PluginDescriptor};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, ThreadId};
use std::time::Instant;
use uuid::Uuid;

/// Registry-level lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryPhase {
    /// No instances are held. `load` is only accepted here.
    Empty,
    /// Instances are wired but `initialize`/`load` did not complete.
    Loading,
    /// Every instance completed `initialize` and `load`.
    Loaded,
}

impl RegistryPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Loading => "loading",
            Self::Loaded => "loaded",
        }
    }
}

impl Display for RegistryPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable identity of one live instance, distinct even for duplicate names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Uuid);

impl InstanceId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One live, wired plugin owned by the registry.
pub struct PluginInstance {
    id: InstanceId,
    position: usize,
    descriptor: PluginDescriptor,
    plugin: Box<dyn Plugin>,
    context: Option<Arc<dyn Context>>,
    configuration: Option<Configuration>,
}

impl PluginInstance {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// 1-based manifest position.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    pub fn plugin(&self) -> &dyn Plugin {
        self.plugin.as_ref()
    }

    /// Whether a context was injected into this instance.
    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    /// Configuration injected into this instance, if any.
    pub fn configuration(&self) -> Option<&Configuration> {
        self.configuration.as_ref()
    }
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("descriptor", &self.descriptor)
            .field("context", &self.context.is_some())
            .field("configuration", &self.configuration)
            .finish()
    }
}

/// Non-fatal condition recorded while wiring capabilities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// Plugin accepts configuration but the manifest declared none.
    ConfigurationNotDeclared { plugin: String },
    /// Declared configuration resource could not be found by the context.
    ConfigurationNotFound { plugin: String, resource: String },
    /// Declared configuration resource exists but could not be read.
    ConfigurationUnreadable {
        plugin: String,
        resource: String,
        reason: String,
    },
}

impl LoadWarning {
    pub fn plugin(&self) -> &str {
        match self {
            Self::ConfigurationNotDeclared { plugin } => plugin,
            Self::ConfigurationNotFound { plugin, .. } => plugin,
            Self::ConfigurationUnreadable { plugin, .. } => plugin,
        }
    }
}

impl Display for LoadWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigurationNotDeclared { plugin } => {
                write!(f, "plugin `{plugin}` declares no config resource")
            }
            Self::ConfigurationNotFound { plugin, resource } => {
                write!(f, "plugin `{plugin}` config resource not found: {resource}")
            }
            Self::ConfigurationUnreadable {
                plugin,
                resource,
                reason,
            } => write!(
                f,
                "plugin `{plugin}` config resource `{resource}` is unreadable: {reason}"
            ),
        }
    }
}

/// One isolated `destroy()` failure.
#[derive(Debug)]
pub struct DestroyFailure {
    pub plugin: String,
    pub position: usize,
    pub error: PluginError,
}

/// Outcome of one destroy pass.
#[derive(Debug, Default)]
pub struct DestroyReport {
    /// Number of instances whose `destroy()` was invoked.
    pub attempted: usize,
    pub failures: Vec<DestroyFailure>,
}

impl DestroyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Read-only view over the live instance list.
///
/// Holds the registry lock while alive; drop it before calling any other
/// registry operation on the same thread.
pub struct PluginList<'a> {
    guard: MutexGuard<'a, RegistryState>,
}

impl Deref for PluginList<'_> {
    type Target = [PluginInstance];

    fn deref(&self) -> &Self::Target {
        &self.guard.instances
    }
}

struct RegistryState {
    phase: RegistryPhase,
    instances: Vec<PluginInstance>,
    context: Option<Arc<dyn Context>>,
    warnings: Vec<LoadWarning>,
}

impl RegistryState {
    fn empty() -> Self {
        Self {
            phase: RegistryPhase::Empty,
            instances: Vec::new(),
            context: None,
            warnings: Vec::new(),
        }
    }
}

/// Process-level plugin registry.
///
/// Hosts typically create one instance at startup, call `load` once, and call
/// `destroy` once at shutdown.
pub struct PluginRegistry {
    catalog: PluginCatalog,
    state: Mutex<RegistryState>,
    // Thread currently running plugin code while holding `state`.
    owner: Mutex<Option<ThreadId>>,
}

/// Marks the current thread as the `state` holder until dropped.
struct OwnerClaim<'a> {
    owner: &'a Mutex<Option<ThreadId>>,
    thread: ThreadId,
}

impl Drop for OwnerClaim<'_> {
    fn drop(&mut self) {
        let mut owner = self.owner.lock().unwrap_or_else(PoisonError::into_inner);
        if *owner == Some(self.thread) {
            *owner = None;
        }
    }
}

impl PluginRegistry {
    pub fn new(catalog: PluginCatalog) -> Self {
        Self {
            catalog,
            state: Mutex::new(RegistryState::empty()),
            owner: Mutex::new(None),
        }
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.catalog
    }

    /// Parses `manifest`, instantiates and wires every entry, then runs the
    /// `initialize` pass followed by the `load` pass.
    ///
    /// # Errors
    /// - `AlreadyLoaded` unless the registry is `Empty`.
    /// - `ManifestFormat` / `Resource` / `UnknownImplementation` /
    ///   `Instantiation` / `MissingConfiguration`: nothing is kept.
    /// - `Lifecycle`: the registry stays `Loading` with every instance kept;
    ///   callers are expected to `destroy()`.
    /// - `Reentrant` when called from plugin code the registry is running.
    pub fn load(&self, manifest: impl Read, context: Arc<dyn Context>) -> Result<(), RegistryError> {
        let started_at = Instant::now();
        let mut guard = self.enter("load")?;
        if guard.phase != RegistryPhase::Empty {
            error!(
                "event=registry_load module=registry status=error error_code=already_loaded phase={}",
                guard.phase
            );
            return Err(RegistryError::AlreadyLoaded { phase: guard.phase });
        }
        let _claim = self.claim();

        info!("event=registry_load module=registry status=start");
        match self.load_locked(&mut guard, manifest, context) {
            Ok(()) => {
                info!(
                    "event=registry_load module=registry status=ok plugins={} warnings={} duration_ms={}",
                    guard.instances.len(),
                    guard.warnings.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=registry_load module=registry status=error phase={} duration_ms={} error={}",
                    guard.phase,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Resolves `manifest_name` through `context`, then behaves as `load`.
    pub fn load_resource(
        &self,
        manifest_name: &str,
        context: Arc<dyn Context>,
    ) -> Result<(), RegistryError> {
        let stream = context.resolve_stream(manifest_name).map_err(|source| {
            error!(
                "event=registry_load module=registry status=error error_code=manifest_unresolved manifest={} error={}",
                manifest_name, source
            );
            RegistryError::Resource {
                plugin: None,
                source,
            }
        })?;
        self.load(stream, context)
    }

    /// Calls `destroy()` on every instance in declaration order, isolating
    /// per-plugin failures, then clears the registry.
    pub fn destroy(&self) -> Result<DestroyReport, RegistryError> {
        let mut guard = self.enter("destroy")?;
        let _claim = self.claim();
        Ok(destroy_locked(&mut guard))
    }

    /// Injects the context into `target` when it accepts one, then forwards
    /// `target` to every plugin's `support` hook in declaration order.
    ///
    /// The first plugin error aborts the remaining forwarding.
    pub fn support(&self, target: &mut dyn SupportTarget) -> Result<(), RegistryError> {
        let mut guard = self.enter("support")?;
        let _claim = self.claim();
        let state = &mut *guard;

        if let Some(context) = state.context.as_ref() {
            if let Some(aware) = target.as_context_aware() {
                aware.set_context(Arc::clone(context));
            }
        }

        for instance in state.instances.iter_mut() {
            if let Err(source) = instance.plugin.support(&mut *target) {
                error!(
                    "event=plugin_support module=registry status=error plugin={} position={} error={}",
                    instance.name(),
                    instance.position,
                    source
                );
                return Err(RegistryError::Lifecycle {
                    plugin: instance.name().to_string(),
                    position: instance.position,
                    phase: LifecyclePhase::Support,
                    source,
                });
            }
        }
        Ok(())
    }

    /// Returns the live ordered instance list.
    pub fn plugin_list(&self) -> Result<PluginList<'_>, RegistryError> {
        Ok(PluginList {
            guard: self.enter("plugin_list")?,
        })
    }

    pub fn phase(&self) -> Result<RegistryPhase, RegistryError> {
        Ok(self.enter("phase")?.phase)
    }

    /// Context bound by the current load, if any.
    pub fn context(&self) -> Result<Option<Arc<dyn Context>>, RegistryError> {
        Ok(self.enter("context")?.context.clone())
    }

    /// Warnings recorded while wiring the current load.
    pub fn warnings(&self) -> Result<Vec<LoadWarning>, RegistryError> {
        Ok(self.enter("warnings")?.warnings.clone())
    }

    fn load_locked(
        &self,
        state: &mut RegistryState,
        manifest: impl Read,
        context: Arc<dyn Context>,
    ) -> Result<(), RegistryError> {
        let descriptors = read_manifest(manifest)?;

        let mut warnings = Vec::new();
        let mut wired = Vec::with_capacity(descriptors.len());
        for (index, descriptor) in descriptors.into_iter().enumerate() {
            wired.push(self.instantiate(index + 1, descriptor, &context, &mut warnings)?);
        }

        state.instances = wired;
        state.context = Some(context);
        state.warnings = warnings;
        state.phase = RegistryPhase::Loading;

        run_pass(&mut state.instances, LifecyclePhase::Initialize, |plugin| {
            plugin.initialize()
        })?;
        run_pass(&mut state.instances, LifecyclePhase::Load, |plugin| plugin.load())?;

        state.phase = RegistryPhase::Loaded;
        Ok(())
    }

    fn instantiate(
        &self,
        position: usize,
        descriptor: PluginDescriptor,
        context: &Arc<dyn Context>,
        warnings: &mut Vec<LoadWarning>,
    ) -> Result<PluginInstance, RegistryError> {
        let name = descriptor.name().to_string();
        let implementation_id = descriptor.implementation_id().to_string();
        info!(
            "event=plugin_instantiate module=registry status=start plugin={} implementation={} position={}",
            name, implementation_id, position
        );

        let Some(factory) = self.catalog.get(&implementation_id) else {
            error!(
                "event=plugin_instantiate module=registry status=error error_code=unknown_implementation plugin={} implementation={}",
                name, implementation_id
            );
            return Err(RegistryError::UnknownImplementation {
                plugin: name,
                implementation_id,
            });
        };

        let mut plugin = match factory() {
            Ok(plugin) => plugin,
            Err(source) => {
                error!(
                    "event=plugin_instantiate module=registry status=error error_code=instantiation_failed plugin={} implementation={} error={}",
                    name, implementation_id, source
                );
                return Err(RegistryError::Instantiation {
                    plugin: name,
                    implementation_id,
                    source,
                });
            }
        };

        let injected_context = match plugin.as_context_aware() {
            Some(aware) => {
                aware.set_context(Arc::clone(context));
                Some(Arc::clone(context))
            }
            None => None,
        };

        let configuration = match plugin.as_configuration_aware() {
            Some(aware) => {
                let strict = aware.requires_configuration();
                let resolved = resolve_configuration(&descriptor, context.as_ref(), strict, warnings)?;
                if let Some(configuration) = &resolved {
                    aware.set_configuration(configuration.clone());
                }
                resolved
            }
            None => {
                if let Some(resource) = descriptor.config_resource() {
                    debug!(
                        "event=plugin_wire module=registry status=ok plugin={} config_ignored={}",
                        name, resource
                    );
                }
                None
            }
        };

        debug!(
            "event=plugin_wire module=registry status=ok plugin={} context={} configuration={}",
            name,
            injected_context.is_some(),
            configuration.is_some()
        );

        Ok(PluginInstance {
            id: InstanceId::new(),
            position,
            descriptor,
            plugin,
            context: injected_context,
            configuration,
        })
    }

    fn enter(&self, operation: &'static str) -> Result<MutexGuard<'_, RegistryState>, RegistryError> {
        let owner = *self.owner.lock().unwrap_or_else(PoisonError::into_inner);
        if owner == Some(thread::current().id()) {
            error!(
                "event=registry_reentry module=registry status=error operation={}",
                operation
            );
            return Err(RegistryError::Reentrant { operation });
        }
        Ok(self.state.lock().unwrap_or_else(|poisoned| {
            warn!("event=registry_lock module=registry status=warn reason=poisoned");
            poisoned.into_inner()
        }))
    }

    // Must be taken after the state guard so it is released first.
    fn claim(&self) -> OwnerClaim<'_> {
        let thread = thread::current().id();
        *self.owner.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread);
        OwnerClaim {
            owner: &self.owner,
            thread,
        }
    }
}

impl Drop for PluginRegistry {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if state.instances.is_empty() {
            return;
        }
        warn!(
            "event=registry_drop module=registry status=warn reason=not_destroyed plugins={}",
            state.instances.len()
        );
        destroy_locked(state);
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("PluginRegistry");
        debug.field("catalog", &self.catalog);
        let state = match self.state.try_lock() {
            Ok(state) => Some(state),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        };
        match state {
            Some(state) => debug
                .field("phase", &state.phase)
                .field("instances", &state.instances),
            None => debug.field("state", &format_args!("<locked>")),
        };
        debug.finish()
    }
}

fn resolve_configuration(
    descriptor: &PluginDescriptor,
    context: &dyn Context,
    strict: bool,
    warnings: &mut Vec<LoadWarning>,
) -> Result<Option<Configuration>, RegistryError> {
    let name = descriptor.name();
    let Some(resource) = descriptor.config_resource() else {
        if strict {
            error!(
                "event=plugin_wire module=registry status=error error_code=config_required plugin={}",
                name
            );
            return Err(RegistryError::MissingConfiguration {
                plugin: name.to_string(),
            });
        }
        warn!(
            "event=plugin_wire module=registry status=warn reason=config_not_declared plugin={}",
            name
        );
        warnings.push(LoadWarning::ConfigurationNotDeclared {
            plugin: name.to_string(),
        });
        return Ok(None);
    };

    match Configuration::resolve(context, resource) {
        Ok(configuration) => Ok(Some(configuration)),
        Err(source) if !strict => {
            let warning = if source.is_not_found() {
                LoadWarning::ConfigurationNotFound {
                    plugin: name.to_string(),
                    resource: resource.to_string(),
                }
            } else {
                LoadWarning::ConfigurationUnreadable {
                    plugin: name.to_string(),
                    resource: resource.to_string(),
                    reason: source.to_string(),
                }
            };
            warn!(
                "event=plugin_wire module=registry status=warn reason=config_unavailable plugin={} resource={} error={}",
                name, resource, source
            );
            warnings.push(warning);
            Ok(None)
        }
        Err(source) => {
            error!(
                "event=plugin_wire module=registry status=error error_code=config_unreadable plugin={} resource={} error={}",
                name, resource, source
            );
            Err(RegistryError::Resource {
                plugin: Some(name.to_string()),
                source,
            })
        }
    }
}

fn run_pass(
    instances: &mut [PluginInstance],
    phase: LifecyclePhase,
    mut call: impl FnMut(&mut dyn Plugin) -> PluginResult,
) -> Result<(), RegistryError> {
    for instance in instances.iter_mut() {
        debug!(
            "event=plugin_{} module=registry status=start plugin={} position={}",
            phase,
            instance.name(),
            instance.position
        );
        if let Err(source) = call(instance.plugin.as_mut()) {
            error!(
                "event=plugin_{} module=registry status=error plugin={} position={} error={}",
                phase,
                instance.name(),
                instance.position,
                source
            );
            return Err(RegistryError::Lifecycle {
                plugin: instance.name().to_string(),
                position: instance.position,
                phase,
                source,
            });
        }
    }
    Ok(())
}

fn destroy_locked(state: &mut RegistryState) -> DestroyReport {
    let started_at = Instant::now();
    let instances = std::mem::take(&mut state.instances);
    info!(
        "event=registry_destroy module=registry status=start phase={} plugins={}",
        state.phase,
        instances.len()
    );

    let mut report = DestroyReport::default();
    for mut instance in instances {
        report.attempted += 1;
        match instance.plugin.destroy() {
            Ok(()) => debug!(
                "event=plugin_destroy module=registry status=ok plugin={} position={}",
                instance.name(),
                instance.position
            ),
            Err(err) => {
                error!(
                    "event=plugin_destroy module=registry status=error plugin={} position={} error={}",
                    instance.name(),
                    instance.position,
                    err
                );
                report.failures.push(DestroyFailure {
                    plugin: instance.name().to_string(),
                    position: instance.position,
                    error: err,
                });
            }
        }
    }

    state.phase = RegistryPhase::Empty;
    state.context = None;
    state.warnings.clear();

    info!(
        "event=registry_destroy module=registry status=ok plugins={} failures={} duration_ms={}",
        report.attempted,
        report.failures.len(),
        started_at.elapsed().as_millis()
    );
    report
}

/// Registry operation errors.
#[derive(Debug)]
pub enum RegistryError {
    /// `load` called while the registry is not `Empty`.
    AlreadyLoaded { phase: RegistryPhase },
    ManifestFormat(ManifestError),
    /// Manifest or configuration resource could not be read.
    Resource {
        plugin: Option<String>,
        source: ResourceError,
    },
    UnknownImplementation {
        plugin: String,
        implementation_id: String,
    },
    Instantiation {
        plugin: String,
        implementation_id: String,
        source: PluginError,
    },
    /// A plugin that requires configuration had none declared.
    MissingConfiguration { plugin: String },
    /// A plugin call-in failed. `position` is the 1-based manifest position.
    Lifecycle {
        plugin: String,
        position: usize,
        phase: LifecyclePhase,
        source: PluginError,
    },
    /// `operation` was called from plugin code the registry is running on
    /// this thread.
    Reentrant { operation: &'static str },
}

impl RegistryError {
    /// Name of the plugin the error refers to, if any.
    pub fn plugin(&self) -> Option<&str> {
        match self {
            Self::AlreadyLoaded { .. } | Self::ManifestFormat(_) | Self::Reentrant { .. } => None,
            Self::Resource { plugin, .. } => plugin.as_deref(),
            Self::UnknownImplementation { plugin, .. }
            | Self::Instantiation { plugin, .. }
            | Self::MissingConfiguration { plugin }
            | Self::Lifecycle { plugin, .. } => Some(plugin),
        }
    }
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyLoaded { phase } => {
                write!(f, "plugin registry is already {phase}; destroy it before loading again")
            }
            Self::ManifestFormat(err) => write!(f, "{err}"),
            Self::Resource { plugin, source } => match plugin {
                Some(plugin) => write!(f, "plugin `{plugin}`: {source}"),
                None => write!(f, "{source}"),
            },
            Self::UnknownImplementation {
                plugin,
                implementation_id,
            } => write!(
                f,
                "plugin `{plugin}`: unknown implementation `{implementation_id}`"
            ),
            Self::Instantiation {
                plugin,
                implementation_id,
                source,
            } => write!(
                f,
                "plugin `{plugin}`: failed to instantiate `{implementation_id}`: {source}"
            ),
            Self::MissingConfiguration { plugin } => {
                write!(f, "plugin `{plugin}` requires a config resource but none is declared")
            }
            Self::Lifecycle {
                plugin,
                position,
                phase,
                source,
            } => write!(f, "plugin `{plugin}` (#{position}) failed to {phase}: {source}"),
            Self::Reentrant { operation } => write!(
                f,
                "registry `{operation}` called from plugin code it is running on this thread"
            ),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AlreadyLoaded { .. }
            | Self::UnknownImplementation { .. }
            | Self::MissingConfiguration { .. }
            | Self::Reentrant { .. } => None,
            Self::ManifestFormat(err) => Some(err),
            Self::Resource { source, .. } => Some(source),
            Self::Instantiation { source, .. } | Self::Lifecycle { source, .. } => Some(source),
        }
    }
}

impl From<ManifestReadError> for RegistryError {
    fn from(value: ManifestReadError) -> Self {
        match value {
            ManifestReadError::Resource(source) => Self::Resource {
                plugin: None,
                source,
            },
            ManifestReadError::Format(err) => Self::ManifestFormat(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PluginRegistry, RegistryError, RegistryPhase};
    use crate::context::MemoryContext;
    use crate::plugin::catalog::PluginCatalog;
    use crate::plugin::lifecycle::{Plugin, PluginResult};
    use std::sync::Arc;

    #[derive(Default)]
    struct Quiet;

    impl Plugin for Quiet {
        fn initialize(&mut self) -> PluginResult {
            Ok(())
        }

        fn load(&mut self) -> PluginResult {
            Ok(())
        }

        fn destroy(&mut self) -> PluginResult {
            Ok(())
        }
    }

    fn registry() -> PluginRegistry {
        let mut catalog = PluginCatalog::new();
        catalog
            .register_default::<Quiet>("test.quiet")
            .expect("quiet registration");
        PluginRegistry::new(catalog)
    }

    const MANIFEST: &str = r#"{"plugins":[
        {"name":"first","implementation":"test.quiet"},
        {"name":"first","implementation":"test.quiet"}
    ]}"#;

    #[test]
    fn phase_follows_load_and_destroy() {
        let registry = registry();
        assert_eq!(registry.phase().expect("registry phase"), RegistryPhase::Empty);

        registry
            .load(MANIFEST.as_bytes(), Arc::new(MemoryContext::new()))
            .expect("load succeeds");
        assert_eq!(registry.phase().expect("registry phase"), RegistryPhase::Loaded);
        assert!(registry.context().expect("registry context").is_some());

        let report = registry.destroy().expect("registry destroy");
        assert!(report.is_clean());
        assert_eq!(registry.phase().expect("registry phase"), RegistryPhase::Empty);
        assert!(registry.context().expect("registry context").is_none());
    }

    #[test]
    fn duplicate_names_get_distinct_instance_ids() {
        let registry = registry();
        registry
            .load(MANIFEST.as_bytes(), Arc::new(MemoryContext::new()))
            .expect("load succeeds");

        let list = registry.plugin_list().expect("plugin list");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name(), list[1].name());
        assert_ne!(list[0].id(), list[1].id());
        assert_eq!(list[0].position(), 1);
        assert_eq!(list[1].position(), 2);
    }

    #[test]
    fn second_load_is_rejected_until_destroyed() {
        let registry = registry();
        let context = Arc::new(MemoryContext::new());
        registry
            .load(MANIFEST.as_bytes(), context.clone())
            .expect("first load succeeds");

        let err = registry
            .load(MANIFEST.as_bytes(), context.clone())
            .expect_err("second load must be rejected");
        assert!(matches!(
            err,
            RegistryError::AlreadyLoaded {
                phase: RegistryPhase::Loaded
            }
        ));
        assert_eq!(registry.plugin_list().expect("plugin list").len(), 2);

        registry.destroy().expect("registry destroy");
        registry
            .load(MANIFEST.as_bytes(), context)
            .expect("load after destroy succeeds");
    }

    #[test]
    fn debug_does_not_block_on_held_plugin_list() {
        let registry = registry();
        registry
            .load(MANIFEST.as_bytes(), Arc::new(MemoryContext::new()))
            .expect("load succeeds");

        let list = registry.plugin_list().expect("plugin list");
        let rendered = format!("{registry:?}");
        assert!(rendered.contains("<locked>"));
        drop(list);

        let rendered = format!("{registry:?}");
        assert!(rendered.contains("phase: Loaded"));
    }
}
