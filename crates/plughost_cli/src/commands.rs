//! CLI command implementations.
//!
//! Each command writes human-readable output to the supplied writer so the
//! binary and tests share one code path.

use crate::probe::{self, SupportLedger};
use log::info;
use plughost_core::{
    manifest_to_string, read_manifest, CatalogError, LocalContext, ManifestError,
    ManifestReadError, PluginCatalog, PluginDescriptor, PluginRegistry, RegistryError,
};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

/// Catalog with every implementation compiled into this binary.
pub fn builtin_catalog() -> Result<PluginCatalog, CommandError> {
    let mut catalog = PluginCatalog::new();
    probe::register(&mut catalog)?;
    Ok(catalog)
}

/// Parses `manifest` and reports whether each implementation resolves.
pub fn check(manifest: &Path, out: &mut impl Write) -> Result<(), CommandError> {
    let descriptors = read_manifest_file(manifest)?;
    let catalog = builtin_catalog()?;

    let mut unresolved = Vec::new();
    for (index, descriptor) in descriptors.iter().enumerate() {
        let resolved = catalog.contains(descriptor.implementation_id());
        if !resolved {
            unresolved.push(descriptor.name().to_string());
        }
        writeln!(
            out,
            "{:>3}. {} -> {} config={} [{}]",
            index + 1,
            descriptor.name(),
            descriptor.implementation_id(),
            descriptor.config_resource().unwrap_or("-"),
            if resolved { "ok" } else { "unknown" }
        )?;
    }

    if unresolved.is_empty() {
        Ok(())
    } else {
        Err(CommandError::Unresolved(unresolved))
    }
}

/// Parses `manifest` and prints it in normalized form.
pub fn export(manifest: &Path, out: &mut impl Write) -> Result<(), CommandError> {
    let descriptors = read_manifest_file(manifest)?;
    writeln!(out, "{}", manifest_to_string(&descriptors)?)?;
    Ok(())
}

/// Loads `manifest` through a `LocalContext`, prints the live plugin list,
/// runs one support pass, then tears everything down.
pub fn run(base_dir: &Path, manifest: &str, out: &mut impl Write) -> Result<(), CommandError> {
    let registry = PluginRegistry::new(builtin_catalog()?);
    let context = Arc::new(LocalContext::new(base_dir));

    if let Err(err) = registry.load_resource(manifest, context) {
        let report = registry.destroy()?;
        info!(
            "event=cli_run module=cli status=error destroyed={} destroy_failures={}",
            report.attempted,
            report.failures.len()
        );
        return Err(err.into());
    }

    for warning in registry.warnings()? {
        writeln!(out, "warning: {warning}")?;
    }
    for instance in registry.plugin_list()?.iter() {
        writeln!(
            out,
            "{:>3}. {} ({}) id={} context={} config={}",
            instance.position(),
            instance.name(),
            instance.descriptor().implementation_id(),
            instance.id(),
            instance.has_context(),
            instance
                .configuration()
                .map(|configuration| configuration.resource())
                .unwrap_or("-")
        )?;
    }

    let mut ledger = SupportLedger::default();
    registry.support(&mut ledger)?;
    writeln!(out, "support: {}", ledger.tags.join(", "))?;

    let report = registry.destroy()?;
    for failure in &report.failures {
        writeln!(out, "destroy failed: {} ({})", failure.plugin, failure.error)?;
    }
    writeln!(out, "destroyed {} plugin(s)", report.attempted)?;
    Ok(())
}

fn read_manifest_file(path: &Path) -> Result<Vec<PluginDescriptor>, CommandError> {
    let file = File::open(path).map_err(|err| CommandError::Open {
        path: path.display().to_string(),
        source: err,
    })?;
    Ok(read_manifest(file)?)
}

/// CLI command failures.
#[derive(Debug)]
pub enum CommandError {
    Open { path: String, source: io::Error },
    Output(io::Error),
    Catalog(CatalogError),
    Manifest(ManifestReadError),
    Export(ManifestError),
    Registry(RegistryError),
    Unresolved(Vec<String>),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { path, source } => write!(f, "failed to open `{path}`: {source}"),
            Self::Output(err) => write!(f, "failed to write output: {err}"),
            Self::Catalog(err) => write!(f, "{err}"),
            Self::Manifest(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::Unresolved(names) => {
                write!(f, "unknown implementation for: {}", names.join(", "))
            }
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Output(err) => Some(err),
            Self::Catalog(err) => Some(err),
            Self::Manifest(err) => Some(err),
            Self::Export(err) => Some(err),
            Self::Registry(err) => Some(err),
            Self::Unresolved(_) => None,
        }
    }
}

impl From<io::Error> for CommandError {
    fn from(value: io::Error) -> Self {
        Self::Output(value)
    }
}

impl From<CatalogError> for CommandError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<ManifestReadError> for CommandError {
    fn from(value: ManifestReadError) -> Self {
        Self::Manifest(value)
    }
}

impl From<ManifestError> for CommandError {
    fn from(value: ManifestError) -> Self {
        Self::Export(value)
    }
}

impl From<RegistryError> for CommandError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}
