//! Implementation catalog: implementation id -> plugin factory.
//!
//! # Responsibility
//! - Hold the registration table populated at startup by each plugin module.
//! - Construct fresh plugin instances on demand for the registry.
//!
//! # Invariants
//! - Implementation ids are validated at registration time.
//! - One id maps to exactly one factory; re-registration is rejected.

use crate::plugin::lifecycle::{Plugin, PluginResult};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Constructor for one implementation. Equivalent of a no-arg constructor.
pub type PluginFactory = Arc<dyn Fn() -> PluginResult<Box<dyn Plugin>> + Send + Sync>;

static IMPLEMENTATION_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*((\.|::|-)[A-Za-z0-9_]+)*$")
        .unwrap_or_else(|err| panic!("implementation id pattern must compile: {err}"))
});

/// Returns whether `value` is a well-formed implementation id.
pub fn is_valid_implementation_id(value: &str) -> bool {
    IMPLEMENTATION_ID_PATTERN.is_match(value)
}

/// Registration table consulted by the registry during load.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    factories: BTreeMap<String, PluginFactory>,
}

impl PluginCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one factory under `implementation_id`.
    pub fn register<F>(&mut self, implementation_id: &str, factory: F) -> Result<(), CatalogError>
    where
        F: Fn() -> PluginResult<Box<dyn Plugin>> + Send + Sync + 'static,
    {
        let id = implementation_id.trim().to_string();
        if !is_valid_implementation_id(&id) {
            return Err(CatalogError::InvalidImplementationId(id));
        }
        if self.factories.contains_key(id.as_str()) {
            return Err(CatalogError::DuplicateImplementationId(id));
        }

        debug!(
            "event=catalog_register module=catalog status=ok implementation={}",
            id
        );
        self.factories.insert(id, Arc::new(factory));
        Ok(())
    }

    /// Registers a `Default`-constructible plugin type.
    pub fn register_default<P>(&mut self, implementation_id: &str) -> Result<(), CatalogError>
    where
        P: Plugin + Default + 'static,
    {
        self.register(implementation_id, || {
            Ok(Box::new(P::default()) as Box<dyn Plugin>)
        })
    }

    pub fn contains(&self, implementation_id: &str) -> bool {
        self.factories.contains_key(implementation_id.trim())
    }

    pub fn get(&self, implementation_id: &str) -> Option<PluginFactory> {
        self.factories.get(implementation_id.trim()).cloned()
    }

    /// Returns sorted implementation ids.
    pub fn ids(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for PluginCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginCatalog")
            .field("ids", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Catalog registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    InvalidImplementationId(String),
    DuplicateImplementationId(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidImplementationId(value) => {
                write!(f, "implementation id is invalid: {value}")
            }
            Self::DuplicateImplementationId(value) => {
                write!(f, "implementation id already registered: {value}")
            }
        }
    }
}

impl Error for CatalogError {}
