//! Plugin registry contracts.
//!
//! This module owns the manifest parser, the capability/lifecycle contracts
//! plugins implement, the implementation catalog, and the registry that wires
//! and drives every plugin instance.

pub mod capability;
pub mod catalog;
pub mod lifecycle;
pub mod manifest;
pub mod registry;
