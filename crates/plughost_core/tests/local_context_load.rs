use plughost_core::{
    manifest_to_string, parse_manifest, CapabilitySlots, ConfigurationAware, Context,
    ContextAware, LoadWarning, LocalContext, Plugin, PluginCatalog, PluginError, PluginRegistry,
    PluginResult, RegistryError, RegistryPhase,
};
use std::fs;
use std::io::Read;
use std::sync::Arc;

/// Reads `greeting` from its configuration during `load()`.
#[derive(Default)]
struct Greeter {
    slots: CapabilitySlots,
    greeting: Option<String>,
}

impl Plugin for Greeter {
    fn initialize(&mut self) -> PluginResult {
        self.slots.require_context()?;
        Ok(())
    }

    fn load(&mut self) -> PluginResult {
        let configuration = self.slots.require_configuration()?;
        let mut text = String::new();
        configuration.as_stream().read_to_string(&mut text)?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        let greeting = value
            .get("greeting")
            .and_then(|greeting| greeting.as_str())
            .ok_or_else(|| PluginError::new("greeting is missing"))?;
        self.greeting = Some(greeting.to_string());
        Ok(())
    }

    fn destroy(&mut self) -> PluginResult {
        self.greeting = None;
        Ok(())
    }

    fn as_context_aware(&mut self) -> Option<&mut dyn ContextAware> {
        Some(&mut self.slots)
    }

    fn as_configuration_aware(&mut self) -> Option<&mut dyn ConfigurationAware> {
        Some(&mut self.slots)
    }
}

/// Accepts configuration but runs fine without it.
#[derive(Default)]
struct Optional {
    slots: CapabilitySlots,
}

impl Plugin for Optional {
    fn initialize(&mut self) -> PluginResult {
        Ok(())
    }

    fn load(&mut self) -> PluginResult {
        Ok(())
    }

    fn destroy(&mut self) -> PluginResult {
        Ok(())
    }

    fn as_configuration_aware(&mut self) -> Option<&mut dyn ConfigurationAware> {
        Some(&mut self.slots)
    }
}

fn catalog() -> PluginCatalog {
    let mut catalog = PluginCatalog::new();
    catalog
        .register_default::<Greeter>("demo.greeter")
        .expect("greeter registration");
    catalog
        .register_default::<Optional>("demo.optional")
        .expect("optional registration");
    catalog
}

fn write(dir: &std::path::Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture dir");
    }
    fs::write(path, contents).expect("write fixture");
}

#[test]
fn loads_manifest_and_config_from_base_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(
        dir.path(),
        "conf/plugins.json",
        r#"{"plugins":[{"name":"greeter","implementation":"demo.greeter","config":"conf/greeter.json"}]}"#,
    );
    write(dir.path(), "conf/greeter.json", r#"{"greeting":"hello"}"#);

    let registry = PluginRegistry::new(catalog());
    let context = Arc::new(LocalContext::new(dir.path()));
    registry
        .load_resource("conf/plugins.json", context)
        .expect("load from local context");

    let list = registry.plugin_list().expect("plugin list");
    assert_eq!(list.len(), 1);
    let configuration = list[0].configuration().expect("configuration injected");
    assert_eq!(configuration.as_bytes(), br#"{"greeting":"hello"}"#);
    drop(list);

    let bound = registry.context().expect("registry context").expect("context bound");
    assert_eq!(
        bound.resolve_path("conf/greeter.json"),
        dir.path().join("conf/greeter.json")
    );
    assert!(registry.destroy().expect("registry destroy").is_clean());
}

#[test]
fn missing_manifest_resource_is_a_resource_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let registry = PluginRegistry::new(catalog());
    let err = registry
        .load_resource("conf/absent.json", Arc::new(LocalContext::new(dir.path())))
        .expect_err("missing manifest must fail");
    match err {
        RegistryError::Resource { plugin, source } => {
            assert!(plugin.is_none());
            assert!(source.is_not_found());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(registry.plugin_list().expect("plugin list").is_empty());
}

#[test]
fn plugin_load_error_surfaces_as_lifecycle_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(
        dir.path(),
        "plugins.json",
        r#"{"plugins":[{"name":"greeter","implementation":"demo.greeter","config":"greeter.json"}]}"#,
    );
    write(dir.path(), "greeter.json", r#"{"salutation":"hi"}"#);

    let registry = PluginRegistry::new(catalog());
    let err = registry
        .load_resource("plugins.json", Arc::new(LocalContext::new(dir.path())))
        .expect_err("missing greeting must fail");
    assert_eq!(err.plugin(), Some("greeter"));
    assert!(err.to_string().contains("greeting is missing"));
}

#[test]
fn unreadable_optional_config_is_a_warning() {
    let dir = tempfile::tempdir().expect("temp dir");
    write(
        dir.path(),
        "plugins.json",
        r#"{"plugins":[{"name":"soft","implementation":"demo.optional","config":"conf/soft.json"}]}"#,
    );
    fs::create_dir_all(dir.path().join("conf/soft.json")).expect("directory in place of config");

    let registry = PluginRegistry::new(catalog());
    registry
        .load_resource("plugins.json", Arc::new(LocalContext::new(dir.path())))
        .expect("unreadable config must not abort the load");

    assert_eq!(registry.phase().expect("registry phase"), RegistryPhase::Loaded);
    let warnings = registry.warnings().expect("registry warnings");
    assert_eq!(warnings.len(), 1);
    match &warnings[0] {
        LoadWarning::ConfigurationUnreadable {
            plugin, resource, ..
        } => {
            assert_eq!(plugin, "soft");
            assert_eq!(resource, "conf/soft.json");
        }
        other => panic!("unexpected warning: {other}"),
    }
    let list = registry.plugin_list().expect("plugin list");
    assert!(list[0].configuration().is_none());
}

#[test]
fn exported_manifest_round_trips_through_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let original = r#"{"plugins":[
        {"name":"labels","implementation":"app.labels","config":"conf/labels.json"},
        {"name":"audit","implementation":"app.audit"},
        {"name":"labels","implementation":"app.labels.secondary"}
    ]}"#;
    let descriptors = parse_manifest(original.as_bytes()).expect("parse original");

    let exported = manifest_to_string(&descriptors).expect("export");
    write(dir.path(), "exported.json", &exported);
    let bytes = fs::read(dir.path().join("exported.json")).expect("read exported");
    let reparsed = parse_manifest(&bytes).expect("parse exported");

    let tuples: Vec<(&str, &str, Option<&str>)> = reparsed
        .iter()
        .map(|d| (d.name(), d.implementation_id(), d.config_resource()))
        .collect();
    assert_eq!(
        tuples,
        vec![
            ("labels", "app.labels", Some("conf/labels.json")),
            ("audit", "app.audit", None),
            ("labels", "app.labels.secondary", None),
        ]
    );
    assert_eq!(reparsed, descriptors);
}
