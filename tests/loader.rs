//! Loader validation pipeline tests: the three sequential failure points and
//! the default/demo path.

use std::any::Any;
use std::io::Write;
use std::sync::Arc;

use graphstudio::config::PgSettings;
use graphstudio::graph::CompiledGraph;
use graphstudio::loader::{GraphSpec, LoaderError, load_graph};
use graphstudio::registry::{GRAPH_EXPORT, GraphModule, GraphRegistry};

/// Module that publishes no exports at all.
struct EmptyModule;

impl GraphModule for EmptyModule {
    fn name(&self) -> &str {
        "empty"
    }

    fn export(&self, _name: &str) -> Option<Box<dyn Any + Send>> {
        None
    }
}

/// Module whose `graph` export is not a compiled graph.
struct WrongTypeModule;

impl GraphModule for WrongTypeModule {
    fn name(&self) -> &str {
        "wrong_type"
    }

    fn export(&self, name: &str) -> Option<Box<dyn Any + Send>> {
        (name == GRAPH_EXPORT).then(|| Box::new("not a graph".to_string()) as Box<dyn Any + Send>)
    }
}

fn test_registry() -> GraphRegistry {
    let mut registry = GraphRegistry::with_defaults();
    registry.register(Arc::new(EmptyModule)).unwrap();
    registry.register(Arc::new(WrongTypeModule)).unwrap();
    registry
}

fn pg() -> PgSettings {
    PgSettings::local_stack()
}

#[test]
fn absent_spec_serves_demo_graph_without_lookup() {
    // An empty registry proves no lookup happens on the default path.
    let registry = GraphRegistry::new();
    let graph = load_graph(&registry, None, &pg()).unwrap();
    assert_eq!(graph.name(), "demo");
    assert!(graph.checkpointer.is_none());
}

#[test]
fn unknown_module_aborts_with_module_not_found() {
    let err = load_graph(&test_registry(), Some("missing.module"), &pg()).unwrap_err();
    assert!(matches!(err, LoaderError::ModuleNotFound { .. }));
    assert!(err.to_string().contains("at path: missing.module"));
}

#[test]
fn module_without_graph_export_aborts() {
    let err = load_graph(&test_registry(), Some("empty"), &pg()).unwrap_err();
    assert!(matches!(err, LoaderError::GraphExportMissing { .. }));
    assert!(err.to_string().contains("could not find `graph` export"));
    assert!(err.to_string().contains("empty"));
}

#[test]
fn non_graph_export_aborts_with_type_mismatch() {
    let err = load_graph(&test_registry(), Some("wrong_type"), &pg()).unwrap_err();
    assert!(matches!(err, LoaderError::NotACompiledGraph { .. }));
    assert!(err.to_string().contains("is not a compiled graph"));
}

#[tokio::test]
async fn valid_module_gets_a_checkpointer_attached() {
    let graph = load_graph(&test_registry(), Some("demo"), &pg()).unwrap();
    assert_eq!(graph.name(), "demo");
    assert!(graph.checkpointer.is_some());
}

#[tokio::test]
async fn manifest_path_resolves_the_named_module() {
    let mut manifest = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .unwrap();
    write!(manifest, r#"{{"module": "demo"}}"#).unwrap();

    let path = manifest.path().to_str().unwrap().to_string();
    let graph = load_graph(&test_registry(), Some(&path), &pg()).unwrap();
    assert_eq!(graph.name(), "demo");
    assert!(graph.checkpointer.is_some());
}

#[test]
fn unreadable_manifest_is_reported_as_manifest_error() {
    let err = load_graph(&test_registry(), Some("no/such/manifest.json"), &pg()).unwrap_err();
    assert!(matches!(err, LoaderError::Manifest { .. }));
}

#[test]
fn spec_parsing_distinguishes_modules_from_manifests() {
    assert_eq!(
        GraphSpec::parse("my_module"),
        GraphSpec::Module("my_module".to_string())
    );
    assert!(matches!(
        GraphSpec::parse("graphs/agent.json"),
        GraphSpec::Manifest(_)
    ));
    assert!(matches!(
        GraphSpec::parse("agent.json"),
        GraphSpec::Manifest(_)
    ));
}

#[tokio::test]
async fn loaded_graph_is_the_registered_compiled_graph_type() {
    let graph: CompiledGraph = load_graph(&test_registry(), Some("demo"), &pg()).unwrap();
    assert_eq!(graph.config().recursion_limit, 50);
}
