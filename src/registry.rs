//! Graph module registration.
//!
//! User-supplied graphs are contributed through an explicit contract instead
//! of runtime reflection: a [`GraphModule`] registers under a name and
//! publishes named exports. The loader asks the module for its [`GRAPH_EXPORT`]
//! and validates the payload type; duplicate names are rejected at
//! registration time.

use std::any::Any;
use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::agent::demo_graph;

/// Export name the loader resolves on a module.
pub const GRAPH_EXPORT: &str = "graph";

/// A named bundle of exports contributed by a plugin.
pub trait GraphModule: Send + Sync {
    /// The registry key this module is looked up by.
    fn name(&self) -> &str;

    /// Look up a named export. `None` means the module does not publish that
    /// symbol; the payload type is validated by the caller.
    fn export(&self, name: &str) -> Option<Box<dyn Any + Send>>;
}

#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error("a graph module named `{name}` is already registered")]
    #[diagnostic(code(graphstudio::registry::duplicate))]
    Duplicate { name: String },
}

/// Registry of graph modules, keyed by module name.
#[derive(Default)]
pub struct GraphRegistry {
    modules: FxHashMap<String, Arc<dyn GraphModule>>,
}

impl GraphRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with the built-in demo module.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(Arc::new(DemoModule))
            .expect("empty registry cannot hold a duplicate");
        registry
    }

    pub fn register(&mut self, module: Arc<dyn GraphModule>) -> Result<(), RegistryError> {
        let name = module.name().to_string();
        if self.modules.contains_key(&name) {
            return Err(RegistryError::Duplicate { name });
        }
        self.modules.insert(name, module);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn GraphModule>> {
        self.modules.get(name)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Built-in module exporting the demo agent graph.
pub struct DemoModule;

impl GraphModule for DemoModule {
    fn name(&self) -> &str {
        "demo"
    }

    fn export(&self, name: &str) -> Option<Box<dyn Any + Send>> {
        (name == GRAPH_EXPORT).then(|| Box::new(demo_graph()) as Box<dyn Any + Send>)
    }
}
