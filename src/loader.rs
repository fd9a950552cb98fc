//! Startup-time graph resolution and validation.
//!
//! A one-shot, synchronous pipeline with three sequential failure points, each
//! reported independently: the module must be registered, it must publish a
//! `"graph"` export, and the export must be a [`CompiledGraph`]. Any failure
//! here is terminal for the startup attempt; there is no retry at this layer.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::agent::demo_graph;
use crate::checkpoint::{CheckpointAt, CheckpointError, PostgresCheckpoint};
use crate::config::PgSettings;
use crate::graph::CompiledGraph;
use crate::registry::{GRAPH_EXPORT, GraphRegistry};

/// Manifest file naming a registered graph module.
#[derive(Debug, Deserialize)]
pub struct GraphManifest {
    pub module: String,
}

/// How the CLI argument selects a graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphSpec {
    /// A registered module name.
    Module(String),
    /// A path to a JSON manifest naming the module.
    Manifest(PathBuf),
}

impl GraphSpec {
    /// An argument that names an existing file, contains a path separator, or
    /// carries a `.json` extension is treated as a manifest path; anything
    /// else is a module name.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let path = Path::new(raw);
        if path.is_file() || raw.contains(['/', '\\']) || raw.ends_with(".json") {
            GraphSpec::Manifest(path.to_path_buf())
        } else {
            GraphSpec::Module(raw.to_string())
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum LoaderError {
    #[error("no graph module registered at path: {path}")]
    #[diagnostic(
        code(graphstudio::loader::module_not_found),
        help("Register the module in the GraphRegistry, or pass no argument to serve the demo graph.")
    )]
    ModuleNotFound { path: String },

    #[error("could not find `graph` export in module at path: {path}")]
    #[diagnostic(code(graphstudio::loader::graph_export_missing))]
    GraphExportMissing { path: String },

    #[error("`graph` export of module at path {path} is not a compiled graph")]
    #[diagnostic(
        code(graphstudio::loader::not_a_compiled_graph),
        help("The export must be a graphstudio::graph::CompiledGraph.")
    )]
    NotACompiledGraph { path: String },

    #[error("could not read graph manifest at {path}: {message}")]
    #[diagnostic(code(graphstudio::loader::manifest))]
    Manifest { path: String, message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Checkpoint(#[from] CheckpointError),
}

fn read_manifest(path: &Path) -> Result<GraphManifest, LoaderError> {
    let raw = std::fs::read_to_string(path).map_err(|e| LoaderError::Manifest {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| LoaderError::Manifest {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Resolve the graph to serve.
///
/// With no spec, the demo graph is returned untouched and no registry lookup
/// happens. With a spec, the module is resolved, its `"graph"` export
/// validated, and a Postgres checkpoint policy (end of every step) attached
/// before the graph is handed to the HTTP layer.
pub fn load_graph(
    registry: &GraphRegistry,
    spec: Option<&str>,
    pg: &PgSettings,
) -> Result<CompiledGraph, LoaderError> {
    let Some(raw) = spec else {
        info!("starting graphstudio with demo graph");
        return Ok(demo_graph());
    };
    info!(path = raw, "starting graphstudio with graph at path");

    let module_name = match GraphSpec::parse(raw) {
        GraphSpec::Module(name) => name,
        GraphSpec::Manifest(path) => read_manifest(&path)?.module,
    };

    let module = registry
        .get(&module_name)
        .ok_or_else(|| LoaderError::ModuleNotFound {
            path: raw.to_string(),
        })?;

    let export = module
        .export(GRAPH_EXPORT)
        .ok_or_else(|| LoaderError::GraphExportMissing {
            path: raw.to_string(),
        })?;

    let mut graph =
        export
            .downcast::<CompiledGraph>()
            .map_err(|_| LoaderError::NotACompiledGraph {
                path: raw.to_string(),
            })?;

    graph.checkpointer = Some(PostgresCheckpoint::new(pg, CheckpointAt::EndOfStep)?);
    info!(graph = graph.name(), "graph loaded and checkpointer attached");
    Ok(*graph)
}
