//! # Graphstudio: Local Development Studio for Agent Graphs
//!
//! Graphstudio is a thin launcher around a graph-driven agent workflow stack.
//! It does four things, in order:
//!
//! 1. Resolves a compiled graph from the plugin [`registry`] (or falls back to
//!    the built-in demo agent) and attaches a Postgres checkpoint policy.
//! 2. Brings up the backing container stack (`docker compose ... up`) as a
//!    supervised child process.
//! 3. Polls the database with a fixed-delay readiness probe until it answers.
//! 4. Serves the graph over a small HTTP API on `0.0.0.0:8100`.
//!
//! Steps 2 and 3+4 run concurrently; serving starts only once the database is
//! reachable.
//!
//! ## Plugging in a graph
//!
//! Graphs are contributed through the [`registry::GraphModule`] contract: a
//! module registers under a name and publishes a `"graph"` export holding a
//! [`graph::CompiledGraph`]. The loader validates the export at startup and
//! reports each failure point (unknown module, missing export, wrong type)
//! individually.
//!
//! ```
//! use graphstudio::config::PgSettings;
//! use graphstudio::loader::load_graph;
//! use graphstudio::registry::GraphRegistry;
//!
//! let registry = GraphRegistry::with_defaults();
//! // No argument: the demo graph, untouched.
//! let graph = load_graph(&registry, None, &PgSettings::local_stack()).unwrap();
//! assert_eq!(graph.name(), "demo");
//! ```
//!
//! ## Module Guide
//!
//! - [`config`] - Connection settings and launcher configuration
//! - [`message`] - Chat message primitives
//! - [`graph`] - The compiled graph surface and step-wise runner
//! - [`agent`] - The configurable demo agent chain
//! - [`registry`] - Graph module registration
//! - [`loader`] - Startup-time graph resolution and validation
//! - [`checkpoint`] - Postgres checkpoint adapter
//! - [`readiness`] - Fixed-delay database readiness polling
//! - [`compose`] - Container-compose child process supervision
//! - [`server`] - HTTP API
//! - [`supervisor`] - Concurrent compose + serve orchestration

pub mod agent;
pub mod checkpoint;
pub mod compose;
pub mod config;
pub mod graph;
pub mod loader;
pub mod message;
pub mod readiness;
pub mod registry;
pub mod server;
pub mod supervisor;
