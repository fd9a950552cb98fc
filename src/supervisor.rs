//! Concurrent compose + serve orchestration.
//!
//! Two tasks run side by side: the compose child process, and the readiness
//! poll followed by the HTTP server. They touch disjoint resources (child
//! process stdio vs. database connections), so no coordination is needed
//! beyond `try_join!` propagating the first fatal error.

use miette::Diagnostic;
use thiserror::Error;

use crate::compose::{self, ComposeError};
use crate::config::StudioConfig;
use crate::graph::CompiledGraph;
use crate::readiness::{self, PgProbe};
use crate::server::{self, AppState, ServerError};

#[derive(Debug, Error, Diagnostic)]
pub enum SupervisorError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Server(#[from] ServerError),
}

/// Launch the compose stack and, once the database answers, serve the graph.
pub async fn run(config: &StudioConfig, graph: CompiledGraph) -> Result<(), SupervisorError> {
    let state = AppState::new(graph);
    let probe = PgProbe::new(&config.pg);

    let stack = async {
        compose::compose_up(&config.compose_file)
            .await
            .map_err(SupervisorError::from)
    };
    let serve_once_ready = async {
        readiness::wait_until_ready(&probe, config.probe_delay).await;
        server::serve(state, config.http_addr)
            .await
            .map_err(SupervisorError::from)
    };

    tokio::try_join!(stack, serve_once_ready)?;
    Ok(())
}
