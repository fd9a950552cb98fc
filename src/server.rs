//! HTTP API over the active graph.
//!
//! The state is built once from the loader's result and only read afterwards;
//! there is no shared mutable graph slot.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;
use uuid::Uuid;

use crate::checkpoint::{CheckpointAt, PersistedCheckpoint};
use crate::graph::{CompiledGraph, RunStatus};
use crate::message::Message;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<CompiledGraph>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    #[must_use]
    pub fn new(graph: CompiledGraph) -> Self {
        Self {
            graph: Arc::new(graph),
            started_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    #[diagnostic(
        code(graphstudio::server::bind),
        help("Is another studio instance already running on this port?")
    )]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("http server error: {source}")]
    #[diagnostic(code(graphstudio::server::serve))]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Serialize)]
struct OkResponse {
    ok: bool,
    started_at: String,
}

#[derive(Debug, Serialize)]
struct GraphInfo {
    name: String,
    recursion_limit: usize,
    /// Checkpoint policy of the active graph, absent when none is attached.
    checkpointing: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    #[serde(default)]
    pub thread_id: Option<String>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct RunResponse {
    pub thread_id: String,
    pub status: &'static str,
    pub steps: u64,
    pub messages: Vec<Message>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ok", get(ok))
        .route("/graphs", get(graph_info))
        .route("/runs", post(create_run))
        .route("/threads/{thread_id}", get(thread_state))
        .with_state(state)
}

async fn ok(State(state): State<AppState>) -> Json<OkResponse> {
    Json(OkResponse {
        ok: true,
        started_at: state.started_at.to_rfc3339(),
    })
}

async fn graph_info(State(state): State<AppState>) -> Json<GraphInfo> {
    let checkpointing = state.graph.checkpointer.as_ref().map(|cp| match cp.at() {
        CheckpointAt::EndOfStep => "end_of_step",
        CheckpointAt::EndOfRun => "end_of_run",
    });
    Json(GraphInfo {
        name: state.graph.name().to_string(),
        recursion_limit: state.graph.config().recursion_limit,
        checkpointing,
    })
}

async fn create_run(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Result<Json<RunResponse>, (StatusCode, String)> {
    let thread_id = req
        .thread_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let output = state
        .graph
        .run(&thread_id, req.messages)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(RunResponse {
        thread_id,
        status: match output.status {
            RunStatus::Done => "done",
            RunStatus::Interrupted => "interrupted",
        },
        steps: output.steps,
        messages: output.messages,
    }))
}

async fn thread_state(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<PersistedCheckpoint>, (StatusCode, String)> {
    let Some(cp) = &state.graph.checkpointer else {
        return Err((
            StatusCode::NOT_FOUND,
            "no checkpointer attached to the active graph".to_string(),
        ));
    };
    match cp.load_latest(&thread_id).await {
        Ok(Some(persisted)) => Ok(Json(persisted)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            format!("no checkpoints for thread {thread_id}"),
        )),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

/// Bind and serve the API until shutdown (Ctrl-C).
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<(), ServerError> {
    let app = build_router(state);
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "serving graphstudio http api");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|source| ServerError::Serve { source })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
