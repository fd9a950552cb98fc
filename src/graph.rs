//! The compiled graph surface and step-wise runner.
//!
//! [`CompiledGraph`] is the concrete runtime type the loader validates a
//! plugin's `"graph"` export against. Execution semantics live behind the
//! [`Runnable`] seam; the graph itself only drives the step loop, enforces the
//! recursion limit, and hands transcripts to the checkpoint adapter.

use std::sync::Arc;

use async_trait::async_trait;
use miette::Diagnostic;
use thiserror::Error;
use tracing::instrument;

use crate::checkpoint::{Checkpoint, CheckpointAt, CheckpointError, PostgresCheckpoint};
use crate::message::Message;

/// Per-run execution configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Maximum number of steps before a run is aborted.
    pub recursion_limit: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            recursion_limit: 25,
        }
    }
}

/// What a single invocation of the entry runnable produced.
#[derive(Clone, Debug, PartialEq)]
pub enum StepOutcome {
    /// New messages; keep stepping.
    Next(Vec<Message>),
    /// Paused before executing an action; the run stops here.
    Interrupted(Vec<Message>),
    /// Final messages; the run is complete.
    Done(Vec<Message>),
}

#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    #[error("graph step failed: {message}")]
    #[diagnostic(code(graphstudio::graph::step))]
    Step { message: String },

    #[error("recursion limit of {limit} reached without the graph finishing")]
    #[diagnostic(
        code(graphstudio::graph::recursion_limit),
        help("Raise the limit in RunConfig or check the graph for a loop.")
    )]
    RecursionLimit { limit: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// The seam to the execution framework: one cooperative step at a time.
#[async_trait]
pub trait Runnable: Send + Sync {
    async fn invoke(
        &self,
        messages: &[Message],
        config: &RunConfig,
    ) -> Result<StepOutcome, RunError>;
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Done,
    Interrupted,
}

/// Result of driving a graph to completion (or to an interrupt).
#[derive(Clone, Debug)]
pub struct RunOutput {
    pub status: RunStatus,
    pub steps: u64,
    pub messages: Vec<Message>,
}

/// A prebuilt, executable representation of an agent's control flow.
///
/// The `checkpointer` slot starts empty; the loader fills it exactly once at
/// startup, before any concurrent task can observe the graph.
pub struct CompiledGraph {
    name: String,
    entry: Arc<dyn Runnable>,
    config: RunConfig,
    pub checkpointer: Option<PostgresCheckpoint>,
}

impl std::fmt::Debug for CompiledGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("checkpointer", &self.checkpointer)
            .finish()
    }
}

impl CompiledGraph {
    #[must_use]
    pub fn new(name: &str, entry: Arc<dyn Runnable>, config: RunConfig) -> Self {
        Self {
            name: name.to_string(),
            entry,
            config,
            checkpointer: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Drive the entry runnable until it finishes, pauses, or hits the
    /// recursion limit, checkpointing per the attached policy.
    #[instrument(skip(self, messages), fields(graph = %self.name), err)]
    pub async fn run(
        &self,
        thread_id: &str,
        mut messages: Vec<Message>,
    ) -> Result<RunOutput, RunError> {
        let limit = self.config.recursion_limit as u64;
        let mut step: u64 = 0;

        while step < limit {
            let outcome = self.entry.invoke(&messages, &self.config).await?;
            step += 1;
            match outcome {
                StepOutcome::Next(mut produced) => {
                    messages.append(&mut produced);
                    self.persist(thread_id, step, &messages, false).await?;
                }
                StepOutcome::Interrupted(mut produced) => {
                    messages.append(&mut produced);
                    self.persist(thread_id, step, &messages, true).await?;
                    return Ok(RunOutput {
                        status: RunStatus::Interrupted,
                        steps: step,
                        messages,
                    });
                }
                StepOutcome::Done(mut produced) => {
                    messages.append(&mut produced);
                    self.persist(thread_id, step, &messages, true).await?;
                    return Ok(RunOutput {
                        status: RunStatus::Done,
                        steps: step,
                        messages,
                    });
                }
            }
        }

        Err(RunError::RecursionLimit {
            limit: self.config.recursion_limit,
        })
    }

    async fn persist(
        &self,
        thread_id: &str,
        step: u64,
        messages: &[Message],
        run_ended: bool,
    ) -> Result<(), CheckpointError> {
        let Some(cp) = &self.checkpointer else {
            return Ok(());
        };
        if cp.at() == CheckpointAt::EndOfStep || run_ended {
            cp.save(&Checkpoint::new(thread_id, step, messages)).await?;
        }
        Ok(())
    }
}
