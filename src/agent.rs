//! The configurable demo agent chain.
//!
//! [`ConfigurableAgent`] is a delegation shim: it wraps the pre-built chain
//! from [`build_chain`] and republishes it under a fixed recursion limit. The
//! `interrupt_before_action` flag makes the chain pause instead of executing
//! its action hop, so a human can inspect the pending action.

use std::sync::Arc;

use async_trait::async_trait;

use crate::graph::{CompiledGraph, RunConfig, RunError, Runnable, StepOutcome};
use crate::message::Message;

/// Recursion limit the agent wrapper always runs under.
pub const AGENT_RECURSION_LIMIT: usize = 50;

/// Demo chain: answer a user message via one lookup action, then respond.
///
/// Step behavior, keyed off the last message in the transcript:
/// - last message is from the user: propose a `lookup` action (or pause, when
///   `interrupt_before_action` is set);
/// - last message is an action: observe it and produce the final answer.
struct DemoChain {
    interrupt_before_action: bool,
}

#[async_trait]
impl Runnable for DemoChain {
    async fn invoke(
        &self,
        messages: &[Message],
        _config: &RunConfig,
    ) -> Result<StepOutcome, RunError> {
        let Some(last) = messages.last() else {
            return Ok(StepOutcome::Done(vec![Message::assistant(
                "Hello! Send a message to get started.",
            )]));
        };

        if last.has_role(Message::ACTION) {
            let answer = Message::assistant(&format!("Observed {}; all done.", last.content));
            return Ok(StepOutcome::Done(vec![answer]));
        }

        let action = Message::new(Message::ACTION, &format!("lookup: {}", last.content));
        if self.interrupt_before_action {
            return Ok(StepOutcome::Interrupted(vec![Message::assistant(&format!(
                "Paused before action `{}`.",
                action.content
            ))]));
        }
        Ok(StepOutcome::Next(vec![action]))
    }
}

/// Build the pre-built demo chain.
pub fn build_chain(interrupt_before_action: bool) -> Arc<dyn Runnable> {
    Arc::new(DemoChain {
        interrupt_before_action,
    })
}

/// Thin wrapper binding the demo chain to a fixed run configuration.
pub struct ConfigurableAgent {
    bound: Arc<dyn Runnable>,
}

impl ConfigurableAgent {
    #[must_use]
    pub fn new(interrupt_before_action: bool) -> Self {
        Self {
            bound: build_chain(interrupt_before_action),
        }
    }

    /// Compile the bound agent into a graph under [`AGENT_RECURSION_LIMIT`].
    #[must_use]
    pub fn into_graph(self, name: &str) -> CompiledGraph {
        CompiledGraph::new(
            name,
            Arc::new(self),
            RunConfig {
                recursion_limit: AGENT_RECURSION_LIMIT,
            },
        )
    }
}

#[async_trait]
impl Runnable for ConfigurableAgent {
    async fn invoke(
        &self,
        messages: &[Message],
        config: &RunConfig,
    ) -> Result<StepOutcome, RunError> {
        self.bound.invoke(messages, config).await
    }
}

/// The default graph served when no module is named on the command line.
#[must_use]
pub fn demo_graph() -> CompiledGraph {
    ConfigurableAgent::new(false).into_graph("demo")
}
