//! Fixed-delay database readiness polling.
//!
//! The poll loop is an unbounded retry with a fixed delay and no jitter: every
//! failure is treated as transient, whether the database is still starting or
//! the schema has not landed yet. That is a deliberate policy for a local
//! development bootstrap, not a production liveness probe.

use std::time::Duration;

use async_trait::async_trait;
use miette::Diagnostic;
use sqlx::{Connection, PgConnection};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::PgSettings;

/// Trivial existence read against a known table.
pub const PROBE_QUERY: &str = "select 1 from assistant limit 1";

#[derive(Debug, Error, Diagnostic)]
#[error("database probe failed: {message}")]
#[diagnostic(code(graphstudio::readiness::probe))]
pub struct ProbeError {
    pub message: String,
}

impl From<sqlx::Error> for ProbeError {
    fn from(e: sqlx::Error) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

/// A single readiness check against a dependency.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn check(&self) -> Result<(), ProbeError>;
}

/// Probe that opens a fresh Postgres connection per attempt.
pub struct PgProbe {
    url: String,
}

impl PgProbe {
    #[must_use]
    pub fn new(settings: &PgSettings) -> Self {
        Self {
            url: settings.url(),
        }
    }
}

#[async_trait]
impl ReadinessProbe for PgProbe {
    async fn check(&self) -> Result<(), ProbeError> {
        let mut conn = PgConnection::connect(&self.url).await?;
        let probed = sqlx::query(PROBE_QUERY).fetch_optional(&mut conn).await;
        // The connection never outlives one attempt.
        conn.close().await.ok();
        probed?;
        Ok(())
    }
}

/// Retry `probe` forever with a fixed `delay` between attempts, returning
/// after the first success.
pub async fn wait_until_ready(probe: &dyn ReadinessProbe, delay: Duration) {
    let mut attempt: u64 = 1;
    loop {
        info!(attempt, "waiting for database to be ready");
        match probe.check().await {
            Ok(()) => {
                info!(attempt, "database ready");
                return;
            }
            Err(e) => {
                debug!(error = %e, "database not ready, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
