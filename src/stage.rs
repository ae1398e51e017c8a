//! Stage runner
//!
//! Every pipeline stage runs on its own disposable tokio task. When a timeout
//! is configured the runner stops waiting once it elapses, aborts the task and
//! reports [`StageOutcome::TimedOut`]; the pipeline then carries on with an
//! empty result for that stage.

use crate::error::{AutolysisError, Result};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::task::JoinError;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Completed(T),
    TimedOut,
}

impl<T> StageOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            StageOutcome::Completed(value) => Some(value),
            StageOutcome::TimedOut => None,
        }
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, StageOutcome::TimedOut)
    }
}

impl StageOutcome<String> {
    /// Text of a finished stage, or the empty string after a timeout.
    pub fn into_text(self) -> String {
        self.completed().unwrap_or_default()
    }
}

/// Run an async stage on a fresh task, bounded by `timeout` when set.
pub async fn run_stage<T, F>(name: &str, timeout: Option<Duration>, future: F) -> Result<StageOutcome<T>>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let started = Instant::now();
    let mut handle = tokio::spawn(future);

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                handle.abort();
                warn!("Stage '{}' timed out after {:?}; continuing without it", name, limit);
                return Ok(StageOutcome::TimedOut);
            }
        },
        None => handle.await,
    };

    let value = joined.map_err(|e| join_error(name, e))??;
    info!("Stage '{}' finished in {:.2?}", name, started.elapsed());
    Ok(StageOutcome::Completed(value))
}

/// Run a CPU-bound stage on the blocking pool, bounded by `timeout` when set.
///
/// A blocking task cannot be interrupted; after a timeout its result is
/// dropped whenever it eventually finishes.
pub async fn run_blocking_stage<T, F>(name: &str, timeout: Option<Duration>, f: F) -> Result<StageOutcome<T>>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let started = Instant::now();
    let mut handle = tokio::task::spawn_blocking(f);

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!("Stage '{}' timed out after {:?}; continuing without it", name, limit);
                return Ok(StageOutcome::TimedOut);
            }
        },
        None => handle.await,
    };

    let value = joined.map_err(|e| join_error(name, e))??;
    info!("Stage '{}' finished in {:.2?}", name, started.elapsed());
    Ok(StageOutcome::Completed(value))
}

fn join_error(name: &str, err: JoinError) -> AutolysisError {
    let message = if err.is_panic() {
        "worker panicked".to_string()
    } else {
        err.to_string()
    };
    AutolysisError::Stage {
        stage: name.to_string(),
        message,
    }
}
