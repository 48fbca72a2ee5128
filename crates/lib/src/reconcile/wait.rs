//! Polling until remote state settles.
//!
//! One loop serves both the function reconciler (version activation) and the
//! distribution binder (propagation). Each poll either reports the target
//! ready, still settling, or failed for good. A poll error aborts the wait
//! immediately; only "not ready yet" is retried.
//!
//! Time goes through [`Clock`] so tests can drive the loop without sleeping.
//! The timeout is measured as elapsed time on that clock, so slow polls count
//! against it as well as the sleeps between them.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::remote::{DeploymentStatus, DistributionApi, FunctionApi};
use crate::util::redact::redact;

use super::types::ReconcileError;

/// Source of time and delays for the polling loop.
#[async_trait]
pub trait Clock: Send + Sync {
  fn now(&self) -> Instant;

  async fn sleep(&self, duration: Duration);
}

/// Real time, via the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
  fn now(&self) -> Instant {
    tokio::time::Instant::now().into_std()
  }

  async fn sleep(&self, duration: Duration) {
    tokio::time::sleep(duration).await;
  }
}

/// Poll interval and optional upper bound on the elapsed wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollPolicy {
  pub interval: Duration,

  /// `None` waits forever.
  pub timeout: Option<Duration>,
}

impl PollPolicy {
  pub const fn new(interval: Duration, timeout: Option<Duration>) -> Self {
    Self { interval, timeout }
  }

  /// Function activation: 1s polls, 10 minute cap.
  pub const fn function_default() -> Self {
    Self::new(Duration::from_secs(1), Some(Duration::from_secs(10 * 60)))
  }

  /// Distribution propagation: 5s polls, 30 minute cap.
  pub const fn distribution_default() -> Self {
    Self::new(Duration::from_secs(5), Some(Duration::from_secs(30 * 60)))
  }
}

/// What a single poll observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
  Ready,
  Pending(String),
  Failed(String),
}

/// Poll until `probe` reports ready.
///
/// Polls once immediately, then once per `policy.interval`. Returns
/// `DeploymentTimeout` once the time elapsed on `clock` since the first poll
/// reaches `policy.timeout`.
pub async fn wait_until<C, F, Fut>(clock: &C, policy: &PollPolicy, target: &str, mut probe: F) -> Result<(), ReconcileError>
where
  C: Clock + ?Sized,
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<Probe, ReconcileError>>,
{
  let started = clock.now();

  loop {
    let outcome = probe().await?;
    let waited = clock.now().saturating_duration_since(started);
    match outcome {
      Probe::Ready => {
        debug!(target = %target, waited = ?waited, "target is ready");
        return Ok(());
      }
      Probe::Failed(status) => {
        return Err(ReconcileError::FunctionFailed {
          target: target.to_string(),
          status,
        });
      }
      Probe::Pending(status) => {
        debug!(target = %target, status = %status, waited = ?waited, "target not ready yet");
      }
    }

    if policy.timeout.is_some_and(|timeout| waited >= timeout) {
      return Err(ReconcileError::DeploymentTimeout {
        target: target.to_string(),
        waited,
      });
    }

    clock.sleep(policy.interval).await;
  }
}

/// Wait until a function version is `Active` with a `Successful` last update.
pub async fn await_function_ready<F, C>(
  api: &F,
  clock: &C,
  policy: &PollPolicy,
  name: &str,
  version: &str,
) -> Result<(), ReconcileError>
where
  F: FunctionApi + ?Sized,
  C: Clock + ?Sized,
{
  let target = format!("function {} version {}", name, version);
  wait_until(clock, policy, &target, move || async move {
    let status = api
      .function_status(name, version)
      .await
      .map_err(|source| ReconcileError::RemoteLookup {
        operation: "read function status",
        source,
      })?;

    let observed = format!("{:?}/{:?}", status.lifecycle_state, status.last_update_status);
    Ok(if status.is_ready() {
      Probe::Ready
    } else if status.is_failed() {
      Probe::Failed(observed)
    } else {
      Probe::Pending(observed)
    })
  })
  .await
}

/// Wait until the distribution reports `Deployed`.
pub async fn await_distribution_deployed<D, C>(
  api: &D,
  clock: &C,
  policy: &PollPolicy,
  distribution_id: &str,
) -> Result<(), ReconcileError>
where
  D: DistributionApi + ?Sized,
  C: Clock + ?Sized,
{
  let target = format!("distribution {}", redact(distribution_id));
  wait_until(clock, policy, &target, move || async move {
    let status = api
      .distribution_status(distribution_id)
      .await
      .map_err(|source| ReconcileError::RemoteLookup {
        operation: "read distribution status",
        source,
      })?;

    Ok(match status {
      DeploymentStatus::Deployed => Probe::Ready,
      DeploymentStatus::InProgress => Probe::Pending("InProgress".to_string()),
    })
  })
  .await
}
