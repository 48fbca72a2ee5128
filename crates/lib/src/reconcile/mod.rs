//! Reconciliation of the edge router.
//!
//! A run converges remote state towards the local build in a fixed order:
//!
//! 1. Validate the configuration
//! 2. Synthesize the payload into the run's scratch directory
//! 3. Create, update or publish the function and wait for the version
//! 4. Grant the edge service permission to invoke that version
//! 5. Bind the version to the distribution and wait for deployment
//! 6. Invalidate the cache if the function was unchanged and a path was given
//!
//! Every step reads before it writes and writes only on divergence, so a
//! repeated run against converged state issues no mutating call. The first
//! error aborts the run; nothing is rolled back.

mod config;
mod distribution;
mod function;
mod invalidate;
mod permission;
mod plan;
mod types;
mod wait;

use tracing::info;

use crate::manifest::BuildManifests;
use crate::payload::synthesize;
use crate::remote::{DistributionApi, FunctionApi};
use crate::util::redact::redact;

pub use config::{ConfigError, ReconcileConfig, default_run_id, default_scratch_dir};
pub use distribution::{associations_match, bind_distribution};
pub use function::{FunctionPlan, decide, lookup_function, reconcile_function};
pub use invalidate::{caller_reference, invalidate_cache};
pub use permission::ensure_invoke_permission;
pub use plan::{BindingPlan, ReconcilePlan, plan};
pub use types::*;
pub use wait::{Clock, PollPolicy, Probe, TokioClock, await_distribution_deployed, await_function_ready, wait_until};

/// Run one full reconciliation.
pub async fn reconcile<F, D, C>(
  config: &ReconcileConfig,
  manifests: &BuildManifests,
  functions: &F,
  distributions: &D,
  clock: &C,
) -> Result<ReconcileReport, ReconcileError>
where
  F: FunctionApi + ?Sized,
  D: DistributionApi + ?Sized,
  C: Clock + ?Sized,
{
  config.validate()?;
  info!(
    function = %config.function_name(),
    distribution = %redact(&config.distribution_id),
    run_id = %config.run_id,
    "starting reconciliation"
  );

  let payload = synthesize(manifests, &config.scratch_dir)?;

  let function = reconcile_function(functions, clock, config, &payload).await?;
  let permission = ensure_invoke_permission(functions, &function.version.arn).await?;
  let binding = bind_distribution(distributions, clock, config, &function.version.arn).await?;

  let invalidation = match (&config.invalidation_path, function.changed()) {
    (Some(path), false) => {
      let reference = caller_reference(&function.name, &config.run_id, &payload.digest);
      Some(invalidate_cache(distributions, &config.distribution_id, path, &reference).await?)
    }
    _ => None,
  };

  let report = ReconcileReport {
    digest: payload.digest,
    function,
    permission,
    binding,
    invalidation,
  };
  info!(
    function = %report.function.name,
    version = %report.function.version.version,
    changed = report.changed(),
    "reconciliation complete"
  );
  Ok(report)
}
