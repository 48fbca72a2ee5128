//! Binding the function version to the distribution's default behavior.
//!
//! The configuration is read once and written back at most once, conditional
//! on the concurrency token from that read. A rejected write is never
//! retried: someone else changed the distribution and the next run should
//! start from their state.

use tracing::{debug, info};

use crate::remote::{DistributionApi, FunctionAssociation, RemoteError};
use crate::util::redact::redact;

use super::config::ReconcileConfig;
use super::types::{BindingOutcome, ReconcileError};
use super::wait::{Clock, await_distribution_deployed};

/// True if `current` is exactly the one desired association.
pub fn associations_match(current: &[FunctionAssociation], desired: &FunctionAssociation) -> bool {
  match current {
    [only] => {
      only.event_type == desired.event_type
        && only.target_arn == desired.target_arn
        && only.include_body == desired.include_body
    }
    _ => false,
  }
}

/// Point the default behavior's origin-request hook at `function_arn`.
pub async fn bind_distribution<D, C>(
  api: &D,
  clock: &C,
  config: &ReconcileConfig,
  function_arn: &str,
) -> Result<BindingOutcome, ReconcileError>
where
  D: DistributionApi + ?Sized,
  C: Clock + ?Sized,
{
  let id = config.distribution_id.as_str();
  let desired = FunctionAssociation::origin_request(function_arn);

  let mut current = api
    .get_distribution_config(id)
    .await
    .map_err(|source| ReconcileError::RemoteLookup {
      operation: "read distribution config",
      source,
    })?;

  if associations_match(&current.function_associations, &desired) {
    info!(distribution = %redact(id), "distribution already bound to function version");
    return Ok(BindingOutcome::Unchanged);
  }

  debug!(
    distribution = %redact(id),
    current = current.function_associations.len(),
    target = %redact(function_arn),
    "replacing function associations"
  );
  current.function_associations = vec![desired];

  match api.update_distribution_config(id, current).await {
    Ok(()) => {}
    Err(source @ RemoteError::PreconditionFailed { .. }) => {
      return Err(ReconcileError::ConcurrencyConflict {
        distribution: redact(id),
        source,
      });
    }
    Err(source) => {
      return Err(ReconcileError::RemoteMutation {
        operation: "update distribution config",
        source,
      });
    }
  }
  info!(distribution = %redact(id), target = %redact(function_arn), "bound function version to distribution");

  if !config.wait_for_deployment {
    return Ok(BindingOutcome::Updated { deployed: false });
  }

  await_distribution_deployed(api, clock, &config.distribution_wait, id).await?;
  info!(distribution = %redact(id), "distribution deployed");
  Ok(BindingOutcome::Updated { deployed: true })
}
