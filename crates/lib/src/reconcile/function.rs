//! Function reconciliation.
//!
//! Brings the named function to a published, ready version whose code digest
//! equals the local payload's. The decision is made against the latest
//! published version, never the mutable head: the distribution can only be
//! bound to a published version.

use serde::Serialize;
use tracing::{debug, info};

use crate::consts::{FUNCTION_HANDLER, FUNCTION_RUNTIME};
use crate::payload::DeployablePayload;
use crate::remote::{CreateFunction, FunctionApi, LastUpdateStatus, PublishedVersion, RemoteFunctionState};
use crate::util::hash::ContentDigest;

use super::config::ReconcileConfig;
use super::types::{FunctionAction, FunctionOutcome, ReconcileError};
use super::wait::{Clock, await_function_ready};

const HEAD_VERSION: &str = "$LATEST";

/// What the function reconciler is going to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum FunctionPlan {
  /// No function by that name exists.
  Create,
  /// The published code differs from the local payload.
  Update,
  /// The head holds the local code but no published version does.
  Publish,
  /// The latest published version already holds the local code.
  NoOp { version: PublishedVersion },
}

impl FunctionPlan {
  pub fn action(&self) -> FunctionAction {
    match self {
      FunctionPlan::Create => FunctionAction::Created,
      FunctionPlan::Update => FunctionAction::Updated,
      FunctionPlan::Publish => FunctionAction::Published,
      FunctionPlan::NoOp { .. } => FunctionAction::Unchanged,
    }
  }
}

/// Decide what to do given the local digest and the remote function, if any.
pub fn decide(local: &ContentDigest, remote: Option<&RemoteFunctionState>) -> FunctionPlan {
  let Some(remote) = remote else {
    return FunctionPlan::Create;
  };

  if let Some(published) = &remote.published {
    if local.matches(&published.content_digest) {
      return FunctionPlan::NoOp {
        version: published.clone(),
      };
    }
  }

  if local.matches(&remote.content_digest) {
    FunctionPlan::Publish
  } else {
    FunctionPlan::Update
  }
}

/// Read the remote function. An absent function is `Ok(None)`.
pub async fn lookup_function<F>(api: &F, name: &str) -> Result<Option<RemoteFunctionState>, ReconcileError>
where
  F: FunctionApi + ?Sized,
{
  match api.get_function(name).await {
    Ok(state) => Ok(Some(state)),
    Err(err) if err.is_not_found() => Ok(None),
    Err(source) => Err(ReconcileError::RemoteLookup {
      operation: "look up function",
      source,
    }),
  }
}

/// Converge the function and wait until the resulting version is ready.
pub async fn reconcile_function<F, C>(
  api: &F,
  clock: &C,
  config: &ReconcileConfig,
  payload: &DeployablePayload,
) -> Result<FunctionOutcome, ReconcileError>
where
  F: FunctionApi + ?Sized,
  C: Clock + ?Sized,
{
  let name = config.function_name();
  let remote = lookup_function(api, &name).await?;
  let plan = decide(&payload.digest, remote.as_ref());
  debug!(function = %name, plan = ?plan, "decided function action");

  let version = match &plan {
    FunctionPlan::NoOp { version } => {
      info!(function = %name, version = %version.version, "function code unchanged");
      // a previous run may have stopped before this version settled
      await_function_ready(api, clock, &config.function_wait, &name, &version.version).await?;
      return Ok(FunctionOutcome {
        name,
        action: FunctionAction::Unchanged,
        version: version.clone(),
      });
    }
    FunctionPlan::Create => {
      info!(function = %name, "creating function");
      api
        .create_function(CreateFunction {
          name: &name,
          role_arn: &config.role_arn,
          runtime: FUNCTION_RUNTIME,
          handler: FUNCTION_HANDLER,
          payload: &payload.bytes,
        })
        .await
        .map_err(|source| ReconcileError::RemoteMutation {
          operation: "create function",
          source,
        })?
    }
    FunctionPlan::Update => {
      settle_head(api, clock, config, &name, remote.as_ref()).await?;
      info!(function = %name, digest = %payload.digest, "updating function code");
      api
        .update_function_code(&name, &payload.bytes)
        .await
        .map_err(|source| ReconcileError::RemoteMutation {
          operation: "update function code",
          source,
        })?
    }
    FunctionPlan::Publish => {
      settle_head(api, clock, config, &name, remote.as_ref()).await?;
      info!(function = %name, "publishing existing function code");
      api
        .publish_version(&name, payload.digest.as_str())
        .await
        .map_err(|source| ReconcileError::RemoteMutation {
          operation: "publish function version",
          source,
        })?
    }
  };

  await_function_ready(api, clock, &config.function_wait, &name, &version.version).await?;
  info!(function = %name, version = %version.version, "function version is ready");

  Ok(FunctionOutcome {
    name,
    action: plan.action(),
    version,
  })
}

/// The service rejects code changes while a previous update is still running.
async fn settle_head<F, C>(
  api: &F,
  clock: &C,
  config: &ReconcileConfig,
  name: &str,
  remote: Option<&RemoteFunctionState>,
) -> Result<(), ReconcileError>
where
  F: FunctionApi + ?Sized,
  C: Clock + ?Sized,
{
  if remote.is_some_and(|r| r.last_update_status == LastUpdateStatus::InProgress) {
    debug!(function = %name, "waiting for previous update to finish");
    await_function_ready(api, clock, &config.function_wait, name, HEAD_VERSION).await?;
  }
  Ok(())
}
