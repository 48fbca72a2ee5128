//! Invoke permission for the edge service.

use tracing::{debug, info};

use crate::consts::{EDGE_PRINCIPAL, INVOKE_ACTION, PERMISSION_STATEMENT_ID};
use crate::remote::{FunctionApi, GrantPermission, RemoteError};
use crate::util::redact::redact;

use super::types::{PermissionOutcome, ReconcileError};

/// Let the edge service invoke `function_arn`.
///
/// The policy is read first and the grant is only issued when the statement
/// is missing. The grant uses a fixed statement id, so one that lands between
/// the read and the write surfaces as a conflict and counts as success.
pub async fn ensure_invoke_permission<F>(api: &F, function_arn: &str) -> Result<PermissionOutcome, ReconcileError>
where
  F: FunctionApi + ?Sized,
{
  let present = api
    .has_permission(function_arn, PERMISSION_STATEMENT_ID)
    .await
    .map_err(|source| ReconcileError::RemoteLookup {
      operation: "read function policy",
      source,
    })?;
  if present {
    debug!(function = %redact(function_arn), "invoke permission already present");
    return Ok(PermissionOutcome::AlreadyGranted);
  }

  let request = GrantPermission {
    function_arn,
    statement_id: PERMISSION_STATEMENT_ID,
    action: INVOKE_ACTION,
    principal: EDGE_PRINCIPAL,
  };

  match api.add_permission(request).await {
    Ok(()) => {
      info!(function = %redact(function_arn), principal = EDGE_PRINCIPAL, "granted invoke permission");
      Ok(PermissionOutcome::Granted)
    }
    Err(RemoteError::Conflict { message }) => {
      debug!(function = %redact(function_arn), reason = %message, "invoke permission already granted");
      Ok(PermissionOutcome::AlreadyGranted)
    }
    Err(source) => Err(ReconcileError::RemoteMutation {
      operation: "grant invoke permission",
      source,
    }),
  }
}
