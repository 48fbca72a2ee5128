//! Error and result types for reconciliation.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::manifest::ManifestReadError;
use crate::payload::PayloadError;
use crate::remote::{PublishedVersion, RemoteError};
use crate::util::hash::ContentDigest;

use super::config::ConfigError;

/// Errors that abort a reconciliation run.
///
/// Every variant is fatal. Nothing is rolled back; each step is idempotent, so
/// the next run picks up where this one stopped.
#[derive(Debug, Error)]
pub enum ReconcileError {
  #[error("invalid configuration")]
  Config(#[from] ConfigError),

  #[error("failed to read build manifests")]
  ManifestRead(#[from] ManifestReadError),

  #[error("failed to synthesize payload")]
  Payload(#[from] PayloadError),

  /// A read failed for a reason other than the resource being absent.
  #[error("failed to {operation}")]
  RemoteLookup {
    operation: &'static str,
    #[source]
    source: RemoteError,
  },

  #[error("failed to {operation}")]
  RemoteMutation {
    operation: &'static str,
    #[source]
    source: RemoteError,
  },

  /// The distribution changed between read and conditional write.
  #[error("distribution {distribution} was modified by someone else; rerun once that change has finished")]
  ConcurrencyConflict {
    distribution: String,
    #[source]
    source: RemoteError,
  },

  #[error("timed out after {} waiting for {target}", humanize(.waited))]
  DeploymentTimeout { target: String, waited: Duration },

  #[error("{target} failed to become ready (status {status})")]
  FunctionFailed { target: String, status: String },
}

fn humanize(duration: &Duration) -> String {
  let secs = duration.as_secs();
  if secs >= 60 {
    format!("{}m {}s", secs / 60, secs % 60)
  } else {
    format!("{}s", secs)
  }
}

/// What the function reconciler did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionAction {
  /// The function did not exist and was created.
  Created,
  /// The code differed and was replaced.
  Updated,
  /// The head already held the local code but was never published.
  Published,
  /// The latest published version already holds the local code.
  Unchanged,
}

impl FunctionAction {
  pub fn is_change(self) -> bool {
    self != FunctionAction::Unchanged
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionOutcome {
  pub name: String,
  pub action: FunctionAction,
  /// The version the distribution is bound to.
  pub version: PublishedVersion,
}

impl FunctionOutcome {
  pub fn changed(&self) -> bool {
    self.action.is_change()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOutcome {
  Granted,
  AlreadyGranted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingOutcome {
  /// The default behavior already pointed at the function version.
  Unchanged,
  /// The association was replaced. `deployed` is true if propagation was awaited.
  Updated { deployed: bool },
}

impl BindingOutcome {
  pub fn changed(&self) -> bool {
    matches!(self, BindingOutcome::Updated { .. })
  }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
  pub digest: ContentDigest,
  pub function: FunctionOutcome,
  pub permission: PermissionOutcome,
  pub binding: BindingOutcome,
  /// Id of the invalidation submitted, if one was.
  pub invalidation: Option<String>,
}

impl ReconcileReport {
  /// True if any remote state was changed.
  pub fn changed(&self) -> bool {
    self.function.changed()
      || self.permission == PermissionOutcome::Granted
      || self.binding.changed()
      || self.invalidation.is_some()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timeout_message_is_human_readable() {
    let err = ReconcileError::DeploymentTimeout {
      target: "distribution E2QW****".to_string(),
      waited: Duration::from_secs(125),
    };
    assert_eq!(err.to_string(), "timed out after 2m 5s waiting for distribution E2QW****");
  }

  #[test]
  fn lookup_error_keeps_cause() {
    let err = ReconcileError::RemoteLookup {
      operation: "look up function",
      source: RemoteError::malformed("GetFunctionConfiguration", "boom"),
    };
    let source = std::error::Error::source(&err).unwrap();
    assert_eq!(err.to_string(), "failed to look up function");
    assert_eq!(source.to_string(), "GetFunctionConfiguration failed: boom");
  }

  #[test]
  fn only_unchanged_is_not_a_change() {
    assert!(FunctionAction::Created.is_change());
    assert!(FunctionAction::Updated.is_change());
    assert!(FunctionAction::Published.is_change());
    assert!(!FunctionAction::Unchanged.is_change());
  }
}
