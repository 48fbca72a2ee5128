//! Remote state as seen by the reconciler.
//!
//! Everything here is rebuilt from remote reads on every run; nothing is
//! cached between runs.

use serde::Serialize;

use crate::consts::ORIGIN_REQUEST_EVENT;

/// Lifecycle of a function or function version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
  Pending,
  Active,
  Failed,
  Inactive,
}

impl LifecycleState {
  /// Parse the service's state name. Unknown names read as `Pending`.
  pub fn parse(value: &str) -> Self {
    match value {
      "Active" => LifecycleState::Active,
      "Failed" => LifecycleState::Failed,
      "Inactive" => LifecycleState::Inactive,
      _ => LifecycleState::Pending,
    }
  }
}

/// Status of the most recent code or configuration update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LastUpdateStatus {
  InProgress,
  Successful,
  Failed,
}

impl LastUpdateStatus {
  /// Parse the service's status name. Unknown names read as `InProgress`.
  pub fn parse(value: &str) -> Self {
    match value {
      "Successful" => LastUpdateStatus::Successful,
      "Failed" => LastUpdateStatus::Failed,
      _ => LastUpdateStatus::InProgress,
    }
  }
}

/// Readiness of one function version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FunctionStatus {
  pub lifecycle_state: LifecycleState,
  pub last_update_status: LastUpdateStatus,
}

impl FunctionStatus {
  pub fn new(lifecycle_state: LifecycleState, last_update_status: LastUpdateStatus) -> Self {
    Self {
      lifecycle_state,
      last_update_status,
    }
  }

  pub fn ready() -> Self {
    Self::new(LifecycleState::Active, LastUpdateStatus::Successful)
  }

  /// Safe to bind and invoke.
  pub fn is_ready(&self) -> bool {
    self.lifecycle_state == LifecycleState::Active && self.last_update_status == LastUpdateStatus::Successful
  }

  /// Will never become ready without another update.
  pub fn is_failed(&self) -> bool {
    self.lifecycle_state == LifecycleState::Failed || self.last_update_status == LastUpdateStatus::Failed
  }
}

/// An immutable, published function version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedVersion {
  /// Version number assigned by the service.
  pub version: String,

  /// Version-qualified ARN, the identifier bound to the distribution.
  pub arn: String,

  /// Digest of the code in this version.
  pub content_digest: String,
}

/// The remote function as found by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteFunctionState {
  /// Unqualified function ARN.
  pub arn: String,

  /// Digest of the unpublished head. Never used to decide whether the
  /// function is current; see [`RemoteFunctionState::published`].
  pub content_digest: String,

  pub lifecycle_state: LifecycleState,
  pub last_update_status: LastUpdateStatus,

  /// The highest published version, if any version was ever published.
  pub published: Option<PublishedVersion>,
}

/// Binding between the distribution's default behavior and a function version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionAssociation {
  pub event_type: String,
  pub target_arn: String,
  pub include_body: bool,
}

impl FunctionAssociation {
  /// The only association this system manages.
  pub fn origin_request(target_arn: impl Into<String>) -> Self {
    Self {
      event_type: ORIGIN_REQUEST_EVENT.to_string(),
      target_arn: target_arn.into(),
      include_body: false,
    }
  }
}

/// A distribution's configuration as read for a conditional write.
///
/// `document` is the backend's full configuration, carried unchanged
/// except for the default behavior's function associations.
#[derive(Debug, Clone)]
pub struct DistributionConfig<D> {
  /// Concurrency token required by the conditional write.
  pub etag: String,

  /// Function associations on the default behavior.
  pub function_associations: Vec<FunctionAssociation>,

  pub document: D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeploymentStatus {
  InProgress,
  Deployed,
}

impl DeploymentStatus {
  pub fn parse(value: &str) -> Self {
    if value == "Deployed" {
      DeploymentStatus::Deployed
    } else {
      DeploymentStatus::InProgress
    }
  }
}
