//! Remote service boundary.
//!
//! The reconciler talks to two services through the traits below: one that
//! hosts the edge function and one that owns the distribution. [`aws`]
//! binds them to Lambda and CloudFront; tests bind them to in-memory fakes.

pub mod aws;
mod error;
mod types;

use async_trait::async_trait;

pub use error::{BoxError, RemoteError};
pub use types::*;

/// Parameters for creating a function.
#[derive(Debug, Clone, Copy)]
pub struct CreateFunction<'a> {
  pub name: &'a str,
  pub role_arn: &'a str,
  pub runtime: &'a str,
  pub handler: &'a str,
  pub payload: &'a [u8],
}

/// Parameters for granting a principal permission to invoke a function.
#[derive(Debug, Clone, Copy)]
pub struct GrantPermission<'a> {
  /// Version-qualified function ARN.
  pub function_arn: &'a str,
  pub statement_id: &'a str,
  pub action: &'a str,
  pub principal: &'a str,
}

/// The service hosting the edge function.
#[async_trait]
pub trait FunctionApi: Send + Sync {
  /// Look a function up by name. An absent function is `RemoteError::NotFound`.
  async fn get_function(&self, name: &str) -> Result<RemoteFunctionState, RemoteError>;

  /// Create a function and publish its first version.
  async fn create_function(&self, request: CreateFunction<'_>) -> Result<PublishedVersion, RemoteError>;

  /// Replace a function's code and publish a new version.
  async fn update_function_code(&self, name: &str, payload: &[u8]) -> Result<PublishedVersion, RemoteError>;

  /// Publish the current head as a new version, if its digest still equals `expected_digest`.
  async fn publish_version(&self, name: &str, expected_digest: &str) -> Result<PublishedVersion, RemoteError>;

  /// Readiness of one published version.
  async fn function_status(&self, name: &str, version: &str) -> Result<FunctionStatus, RemoteError>;

  /// True if the resource policy of the version-qualified `function_arn`
  /// holds a statement named `statement_id` for that ARN. A function with no
  /// policy at all has no such statement.
  async fn has_permission(&self, function_arn: &str, statement_id: &str) -> Result<bool, RemoteError>;

  /// Grant an invoke permission. An existing grant is `RemoteError::Conflict`.
  async fn add_permission(&self, request: GrantPermission<'_>) -> Result<(), RemoteError>;
}

/// The service owning the distribution.
#[async_trait]
pub trait DistributionApi: Send + Sync {
  /// The backend's full configuration document.
  type Document: Send + Sync + 'static;

  async fn get_distribution_config(&self, id: &str) -> Result<DistributionConfig<Self::Document>, RemoteError>;

  /// Write `config` back, conditional on `config.etag`. A stale token is
  /// `RemoteError::PreconditionFailed`.
  async fn update_distribution_config(
    &self,
    id: &str,
    config: DistributionConfig<Self::Document>,
  ) -> Result<(), RemoteError>;

  /// Submit a cache invalidation, returning the invalidation id.
  async fn create_invalidation(&self, id: &str, path: &str, caller_reference: &str) -> Result<String, RemoteError>;

  async fn distribution_status(&self, id: &str) -> Result<DeploymentStatus, RemoteError>;
}
